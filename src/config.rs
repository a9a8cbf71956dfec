//! Configuration for bronze loads
//!
//! The dataset catalog and warehouse location are read from a TOML file:
//!
//! ```toml
//! [warehouse]
//! database = "warehouse.duckdb"
//! base_dir = "datasets"
//!
//! [[groups]]
//! name = "crm"
//!
//! [[groups.datasets]]
//! name = "crm_cust_info"
//! sink = "bronze.crm_cust_info"
//! source = "source_crm/cust_info.csv"
//! fields = [
//!     { name = "cst_id", type = "integer" },
//!     { name = "cst_key", type = "text(50)" },
//! ]
//! ```
//!
//! Relative source locators resolve against `base_dir`; a relative `base_dir`
//! or `database` resolves against the directory holding the config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::{
    DatasetDefinition, DatasetRegistry, FieldSpec, RecordFormat, RegistryError, SourceGroup,
    SourceLocator,
};

/// Errors raised while reading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Catalog does not form a valid registry
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BronzeConfig {
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

/// Location of the warehouse and its raw extracts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseConfig {
    /// DuckDB database file
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Directory relative source locators resolve against
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
}

fn default_database() -> PathBuf {
    PathBuf::from("warehouse.duckdb")
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            base_dir: None,
        }
    }
}

/// One source system and its datasets, in load order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,
}

/// One dataset entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    pub name: String,
    /// `schema.table`
    pub sink: String,
    /// Path or `file://` URI
    pub source: String,
    #[serde(default)]
    pub format: RecordFormat,
    pub fields: Vec<FieldSpec>,
}

impl BronzeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;

        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Ok(config.relative_to(root))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the directory relative source locators resolve against
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.warehouse.base_dir = Some(dir.into());
        self
    }

    /// Set the warehouse database file
    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.warehouse.database = path.into();
        self
    }

    /// Resolve relative warehouse paths against `root`
    fn relative_to(mut self, root: &Path) -> Self {
        if self.warehouse.database.is_relative() {
            self.warehouse.database = root.join(&self.warehouse.database);
        }
        let base = match self.warehouse.base_dir.take() {
            Some(dir) if dir.is_relative() => root.join(dir),
            Some(dir) => dir,
            None => root.to_path_buf(),
        };
        self.warehouse.base_dir = Some(base);
        self
    }

    /// Total number of configured datasets
    pub fn dataset_count(&self) -> usize {
        self.groups.iter().map(|g| g.datasets.len()).sum()
    }

    /// Build the dataset registry described by this configuration
    pub fn to_registry(&self) -> Result<DatasetRegistry, ConfigError> {
        let base_dir = self.warehouse.base_dir.as_deref();
        let mut groups = Vec::with_capacity(self.groups.len());

        for group in &self.groups {
            let mut datasets = Vec::with_capacity(group.datasets.len());
            for dataset in &group.datasets {
                let mut source = SourceLocator::parse(&dataset.source);
                if let Some(base) = base_dir {
                    source = source.resolve_against(base);
                }
                let definition = DatasetDefinition::builder(&dataset.name)
                    .sink(&dataset.sink)
                    .source(source)
                    .format(dataset.format.clone())
                    .fields(dataset.fields.clone())
                    .build()?;
                datasets.push(definition);
            }
            groups.push(SourceGroup::new(&group.name, datasets));
        }

        Ok(DatasetRegistry::new(groups)?)
    }
}
