//! Dataset registry
//!
//! The registry is the fixed catalog of datasets the loader processes. Each
//! dataset belongs to a source group (one per source system) and the registry
//! keeps both groups and datasets in the order they are processed. Definitions
//! are supplied at construction time and never change afterwards.

mod format;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use format::{FieldSpec, FieldType, RecordFormat, RecordTerminator, SinkId, SinkSchema};

/// Errors raised while building a registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Dataset name used more than once
    #[error("Duplicate dataset name: {0}")]
    DuplicateDataset(String),

    /// Source group name used more than once
    #[error("Duplicate source group: {0}")]
    DuplicateGroup(String),

    /// Required builder field not set
    #[error("Dataset definition is missing '{0}'")]
    MissingField(&'static str),

    /// Sink identifier could not be parsed
    #[error("Invalid sink for dataset '{dataset}': {reason}")]
    InvalidSink { dataset: String, reason: String },

    /// Record format is unusable
    #[error("Invalid record format for dataset '{dataset}': {reason}")]
    InvalidFormat { dataset: String, reason: String },

    /// Sink schema is empty or has bad field names
    #[error("Invalid schema for dataset '{dataset}': {reason}")]
    InvalidSchema { dataset: String, reason: String },
}

/// Where a dataset's raw records live
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceLocator(PathBuf);

impl SourceLocator {
    /// Parse a locator: a plain path or a `file://` URI
    pub fn parse(value: &str) -> Self {
        let path = value.strip_prefix("file://").unwrap_or(value);
        Self(PathBuf::from(path))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Resolve a relative locator against a base directory
    pub fn resolve_against(&self, base: &Path) -> Self {
        if self.0.is_absolute() {
            self.clone()
        } else {
            Self(base.join(&self.0))
        }
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for SourceLocator {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&Path> for SourceLocator {
    fn from(path: &Path) -> Self {
        Self(path.to_path_buf())
    }
}

/// Immutable description of one dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDefinition {
    name: String,
    sink: SinkId,
    source: SourceLocator,
    format: RecordFormat,
    schema: SinkSchema,
}

impl DatasetDefinition {
    /// Create a new builder for a dataset definition
    pub fn builder(name: impl Into<String>) -> DatasetDefinitionBuilder {
        DatasetDefinitionBuilder {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sink(&self) -> &SinkId {
        &self.sink
    }

    pub fn source(&self) -> &SourceLocator {
        &self.source
    }

    pub fn format(&self) -> &RecordFormat {
        &self.format
    }

    pub fn schema(&self) -> &SinkSchema {
        &self.schema
    }
}

/// Builder for DatasetDefinition
#[derive(Debug, Default)]
pub struct DatasetDefinitionBuilder {
    name: String,
    sink: Option<String>,
    source: Option<SourceLocator>,
    format: Option<RecordFormat>,
    fields: Vec<FieldSpec>,
}

impl DatasetDefinitionBuilder {
    /// Set the sink identifier (`schema.table` or `table`)
    pub fn sink(mut self, sink: &str) -> Self {
        self.sink = Some(sink.to_string());
        self
    }

    /// Set the source locator
    pub fn source(mut self, source: impl Into<SourceLocator>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the record format
    pub fn format(mut self, format: RecordFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Append one sink field
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Replace the sink fields
    pub fn fields(mut self, fields: Vec<FieldSpec>) -> Self {
        self.fields = fields;
        self
    }

    /// Build the DatasetDefinition
    pub fn build(self) -> Result<DatasetDefinition, RegistryError> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::MissingField("name"));
        }
        let sink = self.sink.ok_or(RegistryError::MissingField("sink"))?;
        let source = self.source.ok_or(RegistryError::MissingField("source"))?;

        let sink = SinkId::parse(&sink).map_err(|reason| RegistryError::InvalidSink {
            dataset: self.name.clone(),
            reason,
        })?;

        let format = self.format.unwrap_or_default();
        format
            .validate()
            .map_err(|reason| RegistryError::InvalidFormat {
                dataset: self.name.clone(),
                reason,
            })?;

        let schema = SinkSchema::new(self.fields);
        if schema.is_empty() {
            return Err(RegistryError::InvalidSchema {
                dataset: self.name,
                reason: "no fields declared".to_string(),
            });
        }
        schema
            .validate()
            .map_err(|reason| RegistryError::InvalidSchema {
                dataset: self.name.clone(),
                reason,
            })?;

        Ok(DatasetDefinition {
            name: self.name,
            sink,
            source,
            format,
            schema,
        })
    }
}

/// Datasets of one source system, in processing order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGroup {
    name: String,
    datasets: Vec<DatasetDefinition>,
}

impl SourceGroup {
    pub fn new(name: impl Into<String>, datasets: Vec<DatasetDefinition>) -> Self {
        Self {
            name: name.into(),
            datasets,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn datasets(&self) -> &[DatasetDefinition] {
        &self.datasets
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

/// Fixed, ordered catalog of datasets grouped by source system
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetRegistry {
    groups: Vec<SourceGroup>,
}

impl DatasetRegistry {
    /// Build a registry, rejecting repeated group or dataset names
    pub fn new(groups: Vec<SourceGroup>) -> Result<Self, RegistryError> {
        let mut group_names = HashSet::new();
        let mut dataset_names = HashSet::new();

        for group in &groups {
            if !group_names.insert(group.name.as_str()) {
                return Err(RegistryError::DuplicateGroup(group.name.clone()));
            }
            for dataset in &group.datasets {
                if !dataset_names.insert(dataset.name.as_str()) {
                    return Err(RegistryError::DuplicateDataset(dataset.name.clone()));
                }
            }
        }

        Ok(Self { groups })
    }

    /// Datasets of a source group in processing order
    pub fn list(&self, group: &str) -> Option<&[DatasetDefinition]> {
        self.groups
            .iter()
            .find(|g| g.name == group)
            .map(|g| g.datasets())
    }

    /// Source groups in processing order
    pub fn groups(&self) -> &[SourceGroup] {
        &self.groups
    }

    /// All datasets across groups in processing order
    pub fn datasets(&self) -> impl Iterator<Item = &DatasetDefinition> {
        self.groups.iter().flat_map(|g| g.datasets.iter())
    }

    /// Look a dataset up by name
    pub fn get(&self, name: &str) -> Option<&DatasetDefinition> {
        self.datasets().find(|d| d.name == name)
    }

    /// Total number of datasets
    pub fn len(&self) -> usize {
        self.groups.iter().map(SourceGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(name: &str) -> DatasetDefinition {
        DatasetDefinition::builder(name)
            .sink(&format!("bronze.{}", name))
            .source(PathBuf::from(format!("{}.csv", name)))
            .field(FieldSpec::integer("id"))
            .field(FieldSpec::text("label", 50))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let def = dataset("crm_cust_info");
        assert_eq!(def.name(), "crm_cust_info");
        assert_eq!(def.sink().to_string(), "bronze.crm_cust_info");
        assert_eq!(def.format(), &RecordFormat::default());
        assert_eq!(def.schema().len(), 2);
    }

    #[test]
    fn test_builder_requires_sink_and_source() {
        let err = DatasetDefinition::builder("x")
            .source(PathBuf::from("x.csv"))
            .field(FieldSpec::integer("id"))
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::MissingField("sink"));

        let err = DatasetDefinition::builder("x")
            .sink("bronze.x")
            .field(FieldSpec::integer("id"))
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::MissingField("source"));
    }

    #[test]
    fn test_builder_rejects_empty_schema() {
        let err = DatasetDefinition::builder("x")
            .sink("bronze.x")
            .source(PathBuf::from("x.csv"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchema { .. }));
    }

    #[test]
    fn test_registry_preserves_order() {
        let registry = DatasetRegistry::new(vec![
            SourceGroup::new("crm", vec![dataset("b"), dataset("a")]),
            SourceGroup::new("erp", vec![dataset("c")]),
        ])
        .unwrap();

        let names: Vec<_> = registry.datasets().map(|d| d.name()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(registry.len(), 3);

        let crm: Vec<_> = registry
            .list("crm")
            .unwrap()
            .iter()
            .map(|d| d.name())
            .collect();
        assert_eq!(crm, vec!["b", "a"]);
        assert!(registry.list("hr").is_none());
        assert!(registry.get("c").is_some());
    }

    #[test]
    fn test_registry_rejects_duplicate_names_across_groups() {
        let err = DatasetRegistry::new(vec![
            SourceGroup::new("crm", vec![dataset("a")]),
            SourceGroup::new("erp", vec![dataset("a")]),
        ])
        .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateDataset("a".to_string()));

        let err = DatasetRegistry::new(vec![
            SourceGroup::new("crm", vec![dataset("a")]),
            SourceGroup::new("crm", vec![dataset("b")]),
        ])
        .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateGroup("crm".to_string()));
    }

    #[test]
    fn test_source_locator() {
        let loc = SourceLocator::parse("file:///data/cust_info.csv");
        assert_eq!(loc.path(), Path::new("/data/cust_info.csv"));

        let rel = SourceLocator::parse("source_crm/cust_info.csv");
        let resolved = rel.resolve_against(Path::new("/datasets"));
        assert_eq!(resolved.path(), Path::new("/datasets/source_crm/cust_info.csv"));
        assert_eq!(loc.resolve_against(Path::new("/other")), loc);
    }
}
