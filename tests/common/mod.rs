//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use bronze_ingest::{
    BronzeConfig, DatasetDefinition, DatasetRegistry, FieldSpec, FieldType, MemorySink, RawLoader,
};

/// The shipped six-dataset catalog
pub fn catalog() -> BronzeConfig {
    BronzeConfig::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config/bronze.toml"))
        .expect("Failed to load config/bronze.toml")
}

/// Raw text for one field of a generated record
pub fn sample_value(field: &FieldSpec, index: usize) -> String {
    match field.ty {
        FieldType::Integer => (index as i32 + 1).to_string(),
        FieldType::Text { .. } => format!("V{}", index),
        FieldType::Date => format!("2024-{:02}-{:02}", index % 12 + 1, index % 28 + 1),
    }
}

/// Write a source with one header row and `rows` data records
pub fn write_source(definition: &DatasetDefinition, rows: usize) {
    write_source_at(definition.source().path(), definition, rows);
}

pub fn write_source_at(path: &Path, definition: &DatasetDefinition, rows: usize) {
    let fields = definition.schema().fields();
    let mut content = fields
        .iter()
        .map(|f| f.name.as_str())
        .collect::<Vec<_>>()
        .join(",");
    content.push('\n');

    for i in 0..rows {
        let record = fields
            .iter()
            .map(|f| sample_value(f, i))
            .collect::<Vec<_>>()
            .join(",");
        content.push_str(&record);
        content.push('\n');
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create source dir");
    }
    fs::write(path, content).expect("Failed to write source");
}

/// Catalog rooted in a temp dir, with every source holding `rows` records
pub fn workspace(rows: usize) -> (TempDir, BronzeConfig, DatasetRegistry) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = catalog()
        .with_base_dir(dir.path().join("datasets"))
        .with_database(dir.path().join("warehouse.duckdb"));
    let registry = config.to_registry().expect("Invalid catalog");

    for definition in registry.datasets() {
        write_source(definition, rows);
    }
    (dir, config, registry)
}

/// Raw loader over an in-memory sink holding every registry sink
pub fn memory_loader(registry: &DatasetRegistry) -> RawLoader<MemorySink> {
    let mut sink = MemorySink::new();
    for definition in registry.datasets() {
        sink.define_schema(definition.sink(), definition.schema());
    }
    RawLoader::new(sink)
}
