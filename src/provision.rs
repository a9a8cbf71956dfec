//! Sink table provisioning
//!
//! The loader never creates sinks. This module derives the DDL for every
//! sink in a registry so the warehouse can be prepared ahead of a run.

use thiserror::Error;

use crate::registry::{DatasetDefinition, DatasetRegistry, SinkId};

/// Errors raised while provisioning sinks
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// A DDL statement failed
    #[error("Failed to execute '{statement}': {reason}")]
    Statement { statement: String, reason: String },
}

/// How existing sink tables are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProvisionMode {
    /// Create schemas and tables that do not exist yet
    #[default]
    CreateMissing,
    /// Drop and recreate every sink table
    Recreate,
}

/// Statements executed during provisioning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub schemas: Vec<String>,
    pub tables: Vec<String>,
}

pub fn create_schema_sql(schema: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS \"{}\"", schema)
}

pub fn drop_table_sql(sink: &SinkId) -> String {
    format!("DROP TABLE IF EXISTS {}", sink.quoted())
}

/// CREATE TABLE statement for a dataset's sink
pub fn create_table_sql(definition: &DatasetDefinition, mode: ProvisionMode) -> String {
    let columns = definition
        .schema()
        .fields()
        .iter()
        .map(|f| format!("    \"{}\" {}", f.name, f.ty.sql_type()))
        .collect::<Vec<_>>()
        .join(",\n");
    let if_not_exists = match mode {
        ProvisionMode::CreateMissing => "IF NOT EXISTS ",
        ProvisionMode::Recreate => "",
    };
    format!(
        "CREATE TABLE {}{} (\n{}\n)",
        if_not_exists,
        definition.sink().quoted(),
        columns
    )
}

/// Ordered DDL statements provisioning every sink of a registry
pub fn provision_statements(registry: &DatasetRegistry, mode: ProvisionMode) -> Vec<String> {
    let mut schemas: Vec<&str> = Vec::new();
    for definition in registry.datasets() {
        let schema = definition.sink().schema();
        if !schemas.contains(&schema) {
            schemas.push(schema);
        }
    }

    let mut statements: Vec<String> = schemas.into_iter().map(create_schema_sql).collect();
    for definition in registry.datasets() {
        if mode == ProvisionMode::Recreate {
            statements.push(drop_table_sql(definition.sink()));
        }
        statements.push(create_table_sql(definition, mode));
    }
    statements
}

/// Create the schemas and sink tables of a registry in a DuckDB warehouse
#[cfg(feature = "duckdb-backend")]
pub fn provision(
    warehouse: &crate::loader::DuckDbSink,
    registry: &DatasetRegistry,
    mode: ProvisionMode,
) -> Result<ProvisionReport, ProvisionError> {
    let conn = warehouse.connection();
    let mut report = ProvisionReport::default();

    for statement in provision_statements(registry, mode) {
        conn.execute_batch(&statement)
            .map_err(|e| ProvisionError::Statement {
                statement: statement.lines().next().unwrap_or_default().to_string(),
                reason: e.to_string(),
            })?;
        tracing::debug!(statement = %statement, "Executed provisioning statement");
    }

    for definition in registry.datasets() {
        let schema = definition.sink().schema().to_string();
        if !report.schemas.contains(&schema) {
            report.schemas.push(schema);
        }
        report.tables.push(definition.sink().to_string());
    }
    tracing::info!(
        schemas = report.schemas.len(),
        tables = report.tables.len(),
        "Provisioned sinks"
    );
    Ok(report)
}
