//! Output formatting for CLI

use serde::Serialize;

use super::error::CliError;
use crate::orchestrator::{FailureReport, RunFailure, RunSummary};
use crate::registry::DatasetRegistry;

/// Render the registry in processing order
pub fn format_registry(registry: &DatasetRegistry) -> String {
    let mut output = String::new();
    let mut position = 0;

    for group in registry.groups() {
        output.push_str(&format!("{} ({} datasets)\n", group.name(), group.len()));
        for definition in group.datasets() {
            position += 1;
            output.push_str(&format!(
                "  {:>2}. {} -> {}\n",
                position,
                definition.name(),
                definition.sink()
            ));
            output.push_str(&format!("      source: {}\n", definition.source()));

            let fields: Vec<String> = definition
                .schema()
                .fields()
                .iter()
                .map(|f| format!("{}:{}", f.name, f.ty))
                .collect();
            output.push_str(&format!("      fields: {}\n", fields.join(", ")));
        }
    }
    output
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureOutput<'a> {
    failure: &'a FailureReport,
    summary: &'a RunSummary,
}

/// Render a successful run as JSON
pub fn summary_json(summary: &RunSummary) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Render a failed run as JSON: the enriched report plus the partial summary
pub fn failure_json(failure: &RunFailure) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(&FailureOutput {
        failure: &failure.report,
        summary: &failure.summary,
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoadError;
    use crate::orchestrator::FailureReporter;
    use crate::registry::{DatasetDefinition, FieldSpec, SourceGroup};
    use std::path::PathBuf;

    #[test]
    fn test_format_registry() {
        let def = DatasetDefinition::builder("erp_px_cat_g1v2")
            .sink("bronze.erp_px_cat_g1v2")
            .source(PathBuf::from("/data/PX_CAT_G1V2.csv"))
            .field(FieldSpec::text("id", 50))
            .field(FieldSpec::text("cat", 50))
            .build()
            .unwrap();
        let registry = DatasetRegistry::new(vec![SourceGroup::new("erp", vec![def])]).unwrap();

        let text = format_registry(&registry);
        assert!(text.starts_with("erp (1 datasets)\n"));
        assert!(text.contains(" 1. erp_px_cat_g1v2 -> bronze.erp_px_cat_g1v2"));
        assert!(text.contains("fields: id:text(50), cat:text(50)"));
    }

    #[test]
    fn test_failure_json() {
        let error = LoadError::Unknown("boom".to_string());
        let failure = FailureReporter.report(error, "crm_cust_info", RunSummary::new("run-9"));

        let json: serde_json::Value =
            serde_json::from_str(&failure_json(&failure).unwrap()).unwrap();
        assert_eq!(json["failure"]["dataset"], "crm_cust_info");
        assert_eq!(json["failure"]["kind"], "unknown_failure");
        assert_eq!(json["failure"]["severity"], 16);
        assert_eq!(json["summary"]["runId"], "run-9");
    }
}
