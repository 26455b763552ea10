use chrono::{DateTime, Utc};
use serde::Serialize;

use jarvet_core::pipeline::AnalysisReport;
use jarvet_core::types::Severity;

/// JSON document wrapper adding the generation timestamp.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub report: &'a AnalysisReport,
}

/// Format a full analysis report as JSON.
pub fn format_report(report: &AnalysisReport, compact: bool) -> String {
    let doc = ReportDocument {
        generated_at: Utc::now(),
        report,
    };
    if compact {
        serde_json::to_string(&doc).expect("AnalysisReport should be serializable")
    } else {
        serde_json::to_string_pretty(&doc).expect("AnalysisReport should be serializable")
    }
}

/// Wrapper for check output that adds pass/fail metadata.
#[derive(Debug, Serialize)]
pub struct CheckOutput<'a> {
    #[serde(flatten)]
    pub document: ReportDocument<'a>,
    pub check: CheckStatus,
}

#[derive(Debug, Serialize)]
pub struct CheckStatus {
    pub passed: bool,
    pub fail_on: Severity,
    pub failing_finding_count: usize,
}

/// Format a check result as JSON. Returns (json_string, passed).
pub fn format_check(report: &AnalysisReport, fail_on: Severity, compact: bool) -> (String, bool) {
    let failing_count = report
        .findings
        .iter()
        .filter(|f| f.severity >= fail_on)
        .count();

    let passed = failing_count == 0;

    let output = CheckOutput {
        document: ReportDocument {
            generated_at: Utc::now(),
            report,
        },
        check: CheckStatus {
            passed,
            fail_on,
            failing_finding_count: failing_count,
        },
    };

    let json = if compact {
        serde_json::to_string(&output).expect("CheckOutput should be serializable")
    } else {
        serde_json::to_string_pretty(&output).expect("CheckOutput should be serializable")
    };

    (json, passed)
}
