use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::merge::MergedRecord;

pub const ISSUE_PERFORMANCE: &str = "Performance metrics not fully documented";
pub const ISSUE_BIAS: &str = "Bias analysis documentation incomplete";
pub const ISSUE_OUT_OF_SCOPE: &str = "Out-of-scope use cases not clearly defined";

/// HTI-1 passes with fewer issues than this.
pub const HTI1_MAX_ISSUES: usize = 2;
/// OCR passes with fewer issues than this, given fairness metrics exist.
pub const OCR_MAX_ISSUES: usize = 3;

pub const RECOMMENDATIONS: [&str; 4] = [
    "Ensure all performance metrics are documented with confidence intervals",
    "Include detailed bias analysis across demographic groups",
    "Specify clear limitations and out-of-scope applications",
    "Document fairness metrics and mitigation strategies",
];

pub const HTI1_REQUIREMENTS: [&str; 6] = [
    "Model purpose and intended use clearly defined",
    "Training data sources and characteristics documented",
    "Performance metrics with statistical significance",
    "Model limitations and known failure modes",
    "Update and maintenance procedures",
    "Contact information for model queries",
];

pub const OCR_REQUIREMENTS: [&str; 6] = [
    "Bias testing across protected characteristics",
    "Fairness metrics evaluation and reporting",
    "Discrimination risk assessment and mitigation",
    "Accessibility features and considerations",
    "Equal treatment across patient populations",
    "Regular monitoring for discriminatory outcomes",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    pub hti1_compliant: bool,
    pub ocr_compliant: bool,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Score a merged record against the HTI-1 and OCR checklists.
#[instrument(skip_all, fields(real_data_found = record.real_data_found))]
pub fn evaluate(record: &MergedRecord) -> ComplianceResult {
    let attributes = &record.attributes;
    let checks = [
        (attributes.accuracy.is_some(), ISSUE_PERFORMANCE),
        (!attributes.bias_analysis.is_empty(), ISSUE_BIAS),
        (!attributes.out_of_scope.is_empty(), ISSUE_OUT_OF_SCOPE),
    ];
    let issues: Vec<String> = checks
        .iter()
        .filter(|(passed, _)| !passed)
        .map(|(_, issue)| issue.to_string())
        .collect();

    let hti1_compliant = issues.len() < HTI1_MAX_ISSUES;
    let has_fairness = !attributes.fairness_metrics.is_empty();
    let ocr_compliant = has_fairness && issues.len() < OCR_MAX_ISSUES;
    debug!(issues = issues.len(), hti1_compliant, ocr_compliant, "compliance evaluated");

    ComplianceResult {
        hti1_compliant,
        ocr_compliant,
        issues,
        recommendations: RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
    }
}
