use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n+").unwrap());

/// Everything the extractors can learn about a model from one source.
///
/// Numeric metrics are probabilities in `[0, 1]`; percentages are normalized
/// before they land here. Empty lists and maps mean "not found".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedAttributes {
    pub accuracy: Option<f64>,
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
    pub auc: Option<f64>,
    pub f1_score: Option<f64>,
    pub architecture: Option<String>,
    pub framework: Option<String>,
    /// Packages and runtimes a repository says it needs.
    pub requirements: Vec<String>,
    pub dataset_names: Vec<String>,
    pub dataset_size: Option<String>,
    pub primary_uses: Vec<String>,
    pub out_of_scope: Vec<String>,
    pub bias_analysis: Vec<String>,
    pub fairness_metrics: BTreeMap<String, f64>,
    pub limitations: Vec<String>,
    pub extraction_provenance: String,
}

/// The mergeable fields of [`ExtractedAttributes`], in the order the merger
/// walks them. Provenance is bookkeeping and not a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Accuracy,
    Sensitivity,
    Specificity,
    Auc,
    F1Score,
    Architecture,
    Framework,
    Requirements,
    DatasetNames,
    DatasetSize,
    PrimaryUses,
    OutOfScope,
    BiasAnalysis,
    FairnessMetrics,
    Limitations,
}

impl Field {
    pub const ALL: [Field; 15] = [
        Field::Accuracy,
        Field::Sensitivity,
        Field::Specificity,
        Field::Auc,
        Field::F1Score,
        Field::Architecture,
        Field::Framework,
        Field::Requirements,
        Field::DatasetNames,
        Field::DatasetSize,
        Field::PrimaryUses,
        Field::OutOfScope,
        Field::BiasAnalysis,
        Field::FairnessMetrics,
        Field::Limitations,
    ];

    pub const METRICS: [Field; 5] = [
        Field::Accuracy,
        Field::Sensitivity,
        Field::Specificity,
        Field::Auc,
        Field::F1Score,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Accuracy => "accuracy",
            Field::Sensitivity => "sensitivity",
            Field::Specificity => "specificity",
            Field::Auc => "auc",
            Field::F1Score => "f1Score",
            Field::Architecture => "architecture",
            Field::Framework => "framework",
            Field::Requirements => "requirements",
            Field::DatasetNames => "datasetNames",
            Field::DatasetSize => "datasetSize",
            Field::PrimaryUses => "primaryUses",
            Field::OutOfScope => "outOfScope",
            Field::BiasAnalysis => "biasAnalysis",
            Field::FairnessMetrics => "fairnessMetrics",
            Field::Limitations => "limitations",
        }
    }
}

impl ExtractedAttributes {
    /// An empty bag that only records where it came from.
    pub fn empty(provenance: impl Into<String>) -> Self {
        Self {
            extraction_provenance: provenance.into(),
            ..Self::default()
        }
    }

    pub fn metric(&self, field: Field) -> Option<f64> {
        match field {
            Field::Accuracy => self.accuracy,
            Field::Sensitivity => self.sensitivity,
            Field::Specificity => self.specificity,
            Field::Auc => self.auc,
            Field::F1Score => self.f1_score,
            _ => None,
        }
    }

    pub(crate) fn metric_mut(&mut self, field: Field) -> Option<&mut Option<f64>> {
        match field {
            Field::Accuracy => Some(&mut self.accuracy),
            Field::Sensitivity => Some(&mut self.sensitivity),
            Field::Specificity => Some(&mut self.specificity),
            Field::Auc => Some(&mut self.auc),
            Field::F1Score => Some(&mut self.f1_score),
            _ => None,
        }
    }

    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Accuracy
            | Field::Sensitivity
            | Field::Specificity
            | Field::Auc
            | Field::F1Score => self.metric(field).is_some(),
            Field::Architecture => self.architecture.is_some(),
            Field::Framework => self.framework.is_some(),
            Field::Requirements => !self.requirements.is_empty(),
            Field::DatasetNames => !self.dataset_names.is_empty(),
            Field::DatasetSize => self.dataset_size.is_some(),
            Field::PrimaryUses => !self.primary_uses.is_empty(),
            Field::OutOfScope => !self.out_of_scope.is_empty(),
            Field::BiasAnalysis => !self.bias_analysis.is_empty(),
            Field::FairnessMetrics => !self.fairness_metrics.is_empty(),
            Field::Limitations => !self.limitations.is_empty(),
        }
    }

    /// Copy one field's value from `other`, overwriting whatever is here.
    pub fn take_field(&mut self, field: Field, other: &ExtractedAttributes) {
        match field {
            Field::Accuracy => self.accuracy = other.accuracy,
            Field::Sensitivity => self.sensitivity = other.sensitivity,
            Field::Specificity => self.specificity = other.specificity,
            Field::Auc => self.auc = other.auc,
            Field::F1Score => self.f1_score = other.f1_score,
            Field::Architecture => self.architecture = other.architecture.clone(),
            Field::Framework => self.framework = other.framework.clone(),
            Field::Requirements => self.requirements = other.requirements.clone(),
            Field::DatasetNames => self.dataset_names = other.dataset_names.clone(),
            Field::DatasetSize => self.dataset_size = other.dataset_size.clone(),
            Field::PrimaryUses => self.primary_uses = other.primary_uses.clone(),
            Field::OutOfScope => self.out_of_scope = other.out_of_scope.clone(),
            Field::BiasAnalysis => self.bias_analysis = other.bias_analysis.clone(),
            Field::FairnessMetrics => self.fairness_metrics = other.fairness_metrics.clone(),
            Field::Limitations => self.limitations = other.limitations.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        !Field::ALL.iter().any(|field| self.has(*field))
    }
}

/// Readable text pulled out of an HTML page.
#[derive(Debug, Clone, Default)]
pub struct PageText {
    pub title: String,
    pub site_name: Option<String>,
    pub description: Option<String>,
    pub text: String,
}

pub fn normalize_whitespace(text: &str) -> String {
    let spaced = SPACES.replace_all(text.trim(), " ");
    BLANK_LINES.replace_all(&spaced, "\n\n").to_string()
}

/// Collapse all whitespace, newlines included, into single spaces.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
