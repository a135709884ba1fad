use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;

use crate::extractor::metrics::normalize_metric;
use crate::extractor::model::Field;

/// The parts of a Hugging Face model card header we use.
#[derive(Debug, Default, Deserialize)]
pub struct CardMetadata {
    #[serde(rename = "model-index", default)]
    model_index: Vec<ModelIndexEntry>,
    #[serde(default)]
    datasets: Option<Value>,
    pub library_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ModelIndexEntry {
    #[serde(default)]
    results: Vec<EvalResult>,
}

#[derive(Debug, Deserialize)]
struct EvalResult {
    #[serde(default)]
    metrics: Vec<EvalMetric>,
}

#[derive(Debug, Deserialize)]
struct EvalMetric {
    #[serde(rename = "type")]
    kind: Option<String>,
    name: Option<String>,
    value: Option<Value>,
}

/// Split a leading `---` YAML block off a markdown document. Returns the
/// parsed header (if there is one and it parses) and the remaining body.
pub fn split(markdown: &str) -> (Option<CardMetadata>, &str) {
    let trimmed = markdown.trim_start_matches('\u{feff}').trim_start();
    let Some(rest) = trimmed.strip_prefix("---") else {
        return (None, markdown);
    };
    let Some(rest) = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) else {
        return (None, markdown);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return match serde_yaml::from_str::<CardMetadata>(yaml) {
                Ok(metadata) => (Some(metadata), body),
                Err(error) => {
                    debug!(%error, "model card front matter did not parse");
                    (None, body)
                }
            };
        }
        offset += line.len();
    }

    (None, markdown)
}

impl CardMetadata {
    /// `model-index` metrics mapped onto our metric fields, first entry per
    /// field wins.
    pub fn metrics(&self) -> Vec<(Field, f64)> {
        let mut found: Vec<(Field, f64)> = Vec::new();
        let entries = self
            .model_index
            .iter()
            .flat_map(|entry| &entry.results)
            .flat_map(|result| &result.metrics);

        for metric in entries {
            let label = [metric.kind.as_deref(), metric.name.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            let Some(field) = metric_field(&label) else { continue };
            if found.iter().any(|(f, _)| *f == field) {
                continue;
            }
            if let Some(value) = metric.value.as_ref().and_then(numeric) {
                found.push((field, value));
            }
        }
        found
    }

    /// Declared dataset ids, whether written as a list or a single string.
    pub fn datasets(&self) -> Vec<String> {
        match &self.datasets {
            Some(Value::String(name)) => vec![name.clone()],
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn metric_field(label: &str) -> Option<Field> {
    if label.contains("accuracy") {
        Some(Field::Accuracy)
    } else if label.contains("sensitivity") || label.contains("recall") {
        Some(Field::Sensitivity)
    } else if label.contains("specificity") {
        Some(Field::Specificity)
    } else if label.contains("auc") || label.contains("roc") {
        Some(Field::Auc)
    } else if label.contains("f1") {
        Some(Field::F1Score)
    } else {
        None
    }
}

fn numeric(value: &Value) -> Option<f64> {
    let (number, percent) = match value {
        Value::Number(n) => (n.as_f64()?, false),
        Value::String(s) => {
            let s = s.trim();
            match s.strip_suffix('%') {
                Some(stripped) => (stripped.trim().parse().ok()?, true),
                None => (s.parse().ok()?, false),
            }
        }
        _ => return None,
    };
    normalize_metric(number, percent)
}
