use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::extractor::model::{ExtractedAttributes, Field};

/// Glue allowed between a label and its number: punctuation, markdown
/// emphasis or table pipes, and a few linking words.
const GLUE: &str = r"(?:[\s:=*|_(]|\bof\b|\bis\b|\bwas\b|\bscore\b)*";
const NUMBER: &str = r"(\d+(?:\.\d+)?)\s*(%)?";

fn label_regex(labels: &[&str]) -> Regex {
    let alternation = labels
        .iter()
        .map(|label| regex::escape(label))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b{}{}", alternation, GLUE, NUMBER)).unwrap()
}

// Longer labels come first so the alternation prefers them.
static ACCURACY: LazyLock<Regex> = LazyLock::new(|| label_regex(&["accuracy"]));
static SENSITIVITY: LazyLock<Regex> =
    LazyLock::new(|| label_regex(&["true positive rate", "sensitivity", "recall"]));
static SPECIFICITY: LazyLock<Regex> =
    LazyLock::new(|| label_regex(&["true negative rate", "specificity"]));
static AUC: LazyLock<Regex> =
    LazyLock::new(|| label_regex(&["area under the curve", "roc-auc", "auroc", "auc"]));
static F1: LazyLock<Regex> = LazyLock::new(|| label_regex(&["f1-score", "f1 score", "f1"]));

pub const FAIRNESS_LABELS: [&str; 3] = [
    "demographic parity",
    "equalized odds",
    "equal opportunity",
];

static FAIRNESS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    FAIRNESS_LABELS
        .iter()
        .map(|label| (*label, label_regex(&[*label])))
        .collect()
});

/// Bring a matched number into `[0, 1]`.
///
/// A trailing `%` or a magnitude above 1 means the number is a percentage.
/// Anything still out of range afterwards is noise and is dropped.
pub fn normalize_metric(value: f64, percent: bool) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let value = if percent || value > 1.0 { value / 100.0 } else { value };
    (0.0..=1.0).contains(&value).then_some(value)
}

fn metric_regex(field: Field) -> Option<&'static Regex> {
    match field {
        Field::Accuracy => Some(&*ACCURACY),
        Field::Sensitivity => Some(&*SENSITIVITY),
        Field::Specificity => Some(&*SPECIFICITY),
        Field::Auc => Some(&*AUC),
        Field::F1Score => Some(&*F1),
        _ => None,
    }
}

fn first_value(regex: &Regex, text: &str) -> Option<f64> {
    let caps = regex.captures(text)?;
    let value = caps.get(1)?.as_str().parse::<f64>().ok()?;
    normalize_metric(value, caps.get(2).is_some())
}

/// First labelled value for a metric field, normalized.
pub fn find_metric(field: Field, text: &str) -> Option<f64> {
    first_value(metric_regex(field)?, text)
}

/// Fill every metric field that is still empty from `text`.
pub fn scan_metrics(text: &str, attributes: &mut ExtractedAttributes) {
    for field in Field::METRICS {
        if let Some(slot) = attributes.metric_mut(field)
            && slot.is_none()
        {
            *slot = find_metric(field, text);
        }
    }
}

pub fn scan_fairness(text: &str) -> BTreeMap<String, f64> {
    FAIRNESS
        .iter()
        .filter_map(|(label, regex)| first_value(regex, text).map(|v| (label.to_string(), v)))
        .collect()
}
