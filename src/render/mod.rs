//! Markdown model-card rendering, validation and export naming.

pub mod export;
pub mod validate;

pub use export::{ExportError, ExportedCard, export_filename, prepare_export};
pub use validate::{DocumentError, REQUIRED_SECTIONS, is_valid_document, validate_document};

use chrono::NaiveDate;
use std::fmt::Write;
use thiserror::Error;
use tracing::{instrument, warn};

use crate::compliance::{ComplianceResult, HTI1_REQUIREMENTS, OCR_REQUIREMENTS};
use crate::extractor::{Field, model::single_line};
use crate::merge::MergedRecord;
use crate::sources::SourceDetails;

/// Tokens that must never reach a rendered document.
pub const LEAK_TOKENS: [&str; 3] = ["undefined", "NaN", "[object Object]"];

/// Issues listed in the compliance section, at most.
const MAX_LISTED_ISSUES: usize = 3;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to format document: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Who the card is for and when it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardIdentity {
    pub model_name: String,
    pub generated_on: NaiveDate,
}

impl CardIdentity {
    pub fn new(model_name: impl Into<String>, generated_on: NaiveDate) -> Self {
        Self {
            model_name: model_name.into(),
            generated_on,
        }
    }
}

/// The text shown in place of a field no source supplied.
pub fn default_text(field: Field) -> &'static str {
    match field {
        Field::Accuracy
        | Field::Sensitivity
        | Field::Specificity
        | Field::Auc
        | Field::F1Score => "Not available",
        Field::Architecture | Field::Framework | Field::DatasetSize => {
            "Not specified in available sources"
        }
        Field::DatasetNames => "Training data information not found in available sources",
        Field::PrimaryUses | Field::OutOfScope => "Not documented in available sources",
        Field::BiasAnalysis => "No bias analysis found in available sources",
        Field::FairnessMetrics => "No fairness metrics reported",
        Field::Limitations => "No limitations documented in available sources",
        Field::Requirements => "No requirements documented in available sources",
    }
}

/// Strip leak tokens from an external string and flatten it to one line.
/// Removal and flattening repeat until the text stops changing, since
/// deleting one token can join the halves of another.
pub fn scrub(text: &str) -> String {
    let mut current = single_line(text);
    loop {
        let stripped = LEAK_TOKENS
            .iter()
            .fold(current.clone(), |acc, token| acc.replace(token, ""));
        let cleaned = single_line(&stripped);
        if cleaned == current {
            return cleaned;
        }
        current = cleaned;
    }
}

fn scrub_or(text: Option<&str>, field: Field) -> String {
    text.map(scrub)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default_text(field).to_string())
}

fn scrub_list(items: &[String], field: Field) -> String {
    let items: Vec<String> = items.iter().map(|i| scrub(i)).filter(|i| !i.is_empty()).collect();
    if items.is_empty() {
        default_text(field).to_string()
    } else {
        items.join("; ")
    }
}

fn metric_label(field: Field) -> &'static str {
    match field {
        Field::Accuracy => "Accuracy",
        Field::Sensitivity => "Sensitivity",
        Field::Specificity => "Specificity",
        Field::Auc => "AUC",
        Field::F1Score => "F1 Score",
        _ => "",
    }
}

fn format_metric(field: Field, value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    Some(match field {
        Field::Auc => format!("{:.3}", value),
        _ => format!("{:.1}%", value * 100.0),
    })
}

/// Fill the model-card template. Pure: the same inputs always give the same
/// text.
#[instrument(skip_all, fields(model = %identity.model_name))]
pub fn render_document(
    record: &MergedRecord,
    compliance: &ComplianceResult,
    identity: &CardIdentity,
) -> Result<String, RenderError> {
    let a = &record.attributes;
    let name = Some(scrub(&identity.model_name))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Unnamed model".to_string());
    let mut doc = String::new();

    writeln!(doc, "# Model Card: {}", name)?;
    writeln!(doc)?;
    writeln!(doc, "## Model Overview")?;
    writeln!(
        doc,
        "This model card documents {} for use in dermatology, assembled from publicly available sources.",
        name
    )?;
    writeln!(doc)?;

    writeln!(doc, "### Model Information")?;
    writeln!(doc, "- **Model Name**: {}", name)?;
    writeln!(doc, "- **Model Type**: Dermatology AI Classification Model")?;
    writeln!(doc, "- **Last Updated**: {}", identity.generated_on.format("%Y-%m-%d"))?;
    writeln!(
        doc,
        "- **Real Data Found**: {}",
        if record.real_data_found { "Yes" } else { "No" }
    )?;
    writeln!(doc, "- **Extraction Provenance**: {}", scrub(&a.extraction_provenance))?;
    writeln!(doc)?;

    writeln!(doc, "### Intended Use")?;
    writeln!(doc, "- **Primary Use Cases**: {}", scrub_list(&a.primary_uses, Field::PrimaryUses))?;
    writeln!(doc, "- **Primary Intended Users**: Healthcare professionals, dermatologists")?;
    writeln!(
        doc,
        "- **Out-of-Scope Use Cases**: {}",
        scrub_list(&a.out_of_scope, Field::OutOfScope)
    )?;
    writeln!(doc)?;

    writeln!(doc, "### Training Data")?;
    writeln!(doc, "- **Datasets**: {}", scrub_list(&a.dataset_names, Field::DatasetNames))?;
    writeln!(doc, "- **Data Size**: {}", scrub_or(a.dataset_size.as_deref(), Field::DatasetSize))?;
    writeln!(doc)?;

    writeln!(doc, "### Model Architecture")?;
    writeln!(
        doc,
        "- **Architecture**: {}",
        scrub_or(a.architecture.as_deref(), Field::Architecture)
    )?;
    writeln!(doc, "- **Framework**: {}", scrub_or(a.framework.as_deref(), Field::Framework))?;
    writeln!(doc, "- **Requirements**: {}", scrub_list(&a.requirements, Field::Requirements))?;
    writeln!(doc)?;

    writeln!(doc, "### Performance Metrics")?;
    for field in Field::METRICS {
        let label = metric_label(field);
        match a.metric(field).and_then(|v| format_metric(field, v)) {
            Some(value) => {
                let source = record
                    .attribution(field)
                    .map(|attr| format!(" (source: {})", attr.kind.label()))
                    .unwrap_or_default();
                writeln!(doc, "- {}: {}{}", label, value, source)?;
            }
            None => writeln!(doc, "- {}: {}", label, default_text(field))?,
        }
    }
    writeln!(doc)?;

    writeln!(doc, "### Ethical Considerations")?;
    writeln!(doc, "- **Bias Analysis**: {}", scrub_list(&a.bias_analysis, Field::BiasAnalysis))?;
    let fairness: Vec<String> = a
        .fairness_metrics
        .iter()
        .filter(|(_, v)| v.is_finite())
        .map(|(name, v)| format!("{} {:.2}", scrub(name), v))
        .collect();
    writeln!(doc, "- **Fairness Metrics**: {}", scrub_list(&fairness, Field::FairnessMetrics))?;
    writeln!(doc, "- **Privacy Considerations**: Patient data privacy and HIPAA compliance")?;
    writeln!(doc)?;

    writeln!(doc, "### Risk Assessment")?;
    writeln!(doc, "- **Known Limitations**: {}", scrub_list(&a.limitations, Field::Limitations))?;
    writeln!(doc, "- Requires clinical expertise for interpretation")?;
    writeln!(doc, "- Not a replacement for professional medical judgment")?;
    writeln!(doc)?;

    writeln!(doc, "### Compliance Assessment")?;
    writeln!(doc, "- **HTI-1**: {}", status(compliance.hti1_compliant))?;
    writeln!(doc, "- **OCR**: {}", status(compliance.ocr_compliant))?;
    writeln!(doc)?;
    writeln!(doc, "**Issues**:")?;
    if compliance.issues.is_empty() {
        writeln!(doc, "- None identified")?;
    }
    for issue in compliance.issues.iter().take(MAX_LISTED_ISSUES) {
        writeln!(doc, "- {}", scrub(issue))?;
    }
    writeln!(doc)?;
    writeln!(doc, "**Recommendations**:")?;
    for recommendation in &compliance.recommendations {
        writeln!(doc, "- {}", scrub(recommendation))?;
    }
    writeln!(doc)?;
    writeln!(doc, "**HTI-1 Requirements**:")?;
    for requirement in HTI1_REQUIREMENTS {
        writeln!(doc, "- {}", requirement)?;
    }
    writeln!(doc)?;
    writeln!(doc, "**OCR Requirements**:")?;
    for requirement in OCR_REQUIREMENTS {
        writeln!(doc, "- {}", requirement)?;
    }
    writeln!(doc)?;

    writeln!(doc, "### Data Sources")?;
    if record.sources.is_empty() {
        writeln!(doc, "- No sources were consulted")?;
    }
    for source in &record.sources {
        let url = source
            .url
            .as_deref()
            .map(scrub)
            .filter(|u| !u.is_empty())
            .map(|u| format!(" <{}>", u))
            .unwrap_or_default();
        let state = match (&source.details, source.is_verified) {
            (_, true) => "verified".to_string(),
            (SourceDetails::Placeholder { reason }, false) => match scrub(reason) {
                reason if reason.is_empty() => "not found".to_string(),
                reason => format!("not found: {}", reason),
            },
            (_, false) => "not verified".to_string(),
        };
        writeln!(doc, "- {}: {}{} ({})", source.kind.label(), scrub(&source.title), url, state)?;
    }
    writeln!(doc)?;

    writeln!(doc, "### Contact Information")?;
    writeln!(
        doc,
        "For questions about this model card, contact the model developers listed under Data Sources."
    )?;
    writeln!(doc)?;
    writeln!(doc, "---")?;
    writeln!(
        doc,
        "*Generated on {} from public sources and checked against the HTI-1 and OCR checklists.*",
        identity.generated_on.format("%Y-%m-%d")
    )?;

    Ok(doc)
}

fn status(compliant: bool) -> &'static str {
    if compliant { "Compliant" } else { "Issues found" }
}

/// Render, or fall back to a short diagnostic when rendering fails. The
/// diagnostic is deliberately not a valid card, so it can never be exported.
pub fn render_or_diagnostic(
    record: &MergedRecord,
    compliance: &ComplianceResult,
    identity: &CardIdentity,
) -> String {
    match render_document(record, compliance, identity) {
        Ok(document) => document,
        Err(error) => {
            warn!(%error, "model card rendering failed");
            format!(
                "Model card generation failed for {}.\n\nReason: {}\n",
                scrub(&identity.model_name),
                scrub(&error.to_string())
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::evaluate;
    use crate::extractor::ExtractedAttributes;
    use crate::merge::merge_sources;
    use crate::sources::{SearchQuery, SourceKind, SourceRecord};

    fn identity(name: &str) -> CardIdentity {
        CardIdentity::new(name, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
    }

    fn performance_section(doc: &str) -> &str {
        let start = doc.find("### Performance Metrics").unwrap();
        let end = doc[start..].find("### Ethical Considerations").unwrap();
        &doc[start..start + end]
    }

    #[test]
    fn scenario_a_no_verified_sources() {
        let query = SearchQuery::new("DermNet-X", None);
        let inputs: Vec<_> = SourceKind::PRIORITY
            .iter()
            .map(|kind| {
                (
                    SourceRecord::placeholder(*kind, &query, "no results"),
                    ExtractedAttributes::default(),
                )
            })
            .collect();
        let merged = merge_sources(&inputs);
        let compliance = evaluate(&merged);
        let doc = render_document(&merged, &compliance, &identity("DermNet-X")).unwrap();

        assert!(!compliance.hti1_compliant);
        assert!(!compliance.ocr_compliant);
        assert_eq!(compliance.issues.len(), 3);
        let performance = performance_section(&doc);
        for label in ["Accuracy", "Sensitivity", "Specificity", "AUC", "F1 Score"] {
            assert!(performance.contains(&format!("- {}: Not available", label)));
        }
        assert!(is_valid_document(&doc));
    }

    #[test]
    fn scenario_b_paper_metrics_are_attributed() {
        let paper = SourceRecord::verified(
            SourceKind::Paper,
            "Deep learning for skin lesions",
            Some("https://doi.org/10.1000/derm.1".into()),
            SourceDetails::Paper {
                authors: vec![],
                venue: None,
                year: Some(2023),
                doi: Some("10.1000/derm.1".into()),
            },
        );
        let attributes = ExtractedAttributes {
            accuracy: Some(0.925),
            sensitivity: Some(0.892),
            ..ExtractedAttributes::default()
        };
        let merged = merge_sources(&[(paper, attributes)]);
        let doc = render_document(&merged, &evaluate(&merged), &identity("DermNet-X")).unwrap();

        assert!(doc.contains("Accuracy: 92.5%"));
        assert!(doc.contains("Sensitivity: 89.2%"));
        assert!(doc.contains("- Accuracy: 92.5% (source: Peer-reviewed paper)"));
        assert!(doc.contains(
            "- Peer-reviewed paper: Deep learning for skin lesions <https://doi.org/10.1000/derm.1> (verified)"
        ));
        assert!(is_valid_document(&doc));
    }

    #[test]
    fn auc_uses_three_decimals() {
        let record = MergedRecord {
            attributes: ExtractedAttributes {
                auc: Some(0.9481),
                ..ExtractedAttributes::default()
            },
            ..MergedRecord::empty(Vec::new())
        };
        let doc = render_document(&record, &evaluate(&record), &identity("X")).unwrap();
        assert!(doc.contains("- AUC: 0.948"));
    }

    #[test]
    fn leak_tokens_are_scrubbed() {
        assert_eq!(scrub("unundefineddefined model"), "model");
        assert_eq!(scrub("line one\nNaN line two"), "line one line two");
        assert_eq!(scrub("[object undefined Object]"), "");
        assert_eq!(scrub("see [object\tNaN\nObject] here"), "see here");

        let record = MergedRecord {
            attributes: ExtractedAttributes {
                architecture: Some("[object Object]".into()),
                primary_uses: vec!["undefined".into(), "Triage NaN support".into()],
                ..ExtractedAttributes::default()
            },
            ..MergedRecord::empty(Vec::new())
        };
        let doc = render_document(&record, &evaluate(&record), &identity("undefined")).unwrap();
        assert!(doc.contains("# Model Card: Unnamed model"));
        assert!(doc.contains("- **Architecture**: Not specified in available sources"));
        assert!(doc.contains("- **Primary Use Cases**: Triage support"));
        assert!(is_valid_document(&doc));
    }

    #[test]
    fn fallback_record_renders_a_valid_document() {
        let record = MergedRecord::empty(Vec::new());
        let doc = render_or_diagnostic(&record, &evaluate(&record), &identity("DermNet-X"));
        assert!(validate_document(&doc).is_ok());
        assert!(doc.contains("- No sources were consulted"));
    }

    #[test]
    fn at_most_three_issues_are_listed() {
        let record = MergedRecord::empty(Vec::new());
        let mut compliance = evaluate(&record);
        compliance.issues.push("Extra issue".into());
        let doc = render_document(&record, &compliance, &identity("X")).unwrap();
        assert!(!doc.contains("Extra issue"));
    }

    #[test]
    fn requirements_render_under_architecture() {
        let empty = MergedRecord::empty(Vec::new());
        let doc = render_document(&empty, &evaluate(&empty), &identity("X")).unwrap();
        assert!(
            doc.contains("- **Requirements**: No requirements documented in available sources")
        );

        let record = MergedRecord {
            attributes: ExtractedAttributes {
                requirements: vec!["Python 3.9+".into(), "torch".into()],
                ..ExtractedAttributes::default()
            },
            ..MergedRecord::empty(Vec::new())
        };
        let doc = render_document(&record, &evaluate(&record), &identity("X")).unwrap();
        assert!(doc.contains("- **Requirements**: Python 3.9+, torch"));
    }

    #[test]
    fn split_leak_tokens_do_not_survive_rendering() {
        let record = MergedRecord {
            attributes: ExtractedAttributes {
                limitations: vec!["[object undefined Object]".into()],
                ..ExtractedAttributes::default()
            },
            ..MergedRecord::empty(Vec::new())
        };
        let doc = render_document(&record, &evaluate(&record), &identity("X")).unwrap();
        assert!(validate_document(&doc).is_ok());
    }

    #[test]
    fn defaults_exist_for_every_field() {
        for field in Field::ALL {
            assert!(!default_text(field).is_empty());
        }
    }

    #[cfg(feature = "fuzz")]
    mod fuzz {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_rendered_documents_always_validate(
                name in "\\PC*",
                limitation in "\\PC*",
                accuracy in proptest::option::of(any::<f64>()),
            ) {
                let mut merged = MergedRecord::empty(Vec::new());
                merged.attributes.accuracy = accuracy;
                merged.attributes.limitations = vec![limitation];
                let compliance = evaluate(&merged);
                let doc = render_or_diagnostic(&merged, &compliance, &identity(&name));
                prop_assert!(is_valid_document(&doc));
            }

            #[test]
            fn test_scrub_removes_tokens_split_by_whitespace(text in leaky_text()) {
                let cleaned = scrub(&text);
                for token in LEAK_TOKENS {
                    prop_assert!(!cleaned.contains(token), "{cleaned:?} from {text:?}");
                }
            }

            #[test]
            fn test_leaky_bullets_still_validate(limitation in leaky_text()) {
                let mut merged = MergedRecord::empty(Vec::new());
                merged.attributes.limitations = vec![limitation];
                let compliance = evaluate(&merged);
                let doc = render_or_diagnostic(&merged, &compliance, &identity("X"));
                prop_assert!(is_valid_document(&doc));
            }
        }

        /// Text assembled from leak-token halves and whitespace.
        fn leaky_text() -> impl Strategy<Value = String> {
            let fragment = prop_oneof![
                Just("[object".to_string()),
                Just("Object]".to_string()),
                Just("undefined".to_string()),
                Just("un".to_string()),
                Just("defined".to_string()),
                Just("Na".to_string()),
                Just("N".to_string()),
                Just(" ".to_string()),
                Just("\n".to_string()),
                Just("\t".to_string()),
                "\\PC{0,3}",
            ];
            proptest::collection::vec(fragment, 0..12).prop_map(|parts| parts.concat())
        }
    }
}
