//! Heuristic field extraction from fetched source content.

pub mod cleaner;
pub mod front_matter;
pub mod metrics;
pub mod model;
pub mod reader;
pub mod sections;
pub mod vocabulary;

#[cfg(test)]
mod tests;

pub use model::{ExtractedAttributes, Field, PageText};

use tracing::{debug, instrument};

use crate::sources::{SourceDetails, SourceKind, SourceRecord};

/// Mine one source record for attributes.
///
/// Unverified records and records without content yield an empty bag that
/// still names its source; extraction itself never fails.
#[instrument(skip_all, fields(kind = %record.kind, title = %record.title))]
pub fn extract(record: &SourceRecord) -> ExtractedAttributes {
    let provenance = format!("{}: {}", record.kind.label(), record.title);
    let content = match record.raw_content.as_deref() {
        Some(content) if record.is_verified => content,
        _ => return ExtractedAttributes::empty(provenance),
    };

    let mut attributes = match record.kind {
        SourceKind::ModelHub => extract_model_card(content, &record.details),
        _ => extract_text(content),
    };
    attributes.extraction_provenance = provenance;

    debug!(
        fields = Field::ALL.iter().filter(|f| attributes.has(**f)).count(),
        "extraction finished"
    );
    attributes
}

/// Attributes from free text or markdown.
pub fn extract_text(text: &str) -> ExtractedAttributes {
    let mut attributes = ExtractedAttributes::default();
    metrics::scan_metrics(text, &mut attributes);
    attributes.architecture = vocabulary::architecture(text);
    attributes.framework = vocabulary::framework(text);
    attributes.dataset_names = vocabulary::dataset_names(text);
    attributes.dataset_size = vocabulary::dataset_size(text);
    attributes.fairness_metrics = metrics::scan_fairness(text);

    let sections = sections::scan_sections(text);
    attributes.primary_uses = sections.primary_uses;
    attributes.out_of_scope = sections.out_of_scope;
    attributes.bias_analysis = sections.bias_analysis;
    attributes.limitations = sections.limitations;
    attributes.requirements = sections.requirements;
    attributes
}

/// A hub model card: front-matter metrics first, then the body text, with the
/// header's library, datasets and the hub tags folded into the keyword scan.
fn extract_model_card(card: &str, details: &SourceDetails) -> ExtractedAttributes {
    let (metadata, body) = front_matter::split(card);
    let mut attributes = ExtractedAttributes::default();

    let mut keywords: Vec<String> = Vec::new();
    if let Some(metadata) = &metadata {
        for (field, value) in metadata.metrics() {
            if let Some(slot) = attributes.metric_mut(field) {
                *slot = Some(value);
            }
        }
        keywords.extend(metadata.library_name.iter().cloned());
        keywords.extend(metadata.datasets());
        keywords.extend(metadata.tags.iter().cloned());
    }
    if let SourceDetails::ModelHub { tags, .. } = details {
        keywords.extend(tags.iter().cloned());
    }

    let from_body = extract_text(body);
    let keyword_text = format!("{}\n{}", keywords.join(" "), body);

    metrics::scan_metrics(body, &mut attributes);
    attributes.architecture = vocabulary::architecture(&keyword_text);
    attributes.framework = vocabulary::framework(&keyword_text);
    attributes.dataset_names = vocabulary::dataset_names(&keyword_text);
    attributes.dataset_size = from_body.dataset_size;
    attributes.fairness_metrics = from_body.fairness_metrics;
    attributes.primary_uses = from_body.primary_uses;
    attributes.out_of_scope = from_body.out_of_scope;
    attributes.bias_analysis = from_body.bias_analysis;
    attributes.limitations = from_body.limitations;
    attributes.requirements = from_body.requirements;
    attributes
}
