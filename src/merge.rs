//! Combine per-source attribute bags into one record under a fixed source
//! priority.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::extractor::{ExtractedAttributes, Field};
use crate::sources::{SourceKind, SourceRecord, SourceSummary};

/// Which source supplied a merged field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribution {
    pub kind: SourceKind,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedRecord {
    pub attributes: ExtractedAttributes,
    pub provenance: BTreeMap<Field, Attribution>,
    /// Every source consulted, placeholders included.
    pub sources: Vec<SourceSummary>,
    pub real_data_found: bool,
}

impl MergedRecord {
    /// The fully-null record: nothing known, no real data.
    pub fn empty(sources: Vec<SourceSummary>) -> Self {
        Self {
            attributes: ExtractedAttributes::empty("No verified sources"),
            provenance: BTreeMap::new(),
            sources,
            real_data_found: false,
        }
    }

    pub fn attribution(&self, field: Field) -> Option<&Attribution> {
        self.provenance.get(&field)
    }
}

/// Merge extracted attributes, each paired with the record it came from.
///
/// Unverified records are dropped first; they never contribute a value. The
/// rest are ordered by source priority, then by rank within a source, with
/// title and URL breaking ties, and each field takes the first value present. The result does not depend on the
/// order of `inputs`.
#[instrument(skip_all, fields(inputs = inputs.len()))]
pub fn merge_sources(inputs: &[(SourceRecord, ExtractedAttributes)]) -> MergedRecord {
    let sources = inputs.iter().map(|(record, _)| record.summary()).collect();

    let mut verified: Vec<&(SourceRecord, ExtractedAttributes)> =
        inputs.iter().filter(|(record, _)| record.is_verified).collect();
    if verified.is_empty() {
        debug!("no verified sources to merge");
        return MergedRecord::empty(sources);
    }
    verified.sort_by(|(a, _), (b, _)| {
        (a.kind, a.rank, &a.title, &a.url).cmp(&(b.kind, b.rank, &b.title, &b.url))
    });

    let mut attributes = ExtractedAttributes::default();
    let mut provenance = BTreeMap::new();
    for field in Field::ALL {
        if let Some((record, bag)) = verified.iter().find(|(_, bag)| bag.has(field)) {
            attributes.take_field(field, bag);
            provenance.insert(
                field,
                Attribution {
                    kind: record.kind,
                    title: record.title.clone(),
                },
            );
        }
    }

    let mut contributors: Vec<String> = Vec::new();
    for attribution in provenance.values() {
        let line = format!("{}: {}", attribution.kind.label(), attribution.title);
        if !contributors.contains(&line) {
            contributors.push(line);
        }
    }
    attributes.extraction_provenance = if contributors.is_empty() {
        "Verified sources contained no extractable fields".to_string()
    } else {
        contributors.join("; ")
    };

    debug!(fields = provenance.len(), "merge finished");
    MergedRecord {
        attributes,
        provenance,
        sources,
        real_data_found: true,
    }
}
