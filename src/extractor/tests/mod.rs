use std::fs;
use url::Url;

use crate::extractor::{Field, cleaner, extract, extract_text, reader};
use crate::sources::{SearchQuery, SourceDetails, SourceKind, SourceRecord};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{}", name))
        .expect("Failed to read test fixture")
}

fn record(kind: SourceKind, content: String, details: SourceDetails) -> SourceRecord {
    SourceRecord::verified(kind, "DermNet-X", None, details).with_content(content)
}

#[test]
fn test_extract_repository_readme() {
    let readme = record(
        SourceKind::Repository,
        fixture("readme.md"),
        SourceDetails::Repository {
            full_name: "acme/dermnet-x".into(),
            description: None,
            stars: 42,
            language: Some("Python".into()),
        },
    );

    let attributes = extract(&readme);

    assert_eq!(attributes.accuracy, Some(0.91));
    assert_eq!(attributes.sensitivity, Some(0.875));
    assert_eq!(attributes.specificity, Some(0.905));
    assert_eq!(attributes.auc, Some(0.948));
    assert_eq!(attributes.f1_score, None);
    assert_eq!(attributes.architecture.as_deref(), Some("EfficientNet"));
    assert_eq!(attributes.framework.as_deref(), Some("PyTorch"));
    assert_eq!(
        attributes.dataset_names,
        vec!["ISIC", "DermNet", "HAM10000", "Fitzpatrick"]
    );
    assert_eq!(attributes.dataset_size.as_deref(), Some("35,126 images"));
    assert_eq!(attributes.primary_uses.len(), 2);
    assert_eq!(
        attributes.out_of_scope,
        vec![
            "Diagnosis without a clinician in the loop",
            "Images from phone cameras without dermoscopy"
        ]
    );
    assert_eq!(attributes.bias_analysis.len(), 2);
    assert_eq!(attributes.limitations, vec!["Not validated on pediatric patients"]);
    assert_eq!(attributes.fairness_metrics.get("demographic parity"), Some(&0.91));
    assert_eq!(attributes.extraction_provenance, "Code repository: DermNet-X");
    assert_eq!(
        attributes.requirements,
        vec!["Python 3.9+", "PyTorch 2.0", "torch", "timm"]
    );
}

#[test]
fn test_extract_model_card_prefers_front_matter() {
    let card = record(
        SourceKind::ModelHub,
        fixture("model_card.md"),
        SourceDetails::ModelHub {
            model_id: "acme/dermnet-x".into(),
            tags: vec!["dataset:isic".into()],
            downloads: 10,
            likes: 1,
            pipeline_tag: Some("image-classification".into()),
        },
    );

    let attributes = extract(&card);

    assert_eq!(attributes.accuracy, Some(0.875));
    assert_eq!(attributes.f1_score, Some(0.815));
    assert_eq!(attributes.architecture.as_deref(), Some("ResNet"));
    assert_eq!(attributes.framework.as_deref(), Some("PyTorch"));
    assert_eq!(attributes.dataset_names, vec!["ISIC", "DermNet", "HAM10000"]);
    assert_eq!(
        attributes.primary_uses,
        vec!["Second-opinion tool for trained clinicians"]
    );
    assert_eq!(
        attributes.bias_analysis,
        vec!["Performance drops on darker skin tones"]
    );
    assert!(attributes.limitations.is_empty());
    assert!(attributes.out_of_scope.is_empty());
}

#[test]
fn test_extract_webpage_text() {
    let html = fixture("page.html");
    let url = Url::parse("https://dermnet.example/").unwrap();

    let page = reader::read_page(&html, &url).unwrap();
    assert!(page.title.contains("DermNet-X"));
    assert_eq!(
        page.description.as_deref(),
        Some("Clinical-grade skin lesion classification.")
    );
    assert!(!page.text.contains("window.analytics"));

    let attributes = extract_text(&page.text);
    assert_eq!(attributes.sensitivity, Some(0.94));
    assert_eq!(attributes.specificity, Some(0.88));
    assert_eq!(attributes.architecture.as_deref(), Some("MobileNet"));
    assert_eq!(attributes.framework.as_deref(), Some("TensorFlow"));
    assert!(attributes.dataset_names.contains(&"ISIC".to_string()));
    assert_eq!(attributes.accuracy, None);

    let links = cleaner::related_links(&html, &page.text, &url);
    assert!(links.contains(&"https://github.com/acme/dermnet-x".to_string()));
    assert!(links.contains(&"https://doi.org/10.1000/derm.42".to_string()));
}

#[test]
fn test_placeholder_never_feeds_extraction() {
    let query = SearchQuery::new("DermNet-X", None);
    let mut placeholder = SourceRecord::placeholder(SourceKind::Paper, &query, "timed out");
    // Even if content sneaks onto an unverified record it is ignored.
    placeholder.raw_content = Some("Accuracy: 99%".into());

    let attributes = extract(&placeholder);
    assert!(attributes.is_empty());
    assert_eq!(attributes.extraction_provenance, "Peer-reviewed paper: DermNet-X");
}

#[test]
fn test_empty_content_yields_empty_bag() {
    let empty = SourceRecord::verified(
        SourceKind::Webpage,
        "https://dermnet.example",
        None,
        SourceDetails::Webpage {
            description: None,
            related_links: Vec::new(),
        },
    );
    let attributes = extract(&empty);
    assert!(attributes.is_empty());
    assert!(!attributes.has(Field::Accuracy));
}

#[test]
fn test_malformed_text_does_not_fail() {
    let attributes = extract_text("Accuracy: .%%% ## \u{0}\u{fffd} AUC: 1e9 | | recall: 100000");
    assert_eq!(attributes.accuracy, None);
    assert_eq!(attributes.sensitivity, None);
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use crate::extractor::metrics::normalize_metric;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extract_text_never_panics(text in ".*") {
            let _ = extract_text(&text);
        }

        #[test]
        fn test_extracted_metrics_stay_in_unit_interval(
            label in "(accuracy|sensitivity|recall|specificity|auc|f1)",
            value in 0.0f64..100000.0,
            percent in any::<bool>(),
        ) {
            let text = format!("{}: {}{}", label, value, if percent { "%" } else { "" });
            let attributes = extract_text(&text);
            for field in Field::METRICS {
                if let Some(v) = attributes.metric(field) {
                    prop_assert!((0.0..=1.0).contains(&v));
                }
            }
        }

        #[test]
        fn test_normalize_metric_law(value in any::<f64>(), percent in any::<bool>()) {
            if let Some(v) = normalize_metric(value, percent) {
                prop_assert!((0.0..=1.0).contains(&v));
            }
        }
    }
}
