//! Closed keyword vocabularies. A keyword matches at a word start, so
//! `ResNet-50` and `resnet50` both count as `resnet`.

use regex::Regex;
use std::sync::LazyLock;

type Vocabulary = Vec<(Regex, &'static str)>;

fn vocabulary(entries: &[(&str, &'static str)]) -> Vocabulary {
    entries
        .iter()
        .map(|(keyword, display)| {
            let regex = Regex::new(&format!(r"(?i)\b{}", regex::escape(keyword))).unwrap();
            (regex, *display)
        })
        .collect()
}

static ARCHITECTURES: LazyLock<Vocabulary> = LazyLock::new(|| {
    vocabulary(&[
        ("resnet", "ResNet"),
        ("vgg", "VGG"),
        ("densenet", "DenseNet"),
        ("efficientnet", "EfficientNet"),
        ("mobilenet", "MobileNet"),
        ("inception", "Inception"),
    ])
});

static FRAMEWORKS: LazyLock<Vocabulary> = LazyLock::new(|| {
    vocabulary(&[
        ("pytorch", "PyTorch"),
        ("tensorflow", "TensorFlow"),
        ("keras", "Keras"),
        ("scikit-learn", "scikit-learn"),
    ])
});

static DATASETS: LazyLock<Vocabulary> = LazyLock::new(|| {
    vocabulary(&[
        ("isic", "ISIC"),
        ("dermnet", "DermNet"),
        ("ham10000", "HAM10000"),
        ("asan", "Asan"),
        ("fitzpatrick", "Fitzpatrick"),
    ])
});

static DATASET_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:dataset|training)\b[^.\n]{0,80}?\b(\d{1,3}(?:,\d{3})+|\d+)\s+(images|samples|patients)\b",
    )
    .unwrap()
});

fn first_match(vocabulary: &Vocabulary, text: &str) -> Option<String> {
    vocabulary
        .iter()
        .find(|(regex, _)| regex.is_match(text))
        .map(|(_, display)| display.to_string())
}

pub fn architecture(text: &str) -> Option<String> {
    first_match(&ARCHITECTURES, text)
}

pub fn framework(text: &str) -> Option<String> {
    first_match(&FRAMEWORKS, text)
}

/// Every vocabulary dataset present in `text`, in vocabulary order.
pub fn dataset_names(text: &str) -> Vec<String> {
    DATASETS
        .iter()
        .filter(|(regex, _)| regex.is_match(text))
        .map(|(_, display)| display.to_string())
        .collect()
}

/// "N images|samples|patients" near a mention of the dataset or training.
pub fn dataset_size(text: &str) -> Option<String> {
    let caps = DATASET_SIZE.captures(text)?;
    Some(format!("{} {}", &caps[1], caps[2].to_lowercase()))
}
