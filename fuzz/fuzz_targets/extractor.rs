#![no_main]

use libfuzzer_sys::fuzz_target;
use url::Url;

use dermcard::extractor::{cleaner::strip_markup, extract_text, reader::read_page};
use dermcard::render::validate_document;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    // None of these may panic, whatever the input.
    let attributes = extract_text(&text);
    for value in [attributes.accuracy, attributes.sensitivity, attributes.specificity]
        .into_iter()
        .flatten()
    {
        assert!((0.0..=1.0).contains(&value));
    }
    let _ = strip_markup(&text);
    if let Ok(base) = Url::parse("https://example.com/") {
        let _ = read_page(&text, &base);
    }
    let _ = validate_document(&text);
});
