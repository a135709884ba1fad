use readability::extractor;
use scraper::{Html, Selector};
use url::Url;

use crate::extractor::model::{PageText, normalize_whitespace, single_line};

/// Candidate containers for the fallback reader, most specific first.
const CONTENT_SELECTORS: [&str; 9] = [
    "article",
    "main",
    "[role='main']",
    ".content",
    ".post",
    ".article",
    "#content",
    "#main",
    ".entry-content",
];

const MIN_CONTENT_CHARS: usize = 100;

/// Readable title and text of a page, via readability with a selector-based
/// fallback. `None` when neither finds any text.
pub fn read_page(html: &str, url: &Url) -> Option<PageText> {
    let document = Html::parse_document(html);
    let site_name = site_name(&document);
    let description = description(&document);

    if let Ok(article) = extractor::extract(&mut html.as_bytes(), url) {
        let text = normalize_whitespace(&article.text);
        if !text.is_empty() {
            let title = Some(single_line(&article.title))
                .filter(|t| !t.is_empty())
                .or_else(|| title(&document))
                .unwrap_or_default();
            return Some(PageText {
                title,
                site_name,
                description,
                text,
            });
        }
    }

    let text = normalize_whitespace(&main_content(&document));
    if text.is_empty() {
        return None;
    }
    Some(PageText {
        title: title(&document).unwrap_or_default(),
        site_name,
        description,
        text,
    })
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(single_line)
        .find(|content| !content.is_empty())
}

fn site_name(document: &Html) -> Option<String> {
    if let Some(name) = meta_content(document, "meta[property='og:site_name']") {
        return Some(name);
    }

    // "Page Title - Site Name" or "Page Title | Site Name"
    let raw = first_text(document, "title")?;
    raw.rfind(" - ")
        .or_else(|| raw.rfind(" | "))
        .map(|pos| raw[pos + 3..].trim().to_string())
        .filter(|name| !name.is_empty())
}

fn description(document: &Html) -> Option<String> {
    meta_content(document, "meta[name='description']")
        .or_else(|| meta_content(document, "meta[property='og:description']"))
}

fn title(document: &Html) -> Option<String> {
    meta_content(document, "meta[property='og:title']")
        .or_else(|| first_text(document, "title"))
        .or_else(|| first_text(document, "h1"))
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .map(|element| single_line(&element.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

fn main_content(document: &Html) -> String {
    for selector in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        if let Some(text) = document
            .select(&selector)
            .map(|element| element.text().collect::<Vec<_>>().join(" "))
            .find(|text| text.trim().len() > MIN_CONTENT_CHARS)
        {
            return text;
        }
    }

    first_text(document, "body").unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_title_description_and_text() {
        let html = format!(
            r#"<!DOCTYPE html><html><head><title>DermNet-X | Acme Health</title>
            <meta name="description" content="A skin lesion classifier.">
            </head><body><article><h1>DermNet-X</h1><p>{}</p></article></body></html>"#,
            "DermNet-X reaches an accuracy of 93% on the ISIC benchmark. ".repeat(10)
        );
        let url = Url::parse("https://dermnet.example/").unwrap();

        let page = read_page(&html, &url).unwrap();
        assert!(page.title.contains("DermNet-X"));
        assert_eq!(page.site_name.as_deref(), Some("Acme Health"));
        assert_eq!(page.description.as_deref(), Some("A skin lesion classifier."));
        assert!(page.text.contains("accuracy of 93%"));
    }

    #[test]
    fn malformed_html_is_tolerated() {
        let html = "<html><head><title>Broken</title><body><p>Unclosed tags<div>More content";
        let url = Url::parse("https://example.com/broken").unwrap();
        if let Some(page) = read_page(html, &url) {
            assert_eq!(page.title, "Broken");
        }
    }
}
