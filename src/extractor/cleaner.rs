use ammonia::Builder;
use linkify::{LinkFinder, LinkKind};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

use crate::extractor::model::single_line;

static TAG_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[A-Za-z/!]").unwrap());
static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Hosts whose links are worth surfacing as related sources.
const RELATED_HOSTS: [&str; 4] = ["github.com", "huggingface.co", "doi.org", "arxiv.org"];
const MAX_RELATED_LINKS: usize = 10;

/// Plain single-line text from an HTML or JATS fragment. Script and style
/// content is dropped and entities are decoded.
pub fn strip_markup(fragment: &str) -> String {
    // Keep words on either side of a tag apart once the tag is gone.
    let spaced = TAG_START.replace_all(fragment, " $0");
    let escaped = Builder::default()
        .tags(HashSet::new())
        .clean(&spaced)
        .to_string();
    let decoded = Html::parse_fragment(&escaped)
        .root_element()
        .text()
        .collect::<String>();
    single_line(&decoded)
}

/// Absolute links to code, model or paper hosts found on a page, from both
/// anchors and bare URLs in its text. Relative hrefs resolve against `base`.
pub fn related_links(html: &str, text: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let hrefs = document
        .select(&ANCHORS)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href).ok());

    let mut finder = LinkFinder::new();
    finder.kinds(&[LinkKind::Url]);
    let bare = finder
        .links(text)
        .filter_map(|link| Url::parse(link.as_str()).ok());

    let mut seen = HashSet::new();
    hrefs
        .chain(bare)
        .filter(is_related)
        .map(|url| url.to_string())
        .filter(|url| seen.insert(url.clone()))
        .take(MAX_RELATED_LINKS)
        .collect()
}

fn is_related(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
        && url
            .host_str()
            .map(|host| host.trim_start_matches("www."))
            .is_some_and(|host| RELATED_HOSTS.contains(&host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_jats_and_inline_tags() {
        assert_eq!(
            strip_markup("<jats:title>Abstract</jats:title><jats:p>AUC of 0.94 &amp; more</jats:p>"),
            "Abstract AUC of 0.94 & more"
        );
        assert_eq!(
            strip_markup("Deep learning for <i>skin</i> lesions"),
            "Deep learning for skin lesions"
        );
    }

    #[test]
    fn drops_script_content() {
        let text = strip_markup("<p>Hello</p><script>alert('x')</script><style>p{}</style>");
        assert_eq!(text, "Hello");
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(strip_markup("Accuracy 3 < 4"), "Accuracy 3 < 4");
    }

    #[test]
    fn related_links_resolve_and_filter() {
        let html = r#"<a href="https://github.com/acme/dermnet-x">code</a>
            <a href="/about">about</a>
            <a href="https://huggingface.co/acme/dermnet-x">weights</a>
            <a href="https://github.com/acme/dermnet-x">again</a>"#;
        let text = "Paper: https://doi.org/10.1000/derm.1 and https://example.com/blog";
        let base = Url::parse("https://dermnet.example/").unwrap();

        let links = related_links(html, text, &base);
        assert_eq!(
            links,
            vec![
                "https://github.com/acme/dermnet-x",
                "https://huggingface.co/acme/dermnet-x",
                "https://doi.org/10.1000/derm.1",
            ]
        );
    }
}
