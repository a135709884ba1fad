use encoding_rs::Encoding;
use regex::Regex;
use std::sync::LazyLock;

use crate::fetcher::errors::FetchError;

/// Bytes of the body inspected for `<meta>` charset declarations.
const SNIFF_WINDOW: usize = 4096;

static HEADER_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

/// Pick the body encoding: Content-Type header first, then a `<meta>` tag in
/// the first few KB, then chardetng's guess.
pub fn detect_encoding(content_type: &str, body: &[u8]) -> &'static Encoding {
    if let Some(encoding) = label_from(&HEADER_CHARSET_REGEX, content_type) {
        return encoding;
    }

    let head = String::from_utf8_lossy(&body[..body.len().min(SNIFF_WINDOW)]);
    // Also covers `<meta http-equiv="Content-Type" content="text/html; charset=...">`.
    if let Some(encoding) = label_from(&META_CHARSET_REGEX, &head)
        .or_else(|| label_from(&HEADER_CHARSET_REGEX, &head))
    {
        return encoding;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(&body[..body.len().min(SNIFF_WINDOW)], body.len() <= SNIFF_WINDOW);
    detector.guess(None, true)
}

fn label_from(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}

/// Decode `body` to UTF-8. Legacy encodings decode lossily; a body that claims
/// to be UTF-8 but isn't is rejected.
pub fn decode_to_utf8(body: &[u8], encoding: &'static Encoding) -> Result<String, FetchError> {
    let (decoded, _, had_errors) = encoding.decode(body);
    if had_errors && std::ptr::eq(encoding, encoding_rs::UTF_8) {
        return Err(FetchError::Charset(format!(
            "body is not valid {}",
            encoding.name()
        )));
    }
    Ok(decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_from_content_type() {
        let encoding = detect_encoding("text/html; charset=utf-8", b"<html></html>");
        assert_eq!(encoding, encoding_rs::UTF_8);
    }

    #[test]
    fn charset_from_meta_tag() {
        let body = b"<html><head><meta charset=\"iso-8859-1\"><title>Test</title></head></html>";
        // ISO-8859-1 maps to windows-1252 in encoding_rs since it's a superset
        assert_eq!(detect_encoding("text/html", body), encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn charset_from_meta_http_equiv() {
        let body = b"<html><head><meta http-equiv=\"Content-Type\" content=\"text/html; charset=shift_jis\"></head></html>";
        assert_eq!(detect_encoding("text/html", body), encoding_rs::SHIFT_JIS);
    }

    #[test]
    fn decodes_latin1_bytes() {
        let body = b"Dermatolog\xeda";
        let decoded = decode_to_utf8(body, encoding_rs::WINDOWS_1252).unwrap();
        assert_eq!(decoded, "Dermatología");
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let result = decode_to_utf8(b"caf\xe9 au lait", encoding_rs::UTF_8);
        assert!(matches!(result, Err(FetchError::Charset(_))));
    }
}
