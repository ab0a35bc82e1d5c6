//! HTML text extraction.

use super::Extraction;

/// Returns the visible text of an HTML document, one text node per line.
#[cfg(feature = "html")]
pub fn extract_html(data: &[u8]) -> Extraction {
    let source = String::from_utf8_lossy(data);
    let document = scraper::Html::parse_document(&source);
    let text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join("\n");
    Extraction::Text(text)
}

/// Tag-stripping fallback when no HTML parser is compiled in.
#[cfg(not(feature = "html"))]
pub fn extract_html(data: &[u8]) -> Extraction {
    use regex::Regex;
    use std::sync::LazyLock;

    static TAG: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid regex"));

    let source = String::from_utf8_lossy(data);
    Extraction::Text(TAG.replace_all(&source, "\n").into_owned())
}
