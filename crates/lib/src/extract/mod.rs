//! # Text Extraction
//!
//! Converts uploaded bytes into Unicode text. Every format extractor reports an
//! explicit [`Extraction`]: either the document text or a bracketed diagnostic
//! that stands in for it. Nothing here returns an error, so one unreadable file
//! never aborts a pipeline.

pub mod docx;
pub mod html;
pub mod pdf;
pub mod text;

use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// The outcome of running a format extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Text recovered from the document.
    Text(String),
    /// A diagnostic placeholder used in place of the document text.
    Fallback(String),
}

impl Extraction {
    pub fn into_text(self) -> String {
        match self {
            Extraction::Text(t) | Extraction::Fallback(t) => t,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Extraction::Fallback(_))
    }
}

/// The extractor chosen for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Pdf,
    Docx,
    Html,
    Unsupported,
}

impl DocumentFormat {
    /// Picks the extractor from the MIME hint and filename (both may be empty).
    pub fn detect(mime: &str, filename: &str) -> Self {
        let name = filename.to_lowercase();
        let mime = mime.to_lowercase();
        let has_ext = |exts: &[&str]| exts.iter().any(|e| name.ends_with(e));

        if has_ext(&[".txt", ".md", ".csv", ".log"]) {
            DocumentFormat::PlainText
        } else if has_ext(&[".html", ".htm"]) || mime == "text/html" {
            DocumentFormat::Html
        } else if mime.starts_with("text/") {
            DocumentFormat::PlainText
        } else if has_ext(&[".pdf"]) || mime == "application/pdf" {
            DocumentFormat::Pdf
        } else if has_ext(&[".docx"]) || mime.contains("wordprocessingml.document") {
            DocumentFormat::Docx
        } else {
            DocumentFormat::Unsupported
        }
    }
}

/// Runs the matching extractor over `data`.
pub fn extract(data: &[u8], mime: &str, filename: &str) -> Extraction {
    let format = DocumentFormat::detect(mime, filename);
    info!(?format, bytes = data.len(), filename, "Extracting document text.");

    let extraction = match format {
        DocumentFormat::PlainText => text::decode_text(data),
        DocumentFormat::Pdf => pdf::extract_pdf(data),
        DocumentFormat::Docx => docx::extract_docx(data),
        DocumentFormat::Html => html::extract_html(data),
        DocumentFormat::Unsupported => {
            Extraction::Fallback(format!("[Unsupported binary file: {} bytes]", data.len()))
        }
    };

    if let Extraction::Fallback(reason) = &extraction {
        warn!(?format, %reason, "Extraction degraded to a placeholder.");
    }
    extraction
}

/// Best-effort conversion of raw bytes to text. Never fails.
pub fn extract_text_from_bytes(data: &[u8], mime: &str, filename: &str) -> String {
    extract(data, mime, filename).into_text()
}

/// Guesses a MIME type from a filename's extension.
pub fn guess_mime(filename: &str) -> &'static str {
    match extension_of(filename).as_str() {
        ".txt" | ".log" => "text/plain",
        ".md" => "text/markdown",
        ".csv" => "text/csv",
        ".html" | ".htm" => "text/html",
        ".json" => "application/json",
        ".pdf" => "application/pdf",
        ".doc" => "application/msword",
        ".docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Lowercased extension including the leading dot, or an empty string.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Upload classification used for stored materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Pdf,
    Text,
    Docx,
    Doc,
    File,
}

impl MaterialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialKind::Pdf => "pdf",
            MaterialKind::Text => "text",
            MaterialKind::Docx => "docx",
            MaterialKind::Doc => "doc",
            MaterialKind::File => "file",
        }
    }
}

/// The result of classifying an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedKind {
    pub kind: MaterialKind,
    pub mime: String,
    pub ext: String,
}

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Classifies an upload by extension and declared content type.
///
/// The MIME falls back to a guess from the extension when no content type is given.
pub fn detect_kind(filename: &str, content_type: Option<&str>) -> DetectedKind {
    let ext = extension_of(filename);
    let mime = content_type
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| guess_mime(filename).to_string());

    let kind = if ext == ".pdf" || mime == "application/pdf" {
        MaterialKind::Pdf
    } else if ext == ".txt" || (mime.starts_with("text/") && (ext.is_empty() || ext == ".txt")) {
        MaterialKind::Text
    } else if ext == ".docx" || mime == DOCX_MIME {
        MaterialKind::Docx
    } else if ext == ".doc" || mime == "application/msword" {
        MaterialKind::Doc
    } else {
        MaterialKind::File
    };

    DetectedKind { kind, mime, ext }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_returned_exactly() {
        assert_eq!(
            extract_text_from_bytes(b"hello world", "text/plain", "x.txt"),
            "hello world"
        );
    }

    #[test]
    fn test_unsupported_binary_placeholder_names_byte_count() {
        let out = extract(&[0u8, 1, 2, 3], "application/octet-stream", "blob.bin");
        assert_eq!(out, Extraction::Fallback("[Unsupported binary file: 4 bytes]".into()));
    }

    #[test]
    fn test_format_detection_order() {
        assert_eq!(DocumentFormat::detect("", "notes.MD"), DocumentFormat::PlainText);
        assert_eq!(DocumentFormat::detect("text/csv", ""), DocumentFormat::PlainText);
        assert_eq!(DocumentFormat::detect("text/html", "page"), DocumentFormat::Html);
        assert_eq!(DocumentFormat::detect("", "index.htm"), DocumentFormat::Html);
        assert_eq!(DocumentFormat::detect("application/pdf", ""), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::detect("", "a.docx"), DocumentFormat::Docx);
        assert_eq!(DocumentFormat::detect(DOCX_MIME, "upload"), DocumentFormat::Docx);
        assert_eq!(DocumentFormat::detect("", "a.doc"), DocumentFormat::Unsupported);
    }

    #[test]
    fn test_broken_pdf_yields_diagnostic() {
        let out = extract(b"definitely not a pdf", "application/pdf", "x.pdf");
        assert!(out.is_fallback());
        assert!(out.into_text().starts_with("[PDF parse error: "));
    }

    #[test]
    fn test_broken_docx_yields_diagnostic() {
        let out = extract(b"not a zip archive", "", "x.docx");
        assert!(out.is_fallback());
        assert!(out.into_text().starts_with("[DOCX parse error: "));
    }

    #[test]
    fn test_detect_kind_for_uploads() {
        let pdf = detect_kind("Report.PDF", None);
        assert_eq!(pdf.kind, MaterialKind::Pdf);
        assert_eq!(pdf.mime, "application/pdf");
        assert_eq!(pdf.ext, ".pdf");

        let text = detect_kind("notes", Some("text/plain"));
        assert_eq!(text.kind, MaterialKind::Text);

        let doc = detect_kind("legacy.doc", Some(""));
        assert_eq!(doc.kind, MaterialKind::Doc);
        assert_eq!(doc.mime, "application/msword");

        let other = detect_kind("image.png", Some("image/png"));
        assert_eq!(other.kind, MaterialKind::File);
    }
}
