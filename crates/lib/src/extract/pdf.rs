//! PDF text extraction.

use super::Extraction;

/// Extracts the text of every page, pages separated by a blank line.
#[cfg(feature = "pdf")]
pub fn extract_pdf(data: &[u8]) -> Extraction {
    match pdf_pages(data, u32::MAX, false) {
        Ok((_, pages)) => Extraction::Text(pages.join("\n\n").trim().to_string()),
        Err(e) => Extraction::Fallback(format!("[PDF parse error: {e}]")),
    }
}

#[cfg(not(feature = "pdf"))]
pub fn extract_pdf(_data: &[u8]) -> Extraction {
    Extraction::Fallback("[PDF parse error: PDF support is not compiled in]".to_string())
}

/// Page count plus the text of the leading pages of a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfOverview {
    pub pages: usize,
    pub text: String,
}

/// Reads the page tree and the text of the first `max_pages` pages.
///
/// Pages whose content cannot be decoded are skipped. Returns `None` when
/// the document itself does not parse.
#[cfg(feature = "pdf")]
pub fn pdf_overview(data: &[u8], max_pages: u32) -> Option<PdfOverview> {
    match pdf_pages(data, max_pages, true) {
        Ok((pages, texts)) => Some(PdfOverview {
            pages: pages as usize,
            text: texts.concat(),
        }),
        Err(e) => {
            tracing::debug!("PDF overview unavailable: {e}");
            None
        }
    }
}

#[cfg(not(feature = "pdf"))]
pub fn pdf_overview(_data: &[u8], _max_pages: u32) -> Option<PdfOverview> {
    None
}

/// Returns the total page count and the text of up to `max_pages` pages.
#[cfg(feature = "pdf")]
fn pdf_pages(data: &[u8], max_pages: u32, skip_broken: bool) -> Result<(u32, Vec<String>), String> {
    use pdf::content::{Op, TextDrawAdjusted};
    use pdf::file::FileOptions;
    use tracing::debug;

    let file = FileOptions::cached().load(data).map_err(|e| e.to_string())?;
    let resolver = file.resolver();
    let total = file.num_pages();

    let page_text = |page_num: u32| -> Result<String, String> {
        let page = file.get_page(page_num).map_err(|e| e.to_string())?;
        let mut text = String::new();
        let Some(content) = &page.contents else {
            debug!("Page {} has no content stream.", page_num);
            return Ok(text);
        };
        let operations = content.operations(&resolver).map_err(|e| e.to_string())?;
        for op in operations.iter() {
            match op {
                Op::TextDraw { text: t } => text.push_str(&t.to_string_lossy()),
                Op::TextDrawAdjusted { array } => {
                    for item in array.iter() {
                        if let TextDrawAdjusted::Text(t) = item {
                            text.push_str(&t.to_string_lossy());
                        }
                    }
                }
                Op::TextNewline | Op::EndText => text.push('\n'),
                _ => {}
            }
        }
        Ok(text)
    };

    let mut pages = Vec::with_capacity(total.min(max_pages) as usize);
    for page_num in 0..total.min(max_pages) {
        match page_text(page_num) {
            Ok(text) => pages.push(text),
            Err(e) if skip_broken => debug!("Skipping page {page_num}: {e}"),
            Err(e) => return Err(e),
        }
    }
    Ok((total, pages))
}
