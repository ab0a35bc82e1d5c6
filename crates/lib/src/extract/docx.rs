//! DOCX paragraph extraction.
//!
//! A `.docx` file is a zip archive; the body lives in `word/document.xml`.
//! Each `w:p` element becomes one line of output.

use super::Extraction;

/// Extracts paragraph text from a DOCX archive, one paragraph per line.
#[cfg(feature = "docx")]
pub fn extract_docx(data: &[u8]) -> Extraction {
    match docx_paragraphs(data) {
        Ok(paragraphs) => Extraction::Text(paragraphs.join("\n")),
        Err(e) => Extraction::Fallback(format!("[DOCX parse error: {e}]")),
    }
}

#[cfg(not(feature = "docx"))]
pub fn extract_docx(_data: &[u8]) -> Extraction {
    Extraction::Fallback("[DOCX parse error: DOCX support is not compiled in]".to_string())
}

#[cfg(feature = "docx")]
fn docx_paragraphs(data: &[u8]) -> Result<Vec<String>, String> {
    use quick_xml::events::Event;
    use quick_xml::Reader;
    use std::io::{Cursor, Read};

    let mut archive = zip::ZipArchive::new(Cursor::new(data)).map_err(|e| e.to_string())?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| e.to_string())?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;

    let mut reader = Reader::from_str(&xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => current = Some(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                b"w:tab" => {
                    if let Some(p) = current.as_mut() {
                        p.push('\t');
                    }
                }
                b"w:br" => {
                    if let Some(p) = current.as_mut() {
                        p.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e.unescape().map_err(|e| e.to_string())?;
                if let Some(p) = current.as_mut() {
                    p.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(p) = current.take() {
                        paragraphs.push(p);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML error at position {}: {e}", reader.buffer_position())),
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}
