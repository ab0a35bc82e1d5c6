//! Plain-text decoding.

use super::Extraction;
use tracing::warn;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Decodes text bytes. Undecodable sequences are replaced, never rejected.
pub fn decode_text(data: &[u8]) -> Extraction {
    if let Some(rest) = data.strip_prefix(UTF16_LE_BOM) {
        return Extraction::Text(decode_utf16(rest, u16::from_le_bytes));
    }
    if let Some(rest) = data.strip_prefix(UTF16_BE_BOM) {
        return Extraction::Text(decode_utf16(rest, u16::from_be_bytes));
    }

    let body = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    match std::str::from_utf8(body) {
        Ok(s) => Extraction::Text(s.to_string()),
        Err(e) => {
            warn!(error = %e, "Input is not valid UTF-8; decoding lossily.");
            Extraction::Text(String::from_utf8_lossy(body).into_owned())
        }
    }
}

fn decode_utf16(data: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    let units = data.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
