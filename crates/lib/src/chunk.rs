//! # Document Chunking
//!
//! Splits document text into bounded windows for submission to a model with a
//! limited input budget. Windows prefer to end at a line break, then at a
//! sentence period, and fall back to a hard cut at the window edge.
//!
//! All lengths are measured in Unicode scalar values, not bytes.

/// A lazy, single-pass iterator over the chunks of a text.
///
/// Each yielded chunk is a trimmed, non-empty slice of the input, except for the
/// degenerate case where the input has no non-whitespace content at all: the
/// iterator then yields exactly one empty string.
#[derive(Debug)]
pub struct Chunks<'a> {
    text: &'a str,
    chars: Vec<char>,
    /// Byte offset of every char, with `text.len()` appended as a sentinel.
    offsets: Vec<usize>,
    pos: usize,
    max_chars: usize,
    emitted: bool,
}

impl<'a> Chunks<'a> {
    pub fn new(text: &'a str, max_chars: usize) -> Self {
        let (offsets, chars): (Vec<usize>, Vec<char>) = text.char_indices().unzip();
        let mut offsets = offsets;
        offsets.push(text.len());
        Self {
            text,
            chars,
            offsets,
            pos: 0,
            max_chars: max_chars.max(1),
            emitted: false,
        }
    }

    /// Finds the cut point for the window `[pos, end)`.
    fn boundary(&self, end: usize) -> usize {
        let window = &self.chars[self.pos..end];
        let found = window
            .iter()
            .rposition(|c| *c == '\n')
            .or_else(|| window.iter().rposition(|c| *c == '.'))
            .map(|idx| self.pos + idx);

        match found {
            // A boundary at the window start would produce an empty segment.
            Some(k) if k > self.pos => k,
            _ => end,
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.chars.len();
        while self.pos < n {
            let end = n.min(self.pos + self.max_chars);
            let cut = self.boundary(end);
            let segment = self.text[self.offsets[self.pos]..self.offsets[cut]].trim();
            self.pos = cut;
            if !segment.is_empty() {
                self.emitted = true;
                return Some(segment);
            }
        }

        if !self.emitted {
            self.emitted = true;
            return Some("");
        }
        None
    }
}

/// Splits `text` into owned chunks of at most `max_chars` characters.
///
/// Never returns an empty vector; text without content yields `vec![""]`.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    Chunks::new(text, max_chars).map(str::to_string).collect()
}
