//! # Local Preprocessing
//!
//! Cheap, model-free analysis of a document: a title guess, frequent keywords,
//! a heading outline, capitalised entity phrases, and a compact summary that
//! fits comfortably in a small model's context window.

use crate::constants::DEFAULT_SUMMARY_CHARS;
use crate::merge::truncate_chars;
use crate::schema::{ensure_open_schema, Record};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::{debug, info};

static LEADING_HASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#+\s*").expect("Invalid regex"));
static KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z]{4,}\b").expect("Invalid regex"));
static NUMBERED_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[\.\)]\s+[A-Z]").expect("Invalid regex"));
static CAPITALISED_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").expect("Invalid regex")
});

const STOP_WORDS: &[&str] = &[
    "this", "that", "with", "from", "have", "been", "were", "will", "would", "could", "should",
    "about", "their", "there", "where", "which", "these", "those", "what", "when", "then", "them",
    "they", "than", "such", "into", "through", "during", "before", "after", "above", "below",
];

const ENTITY_STOP_WORDS: &[&str] = &[
    "The", "This", "That", "These", "Those", "There", "Here", "When", "Where", "What", "Which",
    "Who", "How", "Why",
];

const MAX_SECTIONS: usize = 10;
const MAX_ENTITIES: usize = 15;
const SECTION_PREVIEW_CHARS: usize = 150;
const SUMMARY_HEAD_CHARS: usize = 500;

/// A heading found in the document with a short preview of what follows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOutline {
    pub title: String,
    pub level: usize,
    pub preview: String,
}

/// The result of [`preprocess_document_smart`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessed {
    pub title: String,
    pub keywords: Vec<String>,
    pub entities: Vec<String>,
    pub sections: Vec<SectionOutline>,
    pub summary: String,
    pub original_length: usize,
    pub summary_length: usize,
    pub compression_ratio: f64,
}

/// At least one uppercase character and no lowercase ones.
fn is_all_caps(s: &str) -> bool {
    s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase)
}

fn starts_uppercase(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_uppercase)
}

fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Guesses a document title from its first few lines.
pub fn extract_title_from_text(text: &str) -> String {
    let lines: Vec<&str> = non_empty_lines(text).collect();
    let Some(first) = lines.first() else {
        return "Untitled Document".to_string();
    };

    lines
        .iter()
        .take(5)
        .find(|l| l.chars().count() < 200 && (starts_uppercase(l) || l.starts_with('#')))
        .map(|l| LEADING_HASHES.replace(l, "").trim().to_string())
        .unwrap_or_else(|| truncate_chars(first, 150))
}

/// The `top_n` most frequent lowercase words of four or more letters.
///
/// Stop words are skipped. Ties keep the order in which words first appear.
pub fn extract_simple_keywords(text: &str, top_n: usize) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for m in KEYWORD.find_iter(&lowered) {
        let word = m.as_str();
        if STOP_WORDS.contains(&word) {
            continue;
        }
        match index.get(word) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(word.to_string(), counts.len());
                counts.push((word.to_string(), 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(top_n).map(|(w, _)| w).collect()
}

fn heading_level(line: &str) -> Option<(usize, String)> {
    if line.starts_with('#') {
        let level = line.chars().take_while(|c| *c == '#').count();
        return Some((level, LEADING_HASHES.replace(line, "").to_string()));
    }
    let len = line.chars().count();
    if NUMBERED_HEADING.is_match(line) {
        Some((2, line.to_string()))
    } else if len < 100 && is_all_caps(line) && line.split_whitespace().count() > 1 {
        Some((2, line.to_string()))
    } else if len < 80 && starts_uppercase(line) && !line.ends_with(['.', ',', ';']) {
        Some((3, line.to_string()))
    } else {
        None
    }
}

/// Outlines the document's headings, at most ten.
pub fn extract_sections_structure(text: &str) -> Vec<SectionOutline> {
    let mut sections = Vec::new();
    let mut current: Option<SectionOutline> = None;

    for line in non_empty_lines(text) {
        if let Some((level, title)) = heading_level(line) {
            sections.extend(current.take());
            current = Some(SectionOutline {
                title: truncate_chars(&title, 100),
                level,
                preview: String::new(),
            });
        } else if let Some(section) = current.as_mut() {
            if section.preview.chars().count() < SECTION_PREVIEW_CHARS {
                if !section.preview.is_empty() {
                    section.preview.push(' ');
                }
                section.preview.push_str(line);
            }
        }
    }
    sections.extend(current);
    sections.truncate(MAX_SECTIONS);
    sections
}

/// Capitalised phrases that look like names, unique in order of appearance.
pub fn extract_simple_entities(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    CAPITALISED_PHRASE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|p| !ENTITY_STOP_WORDS.contains(p) && p.chars().count() > 2)
        .filter(|p| seen.insert(*p))
        .take(MAX_ENTITIES)
        .map(str::to_string)
        .collect()
}

/// Runs every local extractor and builds a compact summary of at most
/// `max_summary_chars` characters.
pub fn preprocess_document_smart(text: &str, max_summary_chars: usize) -> Preprocessed {
    let original_length = text.chars().count();
    info!(chars = original_length, "Preprocessing document locally.");

    let title = extract_title_from_text(text);
    let keywords = extract_simple_keywords(text, 10);
    let sections = extract_sections_structure(text);
    let entities = extract_simple_entities(text);

    let mut parts = vec![
        format!("Title: {title}\n"),
        format!("Content: {}...\n", truncate_chars(text, SUMMARY_HEAD_CHARS).trim()),
    ];
    if !sections.is_empty() {
        parts.push("\nSections:".to_string());
        parts.extend(sections.iter().take(5).map(|s| format!("- {}", s.title)));
    }
    let summary = truncate_chars(&parts.join("\n"), max_summary_chars);
    let summary_length = summary.chars().count();

    let compression_ratio = if original_length == 0 {
        0.0
    } else {
        (summary_length as f64 / original_length as f64 * 100.0).round() / 100.0
    };

    debug!(
        %title,
        keywords = keywords.len(),
        sections = sections.len(),
        entities = entities.len(),
        summary_length,
        "Local preprocessing finished."
    );

    Preprocessed {
        title,
        keywords,
        entities,
        sections,
        summary,
        original_length,
        summary_length,
        compression_ratio,
    }
}

impl Preprocessed {
    pub fn from_text(text: &str) -> Self {
        preprocess_document_smart(text, DEFAULT_SUMMARY_CHARS)
    }
}

fn is_direct_heading(line: &str) -> bool {
    let lowered = line.to_lowercase();
    line.chars().count() < 100
        && (line.chars().next().is_some_and(|c| c.is_ascii_digit())
            || is_all_caps(line)
            || ["step", "phase", "stage", "chapter"]
                .iter()
                .any(|m| lowered.contains(m)))
}

/// Groups the first `max_lines` non-empty lines under direct-mode headings,
/// keeping each heading and at most two following lines.
fn heading_groups(text: &str, max_lines: usize) -> Vec<Vec<&str>> {
    let mut groups = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines().take(max_lines).map(str::trim).filter(|l| !l.is_empty()) {
        if is_direct_heading(line) {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
            current.push(line);
        } else if current.len() < 3 {
            current.push(line);
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

fn direct_sections(text: &str) -> Vec<Value> {
    let mut sections: Vec<Value> = heading_groups(text, 100)
        .iter()
        .map(|lines| {
            json!({
                "title": truncate_chars(lines[0], 150),
                "content": truncate_chars(&lines.join(" "), 200),
                "level": 1,
            })
        })
        .collect();

    if sections.is_empty() {
        let chars: Vec<char> = text.chars().take(2500).collect();
        sections = chars
            .chunks(500)
            .enumerate()
            .map(|(i, part)| {
                let head: String = part.iter().take(200).collect();
                json!({
                    "title": format!("Section {}", i + 1),
                    "content": format!("{head}..."),
                    "level": 1,
                })
            })
            .collect();
    }
    sections
}

/// Builds a metadata record from structure alone, without calling any model.
///
/// Only the title, a handful of title words and short section previews are
/// kept, so the record stays small regardless of the input size.
pub fn direct_metadata(text: &str, doc_id: &str) -> Record {
    let stripped = text.trim();
    let title = stripped
        .lines()
        .next()
        .map(|l| truncate_chars(l, 150).trim().to_string())
        .unwrap_or_else(|| "User Content".to_string());

    let keywords: Vec<String> = title
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .take(5)
        .map(str::to_string)
        .collect();

    let sections = direct_sections(stripped);
    let section_count = sections.len();
    let items: Vec<Value> = keywords
        .iter()
        .map(|k| json!({"value": k, "evidence": "", "location": "", "confidence": 0.8}))
        .collect();

    let record = json!({
        "doc_id": doc_id,
        "title": title,
        "subject": title,
        "language": "en",
        "bypass_local_llm": true,
        "keywords": keywords,
        "sections": sections.into_iter().take(MAX_SECTIONS).collect::<Vec<_>>(),
        "facets": {"main_topic": {"summary": title, "items": items}},
        "key_values": [
            {"key": "document_title", "value": title},
            {"key": "processing_mode", "value": "direct"},
            {"key": "section_count", "value": section_count.to_string()},
        ],
        "tags": keywords,
        "extra": {
            "processing_mode": "direct",
            "note": "Extracted structure without full text to reduce prompt size",
            "original_length": text.chars().count(),
            "truncated": true,
        },
    });

    match record {
        Value::Object(map) => ensure_open_schema(map),
        _ => Record::new(),
    }
}

const MAX_FILE_SECTIONS: usize = 15;

/// The direct-mode record for several documents at once.
///
/// `files` pairs each file name with its extracted text. The title comes from
/// the first file, and every section is tagged with the file it came from.
pub fn direct_metadata_from_files(files: &[(String, String)], doc_id: &str) -> Record {
    let names: Vec<&str> = files.iter().map(|(name, _)| name.as_str()).collect();
    let first_line = files
        .first()
        .and_then(|(_, text)| text.trim().lines().next())
        .map(str::trim)
        .filter(|line| line.chars().count() > 10);
    let title = match (first_line, names.as_slice()) {
        (Some(line), _) => truncate_chars(line, 150).trim().to_string(),
        (None, [only]) => only.to_string(),
        (None, _) => format!("Framework from {} files", names.len()),
    };

    let keywords: Vec<String> = title
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .take(5)
        .map(str::to_string)
        .collect();

    let mut sections: Vec<Value> = files
        .iter()
        .flat_map(|(name, text)| {
            heading_groups(text.trim(), 50)
                .into_iter()
                .map(move |lines| {
                    json!({
                        "title": format!("{name}: {}", truncate_chars(lines[0], 100)),
                        "content": truncate_chars(&lines.join(" "), 200),
                        "level": 1,
                        "source_file": name,
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect();
    if sections.is_empty() {
        sections = files
            .iter()
            .map(|(name, text)| {
                json!({
                    "title": name,
                    "content": format!("{}...", truncate_chars(text, 200)),
                    "level": 1,
                    "source_file": name,
                })
            })
            .collect();
    }
    sections.truncate(MAX_FILE_SECTIONS);

    let topic_items: Vec<Value> = keywords
        .iter()
        .map(|k| json!({"value": k, "evidence": "", "location": "", "confidence": 0.8}))
        .collect();
    let file_items: Vec<Value> = names
        .iter()
        .map(|n| json!({"value": n, "evidence": "", "location": "", "confidence": 1.0}))
        .collect();
    let total_length: usize = files.iter().map(|(_, text)| text.chars().count()).sum();
    let leading_names = names.iter().take(3).copied().collect::<Vec<_>>().join(", ");

    let record = json!({
        "doc_id": doc_id,
        "title": title,
        "subject": title,
        "language": "en",
        "bypass_local_llm": true,
        "keywords": keywords,
        "sections": sections,
        "facets": {
            "main_topic": {"summary": title, "items": topic_items},
            "source_files": {
                "summary": format!("Content from {} file(s)", files.len()),
                "items": file_items,
            },
        },
        "key_values": [
            {"key": "document_title", "value": title},
            {"key": "file_count", "value": files.len().to_string()},
            {"key": "processing_mode", "value": "direct"},
            {"key": "source_files", "value": leading_names},
        ],
        "tags": keywords,
        "source_count": files.len(),
        "source_files": names,
        "extra": {
            "processing_mode": "direct",
            "note": "Extracted structure without full text to reduce prompt size",
            "file_names": names,
            "total_length": total_length,
            "truncated": true,
        },
    });

    match record {
        Value::Object(map) => ensure_open_schema(map),
        _ => Record::new(),
    }
}
