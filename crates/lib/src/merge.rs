//! # Per-Chunk Record Merging
//!
//! Combines the normalized records extracted from each chunk of one document
//! into a single record. Input order is document order: scalars resolve to the
//! first usable value, lists keep first occurrences, and `extra` lets later
//! chunks overwrite earlier keys.

use crate::schema::{ensure_open_schema, is_schema_field, FieldKind, Record, FIXED_FIELDS};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::warn;

const FIXED_LIST_CAP: usize = 50;
const FACET_ITEM_CAP: usize = 200;
const FACET_SUMMARY_CHARS: usize = 2000;
const EVIDENCE_CHARS: usize = 200;
const DEFAULT_CONFIDENCE: f64 = 0.5;
const MISC_TOPIC: &str = "misc";

/// Open list fields and their caps after merging.
const OPEN_LIST_CAPS: &[(&str, usize)] = &[
    ("sections", 50),
    ("triples", 500),
    ("key_values", 500),
    ("tags", 300),
    ("questions", 300),
    ("risks", 300),
    ("actions_todo", 300),
    ("metrics", 300),
    ("tables", 300),
    ("figures", 300),
];

/// A single evidenced observation within a facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetItem {
    pub value: String,
    pub evidence: String,
    pub location: String,
    pub confidence: f64,
}

impl FacetItem {
    fn dedup_key(&self) -> (&str, &str, &str) {
        (&self.value, &self.evidence, &self.location)
    }

    fn from_value(item: Value) -> Self {
        let Value::Object(obj) = item else {
            return Self {
                value: stringify(&item),
                evidence: String::new(),
                location: String::new(),
                confidence: DEFAULT_CONFIDENCE,
            };
        };

        let value = ["value", "text", "name"]
            .iter()
            .find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
            .map(stringify)
            .unwrap_or_default();
        let text_field = |key: &str| {
            obj.get(key)
                .filter(|v| !v.is_null())
                .map(stringify)
                .unwrap_or_default()
        };
        let evidence = text_field("evidence");
        let location = text_field("location");
        let confidence = obj
            .get("confidence")
            .or_else(|| obj.get("score"))
            .and_then(parse_confidence)
            .unwrap_or(DEFAULT_CONFIDENCE);

        Self {
            value: value.trim().to_string(),
            evidence: truncate_chars(evidence.trim(), EVIDENCE_CHARS),
            location: location.trim().to_string(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// A named cluster of observations with a free-text summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    pub summary: String,
    pub items: Vec<FacetItem>,
}

/// The shapes a model may use for the `facets` field, resolved once at the
/// normalization boundary.
#[derive(Debug)]
pub enum FacetShape {
    /// Canonical `{topic: {summary, items} | [items] | item}` mapping.
    Topics(Map<String, Value>),
    /// A bare list of items, filed under the `misc` topic.
    List(Vec<Value>),
    /// A bare scalar item, filed under the `misc` topic.
    Scalar(Value),
    /// Nothing usable.
    Empty,
}

impl From<Value> for FacetShape {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => FacetShape::Topics(map),
            Value::Array(items) => FacetShape::List(items),
            Value::Null => FacetShape::Empty,
            scalar => FacetShape::Scalar(scalar),
        }
    }
}

impl FacetShape {
    /// Resolves the shape into canonical facets, topics in the order given.
    pub fn into_facets(self) -> Vec<(String, Facet)> {
        match self {
            FacetShape::Topics(map) => map
                .into_iter()
                .map(|(topic, body)| (topic, facet_from_body(body)))
                .collect(),
            FacetShape::List(items) => {
                vec![(MISC_TOPIC.to_string(), facet_from_items(String::new(), items))]
            }
            FacetShape::Scalar(item) => {
                vec![(MISC_TOPIC.to_string(), facet_from_items(String::new(), vec![item]))]
            }
            FacetShape::Empty => Vec::new(),
        }
    }
}

fn facet_from_body(body: Value) -> Facet {
    match body {
        Value::Object(mut obj) => {
            let summary = obj
                .remove("summary")
                .filter(|v| !v.is_null())
                .map(|v| stringify(&v))
                .unwrap_or_default();
            let items = as_list(obj.remove("items").unwrap_or(Value::Null));
            facet_from_items(summary, items)
        }
        Value::Array(items) => facet_from_items(String::new(), items),
        item => facet_from_items(String::new(), vec![item]),
    }
}

fn facet_from_items(summary: String, items: Vec<Value>) -> Facet {
    Facet {
        summary,
        items: items.into_iter().map(FacetItem::from_value).collect(),
    }
}

/// Merges per-chunk records, in document order, into one normalized record.
pub fn merge_maps<I>(records: I) -> Record
where
    I: IntoIterator<Item = Record>,
{
    let records: Vec<Record> = records.into_iter().map(ensure_open_schema).collect();
    let mut merged = Record::new();

    for f in FIXED_FIELDS {
        let value = match f.kind {
            FieldKind::Scalar => records
                .iter()
                .filter_map(|r| r.get(f.name))
                .find(|v| is_resolved_scalar(v))
                .cloned()
                .unwrap_or(Value::Null),
            _ => {
                let all = records.iter().flat_map(|r| list_items(r.get(f.name)));
                Value::Array(dedup_values(all, FIXED_LIST_CAP))
            }
        };
        merged.insert(f.name.to_string(), value);
    }

    merged.insert("facets".to_string(), merge_facets(&records));

    for (name, cap) in OPEN_LIST_CAPS {
        let all = records.iter().flat_map(|r| list_items(r.get(*name)));
        merged.insert(name.to_string(), Value::Array(dedup_values(all, *cap)));
    }

    let mut extra = Map::new();
    for r in &records {
        match r.get("extra") {
            Some(Value::Object(map)) => {
                extra.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Some(Value::Null) | None => {}
            Some(other) => warn!(?other, "Ignoring non-object `extra` during merge."),
        }
    }
    merged.insert("extra".to_string(), Value::Object(extra));

    // Keys outside the schema keep their first-seen value.
    for r in &records {
        for (k, v) in r {
            if !is_schema_field(k) && !merged.contains_key(k) {
                merged.insert(k.clone(), v.clone());
            }
        }
    }

    ensure_open_schema(merged)
}

fn merge_facets(records: &[Record]) -> Value {
    // Topics keep the order in which they were first seen.
    let mut merged: Vec<(String, Facet)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for r in records {
        let shape = FacetShape::from(r.get("facets").cloned().unwrap_or(Value::Null));
        for (topic, facet) in shape.into_facets() {
            let slot = *index.entry(topic.clone()).or_insert_with(|| {
                merged.push((topic, Facet::default()));
                merged.len() - 1
            });
            let target = &mut merged[slot].1;
            if facet.summary.chars().count() > target.summary.chars().count() {
                target.summary = truncate_chars(&facet.summary, FACET_SUMMARY_CHARS);
            }
            target.items.extend(facet.items);
        }
    }

    let mut out = Map::new();
    for (topic, mut facet) in merged {
        let mut seen = HashSet::new();
        facet.items = std::mem::take(&mut facet.items)
            .into_iter()
            .filter(|item| {
                let (v, e, l) = item.dedup_key();
                seen.insert((v.to_string(), e.to_string(), l.to_string()))
            })
            .take(FACET_ITEM_CAP)
            .collect();
        match serde_json::to_value(facet) {
            Ok(value) => {
                out.insert(topic, value);
            }
            Err(e) => warn!(%topic, error = %e, "Failed to serialize merged facet; dropping it."),
        }
    }
    Value::Object(out)
}

/// Order-preserving dedup by canonical serialization, keeping at most `cap` items.
pub fn dedup_values<I>(values: I, cap: usize) -> Vec<Value>
where
    I: IntoIterator<Item = Value>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(canonical_key(v)))
        .take(cap)
        .collect()
}

/// Serializes with object keys sorted, so equal values share one key
/// whatever their key order.
fn canonical_key(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let body: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), canonical_key(v)))
                .collect();
            format!("{{{}}}", body.join(","))
        }
        Value::Array(items) => {
            let body: Vec<String> = items.iter().map(canonical_key).collect();
            format!("[{}]", body.join(","))
        }
        other => other.to_string(),
    }
}

fn list_items(value: Option<&Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
    }
}

fn as_list(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn is_resolved_scalar(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty() && s != "unknown",
        _ => true,
    }
}

fn parse_confidence(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|c| !c.is_nan())
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Truncates `s` to at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
