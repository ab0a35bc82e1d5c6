//! # Metadata Record Schema
//!
//! A metadata record is an open JSON object. A fixed set of identity fields is
//! always present with a known shape, a second set of open fields is always
//! present with an empty container as default, and any other key passes through
//! untouched.

use serde_json::{Map, Value};

/// A loosely-structured metadata record, as produced by a model or by merging.
pub type Record = Map<String, Value>;

/// The canonical shape of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A string or `null`.
    Scalar,
    /// A JSON array.
    List,
    /// A JSON object.
    Map,
}

impl FieldKind {
    /// The canonical empty value for this kind.
    pub fn empty(self) -> Value {
        match self {
            FieldKind::Scalar => Value::Null,
            FieldKind::List => Value::Array(Vec::new()),
            FieldKind::Map => Value::Object(Map::new()),
        }
    }

    /// Coerces a fixed-field value into this kind, falling back to the empty value.
    ///
    /// Scalars must already be strings. A bare scalar in a list field becomes
    /// a one-item list.
    fn coerce(self, value: Option<Value>) -> Value {
        match (self, value) {
            (FieldKind::Scalar, Some(Value::String(s))) => Value::String(s),
            (FieldKind::List, Some(Value::Array(items))) => Value::Array(items),
            (FieldKind::List, Some(v @ (Value::String(_) | Value::Number(_) | Value::Bool(_)))) => {
                Value::Array(vec![v])
            }
            (FieldKind::Map, Some(Value::Object(map))) => Value::Object(map),
            (kind, _) => kind.empty(),
        }
    }
}

/// A named field with its canonical shape.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> Field {
    Field { name, kind }
}

/// Identity fields. Always present, coerced to their canonical shape.
pub const FIXED_FIELDS: &[Field] = &[
    field("doc_id", FieldKind::Scalar),
    field("title", FieldKind::Scalar),
    field("subject", FieldKind::Scalar),
    field("author", FieldKind::Scalar),
    field("created_at", FieldKind::Scalar),
    field("jurisdiction", FieldKind::List),
    field("industry", FieldKind::List),
    field("confidentiality", FieldKind::Scalar),
    field("version", FieldKind::Scalar),
    field("language", FieldKind::Scalar),
    field("keywords", FieldKind::List),
    field("entities", FieldKind::List),
];

/// Extensible fields. Always present; existing values are kept verbatim.
pub const OPEN_FIELDS: &[Field] = &[
    field("facets", FieldKind::Map),
    field("sections", FieldKind::List),
    field("triples", FieldKind::List),
    field("key_values", FieldKind::List),
    field("tags", FieldKind::List),
    field("questions", FieldKind::List),
    field("risks", FieldKind::List),
    field("actions_todo", FieldKind::List),
    field("metrics", FieldKind::List),
    field("tables", FieldKind::List),
    field("figures", FieldKind::List),
    field("extra", FieldKind::Map),
];

/// Returns `true` if `name` is one of the fixed or open schema fields.
pub fn is_schema_field(name: &str) -> bool {
    FIXED_FIELDS
        .iter()
        .chain(OPEN_FIELDS)
        .any(|f| f.name == name)
}

/// Guarantees every fixed and open key is present on `record`.
///
/// Fixed fields of the wrong type are replaced by their default (scalars given as
/// numbers or booleans are stringified, a bare scalar in a list slot becomes a
/// one-element list). Open fields are only defaulted when absent or `null`.
/// Unknown keys are left alone. This never fails.
pub fn ensure_open_schema(mut record: Record) -> Record {
    for f in FIXED_FIELDS {
        let value = f.kind.coerce(record.remove(f.name));
        record.insert(f.name.to_string(), value);
    }
    for f in OPEN_FIELDS {
        match record.get(f.name) {
            None | Some(Value::Null) => {
                record.insert(f.name.to_string(), f.kind.empty());
            }
            Some(_) => {}
        }
    }
    record
}

/// An empty, fully-shaped record.
pub fn empty_record() -> Record {
    ensure_open_schema(Record::new())
}
