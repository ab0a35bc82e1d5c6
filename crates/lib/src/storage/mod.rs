//! # Repositories
//!
//! Typed access to the `frameworks` and `materials` tables. Every function takes
//! a `&Database` and opens its own connection, so callers can share one
//! [`SqliteProvider`](crate::providers::db::sqlite::SqliteProvider) freely.

pub mod frameworks;
pub mod materials;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Current UTC time as RFC 3339 with microseconds. Sorts lexically.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// `{prefix}_` followed by `len` random hex characters.
pub fn prefixed_id(prefix: &str, len: usize) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &hex[..len.min(hex.len())])
}

fn parse_json_column(raw: &str, fallback: Value) -> Value {
    serde_json::from_str(raw).unwrap_or(fallback)
}
