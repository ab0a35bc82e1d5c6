//! Framework persistence, always scoped to the owning user.

use super::{now_timestamp, parse_json_column, prefixed_id};
use crate::errors::PromptError;
use crate::framework::Family;
use crate::providers::db::sqlite::sql;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::info;
use turso::{params, Database, Row, Value as TursoValue};

const PREVIEW_ARTEFACTS: usize = 3;
const PREVIEW_DESCRIPTION_CHARS: usize = 100;

/// A framework row with its JSON columns decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFramework {
    pub id: String,
    pub title: String,
    pub version: String,
    pub creator_id: String,
    pub metadata: Value,
    pub steps: Value,
    pub artefacts: Value,
    pub risks: Value,
    pub escalation: Value,
    pub raw_framework: Value,
    pub raw_metadata: Value,
    pub pov: Option<Value>,
    pub family: String,
    pub confidence: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// The card view used by framework listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameworkSummary {
    pub id: String,
    pub title: String,
    pub version: String,
    pub family: String,
    pub confidence: f64,
    pub created_at: String,
    pub updated_at: String,
    pub preview_artefacts: Vec<Value>,
}

impl TryFrom<&Row> for StoredFramework {
    type Error = PromptError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let text = |i: usize| -> Result<String, PromptError> { Ok(row.get::<String>(i)?) };
        let pov = match row.get_value(11)? {
            TursoValue::Text(raw) => Some(parse_json_column(&raw, Value::String(raw.clone()))),
            _ => None,
        };
        let confidence = match row.get_value(13)? {
            TursoValue::Real(f) => f,
            TursoValue::Integer(i) => i as f64,
            _ => 0.0,
        };

        Ok(StoredFramework {
            id: text(0)?,
            title: text(1)?,
            version: text(2)?,
            creator_id: text(3)?,
            metadata: parse_json_column(&text(4)?, json!({})),
            steps: parse_json_column(&text(5)?, json!([])),
            artefacts: parse_json_column(&text(6)?, json!({})),
            risks: parse_json_column(&text(7)?, json!([])),
            escalation: parse_json_column(&text(8)?, json!([])),
            raw_framework: parse_json_column(&text(9)?, json!({})),
            raw_metadata: parse_json_column(&text(10)?, json!({})),
            pov,
            family: text(12)?,
            confidence,
            created_at: text(14)?,
            updated_at: text(15)?,
        })
    }
}

impl StoredFramework {
    /// Up to three additional artefacts with shortened descriptions.
    pub fn preview_artefacts(&self) -> Vec<Value> {
        self.artefacts
            .get("additional")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .take(PREVIEW_ARTEFACTS)
                    .map(|art| {
                        let name = art.get("name").and_then(Value::as_str).unwrap_or_default();
                        let description: String = art
                            .get("description")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .chars()
                            .take(PREVIEW_DESCRIPTION_CHARS)
                            .collect();
                        json!({"name": name, "description": description})
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn summary(&self) -> FrameworkSummary {
        FrameworkSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            version: self.version.clone(),
            family: self.family.clone(),
            confidence: self.confidence,
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
            preview_artefacts: self.preview_artefacts(),
        }
    }

    /// The editor view: decoded sections without the raw model payloads.
    pub fn detail(&self) -> Value {
        json!({
            "id": self.id,
            "title": self.title,
            "version": self.version,
            "family": self.family,
            "confidence": self.confidence,
            "creator_id": self.creator_id,
            "metadata": self.metadata,
            "steps": self.steps,
            "artefacts": self.artefacts,
            "risks": self.risks,
            "escalation": self.escalation,
            "created_at": self.created_at,
            "updated_at": self.updated_at,
        })
    }

    /// Point of view, family and confidence. The point of view is read from the
    /// raw model output.
    pub fn binding(&self) -> Value {
        json!({
            "id": self.id,
            "title": self.title,
            "pov": self.raw_framework.get("pov").cloned().unwrap_or(Value::Null),
            "family": self.family,
            "confidence": self.confidence,
            "created_at": self.created_at,
            "updated_at": self.updated_at,
        })
    }
}

fn section<'a>(framework: &'a Value, key: &str, empty: &'a Value) -> &'a Value {
    framework.get(key).filter(|v| !v.is_null()).unwrap_or(empty)
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn confidence_of(framework: &Value) -> f64 {
    match framework.get("confidence") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Saves a generated framework for `creator_id` and returns the stored row.
///
/// Missing sections default to empty containers; the title falls back from
/// `metadata.title` to `title` to `"Untitled Framework"`, the version to
/// `"1.0.0"` and the family to `Other`.
pub async fn insert_framework(
    db: &Database,
    framework: &Value,
    source_metadata: &Value,
    creator_id: &str,
) -> Result<StoredFramework, PromptError> {
    let conn = db.connect()?;
    let empty_map = json!({});
    let empty_list = json!([]);

    let metadata = section(framework, "metadata", &empty_map);
    let title = non_empty_str(metadata, "title")
        .or_else(|| non_empty_str(framework, "title"))
        .unwrap_or("Untitled Framework")
        .to_string();
    let version = non_empty_str(metadata, "version").unwrap_or("1.0.0").to_string();
    let family = framework
        .get("family")
        .and_then(Value::as_str)
        .unwrap_or(Family::Other.as_str())
        .to_string();
    let pov = match framework.get("pov") {
        None | Some(Value::Null) => TursoValue::Null,
        Some(pov) => TursoValue::Text(serde_json::to_string(pov)?),
    };

    let id = prefixed_id("fw", 12);
    let now = now_timestamp();

    conn.execute(
        sql::INSERT_FRAMEWORK,
        params![
            id.clone(),
            title,
            version,
            creator_id,
            serde_json::to_string(metadata)?,
            serde_json::to_string(section(framework, "steps", &empty_list))?,
            serde_json::to_string(section(framework, "artefacts", &empty_map))?,
            serde_json::to_string(section(framework, "risks", &empty_list))?,
            serde_json::to_string(section(framework, "escalation", &empty_list))?,
            serde_json::to_string(framework)?,
            serde_json::to_string(source_metadata)?,
            pov,
            family,
            confidence_of(framework),
            now.clone(),
            now
        ],
    )
    .await?;
    info!(framework_id = %id, creator_id, "Framework saved.");

    get_framework(db, &id, creator_id).await?.ok_or_else(|| {
        PromptError::StorageOperationFailed(format!("framework {id} vanished after insert"))
    })
}

/// All frameworks created by `creator_id`, newest first.
pub async fn list_frameworks_by_creator(
    db: &Database,
    creator_id: &str,
) -> Result<Vec<StoredFramework>, PromptError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(&sql::select_frameworks_by_creator(), params![creator_id])
        .await?;

    let mut frameworks = Vec::new();
    while let Some(row) = rows.next().await? {
        frameworks.push(StoredFramework::try_from(&row)?);
    }
    Ok(frameworks)
}

/// One framework, or `None` when it does not exist or belongs to someone else.
pub async fn get_framework(
    db: &Database,
    id: &str,
    creator_id: &str,
) -> Result<Option<StoredFramework>, PromptError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(&sql::select_framework_for_owner(), params![id, creator_id])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(StoredFramework::try_from(&row)?)),
        None => Ok(None),
    }
}

/// Replaces the editable sections of an owned framework with an editor payload.
///
/// Title and version keep their stored values unless `metadata` supplies new
/// ones. Returns `false` when the framework is not found for this owner.
pub async fn update_framework(
    db: &Database,
    id: &str,
    creator_id: &str,
    edited: &Value,
) -> Result<bool, PromptError> {
    let Some(existing) = get_framework(db, id, creator_id).await? else {
        return Ok(false);
    };
    let empty_map = json!({});
    let empty_list = json!([]);

    let metadata = section(edited, "metadata", &empty_map);
    let title = metadata
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(&existing.title)
        .to_string();
    let version = metadata
        .get("version")
        .and_then(Value::as_str)
        .unwrap_or(&existing.version)
        .to_string();

    let conn = db.connect()?;
    let changed = conn
        .execute(
            sql::UPDATE_FRAMEWORK,
            params![
                title,
                version,
                serde_json::to_string(metadata)?,
                serde_json::to_string(section(edited, "steps", &empty_list))?,
                serde_json::to_string(section(edited, "artefacts", &empty_map))?,
                serde_json::to_string(section(edited, "risks", &empty_list))?,
                serde_json::to_string(section(edited, "escalation", &empty_list))?,
                now_timestamp(),
                id,
                creator_id
            ],
        )
        .await?;
    info!(framework_id = id, "Framework updated.");
    Ok(changed > 0)
}

/// Deletes an owned framework. Returns `false` when nothing was deleted.
pub async fn delete_framework(
    db: &Database,
    id: &str,
    creator_id: &str,
) -> Result<bool, PromptError> {
    let conn = db.connect()?;
    let changed = conn
        .execute(sql::DELETE_FRAMEWORK, params![id, creator_id])
        .await?;
    Ok(changed > 0)
}

/// Groups framework cards by family, keeping the input order within a family.
pub fn group_by_family(frameworks: &[StoredFramework]) -> BTreeMap<String, Vec<FrameworkSummary>> {
    let mut grouped: BTreeMap<String, Vec<FrameworkSummary>> = BTreeMap::new();
    for fw in frameworks {
        let family = if fw.family.is_empty() {
            Family::Other.as_str().to_string()
        } else {
            fw.family.clone()
        };
        grouped.entry(family).or_default().push(fw.summary());
    }
    grouped
}
