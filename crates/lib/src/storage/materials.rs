//! Source material records. Only descriptive metadata is kept, never the bytes.

use super::{now_timestamp, parse_json_column, prefixed_id};
use crate::errors::PromptError;
use crate::extract::docx::extract_docx;
use crate::extract::pdf::pdf_overview;
use crate::extract::{Extraction, MaterialKind};
use crate::providers::db::sqlite::sql;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;
use turso::{params, Database, Row, Value as TursoValue};

pub const MATERIAL_STATUS_AVAILABLE: &str = "available";
const PREVIEW_CHARS: usize = 200;
const PDF_STATS_PAGES: u32 = 5;
const DOCX_STATS_CHARS: usize = 5000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub metadata: Value,
    pub filename: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: i64,
    pub owner_id: Option<String>,
    pub created_at: String,
}

/// Fields supplied when recording new material.
#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub kind: MaterialKind,
    pub metadata: Value,
    pub filename: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: i64,
    pub owner_id: Option<String>,
}

fn optional_text(value: TursoValue) -> Option<String> {
    match value {
        TursoValue::Text(s) => Some(s),
        _ => None,
    }
}

impl TryFrom<&Row> for Material {
    type Error = PromptError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let metadata: String = row.get(3)?;
        Ok(Material {
            id: row.get(0)?,
            kind: row.get(1)?,
            status: row.get(2)?,
            metadata: parse_json_column(&metadata, json!({})),
            filename: optional_text(row.get_value(4)?),
            mime: optional_text(row.get_value(5)?),
            size_bytes: row.get(6)?,
            owner_id: optional_text(row.get_value(7)?),
            created_at: row.get(8)?,
        })
    }
}

/// Character count, word count and a short preview of pasted text.
pub fn text_summary(text: &str) -> Map<String, Value> {
    let mut summary = Map::new();
    summary.insert("chars".into(), json!(text.chars().count()));
    summary.insert("words".into(), json!(text.split_whitespace().count()));
    summary.insert(
        "preview".into(),
        json!(text.chars().take(PREVIEW_CHARS).collect::<String>()),
    );
    summary
}

/// Describes an upload: kind, MIME, extension and size, plus text stats for
/// text, PDF and Word files and the page count for PDFs.
pub fn material_metadata(kind: MaterialKind, mime: &str, ext: &str, payload: &[u8]) -> Value {
    let mut meta = Map::new();
    meta.insert("kind".into(), json!(kind.as_str()));
    meta.insert("mime".into(), json!(mime));
    meta.insert("ext".into(), json!(ext));
    meta.insert("size_bytes".into(), json!(payload.len()));

    match kind {
        MaterialKind::Text => {
            let (text, encoding) = match std::str::from_utf8(payload) {
                Ok(text) => (text.to_string(), "utf-8"),
                Err(_) => (payload.iter().map(|&b| b as char).collect(), "latin-1"),
            };
            meta.insert("encoding".into(), json!(encoding));
            meta.extend(text_summary(&text));
        }
        MaterialKind::Pdf => match pdf_overview(payload, PDF_STATS_PAGES) {
            Some(overview) => {
                meta.insert("pages".into(), json!(overview.pages));
                meta.extend(text_summary(&overview.text));
            }
            None => {
                meta.insert("pages".into(), Value::Null);
            }
        },
        MaterialKind::Docx | MaterialKind::Doc => {
            if let Extraction::Text(text) = extract_docx(payload) {
                let head: String = text.chars().take(DOCX_STATS_CHARS).collect();
                meta.extend(text_summary(&head));
            }
        }
        MaterialKind::File => {}
    }
    Value::Object(meta)
}

/// Records new material and returns the stored row.
pub async fn insert_material(db: &Database, new: NewMaterial) -> Result<Material, PromptError> {
    let conn = db.connect()?;
    let id = prefixed_id("mat", 8);
    let to_value = |s: Option<String>| s.map(TursoValue::Text).unwrap_or(TursoValue::Null);

    conn.execute(
        sql::INSERT_MATERIAL,
        params![
            id.clone(),
            new.kind.as_str(),
            MATERIAL_STATUS_AVAILABLE,
            serde_json::to_string(&new.metadata)?,
            to_value(new.filename),
            to_value(new.mime),
            new.size_bytes,
            to_value(new.owner_id),
            now_timestamp()
        ],
    )
    .await?;
    info!(material_id = %id, kind = new.kind.as_str(), "Material recorded.");

    get_material(db, &id).await?.ok_or_else(|| {
        PromptError::StorageOperationFailed(format!("material {id} vanished after insert"))
    })
}

pub async fn get_material(db: &Database, id: &str) -> Result<Option<Material>, PromptError> {
    let conn = db.connect()?;
    let mut rows = conn.query(sql::SELECT_MATERIAL, params![id]).await?;
    match rows.next().await? {
        Some(row) => Ok(Some(Material::try_from(&row)?)),
        None => Ok(None),
    }
}
