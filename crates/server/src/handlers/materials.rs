//! # Material Route Handlers
//!
//! Uploads and pasted text are described and recorded under `/materials`.
//! The bytes themselves are not kept.

use super::{read_file_field, AppError, AppState};
use crate::{auth::middleware::AuthenticatedUser, types::IngestTextRequest};
use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::Multipart;
use serde_json::{json, Value};
use tracing::info;
use valorie::{
    constants::{MATERIAL_MAX_BYTES, MATERIAL_MAX_TEXT_CHARS},
    extract::{detect_kind, MaterialKind},
    storage::materials::{
        get_material, insert_material, material_metadata, text_summary, Material, NewMaterial,
    },
};

const EXT_WHITELIST: &[&str] = &[".doc", ".docx", ".pdf", ".txt"];
const MIME_WHITELIST: &[&str] = &[
    "text/plain",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// `GET /materials/ping`
pub async fn ping_handler() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// `POST /materials/upload-file`
///
/// Accepts a multipart `file` part. Either the extension or the declared
/// content type must be on the allow-list.
pub async fn upload_file_handler(
    State(app_state): State<AppState>,
    user: Option<AuthenticatedUser>,
    mut multipart: Multipart,
) -> Result<Json<Material>, AppError> {
    let file = read_file_field(&mut multipart)
        .await?
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    if file.filename.trim().is_empty() {
        return Err(AppError::BadRequest("filename empty".to_string()));
    }

    let detected = detect_kind(&file.filename, file.content_type.as_deref());
    if !EXT_WHITELIST.contains(&detected.ext.as_str())
        && !MIME_WHITELIST.contains(&detected.mime.as_str())
    {
        return Err(AppError::UnsupportedMediaType(format!(
            "Unsupported file type. Allowed: {}",
            EXT_WHITELIST.join(", ")
        )));
    }

    let size = file.data.len();
    if size == 0 {
        return Err(AppError::BadRequest("empty file".to_string()));
    }
    if size > MATERIAL_MAX_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "File too large ({size} bytes). Max is {MATERIAL_MAX_BYTES} bytes."
        )));
    }

    let mut metadata = material_metadata(detected.kind, &detected.mime, &detected.ext, &file.data);
    if let Value::Object(map) = &mut metadata {
        map.insert("original_filename".into(), json!(file.filename));
    }

    let material = insert_material(
        &app_state.sqlite_provider.db,
        NewMaterial {
            kind: detected.kind,
            metadata,
            filename: Some(file.filename),
            mime: Some(detected.mime),
            size_bytes: size as i64,
            owner_id: user.map(|u| u.id),
        },
    )
    .await?;
    info!(material_id = %material.id, size, "Material uploaded.");
    Ok(Json(material))
}

/// `GET /materials/{id}`
pub async fn get_material_handler(
    State(app_state): State<AppState>,
    Path(material_id): Path<String>,
) -> Result<Json<Material>, AppError> {
    get_material(&app_state.sqlite_provider.db, &material_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("not found".to_string()))
}

/// `POST /materials/ingest-text`
pub async fn ingest_text_handler(
    State(app_state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Json(payload): Json<IngestTextRequest>,
) -> Result<Json<Material>, AppError> {
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("empty text".to_string()));
    }
    let chars = text.chars().count();
    if chars > MATERIAL_MAX_TEXT_CHARS {
        return Err(AppError::PayloadTooLarge(format!(
            "text too long, max {MATERIAL_MAX_TEXT_CHARS} chars"
        )));
    }

    let mut metadata = serde_json::Map::new();
    metadata.insert("source".into(), json!("paste"));
    metadata.extend(text_summary(text));

    let material = insert_material(
        &app_state.sqlite_provider.db,
        NewMaterial {
            kind: MaterialKind::Text,
            metadata: Value::Object(metadata),
            filename: None,
            mime: Some("text/plain".to_string()),
            size_bytes: chars as i64,
            owner_id: user.map(|u| u.id),
        },
    )
    .await?;
    info!(material_id = %material.id, chars, "Pasted text recorded.");
    Ok(Json(material))
}
