//! # Framework Route Handlers
//!
//! Generation from text or files, the owner-scoped CRUD endpoints, markdown
//! export and regeneration of user-edited frameworks, all under
//! `/api/frameworks`.

use super::{read_file_field, read_file_fields, AppError, AppState, UploadedFile};
use crate::{
    auth::middleware::AuthenticatedUser,
    types::{
        FileGenerateParams, GenerateResponse, MessageResponse, RegenerateRequest,
        RegenerateResponse, TextGenerateRequest, UpdateFrameworkResponse,
    },
};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::Multipart;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use valorie::{
    constants::{FRAMEWORK_MAX_BATCH_FILES, FRAMEWORK_MAX_FILE_BYTES, FRAMEWORK_MAX_TEXT_CHARS},
    extract::{extension_of, extract_text_from_bytes, guess_mime},
    framework::{export_filename, framework_to_markdown, framework_to_text, into_frameworks},
    merge_maps,
    preprocess::{direct_metadata, direct_metadata_from_files},
    schema::Record,
    storage::frameworks::{
        delete_framework, get_framework, group_by_family, insert_framework,
        list_frameworks_by_creator, update_framework, FrameworkSummary,
    },
    SeedExtractor, SeedInput,
};

const ALLOWED_EXTENSIONS: &[&str] = &[".doc", ".docx", ".md", ".pdf", ".txt"];
const DIRECT_DOC_ID_CHARS: usize = 12;
const NOT_FOUND_OR_FORBIDDEN: &str = "Framework not found or you don't have permission";

fn seed_extractor(app_state: &AppState) -> Result<Arc<SeedExtractor>, AppError> {
    app_state.seed_extractor.clone().ok_or_else(|| {
        AppError::ServiceUnavailable(
            "Metadata extraction model is not configured on this server.".to_string(),
        )
    })
}

fn direct_doc_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("doc-{}", &hex[..DIRECT_DOC_ID_CHARS])
}

fn to_values(frameworks: Vec<Record>) -> Vec<Value> {
    frameworks.into_iter().map(Value::Object).collect()
}

fn upload_mime(file: &UploadedFile) -> String {
    file.content_type
        .clone()
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| guess_mime(&file.filename).to_string())
}

/// Saves each framework for `creator_id` and returns the new ids in order.
async fn save_frameworks(
    app_state: &AppState,
    frameworks: &[Value],
    source_metadata: &Value,
    creator_id: &str,
) -> Result<Vec<String>, AppError> {
    let mut saved_ids = Vec::with_capacity(frameworks.len());
    for framework in frameworks {
        let stored = insert_framework(
            &app_state.sqlite_provider.db,
            framework,
            source_metadata,
            creator_id,
        )
        .await?;
        saved_ids.push(stored.id);
    }
    info!(saved = saved_ids.len(), "Frameworks saved.");
    Ok(saved_ids)
}

/// `POST /api/frameworks/generate-from-text`
///
/// With `use_global_llm` (the default) only the text's structure is sent to the
/// framework model; otherwise the seed pipeline summarizes it first. Results
/// are returned, not saved.
pub async fn generate_from_text_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<TextGenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    if payload.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text content is empty".to_string()));
    }
    if payload.text.chars().count() > FRAMEWORK_MAX_TEXT_CHARS {
        return Err(AppError::BadRequest(
            "Text too long (max 50,000 characters)".to_string(),
        ));
    }

    let metadata = if payload.use_global_llm {
        info!("Generating from text structure only.");
        direct_metadata(&payload.text, &direct_doc_id())
    } else {
        info!("Generating from seed metadata.");
        seed_extractor(&app_state)?
            .extract_seed(SeedInput::Text(payload.text))
            .await?
    };

    let result = app_state
        .framework_generator
        .generate(&metadata, false)
        .await?;
    let frameworks = to_values(into_frameworks(result));
    info!(count = frameworks.len(), "Framework generation completed.");

    Ok(Json(GenerateResponse {
        success: true,
        framework_id: None,
        framework: frameworks.first().cloned(),
        frameworks: Some(frameworks),
        metadata: Some(Value::Object(metadata)),
        error: None,
    }))
}

/// `POST /api/frameworks/generate-from-file`
///
/// Runs the seed pipeline over the uploaded document and saves every
/// generated framework for the caller. `use_global_llm=false` swaps the
/// framework model for the deterministic builder.
pub async fn generate_from_file_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<FileGenerateParams>,
    mut multipart: Multipart,
) -> Result<Json<GenerateResponse>, AppError> {
    let file = read_file_field(&mut multipart)
        .await?
        .filter(|f| !f.filename.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let ext = extension_of(&file.filename);
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unsupported file type. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    if file.data.len() > FRAMEWORK_MAX_FILE_BYTES {
        return Err(AppError::BadRequest("File too large (max 10MB)".to_string()));
    }

    info!(user_id = %user.id, filename = %file.filename, bytes = file.data.len(), "Generating from file.");
    let mime = upload_mime(&file);
    let metadata = seed_extractor(&app_state)?
        .extract_seed(SeedInput::Document {
            data: file.data,
            mime,
            filename: file.filename,
        })
        .await?;

    let result = app_state
        .framework_generator
        .generate(&metadata, !params.use_global_llm)
        .await?;
    let frameworks = to_values(into_frameworks(result));

    let source_metadata = Value::Object(metadata);
    let saved_ids = save_frameworks(&app_state, &frameworks, &source_metadata, &user.id).await?;

    Ok(Json(GenerateResponse {
        success: true,
        framework_id: saved_ids.into_iter().next(),
        framework: frameworks.first().cloned(),
        frameworks: Some(frameworks),
        metadata: Some(source_metadata),
        error: None,
    }))
}

/// `POST /api/frameworks/generate-from-files`
///
/// Accepts up to ten `files` parts. Files with an unsupported extension or no
/// name are skipped. With `use_global_llm` (the default) the framework model
/// sees only the files' combined structure; otherwise each file goes through
/// the seed pipeline and the seeds are merged. Results are saved for the caller.
pub async fn generate_from_files_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<FileGenerateParams>,
    mut multipart: Multipart,
) -> Result<Json<GenerateResponse>, AppError> {
    let uploads = read_file_fields(&mut multipart, &["files", "file"]).await?;
    if uploads.is_empty() {
        return Err(AppError::BadRequest("No files provided".to_string()));
    }
    if uploads.len() > FRAMEWORK_MAX_BATCH_FILES {
        return Err(AppError::BadRequest(format!(
            "Too many files (max {FRAMEWORK_MAX_BATCH_FILES})"
        )));
    }

    let mut files = Vec::with_capacity(uploads.len());
    for file in uploads {
        let ext = extension_of(&file.filename);
        if file.filename.trim().is_empty() || !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            debug!(filename = %file.filename, "Skipping file with unsupported type.");
            continue;
        }
        if file.data.len() > FRAMEWORK_MAX_FILE_BYTES {
            return Err(AppError::BadRequest(format!(
                "File {} too large",
                file.filename
            )));
        }
        files.push(file);
    }
    if files.is_empty() {
        return Err(AppError::BadRequest("No valid files".to_string()));
    }
    let count = files.len();
    info!(user_id = %user.id, count, "Generating from files.");

    let metadata = if params.use_global_llm {
        let texts: Vec<(String, String)> = files
            .into_iter()
            .map(|file| {
                let text = extract_text_from_bytes(&file.data, &upload_mime(&file), &file.filename);
                (file.filename, text)
            })
            .collect();
        direct_metadata_from_files(&texts, &direct_doc_id())
    } else {
        let extractor = seed_extractor(&app_state)?;
        let mut seeds = Vec::with_capacity(count);
        for file in files {
            let mime = upload_mime(&file);
            seeds.push(
                extractor
                    .extract_seed(SeedInput::Document {
                        data: file.data,
                        mime,
                        filename: file.filename,
                    })
                    .await?,
            );
        }
        let mut merged = merge_maps(seeds);
        if count > 1 {
            merged.insert("source_count".to_string(), json!(count));
            merged.insert("merged_from_multiple_files".to_string(), json!(true));
        }
        merged
    };

    let result = app_state
        .framework_generator
        .generate(&metadata, false)
        .await?;
    let frameworks = to_values(into_frameworks(result));

    let source_metadata = Value::Object(metadata);
    let saved_ids = save_frameworks(&app_state, &frameworks, &source_metadata, &user.id).await?;

    Ok(Json(GenerateResponse {
        success: true,
        framework_id: saved_ids.into_iter().next(),
        framework: frameworks.first().cloned(),
        frameworks: Some(frameworks),
        metadata: Some(source_metadata),
        error: None,
    }))
}

/// `GET /api/frameworks/my-frameworks`, newest first.
pub async fn my_frameworks_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<FrameworkSummary>>, AppError> {
    let frameworks = list_frameworks_by_creator(&app_state.sqlite_provider.db, &user.id).await?;
    Ok(Json(frameworks.iter().map(|fw| fw.summary()).collect()))
}

/// `GET /api/frameworks/my-frameworks/by-family`
pub async fn my_frameworks_by_family_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<BTreeMap<String, Vec<FrameworkSummary>>>, AppError> {
    let frameworks = list_frameworks_by_creator(&app_state.sqlite_provider.db, &user.id).await?;
    Ok(Json(group_by_family(&frameworks)))
}

/// `GET /api/frameworks/{id}`
pub async fn get_framework_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(framework_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    get_framework(&app_state.sqlite_provider.db, &framework_id, &user.id)
        .await?
        .map(|fw| Json(fw.detail()))
        .ok_or_else(|| {
            AppError::NotFound(
                "Framework not found or you don't have permission to access it".to_string(),
            )
        })
}

/// `GET /api/frameworks/{id}/binding`
pub async fn framework_binding_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(framework_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    get_framework(&app_state.sqlite_provider.db, &framework_id, &user.id)
        .await?
        .map(|fw| Json(fw.binding()))
        .ok_or_else(|| AppError::NotFound("Framework not found or access denied".to_string()))
}

/// `PUT /api/frameworks/{id}`
pub async fn update_framework_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(framework_id): Path<String>,
    Json(edited): Json<Value>,
) -> Result<Json<UpdateFrameworkResponse>, AppError> {
    let updated = update_framework(
        &app_state.sqlite_provider.db,
        &framework_id,
        &user.id,
        &edited,
    )
    .await?;
    if !updated {
        return Err(AppError::NotFound(NOT_FOUND_OR_FORBIDDEN.to_string()));
    }

    Ok(Json(UpdateFrameworkResponse {
        success: true,
        message: "Framework updated successfully".to_string(),
        framework_id,
    }))
}

/// `DELETE /api/frameworks/{id}`
pub async fn delete_framework_handler(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(framework_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let deleted =
        delete_framework(&app_state.sqlite_provider.db, &framework_id, &user.id).await?;
    if !deleted {
        return Err(AppError::NotFound(NOT_FOUND_OR_FORBIDDEN.to_string()));
    }
    info!(framework_id = %framework_id, "Framework deleted.");

    Ok(Json(MessageResponse {
        success: true,
        message: "Framework deleted successfully".to_string(),
    }))
}

/// `POST /api/frameworks/export-markdown`
///
/// Renders the posted framework as a markdown attachment.
pub async fn export_markdown_handler(Json(framework): Json<Value>) -> impl IntoResponse {
    let title = framework
        .pointer("/metadata/title")
        .and_then(Value::as_str)
        .unwrap_or("framework");
    let filename = export_filename(title);
    let markdown = framework_to_markdown(&framework);

    (
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        markdown,
    )
}

/// `POST /api/frameworks/regenerate`
///
/// Cloud mode hands the edited framework to the framework model for
/// completion. Local mode flattens it to text, re-extracts seed metadata and
/// generates afresh, so nothing but the derived metadata leaves the machine.
pub async fn regenerate_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<RegenerateRequest>,
) -> Result<Json<RegenerateResponse>, AppError> {
    if payload.use_local {
        let text = framework_to_text(&payload.framework);
        let metadata = seed_extractor(&app_state)?
            .extract_seed(SeedInput::Text(text))
            .await?;
        let framework = app_state
            .framework_generator
            .generate(&metadata, false)
            .await?;

        return Ok(Json(RegenerateResponse {
            success: true,
            framework: Value::Object(framework),
            method: "local".to_string(),
            message: "Framework regenerated using local processing".to_string(),
        }));
    }

    if !app_state.framework_generator.has_provider() {
        return Err(AppError::BadRequest(
            "AI API key not configured. Please use local processing instead.".to_string(),
        ));
    }
    let framework = app_state
        .framework_generator
        .improve(&payload.framework)
        .await?;

    Ok(Json(RegenerateResponse {
        success: true,
        framework: Value::Object(framework),
        method: "cloud".to_string(),
        message: "Framework regenerated using cloud processing".to_string(),
    }))
}
