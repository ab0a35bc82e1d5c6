//! # API Route Handlers
//!
//! This module organizes all the Axum route handlers for the `valorie-server`.
//! The handlers are split into sub-modules by the resource they serve.

pub mod frameworks;
pub mod general;
pub mod materials;
pub mod users;

// Re-export all handlers from the sub-modules to make them easily accessible
// to the router under a single `handlers::` path.
pub use frameworks::*;
pub use general::*;
pub use materials::*;
pub use users::*;

// Shared items used by multiple handler modules.
use super::{errors::AppError, state::AppState};
use axum_extra::extract::Multipart;
use tracing::{debug, warn};

/// The `file` part of a multipart upload.
pub(crate) struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Reads the `file` part of a multipart body, ignoring any other parts.
pub(crate) async fn read_file_field(
    multipart: &mut Multipart,
) -> Result<Option<UploadedFile>, AppError> {
    Ok(read_file_fields(multipart, &["file"]).await?.pop())
}

/// Reads every part named in `names`, in upload order.
pub(crate) async fn read_file_fields(
    multipart: &mut Multipart,
    names: &[&str],
) -> Result<Vec<UploadedFile>, AppError> {
    let mut uploaded = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        if !names.contains(&name.as_str()) {
            warn!("Ignoring unknown multipart field: {}", name);
            continue;
        }
        let filename = field.file_name().unwrap_or("").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?.to_vec();
        debug!(%filename, ?content_type, bytes = data.len(), "Received file part.");
        uploaded.push(UploadedFile {
            filename,
            content_type,
            data,
        });
    }
    Ok(uploaded)
}
