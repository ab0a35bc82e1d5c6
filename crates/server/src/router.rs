use super::{handlers, state::AppState};
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use valorie::constants::{FRAMEWORK_MAX_BATCH_FILES, FRAMEWORK_MAX_FILE_BYTES, MATERIAL_MAX_BYTES};

// Room for multipart framing, so oversized files reach the handler's own
// size check instead of failing inside the body stream.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register_handler))
        .route("/login", post(handlers::login_handler))
        .route("/me", get(handlers::me_handler))
        .route("/check-email/{email}", get(handlers::check_email_handler))
        .route(
            "/check-username/{username}",
            get(handlers::check_username_handler),
        )
        .route("/logout", post(handlers::logout_handler))
}

fn material_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(handlers::ping_handler))
        .route(
            "/upload-file",
            post(handlers::upload_file_handler)
                .layer(DefaultBodyLimit::max(MATERIAL_MAX_BYTES + MULTIPART_OVERHEAD_BYTES)),
        )
        .route("/ingest-text", post(handlers::ingest_text_handler))
        .route("/{id}", get(handlers::get_material_handler))
}

fn framework_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/generate-from-text",
            post(handlers::generate_from_text_handler),
        )
        .route(
            "/generate-from-file",
            post(handlers::generate_from_file_handler).layer(DefaultBodyLimit::max(
                FRAMEWORK_MAX_FILE_BYTES + MULTIPART_OVERHEAD_BYTES,
            )),
        )
        .route(
            "/generate-from-files",
            post(handlers::generate_from_files_handler).layer(DefaultBodyLimit::max(
                FRAMEWORK_MAX_BATCH_FILES * FRAMEWORK_MAX_FILE_BYTES + MULTIPART_OVERHEAD_BYTES,
            )),
        )
        .route("/my-frameworks", get(handlers::my_frameworks_handler))
        .route(
            "/my-frameworks/by-family",
            get(handlers::my_frameworks_by_family_handler),
        )
        .route("/export-markdown", post(handlers::export_markdown_handler))
        .route("/regenerate", post(handlers::regenerate_handler))
        .route(
            "/{id}",
            get(handlers::get_framework_handler)
                .put(handlers::update_framework_handler)
                .delete(handlers::delete_framework_handler),
        )
        .route("/{id}/binding", get(handlers::framework_binding_handler))
}

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .nest("/api/users", user_routes())
        .nest("/materials", material_routes())
        .nest("/api/frameworks", framework_routes())
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
