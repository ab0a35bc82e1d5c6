//! # Shared Constants
//!
//! This module provides a centralized location for constants that are shared across
//! multiple crates in the `valorie` workspace.

/// The default path for the main application SQLite database.
pub const DEFAULT_DB_FILE: &str = "db/valorie.db";

/// Default chunk budget, sized so one chunk plus prompt stays under a 4K-token window.
pub const DEFAULT_CHUNK_CHARS: usize = 2000;

/// Default per-call timeout for metadata extraction, in seconds.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 300;

/// Default per-call timeout for framework generation, in seconds.
pub const DEFAULT_FRAMEWORK_TIMEOUT_SECS: u64 = 180;

/// Maximum summary length produced by local preprocessing.
pub const DEFAULT_SUMMARY_CHARS: usize = 800;

/// Context window assumed when budgeting output tokens for chat completions.
pub const CONTEXT_WINDOW_TOKENS: i64 = 4096;

/// Upload limit for `/materials/upload-file`.
pub const MATERIAL_MAX_BYTES: usize = 2 * 1024 * 1024;

/// Text limit for `/materials/ingest-text`.
pub const MATERIAL_MAX_TEXT_CHARS: usize = 10_000;

/// Per-file upload limit for `/api/frameworks/generate-from-file(s)`.
pub const FRAMEWORK_MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// Most files accepted by `/api/frameworks/generate-from-files`.
pub const FRAMEWORK_MAX_BATCH_FILES: usize = 10;

/// Text limit for `/api/frameworks/generate-from-text`.
pub const FRAMEWORK_MAX_TEXT_CHARS: usize = 50_000;
