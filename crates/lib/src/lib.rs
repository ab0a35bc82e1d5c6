//! # Valorie
//!
//! Turns uploaded documents into framework metadata. The pipeline extracts text
//! from common formats, chunks it, asks a language model for a metadata record
//! per chunk, repairs and normalizes each answer, and merges the results into a
//! single "seed" record. A second stage turns that record into a framework, and
//! the storage layer persists materials and frameworks in SQLite.

pub mod chunk;
pub mod constants;
pub mod errors;
pub mod extract;
pub mod framework;
pub mod merge;
pub mod preprocess;
pub mod prompts;
pub mod providers;
pub mod repair;
pub mod schema;
pub mod seed;
pub mod storage;
pub mod types;

pub use chunk::{chunk_text, Chunks};
pub use errors::PromptError;
pub use extract::extract_text_from_bytes;
pub use framework::{build_mock_framework, FrameworkGenerator};
pub use merge::merge_maps;
pub use repair::{robust_json_loads, ParseError};
pub use schema::{ensure_open_schema, Record};
pub use seed::{IdMode, SeedExtractor, SeedInput};
pub use types::{ProviderConfig, ProviderKind};
