//! # Seed Metadata Pipeline
//!
//! Turns a document into a "seed" metadata record: the document is summarized
//! locally, the summary is chunked and sent to a model chunk by chunk, each
//! answer is repaired into a JSON object, and the per-chunk objects are merged.
//! The local findings are then laid over the model's answer.

use crate::chunk::Chunks;
use crate::constants::{DEFAULT_CHUNK_CHARS, DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_SUMMARY_CHARS};
use crate::errors::PromptError;
use crate::extract::extract_text_from_bytes;
use crate::merge::{dedup_values, merge_maps, truncate_chars};
use crate::preprocess::preprocess_document_smart;
use crate::prompts::seed::{enhanced_summary_prompt, seed_user_prompt, SEED_SYSTEM_PROMPT};
use crate::providers::ai::AiProvider;
use crate::repair::robust_json_loads;
use crate::schema::Record;
use chrono::Utc;
use futures::{stream, StreamExt, TryStreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// How a seed record's `doc_id` is assigned when the model did not supply one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdMode {
    /// `doc-` plus 16 hex characters of a random UUID.
    #[default]
    Random,
    /// `doc-` plus the first 16 hex characters of the input's SHA-256.
    Hash,
}

impl FromStr for IdMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("hash") {
            IdMode::Hash
        } else {
            IdMode::Random
        })
    }
}

/// Input to [`SeedExtractor::extract_seed`].
#[derive(Debug, Clone)]
pub enum SeedInput {
    /// Raw document text.
    Text(String),
    /// A document's bytes with the hints used to pick an extractor.
    Document {
        data: Vec<u8>,
        mime: String,
        filename: String,
    },
}

/// Hex SHA-256 digest.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Runs the seed pipeline against one AI provider.
#[derive(Debug, Clone)]
pub struct SeedExtractor {
    provider: Box<dyn AiProvider>,
    chunk_chars: usize,
    call_timeout: Duration,
    concurrency: usize,
    id_mode: IdMode,
}

impl SeedExtractor {
    pub fn new(provider: Box<dyn AiProvider>) -> Self {
        Self {
            provider,
            chunk_chars: DEFAULT_CHUNK_CHARS,
            call_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
            concurrency: 1,
            id_mode: IdMode::default(),
        }
    }

    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars.max(1);
        self
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Allows up to `concurrency` chunk calls in flight. Results are still
    /// merged in document order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_id_mode(mut self, id_mode: IdMode) -> Self {
        self.id_mode = id_mode;
        self
    }

    async fn extract_chunk(&self, index: usize, chunk: &str) -> Result<Record, PromptError> {
        let prompt = seed_user_prompt(&truncate_chars(chunk, self.chunk_chars));
        debug!(chunk = index, chars = chunk.len(), "Sending chunk to model.");

        let raw = tokio::time::timeout(
            self.call_timeout,
            self.provider.generate(SEED_SYSTEM_PROMPT, &prompt),
        )
        .await
        .map_err(|_| PromptError::Timeout(self.call_timeout.as_secs()))??;

        debug!(chunk = index, response = %raw, "Model response received.");
        robust_json_loads(&raw).map_err(|source| PromptError::ChunkParse {
            chunk: index,
            source,
        })
    }

    /// Chunks `text`, extracts a record per chunk and merges them in order.
    ///
    /// Any chunk that times out or cannot be repaired into JSON fails the call.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn extract_seed_from_text(&self, text: &str) -> Result<Record, PromptError> {
        let chunks: Vec<&str> = Chunks::new(text, self.chunk_chars).collect();
        info!(chunks = chunks.len(), concurrency = self.concurrency, "Extracting seed metadata.");

        let records: Vec<Record> = stream::iter(chunks.into_iter().enumerate())
            .map(|(i, chunk)| self.extract_chunk(i, chunk))
            .buffered(self.concurrency)
            .boxed()
            .try_collect()
            .await?;

        Ok(merge_maps(records))
    }

    /// Full seed pipeline: local preprocessing, a compact model prompt, and the
    /// overlay of local findings onto the model's answer.
    #[instrument(skip(self, input))]
    pub async fn extract_seed(&self, input: SeedInput) -> Result<Record, PromptError> {
        let (text, doc_hash) = match input {
            SeedInput::Text(text) => {
                let hash = sha256_hex(text.as_bytes());
                (text, hash)
            }
            SeedInput::Document {
                data,
                mime,
                filename,
            } => {
                let hash = sha256_hex(&data);
                (extract_text_from_bytes(&data, &mime, &filename), hash)
            }
        };

        let pre = preprocess_document_smart(&text, DEFAULT_SUMMARY_CHARS);
        info!(
            original = pre.original_length,
            summary = pre.summary_length,
            ratio = pre.compression_ratio,
            "Document summarized locally."
        );

        let prompt = enhanced_summary_prompt(&pre.summary, &pre.title, &pre.keywords, &pre.entities);
        let mut record = self.extract_seed_from_text(&prompt).await?;

        let title = if pre.title.is_empty() {
            record.get("title").cloned().unwrap_or(Value::Null)
        } else {
            Value::String(pre.title.clone())
        };
        record.insert("title".to_string(), title);

        for (field, local) in [("keywords", &pre.keywords), ("entities", &pre.entities)] {
            let from_model = match record.remove(field) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            let combined = local.iter().cloned().map(Value::String).chain(from_model);
            record.insert(field.to_string(), Value::Array(dedup_values(combined, usize::MAX)));
        }

        if !pre.sections.is_empty() {
            record.insert("sections".to_string(), serde_json::to_value(&pre.sections)?);
        }

        record.insert(
            "_preprocessing".to_string(),
            json!({
                "original_length": pre.original_length,
                "processed_length": pre.summary_length,
                "compression_ratio": pre.compression_ratio,
                "method": "smart_local_preprocessing",
            }),
        );

        let has_doc_id = record
            .get("doc_id")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty());
        if !has_doc_id {
            record.insert("doc_id".to_string(), Value::String(self.doc_id(&doc_hash)));
        }
        record.insert(
            "_generated_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()),
        );

        Ok(record)
    }

    fn doc_id(&self, doc_hash: &str) -> String {
        match self.id_mode {
            IdMode::Hash => format!("doc-{}", &doc_hash[..16]),
            IdMode::Random => {
                let hex = Uuid::new_v4().simple().to_string();
                format!("doc-{}", &hex[..16])
            }
        }
    }
}
