use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use turso::Database;
use valorie::errors::PromptError;
use valorie::providers::ai::AiProvider;

// --- Test Setup ---

/// A helper struct to manage database creation for each test.
pub struct TestSetup {
    pub db: Database,
}

impl TestSetup {
    /// Creates a new, isolated in-memory database and initializes the schema.
    pub async fn new() -> Result<Self> {
        let db = turso::Builder::new_local(":memory:").build().await?;
        let conn = db.connect()?;

        for statement in valorie::providers::db::sqlite::sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ()).await?;
        }

        Ok(Self { db })
    }
}

// --- Mock AI Provider ---

/// One recorded model call.
#[derive(Clone, Debug, PartialEq)]
pub struct MockCall {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: Option<f32>,
}

#[derive(Clone, Debug, Default)]
pub struct MockAiProvider {
    queued: Arc<Mutex<VecDeque<String>>>,
    responses: Arc<Mutex<HashMap<String, String>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    delay: Option<Duration>,
    key_delays: Arc<Mutex<HashMap<String, Duration>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-programs a response for any call whose system or user prompt
    /// contains `key`.
    pub fn add_response(&self, key: &str, response: &str) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(key.to_string(), response.to_string());
    }

    /// Queues a response. Queued responses are served first, in order.
    pub fn queue_response(&self, response: &str) {
        self.queued.lock().unwrap().push_back(response.to_string());
    }

    /// Makes every call sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes calls whose prompts contain `key` sleep for `delay` before
    /// answering. Takes precedence over [`MockAiProvider::with_delay`].
    pub fn add_delay(&self, key: &str, delay: Duration) {
        self.key_delays
            .lock()
            .unwrap()
            .insert(key.to_string(), delay);
    }

    /// Retrieves the recorded calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn respond(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: Option<f32>,
    ) -> Result<String, PromptError> {
        self.calls.lock().unwrap().push(MockCall {
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
            temperature,
        });

        let key_delay = self
            .key_delays
            .lock()
            .unwrap()
            .iter()
            .find(|(key, _)| {
                system_prompt.contains(key.as_str()) || user_prompt.contains(key.as_str())
            })
            .map(|(_, delay)| *delay);
        if let Some(delay) = key_delay.or(self.delay) {
            tokio::time::sleep(delay).await;
        }

        if let Some(response) = self.queued.lock().unwrap().pop_front() {
            return Ok(response);
        }

        let responses = self.responses.lock().unwrap();
        for (key, response) in responses.iter() {
            if system_prompt.contains(key) || user_prompt.contains(key) {
                return Ok(response.clone());
            }
        }

        Err(PromptError::AiApi(format!(
            "MockAiProvider: No response programmed for system prompt. Got: '{system_prompt}'"
        )))
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PromptError> {
        self.respond(system_prompt, user_prompt, None).await
    }

    async fn generate_with_temperature(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, PromptError> {
        self.respond(system_prompt, user_prompt, Some(temperature))
            .await
    }
}

// --- Test-Specific Helpers ---
#[cfg(feature = "pdf")]
pub mod helpers {
    use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};

    /// Builds a PDF with one Helvetica text line per page.
    pub fn generate_test_pdf(pages: &[&str]) -> Vec<u8> {
        let mut pdf = Pdf::new();
        let catalog_id = Ref::new(1);
        let page_tree_id = Ref::new(2);
        let font_id = Ref::new(3);
        let font_name = Name(b"F1");

        // Each page takes two ids: the page object and its content stream.
        let page_ids: Vec<Ref> = (0..pages.len())
            .map(|i| Ref::new(4 + 2 * i as i32))
            .collect();

        pdf.catalog(catalog_id).pages(page_tree_id);
        pdf.pages(page_tree_id)
            .kids(page_ids.iter().copied())
            .count(pages.len() as i32);
        pdf.type1_font(font_id).base_font(Name(b"Helvetica"));

        for (text, page_id) in pages.iter().zip(&page_ids) {
            let content_id = Ref::new(page_id.get() + 1);
            let mut page = pdf.page(*page_id);
            page.media_box(Rect::new(0.0, 0.0, 595.0, 842.0));
            page.parent(page_tree_id);
            page.contents(content_id);
            page.resources().fonts().pair(font_name, font_id);
            page.finish();

            let mut content = Content::new();
            content.begin_text();
            content.set_font(font_name, 14.0);
            content.next_line(72.0, 760.0);
            content.show(Str(text.as_bytes()));
            content.end_text();
            pdf.stream(content_id, &content.finish());
        }

        pdf.finish()
    }
}
