//! # AI Provider Tests
//!
//! Exercises the HTTP providers against a local mock server.

mod common;

use crate::common::setup_tracing;
use serde_json::json;
use valorie::providers::ai::{local::LocalAiProvider, ollama::OllamaProvider, AiProvider};
use valorie::providers::factory::create_provider;
use valorie::{PromptError, ProviderConfig, ProviderKind};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_completion(content: &str) -> serde_json::Value {
    json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
}

#[tokio::test]
async fn test_local_provider_sends_chat_completion() -> anyhow::Result<()> {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer secret"))
        .and(body_partial_json(json!({
            "model": "gpt-test",
            "temperature": 0.5,
            "max_tokens": 1500,
            "stream": false,
            "messages": [
                {"role": "system", "content": "sys"},
                {"role": "user", "content": "hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("  {\"ok\": true}  ")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = LocalAiProvider::new(
        format!("{}/v1/chat/completions", server.uri()),
        Some("secret".into()),
        Some("gpt-test".into()),
    )?
    .with_temperature(0.5);

    let answer = provider.generate("sys", "hello").await?;
    assert_eq!(answer, "{\"ok\": true}");
    Ok(())
}

#[tokio::test]
async fn test_local_provider_explicit_temperature_overrides_default() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"temperature": 0.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("{}")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = LocalAiProvider::new(server.uri(), None, None)?;
    provider.generate_with_temperature("sys", "user", 0.0).await?;
    Ok(())
}

#[tokio::test]
async fn test_local_provider_surfaces_api_errors() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
        .mount(&server)
        .await;

    let provider = LocalAiProvider::new(server.uri(), None, None)?;
    let err = provider.generate("sys", "user").await.unwrap_err();
    match err {
        PromptError::AiApi(body) => assert_eq!(body, "model overloaded"),
        other => panic!("expected AiApi, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_ollama_provider_requests_json_output() -> anyhow::Result<()> {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "llama-test",
            "prompt": "user text",
            "system": "sys",
            "stream": false,
            "format": "json",
            "options": {"temperature": 0.0}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": " {\"a\": 1}\n", "done": true})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(Some(server.uri()), Some("llama-test".into()))?;
    assert_eq!(provider.generate("sys", "user text").await?, "{\"a\": 1}");
    Ok(())
}

#[tokio::test]
async fn test_factory_builds_working_local_provider() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("pong")))
        .mount(&server)
        .await;

    let config = ProviderConfig {
        provider: ProviderKind::Local,
        api_url: Some(server.uri()),
        ..Default::default()
    };
    let provider = create_provider(&config)?;
    assert_eq!(provider.generate("", "ping").await?, "pong");
    Ok(())
}
