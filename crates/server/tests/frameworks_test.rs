//! # Framework Endpoint Tests
//!
//! Generation from text and files, the owner-scoped CRUD endpoints, markdown
//! export and regeneration under `/api/frameworks`.

mod common;

use anyhow::Result;
use common::{sample_framework, TestApp, FRAMEWORK_MODEL_PATH, METADATA_MODEL_PATH};
use httpmock::Method::POST;
use reqwest::{
    multipart::{Form, Part},
    StatusCode,
};
use serde_json::{json, Value};
use valorie::constants::FRAMEWORK_MAX_TEXT_CHARS;
use valorie_test_utils::MockAiProvider;

const INTAKE_TEXT: &str = "Patient Intake Procedure\n\n\
    Reception staff collect the referral letter and confirm the patient's identity.\n\n\
    A nurse reviews eligibility and records any missing information.";

fn seed_response() -> String {
    json!({
        "title": "Patient Intake Procedure",
        "subject": "Clinic intake",
        "keywords": ["intake", "referral"],
        "entities": ["Reception"],
        "facets": {"process": {"summary": "How patients are admitted", "items": []}},
        "key_values": [{"key": "owner", "value": "Reception"}]
    })
    .to_string()
}

fn file_form(text: &str, filename: &str) -> Form {
    Form::new().part(
        "file",
        Part::bytes(text.as_bytes().to_vec()).file_name(filename.to_string()),
    )
}

/// Uploads `INTAKE_TEXT` as `token`'s user and returns the saved framework id.
async fn generate_saved_framework(app: &TestApp, token: &str) -> Result<String> {
    let response = app
        .client
        .post(app.url("/api/frameworks/generate-from-file?use_global_llm=false"))
        .bearer_auth(token)
        .multipart(file_form(INTAKE_TEXT, "intake.txt"))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    body["framework_id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("no framework_id in {body}"))
}

#[tokio::test]
async fn test_generate_from_text_sends_structure_only() -> Result<()> {
    let app = TestApp::spawn().await?;
    let metadata_mock = app.mock_chat(METADATA_MODEL_PATH, &seed_response());
    let framework_mock = app.mock_chat(
        FRAMEWORK_MODEL_PATH,
        &sample_framework("Patient Intake Review").to_string(),
    );

    let response = app
        .client
        .post(app.url("/api/frameworks/generate-from-text"))
        .json(&json!({"text": INTAKE_TEXT}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["framework_id"], Value::Null);
    assert_eq!(body["framework"]["metadata"]["title"], "Patient Intake Review");
    assert!(body["framework"]["family"].is_string());
    assert_eq!(body["frameworks"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["metadata"]["bypass_local_llm"], true);
    assert_eq!(body["metadata"]["title"], "Patient Intake Procedure");

    framework_mock.assert();
    metadata_mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_generate_from_text_through_seed_pipeline() -> Result<()> {
    let app = TestApp::spawn().await?;
    let metadata_mock = app.mock_chat(METADATA_MODEL_PATH, &seed_response());
    let framework_mock = app.mock_chat(
        FRAMEWORK_MODEL_PATH,
        &sample_framework("Patient Intake Review").to_string(),
    );

    let response = app
        .client
        .post(app.url("/api/frameworks/generate-from-text"))
        .json(&json!({"text": INTAKE_TEXT, "use_global_llm": false}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    let metadata = &body["metadata"];
    assert!(metadata["doc_id"]
        .as_str()
        .is_some_and(|id| id.starts_with("doc-")));
    assert_eq!(
        metadata["_preprocessing"]["method"],
        "smart_local_preprocessing"
    );
    assert!(metadata["keywords"]
        .as_array()
        .is_some_and(|k| k.contains(&json!("referral"))));

    metadata_mock.assert();
    framework_mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_generate_from_text_rejects_bad_input() -> Result<()> {
    let app = TestApp::spawn_without_models().await?;

    let empty = app
        .client
        .post(app.url("/api/frameworks/generate-from-text"))
        .json(&json!({"text": "   "}))
        .send()
        .await?;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    let body: Value = empty.json().await?;
    assert_eq!(body["error"], "Text content is empty");

    let long = app
        .client
        .post(app.url("/api/frameworks/generate-from-text"))
        .json(&json!({"text": "a".repeat(FRAMEWORK_MAX_TEXT_CHARS + 1)}))
        .send()
        .await?;
    assert_eq!(long.status(), StatusCode::BAD_REQUEST);
    let body: Value = long.json().await?;
    assert_eq!(body["error"], "Text too long (max 50,000 characters)");
    Ok(())
}

#[tokio::test]
async fn test_generate_without_models() -> Result<()> {
    let app = TestApp::spawn_without_models().await?;

    let direct = app
        .client
        .post(app.url("/api/frameworks/generate-from-text"))
        .json(&json!({"text": INTAKE_TEXT}))
        .send()
        .await?;
    assert_eq!(direct.status(), StatusCode::OK);
    let body: Value = direct.json().await?;
    let framework = &body["framework"];
    assert!(framework["id"]
        .as_str()
        .is_some_and(|id| id.starts_with("framework-doc-")));
    assert_eq!(framework["title"], "Patient Intake Procedure");
    assert!(framework["family"].is_string());

    let seeded = app
        .client
        .post(app.url("/api/frameworks/generate-from-text"))
        .json(&json!({"text": INTAKE_TEXT, "use_global_llm": false}))
        .send()
        .await?;
    assert_eq!(seeded.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn test_generate_from_file_requires_auth_and_known_type() -> Result<()> {
    let app = TestApp::spawn_without_models().await?;

    let anonymous = app
        .client
        .post(app.url("/api/frameworks/generate-from-file"))
        .multipart(file_form(INTAKE_TEXT, "intake.txt"))
        .send()
        .await?;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let (token, _) = app.register("ada@example.com", "ada").await?;
    let unsupported = app
        .client
        .post(app.url("/api/frameworks/generate-from-file"))
        .bearer_auth(&token)
        .multipart(file_form("a,b\n1,2", "table.csv"))
        .send()
        .await?;
    assert_eq!(unsupported.status(), StatusCode::BAD_REQUEST);
    let body: Value = unsupported.json().await?;
    assert_eq!(
        body["error"],
        "Unsupported file type. Allowed: .doc, .docx, .md, .pdf, .txt"
    );
    Ok(())
}

const TRIAGE_TEXT: &str = "Triage Checklist\n\nSTEP ONE MEASURE VITALS\nRecord pulse and blood pressure.";

fn files_form(files: &[(&str, &str)]) -> Form {
    files.iter().fold(Form::new(), |form, (name, text)| {
        form.part(
            "files",
            Part::bytes(text.as_bytes().to_vec()).file_name(name.to_string()),
        )
    })
}

#[tokio::test]
async fn test_generate_from_files_combines_structure() -> Result<()> {
    let app = TestApp::spawn().await?;
    let (token, _) = app.register("ada@example.com", "ada").await?;
    let metadata_mock = app.mock_chat(METADATA_MODEL_PATH, &seed_response());
    let framework_mock = app.mock_chat(
        FRAMEWORK_MODEL_PATH,
        &sample_framework("Combined Intake Review").to_string(),
    );

    let response = app
        .client
        .post(app.url("/api/frameworks/generate-from-files"))
        .bearer_auth(&token)
        .multipart(files_form(&[
            ("intake.txt", INTAKE_TEXT),
            ("table.csv", "a,b\n1,2"),
            ("triage.md", TRIAGE_TEXT),
        ]))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    let metadata = &body["metadata"];
    assert_eq!(metadata["title"], "Patient Intake Procedure");
    assert_eq!(metadata["source_count"], 2);
    assert_eq!(metadata["source_files"], json!(["intake.txt", "triage.md"]));
    assert_eq!(metadata["extra"]["processing_mode"], "direct");
    assert!(metadata["sections"]
        .as_array()
        .is_some_and(|s| s.iter().any(|sec| sec["source_file"] == "triage.md")));
    assert!(body["framework_id"]
        .as_str()
        .is_some_and(|id| id.starts_with("fw_")));

    let saved: Value = app
        .client
        .get(app.url("/api/frameworks/my-frameworks"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(
        saved.as_array().map(Vec::len),
        body["frameworks"].as_array().map(Vec::len)
    );

    framework_mock.assert();
    metadata_mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_generate_from_files_merges_seed_metadata() -> Result<()> {
    let metadata = MockAiProvider::new();
    metadata.queue_response(&seed_response());
    metadata.queue_response(
        &json!({"title": "Triage", "keywords": ["vitals"], "entities": ["Nursing"]}).to_string(),
    );
    let app = TestApp::spawn_with_providers(Some(metadata.clone()), None).await?;
    let (token, _) = app.register("ada@example.com", "ada").await?;

    let response = app
        .client
        .post(app.url("/api/frameworks/generate-from-files?use_global_llm=false"))
        .bearer_auth(&token)
        .multipart(files_form(&[("intake.txt", INTAKE_TEXT), ("triage.md", TRIAGE_TEXT)]))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    let merged = &body["metadata"];
    assert_eq!(metadata.get_calls().len(), 2);
    assert_eq!(merged["source_count"], 2);
    assert_eq!(merged["merged_from_multiple_files"], true);
    assert_eq!(merged["title"], "Patient Intake Procedure");
    let keywords = merged["keywords"].as_array().cloned().unwrap_or_default();
    assert!(keywords.contains(&json!("referral")));
    assert!(keywords.contains(&json!("vitals")));
    assert!(body["framework_id"]
        .as_str()
        .is_some_and(|id| id.starts_with("fw_")));
    Ok(())
}

#[tokio::test]
async fn test_generate_from_files_rejections() -> Result<()> {
    let app = TestApp::spawn_without_models().await?;

    let anonymous = app
        .client
        .post(app.url("/api/frameworks/generate-from-files"))
        .multipart(files_form(&[("intake.txt", INTAKE_TEXT)]))
        .send()
        .await?;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let (token, _) = app.register("ada@example.com", "ada").await?;
    let cases = [
        (Form::new().text("note", "no files here"), "No files provided"),
        (
            files_form(&[("intake.txt", INTAKE_TEXT); 11]),
            "Too many files (max 10)",
        ),
        (
            files_form(&[("table.csv", "a,b"), ("image.png", "png")]),
            "No valid files",
        ),
    ];
    for (form, expected) in cases {
        let response = app
            .client
            .post(app.url("/api/frameworks/generate-from-files"))
            .bearer_auth(&token)
            .multipart(form)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], expected);
    }
    Ok(())
}

#[tokio::test]
async fn test_saved_framework_lifecycle() -> Result<()> {
    let metadata = MockAiProvider::new();
    metadata.queue_response(&seed_response());
    let app = TestApp::spawn_with_providers(Some(metadata.clone()), None).await?;
    let (token, user_id) = app.register("ada@example.com", "ada").await?;

    let framework_id = generate_saved_framework(&app, &token).await?;
    assert!(framework_id.starts_with("fw_"));
    assert_eq!(metadata.get_calls().len(), 1);

    // Listing
    let list: Value = app
        .client
        .get(app.url("/api/frameworks/my-frameworks"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    let list = list.as_array().cloned().unwrap_or_default();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], framework_id.as_str());
    assert_eq!(list[0]["version"], "1.0.0");

    let by_family: Value = app
        .client
        .get(app.url("/api/frameworks/my-frameworks/by-family"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    let groups = by_family.as_object().cloned().unwrap_or_default();
    assert_eq!(groups.len(), 1);
    let family = list[0]["family"].as_str().unwrap_or_default();
    assert_eq!(groups[family][0]["id"], framework_id.as_str());

    // Detail and binding
    let detail: Value = app
        .client
        .get(app.url(&format!("/api/frameworks/{framework_id}")))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(detail["creator_id"], user_id.as_str());
    assert!(detail.get("raw_framework").is_none());

    let binding: Value = app
        .client
        .get(app.url(&format!("/api/frameworks/{framework_id}/binding")))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(binding["id"], framework_id.as_str());
    assert!(binding["pov"].is_array());

    // Update
    let edited = json!({
        "metadata": {"title": "Edited Intake", "version": "1.1.0"},
        "steps": [{"name": "Welcome", "description": "Greet the patient."}],
        "artefacts": {},
        "risks": [],
        "escalation": []
    });
    let updated = app
        .client
        .put(app.url(&format!("/api/frameworks/{framework_id}")))
        .bearer_auth(&token)
        .json(&edited)
        .send()
        .await?;
    assert_eq!(updated.status(), StatusCode::OK);
    let body: Value = updated.json().await?;
    assert_eq!(body["message"], "Framework updated successfully");
    assert_eq!(body["framework_id"], framework_id.as_str());

    let detail: Value = app
        .client
        .get(app.url(&format!("/api/frameworks/{framework_id}")))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(detail["title"], "Edited Intake");
    assert_eq!(detail["version"], "1.1.0");
    assert_eq!(detail["steps"][0]["name"], "Welcome");

    // Delete
    let deleted = app
        .client
        .delete(app.url(&format!("/api/frameworks/{framework_id}")))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(deleted.status(), StatusCode::OK);
    let body: Value = deleted.json().await?;
    assert_eq!(body["message"], "Framework deleted successfully");

    let gone = app
        .client
        .get(app.url(&format!("/api/frameworks/{framework_id}")))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_frameworks_are_private_to_their_creator() -> Result<()> {
    let metadata = MockAiProvider::new();
    metadata.queue_response(&seed_response());
    let app = TestApp::spawn_with_providers(Some(metadata), None).await?;
    let (owner, _) = app.register("ada@example.com", "ada").await?;
    let (intruder, _) = app.register("eve@example.com", "eve").await?;
    let framework_id = generate_saved_framework(&app, &owner).await?;
    let path = format!("/api/frameworks/{framework_id}");

    let list: Value = app
        .client
        .get(app.url("/api/frameworks/my-frameworks"))
        .bearer_auth(&intruder)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(list, json!([]));

    let get = app.client.get(app.url(&path)).bearer_auth(&intruder).send().await?;
    assert_eq!(get.status(), StatusCode::NOT_FOUND);
    let body: Value = get.json().await?;
    assert_eq!(
        body["error"],
        "Framework not found or you don't have permission to access it"
    );

    let binding = app
        .client
        .get(app.url(&format!("{path}/binding")))
        .bearer_auth(&intruder)
        .send()
        .await?;
    assert_eq!(binding.status(), StatusCode::NOT_FOUND);

    let put = app
        .client
        .put(app.url(&path))
        .bearer_auth(&intruder)
        .json(&json!({"metadata": {"title": "Hijacked"}}))
        .send()
        .await?;
    assert_eq!(put.status(), StatusCode::NOT_FOUND);
    let body: Value = put.json().await?;
    assert_eq!(body["error"], "Framework not found or you don't have permission");

    let delete = app.client.delete(app.url(&path)).bearer_auth(&intruder).send().await?;
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);

    let still_there = app.client.get(app.url(&path)).bearer_auth(&owner).send().await?;
    assert_eq!(still_there.status(), StatusCode::OK);
    let body: Value = still_there.json().await?;
    assert_ne!(body["title"], "Hijacked");
    Ok(())
}

#[tokio::test]
async fn test_export_markdown() -> Result<()> {
    let app = TestApp::spawn_without_models().await?;

    let response = app
        .client
        .post(app.url("/api/frameworks/export-markdown"))
        .json(&sample_framework("Intake Review: Q3"))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(
        headers.get("content-type").and_then(|v| v.to_str().ok()),
        Some("text/markdown; charset=utf-8")
    );
    assert_eq!(
        headers.get("content-disposition").and_then(|v| v.to_str().ok()),
        Some("attachment; filename=Intake_Review__Q3.md")
    );

    let markdown = response.text().await?;
    assert!(markdown.starts_with("# Intake Review: Q3\n"));
    assert!(markdown.contains("## Steps"));
    assert!(markdown.contains("### 1. Collect"));
    assert!(markdown.contains("- Read the intake form"));
    assert!(markdown.contains("**When:** Eligibility unclear **Action:** Ask a supervisor"));
    Ok(())
}

#[tokio::test]
async fn test_regenerate_in_the_cloud() -> Result<()> {
    let app = TestApp::spawn().await?;
    let framework_mock = app.mock_server.mock(|when, then| {
        when.method(POST)
            .path(FRAMEWORK_MODEL_PATH)
            .body_contains("Edited by hand");
        then.status(200).json_body(common::chat_completion(
            &sample_framework("Edited by hand, completed").to_string(),
        ));
    });

    let response = app
        .client
        .post(app.url("/api/frameworks/regenerate"))
        .json(&json!({"framework": {"metadata": {"title": "Edited by hand"}, "steps": []}}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["method"], "cloud");
    assert_eq!(body["message"], "Framework regenerated using cloud processing");
    assert_eq!(
        body["framework"]["metadata"]["title"],
        "Edited by hand, completed"
    );
    framework_mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_regenerate_in_the_cloud_without_a_model() -> Result<()> {
    let app = TestApp::spawn_without_models().await?;

    let response = app
        .client
        .post(app.url("/api/frameworks/regenerate"))
        .json(&json!({"framework": sample_framework("Draft")}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(
        body["error"],
        "AI API key not configured. Please use local processing instead."
    );
    Ok(())
}

#[tokio::test]
async fn test_regenerate_locally() -> Result<()> {
    let metadata = MockAiProvider::new();
    metadata.queue_response(&seed_response());
    let app = TestApp::spawn_with_providers(Some(metadata.clone()), None).await?;

    let response = app
        .client
        .post(app.url("/api/frameworks/regenerate"))
        .json(&json!({"framework": sample_framework("Draft Intake"), "use_local": true}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["method"], "local");
    assert_eq!(body["message"], "Framework regenerated using local processing");
    assert!(body["framework"]["family"].is_string());

    // The edited framework reaches the metadata model flattened to text.
    let calls = metadata.get_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].user_prompt.contains("Draft Intake"));
    Ok(())
}
