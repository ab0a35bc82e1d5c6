//! # Repository Tests
//!
//! Frameworks and materials against an in-memory database.

mod common;

use crate::common::setup_tracing;
use serde_json::json;
use valorie::extract::MaterialKind;
use valorie::providers::db::sqlite::SqliteProvider;
use valorie::storage::frameworks::{
    delete_framework, get_framework, group_by_family, insert_framework,
    list_frameworks_by_creator, update_framework,
};
use valorie::storage::materials::{get_material, insert_material, material_metadata, NewMaterial};
use valorie_test_utils::helpers::generate_test_pdf;
use valorie_test_utils::TestSetup;

fn editor_framework(title: &str, family: &str) -> serde_json::Value {
    json!({
        "metadata": {"title": title},
        "steps": [{"name": "Scope"}],
        "artefacts": {"primary": {"name": "Checklist"}, "additional": [
            {"name": "Register", "description": "x".repeat(150)},
            {"name": "Brief", "description": "short"},
            {"name": "Deck"},
            {"name": "Fourth"}
        ]},
        "risks": [],
        "family": family,
        "confidence": 87.5,
        "pov": ["Evidence first", "Small steps"],
    })
}

#[tokio::test]
async fn test_insert_applies_defaults() -> anyhow::Result<()> {
    setup_tracing();
    let setup = TestSetup::new().await?;

    let stored = insert_framework(&setup.db, &json!({}), &json!({"doc_id": "d"}), "user_a").await?;
    assert!(stored.id.starts_with("fw_"));
    assert_eq!(stored.id.len(), 15);
    assert_eq!(stored.title, "Untitled Framework");
    assert_eq!(stored.version, "1.0.0");
    assert_eq!(stored.family, "Other");
    assert_eq!(stored.confidence, 0.0);
    assert_eq!(stored.pov, None);
    assert_eq!(stored.steps, json!([]));
    assert_eq!(stored.artefacts, json!({}));
    assert_eq!(stored.raw_metadata, json!({"doc_id": "d"}));
    assert_eq!(stored.created_at, stored.updated_at);

    let titled = insert_framework(&setup.db, &json!({"title": "Top Level"}), &json!({}), "user_a").await?;
    assert_eq!(titled.title, "Top Level");
    Ok(())
}

#[tokio::test]
async fn test_frameworks_are_owner_scoped() -> anyhow::Result<()> {
    let setup = TestSetup::new().await?;
    let fw = editor_framework("Audit Plan", "Compliance");
    let stored = insert_framework(&setup.db, &fw, &json!({}), "owner").await?;

    assert_eq!(stored.title, "Audit Plan");
    assert_eq!(stored.family, "Compliance");
    assert_eq!(stored.confidence, 87.5);
    assert_eq!(stored.pov, Some(json!(["Evidence first", "Small steps"])));
    assert_eq!(stored.binding()["pov"], json!(["Evidence first", "Small steps"]));

    assert!(get_framework(&setup.db, &stored.id, "intruder").await?.is_none());
    assert!(!delete_framework(&setup.db, &stored.id, "intruder").await?);
    assert!(!update_framework(&setup.db, &stored.id, "intruder", &json!({})).await?);
    assert!(list_frameworks_by_creator(&setup.db, "intruder").await?.is_empty());

    assert!(delete_framework(&setup.db, &stored.id, "owner").await?);
    assert!(get_framework(&setup.db, &stored.id, "owner").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_update_keeps_title_unless_given() -> anyhow::Result<()> {
    let setup = TestSetup::new().await?;
    let stored = insert_framework(&setup.db, &editor_framework("Original", "Legal"), &json!({}), "u").await?;

    let edit = json!({"metadata": {"version": "2.0"}, "steps": [{"name": "New"}], "risks": [{"title": "R"}]});
    assert!(update_framework(&setup.db, &stored.id, "u", &edit).await?);

    let updated = get_framework(&setup.db, &stored.id, "u").await?.unwrap();
    assert_eq!(updated.title, "Original");
    assert_eq!(updated.version, "2.0");
    assert_eq!(updated.steps, json!([{"name": "New"}]));
    assert_eq!(updated.risks, json!([{"title": "R"}]));
    assert_eq!(updated.escalation, json!([]));
    assert_eq!(updated.artefacts, json!({}));
    assert_eq!(updated.family, "Legal");
    assert!(updated.updated_at >= updated.created_at);
    Ok(())
}

#[tokio::test]
async fn test_listing_is_newest_first_and_groups_by_family() -> anyhow::Result<()> {
    let setup = TestSetup::new().await?;
    let first = insert_framework(&setup.db, &editor_framework("One", "Legal"), &json!({}), "u").await?;
    let second = insert_framework(&setup.db, &editor_framework("Two", "Sales"), &json!({}), "u").await?;
    let third = insert_framework(&setup.db, &editor_framework("Three", "Legal"), &json!({}), "u").await?;
    insert_framework(&setup.db, &editor_framework("Other user", "Legal"), &json!({}), "v").await?;

    let listed = list_frameworks_by_creator(&setup.db, "u").await?;
    let ids: Vec<&str> = listed.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec![third.id.as_str(), second.id.as_str(), first.id.as_str()]);

    let summary = listed[0].summary();
    assert_eq!(summary.preview_artefacts.len(), 3);
    assert_eq!(summary.preview_artefacts[0]["description"].as_str().map(str::len), Some(100));
    assert_eq!(summary.preview_artefacts[2], json!({"name": "Deck", "description": ""}));

    let grouped = group_by_family(&listed);
    assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["Legal", "Sales"]);
    let legal: Vec<&str> = grouped["Legal"].iter().map(|s| s.title.as_str()).collect();
    assert_eq!(legal, vec!["Three", "One"]);
    Ok(())
}

#[tokio::test]
async fn test_material_round_trip() -> anyhow::Result<()> {
    let setup = TestSetup::new().await?;
    let stored = insert_material(
        &setup.db,
        NewMaterial {
            kind: MaterialKind::Text,
            metadata: json!({"source": "paste", "chars": 5}),
            filename: None,
            mime: Some("text/plain".into()),
            size_bytes: 5,
            owner_id: None,
        },
    )
    .await?;

    assert!(stored.id.starts_with("mat_"));
    assert_eq!(stored.id.len(), 12);
    assert_eq!(stored.kind, "text");
    assert_eq!(stored.status, "available");
    assert_eq!(stored.filename, None);

    let fetched = get_material(&setup.db, &stored.id).await?.unwrap();
    assert_eq!(fetched, stored);
    assert_eq!(serde_json::to_value(&fetched)?["type"], json!("text"));
    assert!(get_material(&setup.db, "mat_missing").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_frameworks_survive_reopening_the_database_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("valorie.db");
    let path = path.to_string_lossy();

    let id = {
        let provider = SqliteProvider::new(&path).await?;
        provider.initialize_schema().await?;
        let fw = editor_framework("Persisted Plan", "Operations");
        insert_framework(&provider.db, &fw, &json!({}), "user_a").await?.id
    };

    let reopened = SqliteProvider::new(&path).await?;
    reopened.initialize_schema().await?;
    let fetched = get_framework(&reopened.db, &id, "user_a").await?;
    assert_eq!(fetched.map(|f| f.title), Some("Persisted Plan".to_string()));
    Ok(())
}

#[test]
fn test_pdf_material_counts_pages_from_the_page_tree() {
    let pdf = generate_test_pdf(&["Quarterly intake review", "Second page notes"]);
    let meta = material_metadata(MaterialKind::Pdf, "application/pdf", ".pdf", &pdf);

    assert_eq!(meta["pages"], json!(2));
    assert_eq!(meta["words"], json!(6));
    assert!(meta["preview"]
        .as_str()
        .is_some_and(|p| p.contains("Quarterly intake review")));

    let single = generate_test_pdf(&["Only page"]);
    let meta = material_metadata(MaterialKind::Pdf, "application/pdf", ".pdf", &single);
    assert_eq!(meta["pages"], json!(1));
}
