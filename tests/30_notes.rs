mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use notes_api::database::models::{ChecklistItemInput, NoteInput};
use notes_api::database::repository::notes;

fn groceries() -> Value {
    json!({
        "title": "Groceries",
        "description": "for the weekend",
        "isChecklist": true,
        "isPinned": true,
        "checklistItems": [
            { "text": "milk", "isChecked": true },
            { "text": "eggs", "isChecked": false },
            { "text": "bread" }
        ],
        "reminders": [
            { "time": "2031-05-01T09:00:00Z" },
            { "time": "2031-05-02T18:30:00Z" }
        ],
        "attachments": [
            { "fileName": "list.pdf", "url": "http://blobs.test/user-x/list.pdf", "contentType": "application/pdf" }
        ]
    })
}

fn times(note: &Value) -> Vec<String> {
    note["reminders"]
        .as_array()
        .map(|rs| rs.iter().filter_map(|r| r["time"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn created_note_round_trips_with_children() -> Result<()> {
    let Some(server) = common::spawn_with_db().await? else { return Ok(()) };
    let session = server.new_session("notes").await?;

    let (status, created) = common::send(server.post("/notes", &session.token).json(&groceries())).await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["data"]["id"].as_str().unwrap_or_default().to_string();
    assert_eq!(created["data"]["createdBy"], session.account_id.to_string());

    let (status, fetched) = common::send(server.get(&format!("/notes/{}", id), &session.token)).await?;
    assert_eq!(status, StatusCode::OK);
    let note = &fetched["data"];

    assert_eq!(note["title"], "Groceries");
    assert_eq!(note["isPinned"], true);
    assert_eq!(note["isArchived"], false);

    let items = note["checklistItems"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 3);
    let texts: Vec<_> = items.iter().map(|i| i["text"].as_str().unwrap_or_default()).collect();
    assert_eq!(texts, vec!["milk", "eggs", "bread"]);
    let checked: Vec<_> = items.iter().map(|i| i["isChecked"].as_bool().unwrap_or_default()).collect();
    assert_eq!(checked, vec![true, false, false]);

    let reminder_times = times(note);
    assert_eq!(reminder_times.len(), 2);
    assert!(reminder_times[0].starts_with("2031-05-01T09:00:00"));
    assert!(reminder_times[1].starts_with("2031-05-02T18:30:00"));

    assert_eq!(note["attachments"][0]["fileName"], "list.pdf");
    assert_eq!(note["attachments"][0]["contentType"], "application/pdf");
    Ok(())
}

#[tokio::test]
async fn update_replaces_all_children() -> Result<()> {
    let Some(server) = common::spawn_with_db().await? else { return Ok(()) };
    let session = server.new_session("replace").await?;

    let (_, created) = common::send(server.post("/notes", &session.token).json(&groceries())).await?;
    let id = created["data"]["id"].as_str().unwrap_or_default().to_string();

    let (status, updated) = common::send(
        server
            .put(&format!("/notes/{}", id), &session.token)
            .json(&json!({ "title": "Groceries (done)", "isArchived": true, "checklistItems": [{ "text": "only this" }] })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["checklistItems"].as_array().map(Vec::len), Some(1));

    let (_, fetched) = common::send(server.get(&format!("/notes/{}", id), &session.token)).await?;
    let note = &fetched["data"];
    assert_eq!(note["title"], "Groceries (done)");
    assert_eq!(note["isArchived"], true);
    assert_eq!(note["isPinned"], false);
    assert_eq!(note["checklistItems"][0]["text"], "only this");
    assert_eq!(note["checklistItems"].as_array().map(Vec::len), Some(1));
    assert!(times(note).is_empty());
    assert_eq!(note["attachments"].as_array().map(Vec::len), Some(0));

    let (status, _) = common::send(server.put(&format!("/notes/{}", id), &session.token).json(&json!({ "title": "empty" }))).await?;
    assert_eq!(status, StatusCode::OK);
    let (_, fetched) = common::send(server.get(&format!("/notes/{}", id), &session.token)).await?;
    assert_eq!(fetched["data"]["checklistItems"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn other_accounts_get_404() -> Result<()> {
    let Some(server) = common::spawn_with_db().await? else { return Ok(()) };
    let owner = server.new_session("owner").await?;
    let stranger = server.new_session("stranger").await?;

    let (_, created) = common::send(server.post("/notes", &owner.token).json(&groceries())).await?;
    let path = format!("/notes/{}", created["data"]["id"].as_str().unwrap_or_default());

    let (status, body) = common::send(server.get(&path, &stranger.token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["data"].is_null());
    assert_eq!(body["error"], "Note not found");

    // Ownership is checked before the body, so even an invalid body is a 404.
    let (status, _) = common::send(server.put(&path, &stranger.token).json(&json!({ "title": "x".repeat(300) }))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::send(server.delete(&path, &stranger.token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = common::send(server.get("/notes", &stranger.token)).await?;
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(0));

    let (status, _) = common::send(server.get(&path, &owner.token)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn delete_removes_note_and_children() -> Result<()> {
    let Some(server) = common::spawn_with_db().await? else { return Ok(()) };
    let session = server.new_session("delete").await?;

    let (_, created) = common::send(server.post("/notes", &session.token).json(&groceries())).await?;
    let path = format!("/notes/{}", created["data"]["id"].as_str().unwrap_or_default());

    let (status, _) = common::send(server.delete(&path, &session.token)).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::send(server.get(&path, &session.token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = common::send(server.get("/notes", &session.token)).await?;
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(0));

    let (status, _) = common::send(server.delete(&path, &session.token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn bad_ids_and_bodies_are_400() -> Result<()> {
    let Some(server) = common::spawn_with_db().await? else { return Ok(()) };
    let session = server.new_session("bad").await?;

    let (status, body) = common::send(server.get("/notes/42", &session.token)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid note ID");

    let (status, body) = common::send(server.post("/notes", &session.token).json(&json!({ "title": "x".repeat(256) }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["title"].is_string());

    let (status, body) = common::send(
        server
            .post("/notes", &session.token)
            .json(&json!({ "title": "t", "checklistItems": [{ "text": "" }] })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["checklistItems[0].text"].is_string());

    let (status, _) = common::send(
        server
            .post("/notes", &session.token)
            .json(&json!({ "title": "t", "reminders": [{ "time": "tomorrow" }] })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn list_puts_pinned_first() -> Result<()> {
    let Some(server) = common::spawn_with_db().await? else { return Ok(()) };
    let session = server.new_session("order").await?;

    common::send(server.post("/notes", &session.token).json(&json!({ "title": "pinned", "isPinned": true }))).await?;
    common::send(server.post("/notes", &session.token).json(&json!({ "title": "later" }))).await?;

    let (_, listed) = common::send(server.get("/notes", &session.token)).await?;
    let titles: Vec<_> = listed["data"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .map(|n| n["title"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(titles, vec!["pinned", "later"]);
    Ok(())
}

#[tokio::test]
async fn nul_in_child_text_is_400_and_creates_nothing() -> Result<()> {
    let Some(server) = common::spawn_with_db().await? else { return Ok(()) };
    let session = server.new_session("n-nul").await?;

    let (status, body) = common::send(server.post("/notes", &session.token).json(&json!({
        "title": "poison",
        "checklistItems": [{ "text": "a\0b" }]
    })))
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["checklistItems[0].text"].is_string());

    let (_, listed) = common::send(server.get("/notes", &session.token)).await?;
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(0));
    Ok(())
}

/// Postgres refuses NUL in text, so an unvalidated item fails after the note row exists.
fn poisoned_input(title: &str) -> NoteInput {
    NoteInput {
        title: title.to_string(),
        checklist_items: vec![ChecklistItemInput { text: "a\0b".to_string(), is_checked: false }],
        ..Default::default()
    }
}

#[tokio::test]
async fn failed_child_insert_rolls_back_create() -> Result<()> {
    let Some(server) = common::spawn_with_db().await? else { return Ok(()) };
    let session = server.new_session("n-rollback").await?;

    let input = poisoned_input("never stored");
    let mut tx = server.db.begin().await?;
    let note = notes::create(&mut *tx, session.account_id, &input).await?;
    assert!(notes::insert_children(&mut *tx, note, &input).await.is_err());
    drop(tx);

    let (_, listed) = common::send(server.get("/notes", &session.token)).await?;
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn failed_child_insert_rolls_back_update() -> Result<()> {
    let Some(server) = common::spawn_with_db().await? else { return Ok(()) };
    let session = server.new_session("n-rollback-put").await?;

    let (_, created) = common::send(server.post("/notes", &session.token).json(&groceries())).await?;
    let id: uuid::Uuid = created["data"]["id"].as_str().unwrap_or_default().parse()?;

    let input = poisoned_input("renamed");
    let mut tx = server.db.begin().await?;
    let note = notes::update(&mut *tx, id, session.account_id, &input).await?;
    notes::delete_children(&mut *tx, id).await?;
    assert!(notes::insert_children(&mut *tx, note, &input).await.is_err());
    drop(tx);

    let (status, fetched) = common::send(server.get(&format!("/notes/{}", id), &session.token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["title"], "Groceries");
    assert_eq!(fetched["data"]["checklistItems"].as_array().map(Vec::len), Some(3));
    assert_eq!(fetched["data"]["reminders"].as_array().map(Vec::len), Some(2));
    Ok(())
}
