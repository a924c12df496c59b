mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn login_requires_email_and_password() -> Result<()> {
    let server = common::spawn_without_db().await?;

    let (status, body) = common::send(server.client.post(server.url("/auth/login")).json(&json!({ "email": "a@b.io" }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = common::send(
        server
            .client
            .post(server.url("/auth/login"))
            .json(&json!({ "email": "a\0@b.io", "password": "whatever" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_issues_token_that_opens_protected_routes() -> Result<()> {
    let Some(server) = common::spawn_with_db().await? else { return Ok(()) };
    let session = server.new_session("login").await?;

    let (status, body) = common::send(
        server
            .client
            .post(server.url("/auth/login"))
            .json(&json!({ "email": session.email.to_uppercase(), "password": "correct horse" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["expires_in"], 3600);
    assert_eq!(body["data"]["user"]["id"], session.account_id.to_string());
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let token = body["data"]["token"].as_str().unwrap_or_default().to_string();
    let (status, body) = common::send(server.get("/users", &token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() -> Result<()> {
    let Some(server) = common::spawn_with_db().await? else { return Ok(()) };
    let session = server.new_session("badpw").await?;

    let (wrong_status, wrong_body) = common::send(
        server
            .client
            .post(server.url("/auth/login"))
            .json(&json!({ "email": session.email, "password": "wrong horse" })),
    )
    .await?;
    let (unknown_status, unknown_body) = common::send(
        server
            .client
            .post(server.url("/auth/login"))
            .json(&json!({ "email": common::unique_email("ghost"), "password": "correct horse" })),
    )
    .await?;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    Ok(())
}

#[tokio::test]
async fn external_identity_accounts_cannot_password_login() -> Result<()> {
    let Some(server) = common::spawn_with_db().await? else { return Ok(()) };
    let email = common::unique_email("clerk");

    let (status, _) = common::send(server.client.post(server.url("/users")).json(&json!({
        "email": email,
        "clerkId": format!("user_{}", uuid::Uuid::new_v4().simple()),
        "firstName": "Ext"
    })))
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = common::send(
        server
            .client
            .post(server.url("/auth/login"))
            .json(&json!({ "email": email, "password": "anything" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
