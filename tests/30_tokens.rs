mod common;

use anyhow::Result;
use chrono::Utc;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn create_user(client: &reqwest::Client, base_url: &str, phone: &str) -> Result<()> {
    client
        .post(format!("{}/users", base_url))
        .json(&json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "phone": phone,
            "password": "hunter2",
            "tosAgreement": true
        }))
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

#[tokio::test]
async fn correct_credentials_mint_a_token_that_expires_in_the_future() -> Result<()> {
    let server = common::spawn().await?;
    let client = reqwest::Client::new();
    create_user(&client, &server.base_url, "5551110000").await?;

    let res = client
        .post(format!("{}/tokens", server.base_url))
        .json(&json!({"phone": "5551110000", "password": "hunter2"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["phone"], "5551110000");
    assert_eq!(body["id"].as_str().map(str::len), Some(20));
    assert!(body["expires"].as_i64().expect("expires") > Utc::now().timestamp_millis());
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_rejected() -> Result<()> {
    let server = common::spawn().await?;
    let client = reqwest::Client::new();
    create_user(&client, &server.base_url, "5551112222").await?;

    let res = client
        .post(format!("{}/tokens", server.base_url))
        .json(&json!({"phone": "5551112222", "password": "not-the-password"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn token_lifecycle_get_extend_delete() -> Result<()> {
    let server = common::spawn().await?;
    let client = reqwest::Client::new();
    create_user(&client, &server.base_url, "5551113333").await?;

    let minted = client
        .post(format!("{}/tokens", server.base_url))
        .json(&json!({"phone": "5551113333", "password": "hunter2"}))
        .send()
        .await?
        .json::<Value>()
        .await?;
    let id = minted["id"].as_str().expect("token id");
    let expires = minted["expires"].as_i64().expect("expires");

    // get
    let res = client
        .get(format!("{}/tokens?id={}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["id"], id);

    // extend pushes the expiry forward
    let res = client
        .put(format!("{}/tokens", server.base_url))
        .json(&json!({"id": id, "extend": true}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let extended = client
        .get(format!("{}/tokens?id={}", server.base_url, id))
        .send()
        .await?
        .json::<Value>()
        .await?;
    assert!(extended["expires"].as_i64().expect("expires") >= expires);

    // extending without the flag is refused
    let res = client
        .put(format!("{}/tokens", server.base_url))
        .json(&json!({"id": id}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // delete, then the record is gone
    let res = client
        .delete(format!("{}/tokens?id={}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = client
        .get(format!("{}/tokens?id={}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn token_ids_must_be_twenty_characters() -> Result<()> {
    let server = common::spawn().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/tokens?id=short", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn a_revoked_token_no_longer_authorizes() -> Result<()> {
    let server = common::spawn().await?;
    let client = reqwest::Client::new();
    create_user(&client, &server.base_url, "5551114444").await?;

    let minted = client
        .post(format!("{}/tokens", server.base_url))
        .json(&json!({"phone": "5551114444", "password": "hunter2"}))
        .send()
        .await?
        .json::<Value>()
        .await?;
    let id = minted["id"].as_str().expect("token id");

    client
        .delete(format!("{}/tokens?id={}", server.base_url, id))
        .send()
        .await?
        .error_for_status()?;

    let res = client
        .get(format!("{}/users?phone=5551114444", server.base_url))
        .header("token", id)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}
