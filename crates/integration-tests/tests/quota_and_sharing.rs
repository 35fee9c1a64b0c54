//! Plan limits and public catalog sharing.
//!
//! These tests require a running server backed by a migrated database.

use reqwest::StatusCode;
use serde_json::{Value, json};

use vitrine_integration_tests::TestClient;

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_free_plan_collection_limit() {
    let (client, _, _) = TestClient::signed_up().await;

    let info: Value = client.get("/protected/my-plan").await.json().await.unwrap();
    assert_eq!(info["plan"]["name"], "free");
    assert_eq!(info["can_create_collection"], true);

    client.create_collection("One").await;
    client.create_collection("Two").await;

    let resp = client
        .post_json("/protected/collections", &json!({ "name": "Three" }))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["limit"], 2);
    assert_eq!(body["current_count"], 2);
    assert_eq!(body["upgrade_required"], true);
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_upgrade_lifts_limit() {
    let (client, _, _) = TestClient::signed_up().await;
    client.create_collection("One").await;
    client.create_collection("Two").await;

    let plans: Vec<Value> = TestClient::new()
        .get("/public/plans")
        .await
        .json()
        .await
        .unwrap();
    let basic = plans.iter().find(|p| p["name"] == "basic").unwrap();

    let resp = client
        .post_json("/protected/upgrade-plan", &json!({ "plan_id": basic["id"] }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post_json("/protected/collections", &json!({ "name": "Three" }))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post_json("/protected/upgrade-plan", &json!({ "plan_id": 999_999 }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_share_is_idempotent_and_resolves() {
    let (client, _, _) = TestClient::signed_up().await;
    let collection = client.create_collection("Shared").await;
    let path = format!("/protected/collections/{}/share", collection["id"]);

    let first: Value = client.post_json(&path, &json!({})).await.json().await.unwrap();
    let second: Value = client.post_json(&path, &json!({})).await.json().await.unwrap();
    let token = first["share_token"].as_str().unwrap();
    assert_eq!(first["share_token"], second["share_token"]);
    assert_eq!(token.len(), 32);

    let resp = TestClient::new()
        .get(&format!("/public/catalogs/{token}"))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let catalog: Value = resp.json().await.unwrap();
    assert_eq!(catalog["collection"]["id"], collection["id"]);
    assert!(catalog["collection"].get("share_token").is_none());
    assert_eq!(catalog["products"].as_array().unwrap().len(), 0);

    let resp = TestClient::new()
        .get(&format!("/public/catalogs/{}", "A".repeat(32)))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_cannot_share_foreign_collection() {
    let (alice, _, _) = TestClient::signed_up().await;
    let (bob, _, _) = TestClient::signed_up().await;
    let collection = bob.create_collection("Private").await;

    let resp = alice
        .post_json(
            &format!("/protected/collections/{}/share", collection["id"]),
            &json!({}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
