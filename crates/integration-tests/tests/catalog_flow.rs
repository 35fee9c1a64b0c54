//! End-to-end account, collection, and product flow.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`vitrine-cli migrate`)
//! - The server running (`cargo run -p vitrine-server`)

use reqwest::{StatusCode, multipart};
use serde_json::{Value, json};

use vitrine_integration_tests::{TestAccount, TestClient, png_part};

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_register_login_and_collections() {
    let anonymous = TestClient::new();
    let account = TestAccount::unique();

    let resp = anonymous
        .post_json("/public/register", &account.registration())
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Same email again
    let mut duplicate = TestAccount::unique();
    duplicate.email.clone_from(&account.email);
    let resp = anonymous
        .post_json("/public/register", &duplicate.registration())
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = anonymous
        .post_json(
            "/public/login",
            &json!({ "email": account.email, "password": "wrong-password" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let mut client = TestClient::new();
    client.login(&account.email, &account.password).await;

    let me: Value = client.get("/protected/me").await.json().await.unwrap();
    let owner_id = me["id"].as_i64().unwrap();

    client.create_collection("Summer").await;
    client.create_collection("Winter").await;

    let resp = anonymous
        .get(&format!("/public/collections?owner_id={owner_id}"))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let public: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(public.len(), 2);
    assert!(public.iter().all(|c| c.get("share_token").is_none()));
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_product_in_foreign_collection_is_rejected() {
    let (alice, _, _) = TestClient::signed_up().await;
    let (bob, _, _) = TestClient::signed_up().await;

    let foreign = bob.create_collection("Bob's").await;
    let form = multipart::Form::new()
        .text("name", "Mug")
        .text("price", "10.50")
        .text("collection_id", foreign["id"].to_string());

    let resp = alice.post_form("/protected/products", form).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid collection_id");
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_delete_collection_removes_its_products() {
    let (client, _, user) = TestClient::signed_up().await;
    let collection = client.create_collection("Doomed").await;

    let form = multipart::Form::new()
        .text("name", "Lamp")
        .text("price", "20")
        .text("collection_id", collection["id"].to_string())
        .part("images", png_part("lamp.png"));
    let resp = client.post_form("/protected/products", form).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let keeper = multipart::Form::new().text("name", "Chair").text("price", "5");
    let resp = client.post_form("/protected/products", keeper).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .delete(&format!("/protected/collections/{}", collection["id"]))
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .delete(&format!("/protected/collections/{}", collection["id"]))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let products: Vec<Value> = TestClient::new()
        .get(&format!("/public/products?owner_id={}", user["id"]))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Chair");
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_product_images_and_cover() {
    let (client, _, _) = TestClient::signed_up().await;

    let form = multipart::Form::new()
        .text("name", "Vase")
        .text("price", "12.90")
        .part("images", png_part("a.png"))
        .part("images", png_part("b.png"));
    let resp = client.post_form("/protected/products", form).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = resp.json().await.unwrap();
    let images = product["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(product["image_url"], images[0]["image_url"]);

    let resp = TestClient::new()
        .get(images[0]["image_url"].as_str().unwrap())
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let form = multipart::Form::new().text("delete_image_ids", images[0]["id"].to_string());
    let resp = client
        .put_form(&format!("/protected/products/{}", product["id"]), form)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["images"].as_array().unwrap().len(), 1);
    assert_eq!(updated["image_url"], images[1]["image_url"]);

    let resp = client
        .delete(&format!("/protected/products/{}", product["id"]))
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

async fn public_product(owner_id: &Value, product_id: &Value) -> Value {
    let products: Vec<Value> = TestClient::new()
        .get(&format!("/public/products?owner_id={owner_id}"))
        .await
        .json()
        .await
        .unwrap();
    products
        .into_iter()
        .find(|p| p["id"] == *product_id)
        .expect("product still listed")
}

fn positions(product: &Value) -> Vec<i64> {
    product["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|image| image["position"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_collection_is_untouched_by_other_owner() {
    let (alice, _, alice_user) = TestClient::signed_up().await;
    let (bob, _, _) = TestClient::signed_up().await;

    let collection = alice.create_collection("Private").await;
    let form = multipart::Form::new()
        .text("name", "Bowl")
        .text("price", "8")
        .text("collection_id", collection["id"].to_string());
    let resp = alice.post_form("/protected/products", form).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = resp.json().await.unwrap();

    let path = format!("/protected/collections/{}", collection["id"]);
    let resp = bob.put_json(&path, &json!({ "name": "Taken" })).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = bob.delete(&path).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Empty update from the owner changes nothing either
    let resp = alice.put_json(&path, &json!({})).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let mine: Vec<Value> = alice.get("/protected/collections").await.json().await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["name"], "Private");
    assert_eq!(mine[0]["updated_at"], collection["updated_at"]);

    let kept = public_product(&alice_user["id"], &product["id"]).await;
    assert_eq!(kept["collection_id"], collection["id"]);
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_product_is_untouched_by_other_owner() {
    let (alice, _, alice_user) = TestClient::signed_up().await;
    let (bob, _, _) = TestClient::signed_up().await;

    let form = multipart::Form::new().text("name", "Teapot").text("price", "15");
    let resp = alice.post_form("/protected/products", form).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = resp.json().await.unwrap();

    let path = format!("/protected/products/{}", product["id"]);
    let form = multipart::Form::new().text("name", "Stolen");
    let resp = bob.put_form(&path, form).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = bob.delete(&path).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = alice.put_form(&path, multipart::Form::new()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let kept = public_product(&alice_user["id"], &product["id"]).await;
    assert_eq!(kept["name"], "Teapot");
    assert_eq!(kept["updated_at"], product["updated_at"]);
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_image_removal_is_scoped_to_product() {
    let (client, _, user) = TestClient::signed_up().await;

    let mut products = Vec::new();
    for name in ["Left", "Right"] {
        let form = multipart::Form::new()
            .text("name", name)
            .text("price", "3")
            .part("images", png_part("side.png"));
        let resp = client.post_form("/protected/products", form).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        products.push(resp.json::<Value>().await.unwrap());
    }
    let foreign_image = products[1]["images"][0]["id"].clone();

    let form = multipart::Form::new()
        .text("name", "Left renamed")
        .text("delete_image_ids[]", foreign_image.to_string());
    let resp = client
        .put_form(&format!("/protected/products/{}", products[0]["id"]), form)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["name"], "Left renamed");
    assert_eq!(updated["images"], products[0]["images"]);

    let right = public_product(&user["id"], &products[1]["id"]).await;
    assert_eq!(right["images"][0]["id"], foreign_image);
    assert_eq!(right["image_url"], products[1]["image_url"]);
}

#[tokio::test]
#[ignore = "Requires running server and PostgreSQL"]
async fn test_added_images_continue_position_sequence() {
    let (client, _, _) = TestClient::signed_up().await;

    let form = multipart::Form::new()
        .text("name", "Rug")
        .text("price", "40")
        .part("images", png_part("a.png"))
        .part("images", png_part("b.png"));
    let resp = client.post_form("/protected/products", form).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = resp.json().await.unwrap();
    assert_eq!(positions(&product), vec![0, 1]);

    let path = format!("/protected/products/{}", product["id"]);
    let form = multipart::Form::new().part("images", png_part("c.png"));
    let resp = client.put_form(&path, form).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(positions(&updated), vec![0, 1, 2]);
    assert_eq!(updated["image_url"], product["image_url"]);

    // New images still go after the highest position once the cover is gone
    let form = multipart::Form::new()
        .text("delete_image_ids[]", updated["images"][0]["id"].to_string())
        .part("images", png_part("d.png"));
    let resp = client.put_form(&path, form).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(positions(&updated), vec![1, 2, 3]);
    assert_eq!(updated["image_url"], updated["images"][0]["image_url"]);
}
