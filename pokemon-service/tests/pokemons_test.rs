mod common;

use common::{content_type, TestApp, COLLECTION_PATH};
use futures::future::join_all;
use pokemon_service::handlers::pokemons::{ADD_FAILED, LIST_FAILED, NAME_REQUIRED};
use pokemon_service::services::providers::mock::MockTextProvider;
use pokemon_service::services::store::InMemoryStore;
use serde_json::json;

#[tokio::test]
async fn list_on_empty_store_returns_empty_array() {
    let app = TestApp::spawn().await;

    let response = app.get("/my-pokemons").await;

    assert_eq!(response.status().as_u16(), 200);
    assert!(content_type(&response).starts_with("application/json"));
    let body: Vec<String> = response.json().await.unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn added_pokemon_appears_in_list() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/my-pokemons", json!({ "name": "Pikachu" }))
        .await;

    assert_eq!(response.status().as_u16(), 201);
    assert!(content_type(&response).starts_with("text/plain"));
    assert!(response.text().await.unwrap().contains("Pikachu"));

    let listed: Vec<String> = app.get("/my-pokemons").await.json().await.unwrap();
    assert_eq!(listed, vec!["Pikachu"]);
}

#[tokio::test]
async fn list_preserves_insertion_order() {
    let app = TestApp::spawn_with(
        InMemoryStore::with_entries(COLLECTION_PATH, ["Bulbasaur", "Squirtle"]),
        MockTextProvider::replying("unused"),
    )
    .await;

    app.post_json("/my-pokemons", json!({ "name": "Abra" }))
        .await;

    let listed: Vec<String> = app.get("/my-pokemons").await.json().await.unwrap();
    assert_eq!(listed, vec!["Bulbasaur", "Squirtle", "Abra"]);
}

#[tokio::test]
async fn concurrent_adds_each_appear_exactly_once() {
    let app = TestApp::spawn().await;
    let names = ["Pidgey", "Rattata", "Caterpie", "Weedle", "Zubat"];

    let requests = names
        .iter()
        .map(|name| app.post_json("/my-pokemons", json!({ "name": name })));
    for response in join_all(requests).await {
        assert_eq!(response.status().as_u16(), 201);
    }

    let mut listed: Vec<String> = app.get("/my-pokemons").await.json().await.unwrap();
    listed.sort();
    let mut expected: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    expected.sort();
    assert_eq!(listed, expected);
}

#[tokio::test]
async fn add_without_name_is_rejected_before_store() {
    let app = TestApp::spawn().await;

    for body in [json!({}), json!({ "name": "" }), json!({ "name": null })] {
        let response = app.post_json("/my-pokemons", body).await;

        assert_eq!(response.status().as_u16(), 400);
        assert_eq!(response.text().await.unwrap(), NAME_REQUIRED);
    }

    assert_eq!(app.store.push_count(), 0);
    assert_eq!(app.store.read_count(), 0);
}

#[tokio::test]
async fn add_with_unreadable_body_is_rejected_before_store() {
    let app = TestApp::spawn().await;

    let not_json = app.post_raw("/my-pokemons", "Pikachu").await;
    assert_eq!(not_json.status().as_u16(), 400);
    assert_eq!(not_json.text().await.unwrap(), NAME_REQUIRED);

    let wrong_type = app
        .post_json("/my-pokemons", json!({ "name": 25 }))
        .await;
    assert_eq!(wrong_type.status().as_u16(), 400);

    assert_eq!(app.store.push_count(), 0);
}

#[tokio::test]
async fn list_failure_returns_fixed_message() {
    let app = TestApp::spawn().await;
    app.store
        .fail_with("permission denied for service account svc@secret-project");

    let response = app.get("/my-pokemons").await;

    assert_eq!(response.status().as_u16(), 500);
    assert!(content_type(&response).starts_with("text/plain"));
    let body = response.text().await.unwrap();
    assert_eq!(body, LIST_FAILED);
    assert!(!body.contains("secret-project"));
}

#[tokio::test]
async fn add_failure_returns_fixed_message() {
    let app = TestApp::spawn().await;
    app.store.fail_with("quota exceeded");

    let response = app
        .post_json("/my-pokemons", json!({ "name": "Mew" }))
        .await;

    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(response.text().await.unwrap(), ADD_FAILED);
    assert_eq!(app.store.push_count(), 1);
}
