//! Router-level checks without a network listener.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use pokemon_service::services::providers::mock::MockTextProvider;
use pokemon_service::services::store::InMemoryStore;
use pokemon_service::services::PokemonCollection;
use pokemon_service::startup::{build_router, AppState};
use std::sync::Arc;
use tower::util::ServiceExt;

fn state(store: InMemoryStore, provider: MockTextProvider) -> AppState {
    AppState::new(
        PokemonCollection::new(Arc::new(store), "my-pokemons"),
        Arc::new(provider),
    )
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn battle_recommendation_end_to_end() {
    let app = build_router(state(
        InMemoryStore::with_entries("my-pokemons", ["Pikachu", "Charmander"]),
        MockTextProvider::replying("### analysis..."),
    ));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/battle-recommendation")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"wildPokemon":"Geodude"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(body_text(response).await, "### analysis...");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = build_router(state(InMemoryStore::new(), MockTextProvider::replying("x")));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/pokedex")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_method_is_rejected() {
    let app = build_router(state(InMemoryStore::new(), MockTextProvider::replying("x")));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/battle-recommendation")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
