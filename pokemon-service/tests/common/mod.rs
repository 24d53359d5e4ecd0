use pokemon_service::services::providers::mock::MockTextProvider;
use pokemon_service::services::store::InMemoryStore;
use pokemon_service::services::PokemonCollection;
use pokemon_service::startup::{AppState, Application};
use std::sync::Arc;

pub const COLLECTION_PATH: &str = "my-pokemons";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<InMemoryStore>,
    pub provider: Arc<MockTextProvider>,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn the service on a random port with an empty store and a provider
    /// that answers with a fixed reply.
    pub async fn spawn() -> Self {
        Self::spawn_with(InMemoryStore::new(), MockTextProvider::replying("mock reply")).await
    }

    pub async fn spawn_with(store: InMemoryStore, provider: MockTextProvider) -> Self {
        let store = Arc::new(store);
        let provider = Arc::new(provider);

        let state = AppState::new(
            PokemonCollection::new(store.clone(), COLLECTION_PATH),
            provider.clone(),
        );

        let app = Application::with_state(0, state, std::future::pending())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client.get(&address).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            store,
            provider,
            client,
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .header("content-type", "text/plain")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

pub fn content_type(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
