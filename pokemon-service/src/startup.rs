//! Application startup and lifecycle management.
//!
//! Collaborator clients are built once here and shared by every request
//! through [`AppState`].

use crate::config::{FirebaseCredentials, PokemonConfig, ServiceAccountKey, StoreBackend};
use crate::handlers;
use crate::services::init_metrics;
use crate::services::metrics::metrics_middleware;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::TextProvider;
use crate::services::store::{
    FirebaseAuth, FirebaseStore, InMemoryStore, ServiceAccountTokenSource,
};
use crate::services::{CollectionStore, PokemonCollection};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::request_id_middleware;
use service_core::observability::REQUEST_ID_HEADER;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub collection: PokemonCollection,
    pub text_provider: Arc<dyn TextProvider>,
}

impl AppState {
    pub fn new(collection: PokemonCollection, text_provider: Arc<dyn TextProvider>) -> Self {
        Self {
            collection,
            text_provider,
        }
    }

    /// Build the collaborators described by `config`.
    pub fn from_config(config: &PokemonConfig) -> Result<Self, AppError> {
        let store = build_store(config)?;
        let collection = PokemonCollection::new(store, config.store.collection_path.clone());

        let gemini_config = GeminiConfig {
            api_key: config.gemini.api_key.clone(),
            model: config.gemini.model.clone(),
            api_base: config.gemini.api_base.clone(),
            timeout: Duration::from_secs(config.gemini.timeout_secs),
        };
        let text_provider: Arc<dyn TextProvider> = Arc::new(
            GeminiTextProvider::new(gemini_config)
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
        );

        tracing::info!(
            model = %config.gemini.model,
            "Initialized Gemini text provider"
        );

        Ok(Self::new(collection, text_provider))
    }
}

fn build_store(config: &PokemonConfig) -> Result<Arc<dyn CollectionStore>, AppError> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory collection store; data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StoreBackend::Firebase => {
            let client = reqwest::Client::new();

            let auth = match &config.store.credentials {
                FirebaseCredentials::ServiceAccount(raw) => {
                    let key = ServiceAccountKey::from_json(raw.expose_secret())?;
                    let source = ServiceAccountTokenSource::new(key, client.clone())
                        .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
                    tracing::info!(
                        client_email = %source.client_email(),
                        "Using service account credentials for Firebase"
                    );
                    FirebaseAuth::ServiceAccount(source)
                }
                FirebaseCredentials::Emulator => FirebaseAuth::None,
            };

            tracing::info!(
                database_url = %config.store.database_url,
                path = %config.store.collection_path,
                "Initialized Firebase collection store"
            );

            Ok(Arc::new(FirebaseStore::new(
                &config.store.database_url,
                client,
                auth,
            )))
        }
    }
}

/// Routes, CORS, metrics, request ids and per-request tracing spans.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/my-pokemons",
            get(handlers::list_pokemons).post(handlers::add_pokemon),
        )
        .route(
            "/battle-recommendation",
            post(handlers::battle_recommendation),
        )
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    server: Box<dyn Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    /// Build the application with collaborators created from configuration.
    pub async fn build(config: PokemonConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(&config)?;
        Self::with_state(config.common.port, state, shutdown_signal()).await
    }

    /// Bind `port` (0 = random port for testing) and serve `state` until
    /// `shutdown` resolves.
    pub async fn with_state<F>(port: u16, state: AppState, shutdown: F) -> Result<Self, AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        init_metrics();

        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on port {}", port);

        let server = axum::serve(listener, build_router(state))
            .with_graceful_shutdown(shutdown)
            .into_future();

        Ok(Self {
            port,
            server: Box::new(Box::pin(server)),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
