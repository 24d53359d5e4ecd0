use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::Path;

/// Google's public Generative Language endpoint.
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 120;

const DEFAULT_SERVICE_ACCOUNT_PATH: &str = "firebase-service-account-key.json";

#[derive(Debug, Clone)]
pub struct PokemonConfig {
    pub common: core_config::Config,
    pub store: StoreConfig,
    pub gemini: GeminiSettings,
    pub otlp_endpoint: Option<String>,
}

/// Which collection store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firebase,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "firebase" => Ok(StoreBackend::Firebase),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown STORE_BACKEND '{}', expected 'firebase' or 'memory'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Realtime Database root, e.g. `https://<project>.firebaseio.com`.
    pub database_url: String,
    /// Path of the owned collection inside the database.
    pub collection_path: String,
    pub credentials: FirebaseCredentials,
}

#[derive(Debug, Clone)]
pub enum FirebaseCredentials {
    /// Service account key JSON, already read from the environment or a file.
    ServiceAccount(Secret<String>),
    /// Unauthenticated access, only for the local database emulator.
    Emulator,
}

/// The subset of a Google service account key the token exchange needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: Secret<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid service account key: {}", e))
        })
    }
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Secret<String>,
    pub model: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl PokemonConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let backend: StoreBackend = get_env("STORE_BACKEND", Some("firebase"), is_prod)?.parse()?;

        let (database_url, credentials) = match backend {
            StoreBackend::Firebase => (
                get_env("FIREBASE_DATABASE_URL", None, is_prod)?,
                load_credentials(is_prod)?,
            ),
            StoreBackend::Memory => (String::new(), FirebaseCredentials::Emulator),
        };

        Ok(PokemonConfig {
            common: common_config,
            store: StoreConfig {
                backend,
                database_url,
                collection_path: get_env("COLLECTION_PATH", Some("my-pokemons"), is_prod)?,
                credentials,
            },
            gemini: GeminiSettings {
                api_key: Secret::new(get_env("GEMINI_API_KEY", None, is_prod)?),
                model: get_env("GEMINI_MODEL", Some("gemini-2.0-flash"), is_prod)?,
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_GEMINI_API_BASE), is_prod)?,
                timeout_secs: parse_timeout_secs(&get_env(
                    "GEMINI_TIMEOUT_SECS",
                    Some(&DEFAULT_GEMINI_TIMEOUT_SECS.to_string()),
                    is_prod,
                )?)?,
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
        })
    }
}

fn parse_timeout_secs(raw: &str) -> Result<u64, AppError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(AppError::ConfigError(anyhow::anyhow!(
            "Invalid GEMINI_TIMEOUT_SECS '{}': must be greater than zero",
            raw
        ))),
        Ok(secs) => Ok(secs),
        Err(e) => Err(AppError::ConfigError(anyhow::anyhow!(
            "Invalid GEMINI_TIMEOUT_SECS '{}': {}",
            raw,
            e
        ))),
    }
}

fn load_credentials(is_prod: bool) -> Result<FirebaseCredentials, AppError> {
    let inline = env::var("FIREBASE_SERVICE_ACCOUNT")
        .ok()
        .filter(|v| !v.trim().is_empty());
    let path = env::var("FIREBASE_SERVICE_ACCOUNT_PATH")
        .unwrap_or_else(|_| DEFAULT_SERVICE_ACCOUNT_PATH.to_string());
    let emulator = env::var("FIREBASE_EMULATOR")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    resolve_credentials(inline, Path::new(&path), emulator, is_prod)
}

/// Inline key JSON wins over the key file. With neither present, `emulator`
/// selects unauthenticated access, except in production.
fn resolve_credentials(
    inline: Option<String>,
    key_path: &Path,
    emulator: bool,
    is_prod: bool,
) -> Result<FirebaseCredentials, AppError> {
    if let Some(inline) = inline {
        return Ok(FirebaseCredentials::ServiceAccount(Secret::new(inline)));
    }

    match std::fs::read_to_string(key_path) {
        Ok(raw) => Ok(FirebaseCredentials::ServiceAccount(Secret::new(raw))),
        Err(e) if emulator && !is_prod => {
            tracing::warn!(
                path = %key_path.display(),
                error = %e,
                "No service account found, using unauthenticated emulator access"
            );
            Ok(FirebaseCredentials::Emulator)
        }
        Err(e) => Err(AppError::ConfigError(anyhow::anyhow!(
            "Failed to read service account key from {}: {}",
            key_path.display(),
            e
        ))),
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
