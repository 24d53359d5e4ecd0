//! OAuth2 access tokens for the realtime database.
//!
//! A Google service account authenticates by signing a short-lived RS256
//! assertion with its private key and exchanging it at the account's token
//! endpoint. The resulting bearer token is reused until shortly before it
//! expires.

use super::StoreError;
use crate::config::ServiceAccountKey;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use tokio::sync::Mutex;

const DATABASE_SCOPES: &str =
    "https://www.googleapis.com/auth/firebase.database https://www.googleapis.com/auth/userinfo.email";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertion lifetime; Google caps it at one hour.
const ASSERTION_TTL_SECS: i64 = 3600;

/// Tokens are refreshed this long before their stated expiry.
const REFRESH_MARGIN_SECS: i64 = 60;

/// How requests to the database authenticate.
pub enum FirebaseAuth {
    ServiceAccount(ServiceAccountTokenSource),
    /// No credentials; only the local emulator accepts this.
    None,
}

impl FirebaseAuth {
    pub async fn bearer_token(&self) -> Result<Option<Secret<String>>, StoreError> {
        match self {
            FirebaseAuth::ServiceAccount(source) => source.access_token().await.map(Some),
            FirebaseAuth::None => Ok(None),
        }
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_TTL_SECS
}

struct CachedToken {
    token: Secret<String>,
    refresh_at: DateTime<Utc>,
}

pub struct ServiceAccountTokenSource {
    client_email: String,
    token_uri: String,
    signing_key: EncodingKey,
    client: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(key: ServiceAccountKey, client: Client) -> Result<Self, StoreError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
            .map_err(|e| StoreError::Auth(format!("Invalid service account private key: {}", e)))?;

        Ok(Self {
            client_email: key.client_email,
            token_uri: key.token_uri,
            signing_key,
            client,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// A valid access token, exchanging a fresh assertion when the cached one
    /// is missing or about to expire. Concurrent callers wait on one exchange.
    pub async fn access_token(&self) -> Result<Secret<String>, StoreError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Utc::now() < token.refresh_at {
                return Ok(token.token.clone());
            }
        }

        let fresh = self.exchange().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, StoreError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: DATABASE_SCOPES,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_TTL_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| StoreError::Auth(format!("Failed to sign assertion: {}", e)))
    }

    async fn exchange(&self) -> Result<CachedToken, StoreError> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;

        tracing::debug!(client_email = %self.client_email, "Requesting database access token");

        let response = self
            .client
            .traced_post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!(
                "Token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Auth(format!("Malformed token response: {}", e)))?;

        let lifetime = (token.expires_in - REFRESH_MARGIN_SECS).max(0);

        Ok(CachedToken {
            token: Secret::new(token.access_token),
            refresh_at: now + Duration::seconds(lifetime),
        })
    }
}
