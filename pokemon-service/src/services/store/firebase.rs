//! Firebase Realtime Database store over its REST interface.
//!
//! Every path maps to `{database_url}/{path}.json`: a `GET` returns the
//! subtree (`null` when empty) and a `POST` appends a child under a
//! generated push key, answering `{"name": "<key>"}`. A query on the
//! database URL, such as the emulator's `?ns=<db>`, is kept on every request.

use super::{CollectionStore, FirebaseAuth, StoreError};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use service_core::observability::{TracedClientExt, TracedRequest};

pub struct FirebaseStore {
    database_root: String,
    query: Option<String>,
    client: Client,
    auth: FirebaseAuth,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

impl FirebaseStore {
    pub fn new(database_url: &str, client: Client, auth: FirebaseAuth) -> Self {
        let (root, query) = match database_url.split_once('?') {
            Some((root, query)) => (root, Some(query.to_string())),
            None => (database_url, None),
        };

        Self {
            database_root: root.trim_end_matches('/').to_string(),
            query: query.filter(|q| !q.is_empty()),
            client,
            auth,
        }
    }

    fn url(&self, path: &str) -> String {
        let mut url = format!("{}/{}.json", self.database_root, path.trim_matches('/'));
        if let Some(query) = &self.query {
            url.push('?');
            url.push_str(query);
        }
        url
    }

    async fn authorize(&self, request: TracedRequest) -> Result<TracedRequest, StoreError> {
        Ok(match self.auth.bearer_token().await? {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status { status, body })
    }
}

#[async_trait]
impl CollectionStore for FirebaseStore {
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let request = self.authorize(self.client.traced_get(&self.url(path))).await?;

        tracing::debug!(path = %path, "Reading collection from Firebase");

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let value: Value = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(match value {
            Value::Null => None,
            other => Some(other),
        })
    }

    async fn push(&self, path: &str, value: &Value) -> Result<String, StoreError> {
        let request = self
            .authorize(self.client.traced_post(&self.url(path)))
            .await?
            .json(value);

        tracing::debug!(path = %path, "Pushing entry to Firebase");

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let pushed: PushResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(pushed.name)
    }

    fn name(&self) -> &'static str {
        "firebase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_root_and_path() {
        let store = FirebaseStore::new(
            "https://demo-default-rtdb.firebaseio.com/",
            Client::new(),
            FirebaseAuth::None,
        );

        assert_eq!(
            store.url("my-pokemons"),
            "https://demo-default-rtdb.firebaseio.com/my-pokemons.json"
        );
        assert_eq!(
            store.url("/users/ash/my-pokemons/"),
            "https://demo-default-rtdb.firebaseio.com/users/ash/my-pokemons.json"
        );
    }

    #[test]
    fn url_keeps_namespace_query_after_path() {
        let store = FirebaseStore::new(
            "http://localhost:9000/?ns=demo-default-rtdb",
            Client::new(),
            FirebaseAuth::None,
        );

        assert_eq!(
            store.url("my-pokemons"),
            "http://localhost:9000/my-pokemons.json?ns=demo-default-rtdb"
        );
    }
}
