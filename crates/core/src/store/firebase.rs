use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::Value;
use std::time::Duration;

use crate::errors::CoreError;
use super::traits::{StoreReader, StoreWriter};

const NAME: &str = "Firebase";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Characters Firebase refuses inside a key.
const FORBIDDEN_KEY_CHARS: [char; 5] = ['.', '$', '#', '[', ']'];

/// Firebase Realtime Database adapter over its REST API.
///
/// - **Read**: `GET {base_url}/{path}.json`; a missing node comes back as `null`.
/// - **Write**: `PUT {base_url}/{path}.json` with the JSON body.
/// - **Auth**: optional database secret / ID token sent as the `auth` query parameter.
///
/// Path segments are percent-encoded, and a segment Firebase could not store
/// as a key is refused before any request goes out.
///
/// Firebase may hand back an object whose keys are small integers as an
/// array; the aggregation engine accepts both shapes.
pub struct FirebaseStore {
    client: Client,
    base_url: Url,
    auth: Option<String>,
}

impl FirebaseStore {
    pub fn new(base_url: &str, auth: Option<String>) -> Result<Self, CoreError> {
        Self::with_timeout(base_url, auth, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: &str,
        auth: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| store_error(format!("Failed to build HTTP client: {e}")))?;

        let base_url = Url::parse(base_url.trim().trim_end_matches('/'))
            .map_err(|e| store_error(format!("Invalid database URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(store_error(format!("Invalid database URL '{base_url}'")));
        }

        Ok(Self {
            client,
            base_url,
            auth: auth.filter(|a| !a.is_empty()),
        })
    }

    /// REST URL of a node, without credentials.
    pub fn node_url(&self, path: &str) -> Result<Url, CoreError> {
        let mut segments = Vec::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if segment.contains(FORBIDDEN_KEY_CHARS) || segment.chars().any(char::is_control) {
                return Err(store_error(format!(
                    "Invalid key '{segment}' in path '{path}'"
                )));
            }
            segments.push(segment.to_string());
        }
        match segments.last_mut() {
            Some(last) => last.push_str(".json"),
            None => segments.push(".json".to_string()),
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| store_error(format!("Invalid database URL '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(&segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(auth) => request.query(&[("auth", auth)]),
            None => request,
        }
    }

    async fn check(&self, path: &str, response: Response) -> Result<Response, CoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(store_error(format!("HTTP {status} for '{path}': {}", body.trim())))
    }
}

fn store_error(message: String) -> CoreError {
    CoreError::Store {
        backend: NAME.into(),
        message,
    }
}

#[async_trait]
impl StoreReader for FirebaseStore {
    fn name(&self) -> &str {
        NAME
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, CoreError> {
        let request = self.authorized(self.client.get(self.node_url(path)?));
        let response = self.check(path, request.send().await?).await?;

        let value: Value = response
            .json()
            .await
            .map_err(|e| store_error(format!("Failed to parse node '{path}': {e}")))?;

        if value.is_null() {
            Ok(None)
        } else {
            Ok(Some(value))
        }
    }
}

#[async_trait]
impl StoreWriter for FirebaseStore {
    async fn set(&self, path: &str, value: Value) -> Result<(), CoreError> {
        let request = self.authorized(self.client.put(self.node_url(path)?).json(&value));
        self.check(path, request.send().await?).await?;
        Ok(())
    }
}
