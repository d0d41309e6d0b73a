//! Firestore REST client: document listing for the connectivity probe.
//!
//! One consumed operation: list the documents of a collection. The store owns
//! all durable data; this client never writes.

use std::time::Duration;

use super::{DocumentStore, DocumentSummary, StoreError};

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const LIST_PAGE_SIZE: u32 = 20;

// =============================================================================
// CONFIG
// =============================================================================

/// Document store configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub base_url: String,
    /// Optional API key appended to requests; rules-protected projects accept
    /// keyless reads over OAuth instead.
    pub api_key: Option<String>,
}

impl FirestoreConfig {
    /// Load from `FIRESTORE_PROJECT_ID`, optional `FIRESTORE_BASE_URL` and
    /// `FIRESTORE_API_KEY`. Returns `None` when the project id is missing
    /// (the probe is disabled).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let project_id = std::env::var("FIRESTORE_PROJECT_ID").ok()?;
        let base_url =
            std::env::var("FIRESTORE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let api_key = std::env::var("FIRESTORE_API_KEY").ok();
        Some(Self { project_id, base_url, api_key })
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// REST client for the managed document store.
pub struct FirestoreClient {
    http: reqwest::Client,
    config: FirestoreConfig,
}

impl FirestoreClient {
    /// Build a client from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: FirestoreConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn collection_url(&self, collection: &str) -> String {
        let mut url = format!(
            "{}/projects/{}/databases/(default)/documents/{}?pageSize={}",
            self.config.base_url, self.config.project_id, collection, LIST_PAGE_SIZE
        );
        if let Some(key) = &self.config.api_key {
            url.push_str("&key=");
            url.push_str(key);
        }
        url
    }
}

#[async_trait::async_trait]
impl DocumentStore for FirestoreClient {
    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentSummary>, StoreError> {
        let response = self
            .http
            .get(self.collection_url(collection))
            .send()
            .await
            .map_err(|e| StoreError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(StoreError::ApiResponse { status, body: text });
        }

        parse_list_response(&text)
    }
}

// =============================================================================
// WIRE TYPES + PARSING
// =============================================================================

#[derive(serde::Deserialize)]
struct ListResponse {
    // An empty collection comes back as `{}` with no `documents` field.
    #[serde(default)]
    documents: Vec<DocumentSummary>,
}

fn parse_list_response(body: &str) -> Result<Vec<DocumentSummary>, StoreError> {
    let response: ListResponse =
        serde_json::from_str(body).map_err(|e| StoreError::ApiParse(e.to_string()))?;
    Ok(response.documents)
}

#[cfg(test)]
#[path = "firestore_test.rs"]
mod tests;
