//! Remote backend client.
//!
//! Fetches `GET {base_url}/crises/` and `GET {base_url}/charities/`. Both
//! endpoints may answer with a bare array or with an envelope object
//! (`{"crises": [...], "total": n}` / `{"charities": [...]}`).

use std::time::Duration;

use async_trait::async_trait;
use crisis_map_crisis_models::{Charity, Crisis};

use crate::{CrisisSource, SourceError, parse_collection};

/// [`CrisisSource`] backed by the crisis-map HTTP API.
pub struct ApiSource {
    client: reqwest::Client,
    base_url: String,
}

impl ApiSource {
    /// Creates a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value, SourceError> {
        let url = self.endpoint(path);
        log::debug!("GET {url}");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url,
                status: status.as_u16(),
            });
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl CrisisSource for ApiSource {
    fn name(&self) -> &str {
        "api"
    }

    async fn fetch_crises(&self) -> Result<Vec<Crisis>, SourceError> {
        let body = self.get_json("crises/").await?;
        parse_collection(body, "crises")
    }

    async fn fetch_charities(&self) -> Result<Vec<Charity>, SourceError> {
        let body = self.get_json("charities/").await?;
        parse_collection(body, "charities")
    }
}
