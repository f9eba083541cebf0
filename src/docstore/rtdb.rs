use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{DocumentStore, PathUpdate, StoreError, check_disjoint, segments};

/// Firebase Realtime Database over its REST API.
///
/// Multi-path updates map to a single `PATCH /.json`, which the database
/// applies atomically.
pub struct RtdbStore {
    base_url: String,
    auth: Option<String>,
    client: reqwest::Client,
}

impl RtdbStore {
    pub fn new(base_url: impl Into<String>, auth: Option<String>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/.json", self.base_url)
        } else {
            format!("{}/{}.json", self.base_url, path)
        }
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }
}

#[async_trait]
impl DocumentStore for RtdbStore {
    fn backend(&self) -> &'static str {
        "rtdb"
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let path = segments(path)?.join("/");
        let resp = self
            .with_auth(self.client.get(self.url(&path)))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }

        let value: Value = resp.json().await?;
        Ok((!value.is_null()).then_some(value))
    }

    async fn update(&self, updates: PathUpdate) -> Result<(), StoreError> {
        check_disjoint(&updates)?;
        tracing::debug!(paths = updates.len(), "rtdb multi-path update");
        let resp = self
            .with_auth(self.client.patch(self.url("")))
            .json(&updates)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }
        Ok(())
    }
}
