//! Thin JSON client for the node API.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9001";

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    retryable: bool,
}

pub struct NodeClient {
    endpoint: String,
    http: reqwest::Client,
}

impl NodeClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.endpoint, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, action: &str, path: &str) -> anyhow::Result<T> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        Self::decode(action, resp).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        action: &str,
        path: &str,
        body: &B,
    ) -> anyhow::Result<T> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        Self::decode(action, resp).await
    }

    fn unreachable(&self, e: reqwest::Error) -> anyhow::Error {
        anyhow::anyhow!(
            "could not reach node at {}: {}\nIs the node running? Start it with: zkyc-node",
            self.endpoint,
            e
        )
    }

    async fn decode<T: DeserializeOwned>(action: &str, resp: reqwest::Response) -> anyhow::Result<T> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }
        if let Ok(err) = resp.json::<ErrorResponse>().await {
            let hint = if err.retryable { " (retryable)" } else { "" };
            anyhow::bail!("{} failed (HTTP {}): {}{}", action, status, err.error, hint);
        } else {
            anyhow::bail!("{} failed (HTTP {})", action, status);
        }
    }
}
