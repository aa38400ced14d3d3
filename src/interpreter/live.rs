//! Host backed by HTTP, the local filesystem and the system clock.

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::json;

use crate::config::Config;
use crate::post::ResourceId;

use super::host::{Host, HostError};

/// The production [`Host`].
///
/// - Resources: `GET {base_url}/resources/{id}`
/// - Beer: `POST {base_url}/orders/beer`
/// - Storage: `{data_dir}/{id}.txt`
pub struct LiveHost {
    client: Client,
    base_url: Url,
    data_dir: PathBuf,
    timeout_secs: u64,
}

impl LiveHost {
    pub fn new(config: &Config) -> Result<Self, HostError> {
        let timeout_secs = u64::from(config.network.timeout_seconds);
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(u64::from(
                config.network.connect_timeout_seconds,
            )))
            .build()
            .map_err(|e| HostError::Connection(e.to_string()))?;

        let raw = &config.network.base_url;
        let base_url = Url::parse(raw.trim_end_matches('/'))
            .map_err(|e| HostError::InvalidUrl(format!("{}: {}", raw, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(HostError::InvalidUrl(raw.clone()));
        }

        Ok(Self {
            client,
            base_url,
            data_dir: config.storage.data_dir.clone(),
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// `base_url` with `segments` appended, each percent-encoded as a
    /// single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, HostError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| HostError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn map_send_error(&self, err: reqwest::Error) -> HostError {
        if err.is_timeout() {
            HostError::Timeout {
                duration_secs: self.timeout_secs,
            }
        } else {
            HostError::Connection(err.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, HostError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        Err(HostError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// `id` with everything but ASCII alphanumerics, `-`, `_` and `.` replaced,
/// so it cannot name a path outside the data directory.
fn file_stem(id: &ResourceId) -> String {
    id.as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl Host for LiveHost {
    async fn fetch_resource(&self, id: &ResourceId) -> Result<String, HostError> {
        let url = self.endpoint(&["resources", id.as_str()])?;
        tracing::debug!(url = %url, "Fetching resource");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response).await?;

        response.text().await.map_err(|e| self.map_send_error(e))
    }

    async fn order_beer(&self) -> Result<(), HostError> {
        let url = self.endpoint(&["orders", "beer"])?;
        tracing::debug!(url = %url, "Ordering beer");

        let response = self
            .client
            .post(url)
            .json(&json!({ "quantity": 1 }))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn persist(&self, id: &ResourceId, body: &str) -> Result<(), HostError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        let path = self.data_dir.join(format!("{}.txt", file_stem(id)));
        tokio::fs::write(&path, body).await?;
        tracing::debug!(path = %path.display(), bytes = body.len(), "Package stored");
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
