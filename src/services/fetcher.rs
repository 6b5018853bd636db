use std::time::Duration;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("unexpected status {status} fetching {url}")]
    Status { status: u16, url: String },
    #[error("download request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Capability to fetch one attachment's raw bytes. A failed fetch never
/// aborts an announcement; the triage pipeline drops the candidate and
/// moves on.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch_pdf(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}

pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap();

        ReqwestFetcher { client }
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentFetcher for ReqwestFetcher {
    async fn fetch_pdf(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let response = self.client.get(url).send().await?;

        match response.status().is_success() {
            true => Ok(response.bytes().await?.to_vec()),
            false => Err(DownloadError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            }),
        }
    }
}
