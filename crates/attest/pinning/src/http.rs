use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use attest_types::{AtomMetadata, ContentUri};

use crate::error::PinningError;
use crate::PinningClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP pinning client: `POST {base}/pin` with the metadata JSON, expecting
/// `{ "uri": "..." }` back.
pub struct HttpPinningClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    uri: String,
}

impl HttpPinningClient {
    pub fn new(endpoint: &str) -> Result<Self, PinningError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| PinningError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PinningClient for HttpPinningClient {
    async fn pin(&self, metadata: &AtomMetadata) -> Result<ContentUri, PinningError> {
        let url = format!("{}/pin", self.base_url);
        tracing::debug!(%url, name = %metadata.name, "pinning metadata");

        let response = self
            .client
            .post(&url)
            .json(metadata)
            .send()
            .await
            .map_err(|error| PinningError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PinningError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let pinned: PinResponse = response
            .json()
            .await
            .map_err(|error| PinningError::Malformed(error.to_string()))?;
        if pinned.uri.is_empty() {
            return Err(PinningError::Malformed("empty uri".into()));
        }

        Ok(ContentUri::new(pinned.uri))
    }
}
