//! HTTP transport backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, error};

use super::{DocumentTransport, TransportResponse};
use crate::config::TransportConfig;
use crate::error::Result;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Posts documents to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    content_type: String,
}

impl HttpTransport {
    /// Build a transport from configuration.
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECTION_TIMEOUT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            content_type: config.content_type.clone(),
        })
    }

    /// Endpoint documents are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DocumentTransport for HttpTransport {
    async fn submit(&self, body: &str) -> Result<TransportResponse> {
        debug!(endpoint = %self.endpoint, bytes = body.len(), "Posting document");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, self.content_type.as_str())
            .body(body.to_owned())
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "Document request failed");
                e
            })?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(status = status, "Document response received");
        Ok(TransportResponse { status, body })
    }
}
