//! Guarded document submission.
//!
//! [`DocumentClient`] pairs an [`AdmissionLimiter`](crate::ratelimit::AdmissionLimiter)
//! with a [`DocumentTransport`], so every outbound call is admitted first.

mod client;
mod http;

use async_trait::async_trait;

use crate::error::Result;

pub use client::DocumentClient;
pub use http::HttpTransport;

/// Response of one guarded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl TransportResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for the component that actually sends a document.
///
/// Implementations perform exactly one attempt per call and never retry.
#[async_trait]
pub trait DocumentTransport: Send + Sync {
    /// Submit one serialized document.
    async fn submit(&self, body: &str) -> Result<TransportResponse>;
}
