//! Rate-limited document client.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{DocumentTransport, TransportResponse};
use crate::error::Result;
use crate::ratelimit::AdmissionLimiter;

/// Submits documents through a transport, one permit per call.
pub struct DocumentClient<T: DocumentTransport> {
    limiter: Arc<AdmissionLimiter>,
    transport: T,
}

impl<T: DocumentTransport> DocumentClient<T> {
    /// Create a client guarded by `limiter`.
    pub fn new(limiter: Arc<AdmissionLimiter>, transport: T) -> Self {
        Self { limiter, transport }
    }

    /// Acquire a permit, then submit `body` exactly once.
    ///
    /// Fails without calling the transport if the permit cannot be acquired.
    /// A transport failure is returned as is; the permit stays consumed.
    #[instrument(skip(self, body), fields(request_id = %Uuid::new_v4()))]
    pub async fn submit(&self, body: &str) -> Result<TransportResponse> {
        self.limiter.acquire().await?;
        debug!(available = self.limiter.available(), "Permit acquired");

        let response = self.transport.submit(body).await?;
        if response.is_success() {
            info!(status = response.status, "Document submitted");
        } else {
            warn!(status = response.status, "Document rejected by endpoint");
        }
        Ok(response)
    }

    /// The limiter guarding this client.
    pub fn limiter(&self) -> &Arc<AdmissionLimiter> {
        &self.limiter
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
