//! Registration coordinator
//!
//! `register_metrics` bypasses batching entirely - registration is not a
//! data-volume operation. Each requested name is evaluated independently by
//! the remote service, so the result is a per-key boolean map rather than a
//! single success/failure.
//!
//! A transport-level failure that prevents the whole exchange raises the
//! ingestion error; a partial map is only ever produced from a reply the
//! service fully received.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use flare_protocol::{AuthToken, MetricType, ValidationError};

use crate::backoff::Backoff;
use crate::config::RetryConfig;
use crate::error::{IngestError, Result};
use crate::metrics::ClientMetrics;
use crate::transport::Transport;

/// Handles the distinct per-key semantics of metric-type registration
pub(crate) struct RegistrationCoordinator {
    transport: Arc<dyn Transport>,
    retry: RetryConfig,
    metrics: Arc<ClientMetrics>,
}

impl RegistrationCoordinator {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        retry: RetryConfig,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        Self {
            transport,
            retry,
            metrics,
        }
    }

    /// Register metric types, returning one boolean per requested name
    ///
    /// true = newly registered or already matching; false = the name exists
    /// under a different type. Registration is idempotent at the service, so
    /// transient transport failures are retried with backoff before the
    /// error escalates.
    ///
    /// # Errors
    ///
    /// - `IngestError::Validation` - a requested name is empty
    /// - `IngestError::RetriesExhausted` / `IngestError::Transport` - the
    ///   whole exchange failed; no partial map is returned
    pub(crate) async fn register(
        &self,
        token: &AuthToken,
        types: &BTreeMap<String, MetricType>,
    ) -> Result<HashMap<String, bool>> {
        if types.is_empty() {
            return Ok(HashMap::new());
        }

        if types.keys().any(|name| name.is_empty()) {
            return Err(ValidationError::EmptyMetricName.into());
        }

        let max_attempts = self.retry.max_attempts;
        let mut backoff = Backoff::new(&self.retry);
        let mut attempt = 0;

        let reply = loop {
            attempt += 1;

            match self.transport.register(token, types).await {
                Ok(reply) => break reply,
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = backoff.next_delay();
                    tracing::debug!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient registration failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_transient() => {
                    tracing::error!(
                        attempts = max_attempts,
                        names = types.len(),
                        error = %e,
                        "registration retry budget exhausted"
                    );
                    return Err(IngestError::RetriesExhausted {
                        attempts: max_attempts,
                        source: e,
                    });
                }
                Err(e) => {
                    tracing::error!(
                        names = types.len(),
                        error = %e,
                        "permanent registration failure"
                    );
                    return Err(IngestError::Transport(e));
                }
            }
        };

        // Normalize: exactly one boolean per requested name, whatever the
        // reply contained.
        let mut results = HashMap::with_capacity(types.len());
        let mut accepted = 0u64;
        let mut rejected = 0u64;

        for name in types.keys() {
            let ok = match reply.results.get(name) {
                Some(&ok) => ok,
                None => {
                    tracing::warn!(
                        metric = %name,
                        "registration reply missing a requested name, treating as failed"
                    );
                    false
                }
            };
            if ok {
                accepted += 1;
            } else {
                rejected += 1;
            }
            results.insert(name.clone(), ok);
        }

        self.metrics.record_registration(accepted, rejected);
        tracing::debug!(accepted, rejected, "registration completed");

        Ok(results)
    }
}

#[cfg(test)]
#[path = "registration_test.rs"]
mod registration_test;
