//! In-crate test doubles for the Encoder and Transport seams

use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use flare_protocol::{AuthToken, Batch, MetricType};

use crate::transport::{EncodeError, Encoder, RegistrationReply, Transport, TransportError};

/// Install a log subscriber for a test run (honors RUST_LOG)
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic line-per-item encoder
pub(crate) struct LineEncoder;

impl Encoder for LineEncoder {
    fn encode(&self, batch: &Batch) -> Result<Bytes, EncodeError> {
        let mut out = String::new();
        for item in batch.items() {
            let kind = if item.is_backfill() { "backfill" } else { "live" };
            let ts = item
                .timestamp()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".into());
            out.push_str(&format!("{kind} {} {} {ts}\n", item.metric(), item.value()));
        }
        Ok(Bytes::from(out))
    }

    fn name(&self) -> &'static str {
        "line"
    }
}

/// Encoder that rejects every batch
pub(crate) struct RejectingEncoder;

impl Encoder for RejectingEncoder {
    fn encode(&self, _batch: &Batch) -> Result<Bytes, EncodeError> {
        Err(EncodeError("unsupported batch".into()))
    }

    fn name(&self) -> &'static str {
        "rejecting"
    }
}

/// Transport that serves a scripted sequence of failures, then succeeds
///
/// Every `send_batch` pops the next scripted failure; once the script is
/// empty, sends succeed and payloads are recorded. `register` follows its
/// own script of replies/failures.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    send_failures: Mutex<VecDeque<TransportError>>,
    sent: Mutex<Vec<(AuthToken, Bytes)>>,
    send_attempts: Mutex<usize>,
    send_delay: Mutex<Option<std::time::Duration>>,
    register_script: Mutex<VecDeque<Result<RegistrationReply, TransportError>>>,
    register_attempts: Mutex<usize>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a failure for the next `send_batch` call
    pub(crate) fn push_send_failure(&self, err: TransportError) {
        self.send_failures.lock().push_back(err);
    }

    /// Make every `send_batch` take this long before resolving
    pub(crate) fn set_send_delay(&self, delay: std::time::Duration) {
        *self.send_delay.lock() = Some(delay);
    }

    /// Queue `n` timeouts
    pub(crate) fn fail_transiently(&self, n: usize) {
        for _ in 0..n {
            self.push_send_failure(TransportError::Timeout);
        }
    }

    /// Queue a reply (or total failure) for the next `register` call
    pub(crate) fn push_register_result(
        &self,
        result: Result<RegistrationReply, TransportError>,
    ) {
        self.register_script.lock().push_back(result);
    }

    /// Total `send_batch` calls observed
    pub(crate) fn send_attempts(&self) -> usize {
        *self.send_attempts.lock()
    }

    /// Total `register` calls observed
    pub(crate) fn register_attempts(&self) -> usize {
        *self.register_attempts.lock()
    }

    /// Successfully sent payloads, in order
    pub(crate) fn sent(&self) -> Vec<(AuthToken, Bytes)> {
        self.sent.lock().clone()
    }

    /// Successfully sent payloads decoded as UTF-8, in order
    pub(crate) fn sent_text(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .map(|(_, p)| String::from_utf8_lossy(p).into_owned())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send_batch(&self, token: &AuthToken, payload: Bytes) -> Result<(), TransportError> {
        *self.send_attempts.lock() += 1;
        let delay = *self.send_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.send_failures.lock().pop_front() {
            return Err(err);
        }
        self.sent.lock().push((token.clone(), payload));
        Ok(())
    }

    async fn register(
        &self,
        _token: &AuthToken,
        types: &BTreeMap<String, MetricType>,
    ) -> Result<RegistrationReply, TransportError> {
        *self.register_attempts.lock() += 1;
        match self.register_script.lock().pop_front() {
            Some(result) => result,
            None => {
                // Default behavior: accept every requested name
                let results = types.keys().map(|name| (name.clone(), true)).collect();
                Ok(RegistrationReply { results })
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
