use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use flare_protocol::{AuthToken, MetricType};

use super::RegistrationCoordinator;
use crate::config::RetryConfig;
use crate::error::IngestError;
use crate::metrics::ClientMetrics;
use crate::test_support::ScriptedTransport;
use crate::transport::{RegistrationReply, Transport, TransportError};

fn fast_retry(max_attempts: usize) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(100),
        multiplier: 2.0,
        jitter: 0.0,
    }
}

fn coordinator(
    transport: &Arc<ScriptedTransport>,
    retry: RetryConfig,
) -> (RegistrationCoordinator, Arc<ClientMetrics>) {
    let metrics = Arc::new(ClientMetrics::new());
    let coordinator = RegistrationCoordinator::new(
        Arc::clone(transport) as Arc<dyn Transport>,
        retry,
        Arc::clone(&metrics),
    );
    (coordinator, metrics)
}

fn three_names() -> BTreeMap<String, MetricType> {
    BTreeMap::from([
        ("cpu.load".to_string(), MetricType::Gauge),
        ("requests".to_string(), MetricType::Counter),
        ("bytes.total".to_string(), MetricType::CumulativeCounter),
    ])
}

#[tokio::test]
async fn test_empty_request_is_noop() {
    let transport = Arc::new(ScriptedTransport::new());
    let (coordinator, _) = coordinator(&transport, fast_retry(3));

    let result = coordinator
        .register(&AuthToken::from("tok1"), &BTreeMap::new())
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(transport.register_attempts(), 0);
}

#[tokio::test]
async fn test_empty_name_rejected_locally() {
    let transport = Arc::new(ScriptedTransport::new());
    let (coordinator, _) = coordinator(&transport, fast_retry(3));
    let types = BTreeMap::from([(String::new(), MetricType::Gauge)]);

    let err = coordinator
        .register(&AuthToken::from("tok1"), &types)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::Validation(_)));
    assert_eq!(transport.register_attempts(), 0);
}

#[tokio::test]
async fn test_all_accepted() {
    let transport = Arc::new(ScriptedTransport::new());
    let (coordinator, metrics) = coordinator(&transport, fast_retry(3));

    let result = coordinator
        .register(&AuthToken::from("tok1"), &three_names())
        .await
        .unwrap();

    assert_eq!(result.len(), 3);
    assert!(result.values().all(|&ok| ok));
    assert_eq!(metrics.snapshot().registrations_accepted, 3);
}

#[tokio::test]
async fn test_partial_success_one_boolean_per_name() {
    let transport = Arc::new(ScriptedTransport::new());
    // "requests" conflicts with an existing registration of another type
    transport.push_register_result(Ok(RegistrationReply {
        results: HashMap::from([
            ("cpu.load".to_string(), true),
            ("requests".to_string(), false),
            ("bytes.total".to_string(), true),
        ]),
    }));
    let (coordinator, metrics) = coordinator(&transport, fast_retry(3));

    let result = coordinator
        .register(&AuthToken::from("tok1"), &three_names())
        .await
        .unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result["cpu.load"], true);
    assert_eq!(result["requests"], false);
    assert_eq!(result["bytes.total"], true);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.registrations_accepted, 2);
    assert_eq!(snapshot.registrations_rejected, 1);
}

#[tokio::test]
async fn test_reply_missing_name_normalized_to_false() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_register_result(Ok(RegistrationReply {
        results: HashMap::from([("cpu.load".to_string(), true)]),
    }));
    let (coordinator, _) = coordinator(&transport, fast_retry(3));

    let result = coordinator
        .register(&AuthToken::from("tok1"), &three_names())
        .await
        .unwrap();

    // Still exactly N booleans, one per requested name
    assert_eq!(result.len(), 3);
    assert_eq!(result["cpu.load"], true);
    assert_eq!(result["requests"], false);
    assert_eq!(result["bytes.total"], false);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_retried() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_register_result(Err(TransportError::Timeout));
    transport.push_register_result(Err(TransportError::ServerUnavailable { status: 503 }));
    let (coordinator, _) = coordinator(&transport, fast_retry(5));

    let result = coordinator
        .register(&AuthToken::from("tok1"), &three_names())
        .await
        .unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(transport.register_attempts(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_total_failure_raises_not_partial() {
    let transport = Arc::new(ScriptedTransport::new());
    for _ in 0..3 {
        transport.push_register_result(Err(TransportError::Timeout));
    }
    let (coordinator, metrics) = coordinator(&transport, fast_retry(3));

    let err = coordinator
        .register(&AuthToken::from("tok1"), &three_names())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::RetriesExhausted { attempts: 3, .. }
    ));
    assert_eq!(metrics.snapshot().registrations_accepted, 0);
}

#[tokio::test]
async fn test_permanent_failure_not_retried() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_register_result(Err(TransportError::AuthRejected));
    let (coordinator, _) = coordinator(&transport, fast_retry(5));

    let err = coordinator
        .register(&AuthToken::from("tok1"), &three_names())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Transport(TransportError::AuthRejected)
    ));
    assert_eq!(transport.register_attempts(), 1);
}
