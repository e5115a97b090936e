/*!
 * Tests for the narration backend cascade
 */

use std::sync::atomic::Ordering;
use std::time::Duration;

use subnarrate::diagnostics::Diagnostic;
use subnarrate::errors::NarrationError;
use subnarrate::narration::BackendCascade;
use crate::common::mock_providers::{MockProvider, MOCK_NARRATION};

/// Test that the first working backend wins and later ones are never called
#[tokio::test]
async fn test_run_withWorkingFirst_shouldNotCallOthers() {
    let second = MockProvider::working();
    let second_calls = second.call_counter();
    let cascade = BackendCascade::new(
        vec![MockProvider::working().with_reply("[00:00] Hi.").boxed(), second.boxed()],
        Duration::from_secs(5),
    );

    let outcome = cascade.run("prompt").await;
    let generated = outcome.result.expect("first backend should answer");
    assert_eq!(generated.provider, "MockWorking");
    assert_eq!(generated.text, "[00:00] Hi.");
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

/// Test failover past failing and empty backends
#[tokio::test]
async fn test_run_withFailingThenEmpty_shouldFallThroughToWorking() {
    let cascade = BackendCascade::new(
        vec![MockProvider::failing().boxed(), MockProvider::empty().boxed(), MockProvider::working().boxed()],
        Duration::from_secs(5),
    );

    let outcome = cascade.run("prompt").await;
    assert_eq!(outcome.result.expect("third backend should answer").text, MOCK_NARRATION);
    assert_eq!(outcome.diagnostics.len(), 2);
    assert!(matches!(
        &outcome.diagnostics[1],
        Diagnostic::ProviderFailed { provider, reason } if provider == "MockEmpty" && reason == "empty response"
    ));
}

/// Test that a slow backend is cut off by the per-call timeout
#[tokio::test]
async fn test_run_withSlowBackend_shouldTimeOutAndContinue() {
    let cascade = BackendCascade::new(
        vec![MockProvider::slow(2_000).boxed(), MockProvider::working().boxed()],
        Duration::from_millis(50),
    );

    let outcome = cascade.run("prompt").await;
    assert_eq!(outcome.result.expect("fallback backend should answer").provider, "MockWorking");
    assert!(matches!(
        &outcome.diagnostics[0],
        Diagnostic::ProviderFailed { provider, reason } if provider == "MockSlow" && reason.contains("timed out")
    ));
}

/// Test the all-failed outcome
#[tokio::test]
async fn test_run_withAllFailing_shouldReportAttempts() {
    let cascade = BackendCascade::new(
        vec![MockProvider::failing().boxed(), MockProvider::failing().boxed(), MockProvider::empty().boxed()],
        Duration::from_secs(5),
    );

    let outcome = cascade.run("prompt").await;
    assert!(matches!(outcome.result, Err(NarrationError::AllBackendsFailed { attempts: 3 })));
    assert_eq!(outcome.diagnostics.len(), 3);
}

/// Test an intermittent backend across repeated runs
#[tokio::test]
async fn test_run_withIntermittentBackend_shouldFailOnlyOnNthCall() {
    let flaky = MockProvider::intermittent(2);
    let calls = flaky.call_counter();
    let cascade = BackendCascade::new(vec![flaky.boxed()], Duration::from_secs(5));

    assert!(cascade.run("a").await.result.is_ok());
    assert!(cascade.run("b").await.result.is_err());
    assert!(cascade.run("c").await.result.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

/// Test an empty cascade
#[tokio::test]
async fn test_run_withNoBackends_shouldFailWithoutDiagnostics() {
    let cascade = BackendCascade::new(Vec::new(), Duration::from_secs(1));

    assert!(cascade.is_empty());
    let outcome = cascade.run("prompt").await;
    assert!(matches!(outcome.result, Err(NarrationError::AllBackendsFailed { attempts: 0 })));
    assert!(outcome.diagnostics.is_empty());
}
