//! Concurrent provider fan-out with fail-soft join semantics.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::findings::DocumentFindings;
use crate::providers::base::{Provider, ProviderDescriptor};
use crate::providers::errors::ProviderError;
use crate::request::AnalysisRequest;

/// Knobs for one fan-out. The defaults reproduce the historical behavior:
/// no per-call deadline and unbounded concurrency.
#[derive(Debug, Clone, Default)]
pub struct InvokeOptions {
    /// Advisory per-provider deadline. A call that outlives it is recorded
    /// as that provider's failure; siblings are unaffected.
    pub per_provider_timeout: Option<Duration>,
    /// Cap on simultaneously outstanding provider calls. Unbounded fan-out
    /// against paid APIs is a cost and availability risk at scale.
    pub max_concurrency: Option<usize>,
}

/// What one provider produced for one request.
#[derive(Debug)]
pub struct ProviderOutcome {
    pub descriptor: ProviderDescriptor,
    pub elapsed: Duration,
    pub result: Result<DocumentFindings, ProviderError>,
}

impl ProviderOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Invoke every selected provider concurrently, tolerating individual
/// failures.
///
/// The join waits for all calls and never fails fast: one slow or broken
/// vendor must not deny the caller a partial answer when a sibling succeeds.
/// No automatic retry; retries are the caller's responsibility.
pub async fn invoke(
    providers: &[Arc<dyn Provider>],
    request: &AnalysisRequest,
    options: &InvokeOptions,
) -> Vec<ProviderOutcome> {
    let limiter = options
        .max_concurrency
        .map(|limit| Arc::new(Semaphore::new(limit)));

    let calls = providers.iter().map(|provider| {
        let provider = Arc::clone(provider);
        let limiter = limiter.clone();
        async move {
            // The semaphore is never closed, so acquire only fails if it is;
            // a missing permit then just means an unbounded call.
            let _permit = match limiter.as_ref() {
                Some(semaphore) => semaphore.acquire().await.ok(),
                None => None,
            };

            let started = Instant::now();
            let call = provider.analyze(request);
            let result = match options.per_provider_timeout {
                Some(deadline) => match tokio::time::timeout(deadline, call).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::NetworkError(format!(
                        "no response within {}ms",
                        deadline.as_millis()
                    ))),
                },
                None => call.await,
            };
            let elapsed = started.elapsed();

            let descriptor = provider.descriptor().clone();
            match &result {
                Ok(_) => debug!(
                    provider = %descriptor.id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "provider analysis succeeded"
                ),
                Err(error) => warn!(
                    provider = %descriptor.id,
                    kind = error.telemetry_type(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "provider analysis failed: {}", error
                ),
            }

            ProviderOutcome {
                descriptor,
                elapsed,
                result,
            }
        }
    });

    join_all(calls).await
}
