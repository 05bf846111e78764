use anyhow::Result;
use tracing::debug;

use crate::consensus::{merge, ConsensusResult, ProviderReport};
use crate::error::AnalysisError;
use crate::invoker::{invoke, InvokeOptions};
use crate::providers::registry::ProviderRegistry;
use crate::request::AnalysisRequest;
use crate::selector::select;

/// Explicitly constructed entry point wiring selection, fan-out, and
/// consensus for one document per call.
///
/// Holds no global state; tests substitute fake providers through the
/// registry they inject.
pub struct Orchestrator {
    registry: ProviderRegistry,
    options: InvokeOptions,
}

impl Orchestrator {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            options: InvokeOptions::default(),
        }
    }

    /// Registry built from the environment: every provider with credentials
    /// present, in the built-in order.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ProviderRegistry::from_env()?))
    }

    pub fn with_options(mut self, options: InvokeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Analyze one document: select providers, invoke them concurrently,
    /// and merge the successful results into a single consensus record.
    ///
    /// Individual provider failures are logged and swallowed; the only
    /// errors callers see are `NoProvidersAvailable` and
    /// `NoSuccessfulProvider`.
    #[tracing::instrument(skip(self, request), fields(kind = ?request.kind))]
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<ConsensusResult, AnalysisError> {
        let selected = select(&self.registry, request);
        if selected.is_empty() {
            return Err(AnalysisError::NoProvidersAvailable);
        }

        let outcomes = invoke(&selected, request, &self.options).await;

        let attempted = outcomes.len();
        let reports: Vec<ProviderReport> = outcomes
            .into_iter()
            .filter_map(|outcome| {
                outcome.result.ok().map(|findings| ProviderReport {
                    descriptor: outcome.descriptor,
                    findings,
                })
            })
            .collect();
        debug!(attempted, succeeded = reports.len(), "merging provider results");

        merge(&reports)
    }
}
