use thiserror::Error;

/// Whole-request failures. Per-provider errors are recovered at the invoker
/// boundary and never surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Every consulted provider failed. The only condition callers should
    /// present to end users, as a single retry affordance.
    #[error("analysis unavailable: no provider returned a successful result")]
    NoSuccessfulProvider,

    /// Selection produced an empty panel because no providers are registered.
    #[error("no analysis providers are registered for this request")]
    NoProvidersAvailable,

    #[error("provider `{0}` is already registered")]
    DuplicateProvider(String),
}
