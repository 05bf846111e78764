//! Multi-provider document analysis with consensus merging.
//!
//! A document image is fanned out to several AI vision backends in parallel;
//! their structured findings are merged field by field into one consensus
//! record with an aggregate confidence score.

pub mod consensus;
pub mod error;
pub mod findings;
pub mod invoker;
pub mod orchestrator;
mod prompt_template;
pub mod providers;
pub mod request;
pub mod selector;

pub use consensus::{merge, ConsensusResult, Divergence, ProviderReport};
pub use error::AnalysisError;
pub use findings::{
    AnomalyFinding, DamageAssessment, DocumentFindings, MonetaryAmount, Severity,
};
pub use invoker::{invoke, InvokeOptions, ProviderOutcome};
pub use orchestrator::Orchestrator;
pub use providers::base::{Provider, ProviderDescriptor, Specialty};
pub use providers::errors::ProviderError;
pub use providers::registry::ProviderRegistry;
pub use request::{AnalysisRequest, ContextFlags, DocumentKind};
