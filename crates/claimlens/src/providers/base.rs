use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::errors::ProviderError;
use crate::findings::DocumentFindings;
use crate::request::AnalysisRequest;

/// Capability tags a provider declares at registration.
///
/// Selection and merge authority key on these tags, never on human-readable
/// provider names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Specialty {
    RealTime,
    AnomalyDetection,
    ComplexReasoning,
    Regulatory,
    Vision,
    Forms,
}

/// Static description of an analysis backend. Defined at process start and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub display_name: String,
    /// Prior belief in this provider's accuracy, 0.0..=1.0.
    pub confidence_prior: f64,
    /// Ordered specialty tags.
    pub specialties: Vec<Specialty>,
}

impl ProviderDescriptor {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        confidence_prior: f64,
        specialties: Vec<Specialty>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            confidence_prior,
            specialties,
        }
    }

    pub fn has_specialty(&self, specialty: Specialty) -> bool {
        self.specialties.contains(&specialty)
    }

    /// Whether this provider's damage and anomaly findings override majority
    /// vote during the merge.
    pub fn is_anomaly_specialist(&self) -> bool {
        self.has_specialty(Specialty::RealTime) || self.has_specialty(Specialty::AnomalyDetection)
    }

    pub fn is_reasoning_specialist(&self) -> bool {
        self.has_specialty(Specialty::ComplexReasoning) || self.has_specialty(Specialty::Regulatory)
    }
}

/// An external AI analysis backend capable of returning structured findings
/// for a document.
#[async_trait]
pub trait Provider: Send + Sync {
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Analyze one document. Each call owns its own request/response pair;
    /// implementations hold no mutable state across calls.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<DocumentFindings, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specialist_checks_use_tags_not_names() {
        let descriptor = ProviderDescriptor::new(
            "acme",
            "Acme Anomaly Scanner",
            0.5,
            vec![Specialty::AnomalyDetection],
        );
        assert!(descriptor.is_anomaly_specialist());
        assert!(!descriptor.is_reasoning_specialist());

        let plain = ProviderDescriptor::new("real-time-ish", "Real Time Ish", 0.5, vec![]);
        assert!(!plain.is_anomaly_specialist());
    }
}
