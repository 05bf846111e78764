//! Canned providers for unit tests. Integration tests drive the real
//! provider structs against a wiremock server instead.

use async_trait::async_trait;

use super::base::{Provider, ProviderDescriptor, Specialty};
use super::errors::ProviderError;
use crate::findings::DocumentFindings;
use crate::request::AnalysisRequest;

pub struct MockProvider {
    descriptor: ProviderDescriptor,
    response: Result<DocumentFindings, ProviderError>,
}

impl MockProvider {
    pub fn succeeding(
        id: &str,
        confidence_prior: f64,
        specialties: Vec<Specialty>,
        findings: DocumentFindings,
    ) -> Self {
        Self {
            descriptor: ProviderDescriptor::new(id, id, confidence_prior, specialties),
            response: Ok(findings),
        }
    }

    pub fn failing(
        id: &str,
        confidence_prior: f64,
        specialties: Vec<Specialty>,
        error: ProviderError,
    ) -> Self {
        Self {
            descriptor: ProviderDescriptor::new(id, id, confidence_prior, specialties),
            response: Err(error),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn analyze(&self, _request: &AnalysisRequest) -> Result<DocumentFindings, ProviderError> {
        self.response.clone()
    }
}
