use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;

use super::api_client::{ApiClient, ApiResponse, AuthMethod};
use super::base::{Provider, ProviderDescriptor, Specialty};
use super::errors::{map_status_to_error, ProviderError};
use super::formats;
use crate::findings::DocumentFindings;
use crate::request::AnalysisRequest;

const XAI_PROVIDER_ID: &str = "xai";
const XAI_API_HOST: &str = "https://api.x.ai";
pub const XAI_DEFAULT_MODEL: &str = "grok-4";
const XAI_CONFIDENCE_PRIOR: f64 = 0.75;

/// The real-time anomaly-detection specialist. Its damage and anomaly
/// findings take authority over majority vote during the merge.
#[derive(Debug)]
pub struct XaiProvider {
    api_client: ApiClient,
    model: String,
    descriptor: ProviderDescriptor,
}

impl XaiProvider {
    pub fn new(api_client: ApiClient, model: impl Into<String>) -> Self {
        Self {
            api_client,
            model: model.into(),
            descriptor: ProviderDescriptor::new(
                XAI_PROVIDER_ID,
                "xAI Grok",
                XAI_CONFIDENCE_PRIOR,
                vec![Specialty::RealTime, Specialty::AnomalyDetection],
            ),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("XAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("XAI_API_KEY is not set"))?;
        let host = std::env::var("XAI_HOST").unwrap_or_else(|_| XAI_API_HOST.to_string());
        let model = std::env::var("XAI_MODEL").unwrap_or_else(|_| XAI_DEFAULT_MODEL.to_string());

        let api_client = ApiClient::new(host, AuthMethod::BearerToken(api_key))?;
        Ok(Self::new(api_client, model))
    }

    fn findings_result(response: ApiResponse) -> Result<DocumentFindings, ProviderError> {
        match response.status {
            StatusCode::OK => {
                let payload = response.payload.ok_or_else(|| {
                    ProviderError::MalformedResponse("response body is not valid JSON".to_string())
                })?;
                // The xAI API is OpenAI-compatible.
                formats::openai::response_to_findings(&payload)
            }
            status => Err(map_status_to_error(status, response.payload.as_ref())),
        }
    }
}

#[async_trait]
impl Provider for XaiProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    #[tracing::instrument(skip(self, request), fields(provider = XAI_PROVIDER_ID))]
    async fn analyze(&self, request: &AnalysisRequest) -> Result<DocumentFindings, ProviderError> {
        let instructions = formats::render_instructions(request)?;
        let payload = formats::openai::create_request(&self.model, &instructions, request);
        let response = self.api_client.api_post("v1/chat/completions", &payload).await?;
        Self::findings_result(response)
    }
}
