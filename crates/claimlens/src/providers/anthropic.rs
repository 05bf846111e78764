use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;

use super::api_client::{ApiClient, ApiResponse, AuthMethod};
use super::base::{Provider, ProviderDescriptor, Specialty};
use super::errors::{map_status_to_error, ProviderError};
use super::formats;
use crate::findings::DocumentFindings;
use crate::request::AnalysisRequest;

const ANTHROPIC_PROVIDER_ID: &str = "anthropic";
const ANTHROPIC_API_HOST: &str = "https://api.anthropic.com";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const ANTHROPIC_API_VERSION: &str = "2023-06-01";
const ANTHROPIC_CONFIDENCE_PRIOR: f64 = 0.88;

#[derive(Debug)]
pub struct AnthropicProvider {
    api_client: ApiClient,
    model: String,
    descriptor: ProviderDescriptor,
}

impl AnthropicProvider {
    pub fn new(api_client: ApiClient, model: impl Into<String>) -> Self {
        Self {
            api_client,
            model: model.into(),
            descriptor: ProviderDescriptor::new(
                ANTHROPIC_PROVIDER_ID,
                "Anthropic",
                ANTHROPIC_CONFIDENCE_PRIOR,
                vec![Specialty::ComplexReasoning, Specialty::Regulatory],
            ),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| anyhow::anyhow!("ANTHROPIC_API_KEY is not set"))?;
        let host =
            std::env::var("ANTHROPIC_HOST").unwrap_or_else(|_| ANTHROPIC_API_HOST.to_string());
        let model = std::env::var("ANTHROPIC_MODEL")
            .unwrap_or_else(|_| ANTHROPIC_DEFAULT_MODEL.to_string());

        let auth = AuthMethod::ApiKey {
            header_name: "x-api-key".to_string(),
            key: api_key,
        };
        let api_client =
            ApiClient::new(host, auth)?.with_header("anthropic-version", ANTHROPIC_API_VERSION)?;
        Ok(Self::new(api_client, model))
    }

    fn findings_result(response: ApiResponse) -> Result<DocumentFindings, ProviderError> {
        match response.status {
            StatusCode::OK => {
                let payload = response.payload.ok_or_else(|| {
                    ProviderError::MalformedResponse("response body is not valid JSON".to_string())
                })?;
                formats::anthropic::response_to_findings(&payload)
            }
            status => Err(map_status_to_error(status, response.payload.as_ref())),
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    #[tracing::instrument(skip(self, request), fields(provider = ANTHROPIC_PROVIDER_ID))]
    async fn analyze(&self, request: &AnalysisRequest) -> Result<DocumentFindings, ProviderError> {
        let instructions = formats::render_instructions(request)?;
        let payload = formats::anthropic::create_request(&self.model, &instructions, request);
        let response = self.api_client.api_post("v1/messages", &payload).await?;
        Self::findings_result(response)
    }
}
