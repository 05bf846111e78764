use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;

use super::api_client::{ApiClient, ApiResponse, AuthMethod};
use super::base::{Provider, ProviderDescriptor, Specialty};
use super::errors::{map_status_to_error, ProviderError};
use super::formats;
use crate::findings::DocumentFindings;
use crate::request::AnalysisRequest;

const OPENAI_PROVIDER_ID: &str = "openai";
const OPENAI_API_HOST: &str = "https://api.openai.com";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";
const OPENAI_CONFIDENCE_PRIOR: f64 = 0.85;

#[derive(Debug)]
pub struct OpenAiProvider {
    api_client: ApiClient,
    model: String,
    descriptor: ProviderDescriptor,
}

impl OpenAiProvider {
    pub fn new(api_client: ApiClient, model: impl Into<String>) -> Self {
        Self {
            api_client,
            model: model.into(),
            descriptor: ProviderDescriptor::new(
                OPENAI_PROVIDER_ID,
                "OpenAI",
                OPENAI_CONFIDENCE_PRIOR,
                vec![Specialty::Vision, Specialty::Forms],
            ),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY is not set"))?;
        let host =
            std::env::var("OPENAI_HOST").unwrap_or_else(|_| OPENAI_API_HOST.to_string());
        let model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| OPENAI_DEFAULT_MODEL.to_string());

        let api_client = ApiClient::new(host, AuthMethod::BearerToken(api_key))?;
        Ok(Self::new(api_client, model))
    }

    fn findings_result(response: ApiResponse) -> Result<DocumentFindings, ProviderError> {
        match response.status {
            StatusCode::OK => {
                let payload = response.payload.ok_or_else(|| {
                    ProviderError::MalformedResponse("response body is not valid JSON".to_string())
                })?;
                formats::openai::response_to_findings(&payload)
            }
            status => Err(map_status_to_error(status, response.payload.as_ref())),
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    #[tracing::instrument(skip(self, request), fields(provider = OPENAI_PROVIDER_ID))]
    async fn analyze(&self, request: &AnalysisRequest) -> Result<DocumentFindings, ProviderError> {
        let instructions = formats::render_instructions(request)?;
        let payload = formats::openai::create_request(&self.model, &instructions, request);
        let response = self.api_client.api_post("v1/chat/completions", &payload).await?;
        Self::findings_result(response)
    }
}
