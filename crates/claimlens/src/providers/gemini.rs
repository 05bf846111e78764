use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;

use super::api_client::{ApiClient, ApiResponse, AuthMethod};
use super::base::{Provider, ProviderDescriptor, Specialty};
use super::errors::{map_status_to_error, ProviderError};
use super::formats;
use crate::findings::DocumentFindings;
use crate::request::AnalysisRequest;

const GEMINI_PROVIDER_ID: &str = "gemini";
const GEMINI_API_HOST: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";
const GEMINI_CONFIDENCE_PRIOR: f64 = 0.80;

#[derive(Debug)]
pub struct GeminiProvider {
    api_client: ApiClient,
    model: String,
    descriptor: ProviderDescriptor,
}

impl GeminiProvider {
    pub fn new(api_client: ApiClient, model: impl Into<String>) -> Self {
        Self {
            api_client,
            model: model.into(),
            descriptor: ProviderDescriptor::new(
                GEMINI_PROVIDER_ID,
                "Google Gemini",
                GEMINI_CONFIDENCE_PRIOR,
                vec![Specialty::Vision],
            ),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY is not set"))?;
        let host =
            std::env::var("GEMINI_HOST").unwrap_or_else(|_| GEMINI_API_HOST.to_string());
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| GEMINI_DEFAULT_MODEL.to_string());

        let auth = AuthMethod::ApiKey {
            header_name: "x-goog-api-key".to_string(),
            key: api_key,
        };
        let api_client = ApiClient::new(host, auth)?;
        Ok(Self::new(api_client, model))
    }

    fn findings_result(response: ApiResponse) -> Result<DocumentFindings, ProviderError> {
        match response.status {
            StatusCode::OK => {
                let payload = response.payload.ok_or_else(|| {
                    ProviderError::MalformedResponse("response body is not valid JSON".to_string())
                })?;
                formats::gemini::response_to_findings(&payload)
            }
            status => Err(map_status_to_error(status, response.payload.as_ref())),
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    #[tracing::instrument(skip(self, request), fields(provider = GEMINI_PROVIDER_ID))]
    async fn analyze(&self, request: &AnalysisRequest) -> Result<DocumentFindings, ProviderError> {
        let instructions = formats::render_instructions(request)?;
        let payload = formats::gemini::create_request(&instructions, request);
        let path = format!("v1beta/models/{}:generateContent", self.model);
        let response = self.api_client.api_post(&path, &payload).await?;
        Self::findings_result(response)
    }
}
