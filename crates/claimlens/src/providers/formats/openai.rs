//! OpenAI chat-completions format, also spoken by the xAI API.
//!
//! The document travels as a `data:` URL image part; the reply is requested
//! in JSON mode and parsed out of `choices[0].message.content`.

use serde_json::{json, Value};

use super::{document_data_url, findings_from_text};
use crate::findings::DocumentFindings;
use crate::providers::errors::ProviderError;
use crate::request::AnalysisRequest;

pub fn create_request(model: &str, instructions: &str, request: &AnalysisRequest) -> Value {
    json!({
        "model": model,
        "messages": [
            {
                "role": "system",
                "content": instructions,
            },
            {
                "role": "user",
                "content": [
                    {
                        "type": "text",
                        "text": "Analyze the attached document.",
                    },
                    {
                        "type": "image_url",
                        "image_url": { "url": document_data_url(request) },
                    },
                ],
            },
        ],
        "response_format": { "type": "json_object" },
        "temperature": 0,
    })
}

pub fn response_to_findings(response: &Value) -> Result<DocumentFindings, ProviderError> {
    let text = response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ProviderError::MalformedResponse(
                "completion response carries no message content".to_string(),
            )
        })?;
    findings_from_text(text)
}
