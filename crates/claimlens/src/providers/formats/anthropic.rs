//! Anthropic messages format.
//!
//! The document travels as a base64 image source block; the reply is parsed
//! out of the first content block's text.

use serde_json::{json, Value};

use super::{document_base64, findings_from_text};
use crate::findings::DocumentFindings;
use crate::providers::errors::ProviderError;
use crate::request::AnalysisRequest;

const MAX_TOKENS: u32 = 4096;

pub fn create_request(model: &str, instructions: &str, request: &AnalysisRequest) -> Value {
    json!({
        "model": model,
        "max_tokens": MAX_TOKENS,
        "system": instructions,
        "messages": [{
            "role": "user",
            "content": [
                {
                    "type": "image",
                    "source": {
                        "type": "base64",
                        "media_type": request.mime_type,
                        "data": document_base64(request),
                    },
                },
                {
                    "type": "text",
                    "text": "Analyze the attached document.",
                },
            ],
        }],
        "temperature": 0,
    })
}

pub fn response_to_findings(response: &Value) -> Result<DocumentFindings, ProviderError> {
    let text = response
        .pointer("/content/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ProviderError::MalformedResponse("response carries no content text".to_string())
        })?;
    findings_from_text(text)
}
