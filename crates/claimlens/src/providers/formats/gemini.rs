//! Gemini `generateContent` format.
//!
//! The document travels as an `inlineData` part; JSON replies are requested
//! through `responseMimeType` and parsed out of the first candidate part.

use serde_json::{json, Value};

use super::{document_base64, findings_from_text};
use crate::findings::DocumentFindings;
use crate::providers::errors::ProviderError;
use crate::request::AnalysisRequest;

pub fn create_request(instructions: &str, request: &AnalysisRequest) -> Value {
    json!({
        "systemInstruction": {
            "parts": [{ "text": instructions }],
        },
        "contents": [{
            "role": "user",
            "parts": [
                { "text": "Analyze the attached document." },
                {
                    "inlineData": {
                        "mimeType": request.mime_type,
                        "data": document_base64(request),
                    },
                },
            ],
        }],
        "generationConfig": {
            "temperature": 0,
            "responseMimeType": "application/json",
        },
    })
}

pub fn response_to_findings(response: &Value) -> Result<DocumentFindings, ProviderError> {
    let text = response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ProviderError::MalformedResponse("response carries no candidate text".to_string())
        })?;
    findings_from_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_inlines_document_with_mime_type() {
        let request = AnalysisRequest::new(vec![1, 2, 3], "application/pdf");
        let payload = create_request("extract the fields", &request);

        assert_eq!(
            payload["systemInstruction"]["parts"][0]["text"],
            "extract the fields"
        );
        let inline = &payload["contents"][0]["parts"][1]["inlineData"];
        assert_eq!(inline["mimeType"], "application/pdf");
        assert_eq!(inline["data"], "AQID");
        assert_eq!(
            payload["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn parses_findings_out_of_the_candidate_envelope() {
        let response = json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": "{\"category\": \"roof-damage\"}" }],
                },
            }],
        });

        let findings = response_to_findings(&response).unwrap();
        assert_eq!(findings.category.as_deref(), Some("roof-damage"));
    }

    #[test]
    fn empty_candidates_are_malformed() {
        assert!(matches!(
            response_to_findings(&json!({"candidates": []})),
            Err(ProviderError::MalformedResponse(_))
        ));
    }
}
