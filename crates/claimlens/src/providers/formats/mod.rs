//! Per-vendor wire formats.
//!
//! Each vendor module owns `create_request` (JSON payload with the inlined
//! base64 document) and `response_to_findings` (structured findings out of
//! the vendor's response envelope). The xAI API is OpenAI-compatible and
//! reuses the `openai` module.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use super::errors::ProviderError;
use crate::findings::DocumentFindings;
use crate::prompt_template;
use crate::request::AnalysisRequest;

#[derive(Serialize)]
struct InstructionFlag {
    key: String,
    value: String,
}

#[derive(Serialize)]
struct InstructionContext {
    kind: Option<String>,
    flags: Vec<InstructionFlag>,
}

/// Render the natural-language instruction string every vendor embeds in its
/// payload: the field contract plus the caller's declared kind and context
/// flags.
pub(crate) fn render_instructions(request: &AnalysisRequest) -> Result<String, ProviderError> {
    let context = InstructionContext {
        kind: request.kind.map(|kind| kind.to_string()),
        flags: request
            .context
            .iter()
            .map(|(key, value)| InstructionFlag {
                key: key.clone(),
                value: flag_display(value),
            })
            .collect(),
    };

    prompt_template::render_file("analyze.md", &context).map_err(|e| {
        ProviderError::RequestFailed(format!("failed to render analysis instructions: {}", e))
    })
}

fn flag_display(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// The document as a `data:` URL for vendors that take inline images by URL.
pub(crate) fn document_data_url(request: &AnalysisRequest) -> String {
    format!(
        "data:{};base64,{}",
        request.mime_type,
        STANDARD.encode(&request.document)
    )
}

/// The document as bare base64 for vendors that take mime type and data
/// separately.
pub(crate) fn document_base64(request: &AnalysisRequest) -> String {
    STANDARD.encode(&request.document)
}

/// Parse a model's text reply into findings, tolerating markdown code fences
/// around the JSON body.
pub(crate) fn findings_from_text(text: &str) -> Result<DocumentFindings, ProviderError> {
    let body = strip_code_fences(text);
    serde_json::from_str(body).map_err(|e| {
        ProviderError::MalformedResponse(format!("reply is not valid findings JSON: {}", e))
    })
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(inner) = trimmed.strip_prefix("```") {
        let inner = inner.strip_prefix("json").unwrap_or(inner);
        let inner = inner.trim();
        return inner.strip_suffix("```").unwrap_or(inner).trim_end();
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ContextFlags, DocumentKind};
    use indoc::indoc;

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(vec![0xFF, 0xD8, 0xFF], "image/jpeg")
            .with_kind(DocumentKind::Claim)
            .with_context(ContextFlags::new().set("hurricane", true).set("county", "charlotte"))
    }

    #[test]
    fn instructions_embed_kind_and_flags() {
        let instructions = render_instructions(&request()).unwrap();
        assert!(instructions.contains("declared this document as: claim"));
        assert!(instructions.contains("- county: charlotte"));
        assert!(instructions.contains("- hurricane: true"));
    }

    #[test]
    fn data_url_carries_mime_type_and_payload() {
        let url = document_data_url(&request());
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert!(url.ends_with("/9j/"));
    }

    #[test]
    fn findings_parse_with_and_without_fences() {
        let plain = r#"{"documentType": "claim"}"#;
        assert_eq!(
            findings_from_text(plain).unwrap().document_type.as_deref(),
            Some("claim")
        );

        let fenced = indoc! {r#"
            ```json
            {"documentType": "claim"}
            ```
        "#};
        assert_eq!(
            findings_from_text(fenced).unwrap().document_type.as_deref(),
            Some("claim")
        );
    }

    #[test]
    fn malformed_reply_is_a_provider_error() {
        let parsed = findings_from_text("the document appears to be a claim");
        assert!(matches!(parsed, Err(ProviderError::MalformedResponse(_))));
    }
}
