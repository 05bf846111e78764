use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Failure of a single provider invocation.
///
/// Always recovered at the invoker boundary: one provider's error never
/// aborts sibling calls or the overall request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ProviderError {
    pub fn telemetry_type(&self) -> &'static str {
        match self {
            ProviderError::Authentication(_) => "auth",
            ProviderError::RateLimitExceeded(_) => "rate_limit",
            ProviderError::ServerError(_) => "server",
            ProviderError::NetworkError(_) => "network",
            ProviderError::RequestFailed(_) => "request",
            ProviderError::MalformedResponse(_) => "malformed_response",
        }
    }
}

fn is_network_error(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || (err.status().is_none() && err.is_request())
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if is_network_error(&error) {
            let msg = if error.is_timeout() {
                "request timed out".to_string()
            } else if error.is_connect() {
                match error.url().and_then(|url| url.host_str().map(str::to_string)) {
                    Some(host) => format!("could not connect to {}", host),
                    None => "could not connect to the provider".to_string(),
                }
            } else {
                error.to_string()
            };
            return ProviderError::NetworkError(msg);
        }

        ProviderError::RequestFailed(error.to_string())
    }
}

/// Map a non-success HTTP status plus optional JSON body to a provider error.
///
/// All four vendors nest a human-readable message under `error`, either as a
/// string or as `error.message`.
pub fn map_status_to_error(status: StatusCode, payload: Option<&Value>) -> ProviderError {
    let detail = payload
        .and_then(|body| body.get("error"))
        .and_then(|error| {
            error
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| error.as_str())
        })
        .unwrap_or("no error detail in response body")
        .to_string();

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication(detail),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(detail),
        status if status.is_server_error() => {
            ProviderError::ServerError(format!("{}: {}", status, detail))
        }
        status => ProviderError::RequestFailed(format!("{}: {}", status, detail)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_status_codes_to_error_variants() {
        let body = json!({"error": {"message": "bad key"}});
        assert_eq!(
            map_status_to_error(StatusCode::UNAUTHORIZED, Some(&body)),
            ProviderError::Authentication("bad key".to_string())
        );
        assert!(matches!(
            map_status_to_error(StatusCode::TOO_MANY_REQUESTS, Some(&body)),
            ProviderError::RateLimitExceeded(_)
        ));
        assert!(matches!(
            map_status_to_error(StatusCode::INTERNAL_SERVER_ERROR, None),
            ProviderError::ServerError(_)
        ));
        assert!(matches!(
            map_status_to_error(StatusCode::BAD_REQUEST, Some(&json!({"error": "oops"}))),
            ProviderError::RequestFailed(_)
        ));
    }
}
