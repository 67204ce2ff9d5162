//! HTTP adapters for the remote classification service.
//!
//! Both endpoints take multipart form posts and answer with JSON. Errors are
//! mapped onto [`TransportError`] here so every gateway reports them the same
//! way.

mod chat;
mod classification;

pub use chat::HttpChatGateway;
pub use classification::HttpClassificationGateway;

use pestwatch_application::TransportError;
use pestwatch_domain::core::text::preview_line;
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("pestwatch/", env!("CARGO_PKG_VERSION"));

/// Longest error detail kept from a non-JSON error body
const MAX_DETAIL_CHARS: usize = 200;

/// Build the shared client. `None` leaves requests without a deadline.
pub fn build_client(timeout: Option<Duration>) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

fn map_send_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_decode() || e.is_body() {
        TransportError::MalformedBody(e.to_string())
    } else {
        TransportError::Unreachable(e.to_string())
    }
}

/// Error bodies the service is known to send
#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    response: Option<String>,
    error: Option<String>,
}

/// Pull a human-readable detail out of an error body.
fn error_detail(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(response) = parsed.response {
            return response;
        }
        if let Some(error) = parsed.error {
            return error;
        }
        match parsed.detail {
            Some(serde_json::Value::String(s)) => return s,
            Some(other) => return preview_line(&other.to_string(), MAX_DETAIL_CHARS),
            None => {}
        }
    }
    if body.trim().is_empty() {
        return "empty response body".to_string();
    }
    preview_line(body, MAX_DETAIL_CHARS)
}

/// Read a response, turning non-2xx statuses into [`TransportError::Status`]
/// and returning the body text otherwise.
async fn read_body(response: reqwest::Response) -> Result<String, TransportError> {
    let status = response.status();
    let body = response.text().await.map_err(map_send_error)?;
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            detail: error_detail(&body),
        });
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_prefers_known_fields() {
        assert_eq!(
            error_detail(r#"{"response": "Sorry, try again later."}"#),
            "Sorry, try again later."
        );
        assert_eq!(error_detail(r#"{"detail": "Invalid image"}"#), "Invalid image");
        assert_eq!(error_detail(r#"{"error": "boom"}"#), "boom");
    }

    #[test]
    fn test_error_detail_structured_detail() {
        let detail = error_detail(r#"{"detail": [{"loc": ["body", "image"], "msg": "field required"}]}"#);
        assert!(detail.contains("field required"));
    }

    #[test]
    fn test_error_detail_plain_text() {
        assert_eq!(error_detail("Internal Server Error"), "Internal Server Error");
        assert_eq!(error_detail("   "), "empty response body");
    }
}
