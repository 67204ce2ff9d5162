//! Assistant gateway over HTTP (`POST /chat/`)

use super::{build_client, map_send_error, read_body};
use async_trait::async_trait;
use pestwatch_application::{ChatGateway, TransportError};
use pestwatch_domain::{ChatReply, Question};
use reqwest::multipart::Form;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

/// Assistant reached through the service's chat endpoint
pub struct HttpChatGateway {
    client: reqwest::Client,
    url: String,
}

impl HttpChatGateway {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> reqwest::Result<Self> {
        Ok(Self::with_client(build_client(timeout)?, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ChatGateway for HttpChatGateway {
    async fn ask(&self, question: &Question) -> Result<ChatReply, TransportError> {
        debug!("POST {} ({} chars)", self.url, question.content().len());

        let form = Form::new().text("text", question.content().to_string());
        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;

        let body = read_body(response).await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| TransportError::MalformedBody(e.to_string()))?;
        Ok(ChatReply::new(parsed.response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_ask_posts_text_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/"))
            .and(body_string_contains("name=\"text\""))
            .and(body_string_contains("How do I treat aphids?"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"response": "Spray with **neem oil**."}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = HttpChatGateway::new(format!("{}/chat/", server.uri()), None).unwrap();
        let reply = gateway
            .ask(&Question::new("How do I treat aphids?").unwrap())
            .await
            .unwrap();

        assert_eq!(reply.markup, "Spray with **neem oil**.");
    }

    #[tokio::test]
    async fn test_friendly_error_text_becomes_status_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "response": "**Sorry!** The assistant is unavailable right now."
            })))
            .mount(&server)
            .await;

        let gateway = HttpChatGateway::new(format!("{}/chat/", server.uri()), None).unwrap();
        let err = gateway
            .ask(&Question::new("hello").unwrap())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TransportError::Status {
                status: 500,
                detail: "**Sorry!** The assistant is unavailable right now.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_response_field_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"answer": "x"})))
            .mount(&server)
            .await;

        let gateway = HttpChatGateway::new(format!("{}/chat/", server.uri()), None).unwrap();
        let err = gateway.ask(&Question::new("hello").unwrap()).await.unwrap_err();
        assert!(matches!(err, TransportError::MalformedBody(_)));
    }
}
