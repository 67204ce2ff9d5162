//! Classification gateway over HTTP (`POST /predict-all/`)

use super::{build_client, map_send_error, read_body};
use async_trait::async_trait;
use pestwatch_application::{ClassificationGateway, TransportError};
use pestwatch_domain::{Confidence, PredictionRequest, PredictionResult};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Success body of the classification endpoint
#[derive(Deserialize)]
struct PredictResponse {
    prediction: String,
    explanation: Option<String>,
    confidence: Option<f64>,
}

/// Classifier reached through the service's multipart endpoint.
///
/// Sends `image` as a file part and `query` as a text part when the request
/// text is not blank.
pub struct HttpClassificationGateway {
    client: reqwest::Client,
    url: String,
}

impl HttpClassificationGateway {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> reqwest::Result<Self> {
        Ok(Self::with_client(build_client(timeout)?, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn form(request: &PredictionRequest) -> Result<Form, TransportError> {
        let image = request.image();
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().to_string())
            .mime_str(image.mime_type())
            .map_err(|e| {
                TransportError::InvalidRequest(format!(
                    "MIME type '{}': {}",
                    image.mime_type(),
                    e
                ))
            })?;

        let mut form = Form::new().part("image", part);
        if let Some(query) = request.query() {
            form = form.text("query", query.to_string());
        }
        Ok(form)
    }

    fn parse(body: &str) -> Result<PredictionResult, TransportError> {
        let parsed: PredictResponse = serde_json::from_str(body)
            .map_err(|e| TransportError::MalformedBody(e.to_string()))?;

        let label = parsed.prediction.trim();
        if label.is_empty() {
            return Err(TransportError::MalformedBody(
                "prediction is empty".to_string(),
            ));
        }

        let mut result = PredictionResult::new(label);
        if let Some(value) = parsed.confidence {
            let confidence = Confidence::new(value)
                .map_err(|e| TransportError::MalformedBody(e.to_string()))?;
            result = result.with_confidence(confidence);
        }
        if let Some(explanation) = parsed.explanation {
            result = result.with_explanation(explanation);
        }
        Ok(result)
    }
}

#[async_trait]
impl ClassificationGateway for HttpClassificationGateway {
    async fn classify(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResult, TransportError> {
        debug!(
            "POST {} ({} bytes, query: {})",
            self.url,
            request.image().len(),
            request.query().is_some()
        );

        let response = self
            .client
            .post(&self.url)
            .multipart(Self::form(request)?)
            .send()
            .await
            .map_err(map_send_error)?;

        let body = read_body(response).await?;
        Self::parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pestwatch_domain::ImagePayload;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(text: Option<&str>) -> PredictionRequest {
        let image = ImagePayload::new(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3], "leaf.jpg");
        PredictionRequest::new(image, text.map(str::to_string)).unwrap()
    }

    async fn gateway_for(server: &MockServer) -> HttpClassificationGateway {
        HttpClassificationGateway::new(format!("{}/predict-all/", server.uri()), None).unwrap()
    }

    #[tokio::test]
    async fn test_aphids_without_confidence() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict-all/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "prediction": "aphids",
                "explanation": "## Aphids\n<b>Small</b> sap-sucking insects."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = gateway_for(&server)
            .await
            .classify(&request(Some("")))
            .await
            .unwrap();

        assert_eq!(result.label, "aphids");
        assert!(result.confidence.is_none());
        assert_eq!(
            result.explanation.as_deref(),
            Some("## Aphids\n<b>Small</b> sap-sucking insects.")
        );

        // The JPEG bytes are not UTF-8, so inspect the body lossily
        let received = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&received[0].body);
        assert!(body.contains("name=\"image\""));
        assert!(body.contains("filename=\"leaf.jpg\""));
        assert!(body.contains("image/jpeg"));
    }

    #[tokio::test]
    async fn test_blank_text_not_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"prediction": "mites"})),
            )
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        gateway.classify(&request(Some("   "))).await.unwrap();
        gateway.classify(&request(Some("webbing under leaves"))).await.unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 2);
        let first = String::from_utf8_lossy(&received[0].body);
        let second = String::from_utf8_lossy(&received[1].body);
        assert!(!first.contains("name=\"query\""));
        assert!(second.contains("name=\"query\""));
        assert!(second.contains("webbing under leaves"));
    }

    #[tokio::test]
    async fn test_confidence_passed_through_and_validated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"prediction": "thrips", "confidence": 0.82}),
            ))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"prediction": "thrips", "confidence": 1.7}),
            ))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let ok = gateway.classify(&request(None)).await.unwrap();
        assert_eq!(ok.confidence.map(|c| c.value()), Some(0.82));

        let err = gateway.classify(&request(None)).await.unwrap_err();
        assert!(matches!(err, TransportError::MalformedBody(_)));
    }

    #[tokio::test]
    async fn test_non_2xx_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(serde_json::json!({"detail": "Invalid image"})),
            )
            .mount(&server)
            .await;

        let err = gateway_for(&server)
            .await
            .classify(&request(None))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TransportError::Status {
                status: 422,
                detail: "Invalid image".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = gateway_for(&server)
            .await
            .classify(&request(None))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::MalformedBody(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"prediction": "aphids"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let gateway = HttpClassificationGateway::new(
            format!("{}/predict-all/", server.uri()),
            Some(Duration::from_millis(200)),
        )
        .unwrap();

        let err = gateway.classify(&request(None)).await.unwrap_err();
        assert_eq!(err, TransportError::Timeout);
    }

    #[tokio::test]
    async fn test_unreachable() {
        let gateway =
            HttpClassificationGateway::new("http://127.0.0.1:9/predict-all/", None).unwrap();
        let err = gateway.classify(&request(None)).await.unwrap_err();
        assert!(matches!(err, TransportError::Unreachable(_)));
    }
}
