use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::{fmt::Debug, time::Duration};

use crate::{
    config::GeneratorConfig,
    error::{PipelineError, describe_transport_error, truncate_body},
};

/// Black-box text completion capability.
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    /// Complete `prompt`. Unreachable backends, timeouts and 5xx statuses
    /// surface as [`PipelineError::GenerationUnavailable`]; 4xx statuses as
    /// [`PipelineError::GenerationRejected`].
    async fn complete(&self, prompt: &str) -> Result<String, PipelineError>;
}

/// Client for an Ollama-style `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    hostname: String,
    model: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaGenerator {
    pub fn new(hostname: &str, config: &GeneratorConfig) -> Result<Self, PipelineError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            hostname: normalize_host(hostname),
            model: config.model.clone(),
            http,
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, PipelineError> {
        let url = format!("{}/api/generate", self.hostname);
        tracing::debug!(%url, model = %self.model, "requesting completion");

        let payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let res = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PipelineError::GenerationUnavailable(describe_transport_error(&e)))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            PipelineError::GenerationUnavailable(format!(
                "Failed to read completion body: {}",
                describe_transport_error(&e)
            ))
        })?;

        if status.is_client_error() {
            return Err(PipelineError::GenerationRejected {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        if !status.is_success() {
            return Err(PipelineError::GenerationUnavailable(format!(
                "Completion request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: OllamaResponse =
            serde_json::from_str(&body).map_err(|e| PipelineError::GenerationMalformed {
                reason: format!("completion envelope is not valid JSON: {e}"),
                raw: body.clone(),
            })?;

        Ok(parsed.response.trim().to_string())
    }
}

/// Accept bare `host:port` values as well as full URLs.
fn normalize_host(hostname: &str) -> String {
    let trimmed = hostname.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(host: &str) -> OllamaGenerator {
        OllamaGenerator::new(host, &GeneratorConfig::default()).expect("client")
    }

    #[test]
    fn normalize_host_adds_scheme_and_strips_slash() {
        assert_eq!(normalize_host("gpu-box:11434/"), "http://gpu-box:11434");
        assert_eq!(normalize_host("https://llm.local/"), "https://llm.local");
    }

    #[tokio::test]
    async fn complete_returns_trimmed_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({ "model": "llama3.2:1b", "stream": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.2:1b",
                "response": "  Summary: ok\n",
                "done": true
            })))
            .mount(&mock_server)
            .await;

        let text = generator(&mock_server.uri()).complete("hi").await.expect("complete");
        assert_eq!(text, "Summary: ok");
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
            .mount(&mock_server)
            .await;

        let err = generator(&mock_server.uri()).complete("hi").await.unwrap_err();
        assert!(matches!(err, PipelineError::GenerationUnavailable(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn unknown_model_is_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({ "error": "model \"llama3.2:1b\" not found" })),
            )
            .mount(&mock_server)
            .await;

        let err = generator(&mock_server.uri()).complete("hi").await.unwrap_err();
        match &err {
            PipelineError::GenerationRejected { status, body } => {
                assert_eq!(*status, 404);
                assert!(body.contains("not found"));
            }
            other => panic!("expected GenerationRejected, got {other:?}"),
        }
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn non_json_envelope_is_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let err = generator(&mock_server.uri()).complete("hi").await.unwrap_err();
        assert!(matches!(err, PipelineError::GenerationMalformed { .. }));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "response": "late" }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let config = GeneratorConfig { timeout_secs: 1, ..GeneratorConfig::default() };
        let err = OllamaGenerator::new(&mock_server.uri(), &config)
            .expect("client")
            .complete("hi")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::GenerationUnavailable(_)));
        assert!(err.to_string().contains("timed out"));
    }
}
