//! Chat-completion transport for OpenAI-compatible endpoints (OpenRouter by default).

use crate::error::ChatError;
use crate::models::ChatRequest;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_CHAT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Sends one stateless chat-completion request and returns the reply text.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError>;
}

#[derive(Clone, Default)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub chat_endpoint: Url,
    pub api_key: ApiKey,
    pub timeout: Duration,
    /// Extra attempts after the first failure; zero disables retry.
    pub max_retries: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: Client,
    config: EndpointConfig,
}

impl OpenRouterClient {
    pub fn new(config: EndpointConfig) -> Result<Self, ChatError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let mut builder = self
            .http
            .post(self.config.chat_endpoint.clone())
            .header("Content-Type", "application/json")
            .json(request);
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(self.config.api_key.expose());
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            let snippet = body.chars().take(200).collect::<String>();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body: snippet,
            });
        }

        debug!(model = %request.model, body = %body, "chat raw response");
        extract_content(&body)
    }
}

#[async_trait]
impl ChatClient for OpenRouterClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let mut attempt = 0;
        loop {
            match self.send_once(request).await {
                Ok(content) => return Ok(content),
                Err(error) if attempt < self.config.max_retries => {
                    let delay = RETRY_BASE_DELAY * 2u32.pow(attempt);
                    warn!(
                        model = %request.model,
                        %error,
                        attempt = attempt + 1,
                        "chat request failed, retrying in {:?}",
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

fn map_transport_error(error: reqwest::Error) -> ChatError {
    if error.is_timeout() {
        ChatError::Timeout
    } else {
        ChatError::Http(error)
    }
}

/// Reads `choices[0].message.content` from a completion body.
fn extract_content(body: &str) -> Result<String, ChatError> {
    let payload: CompletionResponse = serde_json::from_str(body)
        .map_err(|error| ChatError::MalformedResponse(error.to_string()))?;

    let content = payload
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ChatError::MalformedResponse("response has no choices".to_string()))?
        .message
        .content
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(ChatError::EmptyContent);
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatMessage, SamplingParams};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, max_retries: u32) -> OpenRouterClient {
        let endpoint = Url::parse(&format!("{}/api/v1/chat/completions", server.uri())).unwrap();
        OpenRouterClient::new(EndpointConfig {
            chat_endpoint: endpoint,
            api_key: ApiKey::new("test-key"),
            timeout: Duration::from_secs(5),
            max_retries,
        })
        .unwrap()
    }

    fn request() -> ChatRequest {
        ChatRequest::new(
            "thedrummer/valkyrie-49b-v1",
            vec![ChatMessage::system("system"), ChatMessage::user("What is KALIA?")],
            SamplingParams::default(),
        )
    }

    #[test]
    fn api_key_is_redacted_in_debug_output() {
        let key = ApiKey::new("sk-secret");
        assert_eq!(format!("{key:?}"), "[REDACTED]");
    }

    #[test]
    fn extract_content_reads_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "Hello");
        assert!(matches!(
            extract_content(r#"{"choices":[]}"#),
            Err(ChatError::MalformedResponse(_))
        ));
        assert!(matches!(
            extract_content(r#"{"choices":[{"message":{"content":"  "}}]}"#),
            Err(ChatError::EmptyContent)
        ));
        assert!(matches!(
            extract_content("not json"),
            Err(ChatError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn complete_posts_sampling_parameters_and_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "thedrummer/valkyrie-49b-v1",
                "max_tokens": 1500,
                "messages": [
                    {"role": "system", "content": "system"},
                    {"role": "user", "content": "What is KALIA?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "KALIA supports farmers."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, 0);
        let answer = client.complete(&request()).await.unwrap();
        assert_eq!(answer, "KALIA supports farmers.");
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, 0);
        match client.complete(&request()).await {
            Err(ChatError::Status { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failures_are_retried_up_to_the_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server, 1);
        assert!(client.complete(&request()).await.is_err());
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"choices": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let endpoint = Url::parse(&format!("{}/chat", server.uri())).unwrap();
        let client = OpenRouterClient::new(EndpointConfig {
            chat_endpoint: endpoint,
            api_key: ApiKey::default(),
            timeout: Duration::from_millis(50),
            max_retries: 0,
        })
        .unwrap();

        assert!(matches!(
            client.complete(&request()).await,
            Err(ChatError::Timeout)
        ));
    }
}
