//! Chat completion client
//!
//! Sends one JSON request to a fixed OpenAI-compatible `/chat/completions`
//! URL with bearer authentication and hands back the unparsed response.

use crate::core::config::Config;
use crate::core::constants::CHAT_COMPLETIONS_PATH;
use crate::core::invoker::{ApiKey, Invoke, InvokeError, RawResponse};
use crate::models::openai::{ApiErrorEnvelope, ChatCompletionRequest};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Performs request/response cycles against one chat completion endpoint
///
/// Holds no per-call state; the `reqwest::Client` connection pool is the only
/// thing shared between calls.
pub struct ChatCompletionInvoker {
    client: Client,
    api_key: ApiKey,
    url: String,
}

impl ChatCompletionInvoker {
    /// Create a new invoker
    ///
    /// # Arguments
    ///
    /// * `base_url` - API base URL, e.g. `https://api.nuwaapi.com/v1`
    /// * `api_key` - Bearer token sent with every request
    /// * `timeout` - Request timeout in seconds
    pub fn new(base_url: &str, api_key: ApiKey, timeout: u64) -> Result<Self, InvokeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| InvokeError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            url: format!("{}{}", base_url.trim_end_matches('/'), CHAT_COMPLETIONS_PATH),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, InvokeError> {
        Self::new(&config.base_url, config.api_key.clone(), config.request_timeout)
    }

    /// Replace credential and quota errors with a hint naming the setting to fix
    fn classify_error(error_detail: &str) -> String {
        let error_lower = error_detail.to_lowercase();

        if error_lower.contains("invalid_api_key")
            || error_lower.contains("incorrect api key")
            || error_lower.contains("unauthorized")
        {
            return "Invalid API key. Please check api.api_key or OPENAI_API_KEY.".to_string();
        }

        if error_lower.contains("rate_limit") || error_lower.contains("quota") {
            return "Rate limit exceeded. Please wait and try again, or upgrade your API plan."
                .to_string();
        }

        error_detail.to_string()
    }

    /// Extract a human readable message from an error body
    ///
    /// The body is only parsed when the server labelled it as JSON.
    fn error_message(content_type: Option<&str>, body: &str) -> String {
        if content_type.is_some_and(is_json_content_type) {
            if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) {
                return match envelope.error.code {
                    Some(serde_json::Value::String(code)) => {
                        format!("{}: {}", code, envelope.error.message)
                    }
                    _ => envelope.error.message,
                };
            }
        }
        body.trim().to_string()
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

#[async_trait]
impl Invoke for ChatCompletionInvoker {
    async fn invoke(&self, payload: &ChatCompletionRequest) -> Result<RawResponse, InvokeError> {
        let request_id = Uuid::new_v4();

        let body = serde_json::to_vec(payload).map_err(|e| {
            error!("[{}] Failed to serialize chat request: {}", request_id, e);
            InvokeError::Serialization(e.to_string())
        })?;

        debug!(
            "[{}] POST {} (model: {}, messages: {}, max_tokens: {})",
            request_id,
            self.url,
            payload.model,
            payload.messages.len(),
            payload.max_tokens
        );

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .bearer_auth(self.api_key.expose())
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("[{}] Error sending request to {}: {}", request_id, self.url, e);
                InvokeError::from(e)
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let text = response.text().await.map_err(|e| {
            error!("[{}] Error reading response body: {}", request_id, e);
            InvokeError::from(e)
        })?;

        if !status.is_success() {
            let detail = Self::error_message(content_type.as_deref(), &text);
            let message = if detail.is_empty() {
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            } else {
                Self::classify_error(&detail)
            };
            warn!("[{}] Endpoint returned {}: {}", request_id, status, message);

            return Err(match status.as_u16() {
                code @ (401 | 403) => InvokeError::Authentication {
                    status: code,
                    message,
                },
                429 => InvokeError::RateLimit(message),
                400 => InvokeError::BadRequest(message),
                code => InvokeError::Api {
                    status: code,
                    message,
                },
            });
        }

        debug!(
            "[{}] Received {} ({} bytes)",
            request_id,
            status,
            text.len()
        );

        Ok(RawResponse {
            request_id,
            status: status.as_u16(),
            content_type,
            body: text,
        })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::openai::Message;
    use axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode, header},
        response::IntoResponse,
        routing::post,
    };
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured {
        requests: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    async fn hi_completion(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        captured.requests.lock().unwrap().push((headers, body));
        Json(json!({"choices":[{"message":{"content":"Hi"}}]}))
    }

    fn hello_payload() -> ChatCompletionRequest {
        ChatCompletionRequest::new("gpt-4o-mini", vec![Message::user("Hello")], 5)
    }

    fn invoker(base_url: &str) -> ChatCompletionInvoker {
        ChatCompletionInvoker::new(base_url, ApiKey::new("sk-test").unwrap(), 5).unwrap()
    }

    #[test]
    fn test_endpoint_url() {
        let invoker = invoker("https://api.nuwaapi.com/v1/");
        assert_eq!(invoker.endpoint(), "https://api.nuwaapi.com/v1/chat/completions");
    }

    #[test]
    fn test_classify_auth_error() {
        let result = ChatCompletionInvoker::classify_error("invalid_api_key: The API key is invalid");
        assert!(result.contains("API key"));
    }

    #[test]
    fn test_classify_quota_error() {
        let result = ChatCompletionInvoker::classify_error("insufficient_quota: You exceeded your quota");
        assert!(result.starts_with("Rate limit exceeded"));
    }

    #[test]
    fn test_classify_passthrough() {
        let result = ChatCompletionInvoker::classify_error("upstream overloaded");
        assert_eq!(result, "upstream overloaded");
    }

    #[test]
    fn test_json_content_type_detection() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/plain; charset=utf-8"));
        assert!(!is_json_content_type("text/html"));
    }

    #[tokio::test]
    async fn test_invoke_logs_expected_object() {
        let captured = Captured::default();
        let router = Router::new()
            .route("/v1/chat/completions", post(hi_completion))
            .with_state(captured.clone());
        let base_url = serve(router).await;

        let response = invoker(&base_url).invoke(&hello_payload()).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(
            response.json().unwrap(),
            json!({"choices":[{"message":{"content":"Hi"}}]})
        );

        let requests = captured.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (headers, body) = &requests[0];
        assert_eq!(headers[header::AUTHORIZATION], "Bearer sk-test");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            body,
            &json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "Hello"}],
                "max_tokens": 5
            })
        );
    }

    #[tokio::test]
    async fn test_two_invocations_are_independent() {
        let captured = Captured::default();
        let router = Router::new()
            .route("/v1/chat/completions", post(hi_completion))
            .with_state(captured.clone());
        let base_url = serve(router).await;
        let invoker = invoker(&base_url);
        let payload = hello_payload();

        let (first, second) = tokio::join!(invoker.invoke(&payload), invoker.invoke(&payload));
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_ne!(first.request_id, second.request_id);
        assert_eq!(first.json().unwrap(), second.json().unwrap());
        assert_eq!(payload, hello_payload());

        let requests = captured.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].1, requests[1].1);
    }

    #[tokio::test]
    async fn test_unauthorized_plain_text_is_not_parsed() {
        async fn unauthorized() -> impl IntoResponse {
            (StatusCode::UNAUTHORIZED, "token expired")
        }
        let base_url = serve(Router::new().route("/v1/chat/completions", post(unauthorized))).await;

        let err = invoker(&base_url).invoke(&hello_payload()).await.unwrap_err();

        match err {
            InvokeError::Authentication { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "token expired");
            }
            other => panic!("expected authentication error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_json_envelope_is_classified() {
        async fn unauthorized() -> impl IntoResponse {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"message": "Incorrect API key provided", "code": "invalid_api_key"}})),
            )
        }
        let base_url = serve(Router::new().route("/v1/chat/completions", post(unauthorized))).await;

        let err = invoker(&base_url).invoke(&hello_payload()).await.unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_json_looking_text_body_is_kept_raw() {
        async fn unavailable() -> impl IntoResponse {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::CONTENT_TYPE, "text/plain")],
                r#"{"error":{"message":"hidden"}}"#,
            )
        }
        let base_url = serve(Router::new().route("/v1/chat/completions", post(unavailable))).await;

        let err = invoker(&base_url).invoke(&hello_payload()).await.unwrap_err();

        match err {
            InvokeError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, r#"{"error":{"message":"hidden"}}"#);
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forbidden_keeps_its_status() {
        async fn forbidden() -> impl IntoResponse {
            (StatusCode::FORBIDDEN, "forbidden")
        }
        let base_url = serve(Router::new().route("/v1/chat/completions", post(forbidden))).await;

        let err = invoker(&base_url).invoke(&hello_payload()).await.unwrap_err();

        assert!(matches!(err, InvokeError::Authentication { .. }));
        assert_eq!(err.status(), Some(403));
        assert!(err.to_string().contains("status 403"));
    }

    #[tokio::test]
    async fn test_rate_limit_status() {
        async fn limited() -> impl IntoResponse {
            (StatusCode::TOO_MANY_REQUESTS, "slow down")
        }
        let base_url = serve(Router::new().route("/v1/chat/completions", post(limited))).await;

        let err = invoker(&base_url).invoke(&hello_payload()).await.unwrap_err();
        assert!(matches!(err, InvokeError::RateLimit(_)));
    }

    #[tokio::test]
    async fn test_malformed_success_body_fails_at_parse() {
        async fn garbage() -> impl IntoResponse {
            ([(header::CONTENT_TYPE, "application/json")], "{\"choices\": [")
        }
        let base_url = serve(Router::new().route("/v1/chat/completions", post(garbage))).await;

        let response = invoker(&base_url).invoke(&hello_payload()).await.unwrap();

        assert_eq!(response.status, 200);
        assert!(matches!(response.json(), Err(InvokeError::ResponseParse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let base_url = format!("http://127.0.0.1:{}/v1", port);

        let err = invoker(&base_url).invoke(&hello_payload()).await.unwrap_err();

        assert!(err.is_network(), "expected network error, got {:?}", err);
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        async fn slow() -> Json<Value> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({}))
        }
        let base_url = serve(Router::new().route("/v1/chat/completions", post(slow))).await;
        let invoker =
            ChatCompletionInvoker::new(&base_url, ApiKey::new("sk-test").unwrap(), 1).unwrap();

        let err = invoker.invoke(&hello_payload()).await.unwrap_err();

        assert!(matches!(err, InvokeError::Timeout));
    }
}
