use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::errors::GenError;

/// OpenAI-compatible chat completions (OpenAI, Groq, and other services
/// exposing `/chat/completions`).
pub struct OpenAIProvider {
    model: String,
    client: Client,
    api_base: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIProvider {
    pub fn new(client: Client, model: String, api_base: String, temperature: f32, max_tokens: u32) -> Self {
        Self { model, client, api_base, temperature, max_tokens }
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[async_trait]
impl super::Provider for OpenAIProvider {
    async fn complete(&self, prompt: &str, api_key: &str) -> Result<String, GenError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let url = self.url();
        log::debug!("openai: POST {} ({} prompt bytes)", url, prompt.len());

        let resp = self.client.post(&url).bearer_auth(api_key).json(&body).send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        log::debug!("openai: status {}, {} response bytes", status, text.len());

        if !status.is_success() {
            return Err(GenError::provider(Some(status.as_u16()), text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| GenError::provider(None, format!("failed to parse completion response: {e}\nRaw: {text}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenError::provider(None, "completion response contained no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn provider(base: String) -> OpenAIProvider {
        OpenAIProvider::new(Client::new(), "test-model".into(), base, 0.4, 256)
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice_and_sends_bearer() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or("").to_string();
                let prompt = body["messages"][0]["content"].as_str().unwrap_or("").to_string();
                Json(json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": format!("{auth}|{prompt}|{}", body["model"]) } },
                        { "message": { "role": "assistant", "content": "second" } }
                    ]
                }))
            }),
        );
        let base = serve(app).await;
        let out = provider(base).complete("hello", "sk-test").await.unwrap();
        assert_eq!(out, "Bearer sk-test|hello|\"test-model\"");
    }

    #[tokio::test]
    async fn test_non_success_carries_raw_body() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, r#"{"error":{"message":"Invalid API Key"}}"#) }),
        );
        let base = serve(app).await;
        let err = provider(base).complete("hello", "bad").await.unwrap_err();
        match err {
            GenError::Provider { status, body } => {
                assert_eq!(status, Some(401));
                assert!(body.contains("Invalid API Key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_provider_error() {
        let app = Router::new().route("/v1/chat/completions", post(|| async { Json(json!({ "choices": [] })) }));
        let base = serve(app).await;
        let err = provider(base).complete("hello", "k").await.unwrap_err();
        assert!(matches!(err, GenError::Provider { status: None, .. }));
    }
}
