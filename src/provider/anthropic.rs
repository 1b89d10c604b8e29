use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Provider;
use crate::errors::GenError;

pub const API_VERSION: &str = "2023-06-01";

pub struct Anthropic {
    client: Client,
    model: String,
    api_base: String,
    max_tokens: u32,
}

impl Anthropic {
    pub fn new(client: Client, model: String, api_base: String, max_tokens: u32) -> Self {
        Self { client, model, api_base, max_tokens }
    }
}

#[derive(Serialize)]
struct MsgRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Msg<'a>>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MsgResponse {
    #[serde(default)]
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: String,
    #[serde(default)]
    r#type: String,
}

#[async_trait]
impl Provider for Anthropic {
    async fn complete(&self, prompt: &str, api_key: &str) -> Result<String, GenError> {
        let url = format!("{}/v1/messages", self.api_base.trim_end_matches('/'));
        let body = MsgRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Msg { role: "user", content: prompt }],
        };

        log::debug!("anthropic: POST {}", url);

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(GenError::provider(Some(status.as_u16()), text));
        }

        let parsed: MsgResponse = serde_json::from_str(&text)
            .map_err(|e| GenError::provider(None, format!("anthropic response parse error: {e}")))?;

        parsed
            .content
            .into_iter()
            .find(|b| b.r#type == "text" || !b.text.is_empty())
            .map(|b| b.text)
            .ok_or_else(|| GenError::provider(None, "anthropic: empty content"))
    }
}
