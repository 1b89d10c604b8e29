use std::sync::Arc;

use async_trait::async_trait;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::errors::GenError;

pub mod anthropic;
pub mod openai;

/// A hosted completion endpoint. The credential travels with each call and
/// is never stored by the provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Sends `prompt` as a single user message and returns the first
    /// completion's text.
    async fn complete(&self, prompt: &str, api_key: &str) -> Result<String, GenError>;
}

pub type DynProvider = Arc<dyn Provider>;

pub fn make_provider(cfg: &Config) -> Result<DynProvider, GenError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
        .build()?;

    match cfg.provider {
        ProviderKind::OpenAI => Ok(Arc::new(openai::OpenAIProvider::new(
            client,
            cfg.model(),
            cfg.api_base(),
            cfg.temperature,
            cfg.max_tokens,
        ))),
        ProviderKind::Anthropic => Ok(Arc::new(anthropic::Anthropic::new(
            client,
            cfg.model(),
            cfg.api_base(),
            cfg.max_tokens,
        ))),
    }
}
