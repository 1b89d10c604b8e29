use std::path::Path;

use anyhow::Context;
use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::cli::{Args, ProviderKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderKind,
    /// Falls back to a per-provider default when unset.
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub bind: String,
    /// Idle sessions older than this are dropped by the server.
    pub session_ttl_secs: u64,
    pub preview: PreviewAssets,
}

/// Script URLs loaded by the sandboxed preview document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewAssets {
    pub react_url: String,
    pub react_dom_url: String,
    pub babel_url: String,
}

impl Default for PreviewAssets {
    fn default() -> Self {
        Self {
            react_url: "https://unpkg.com/react@18/umd/react.development.js".into(),
            react_dom_url: "https://unpkg.com/react-dom@18/umd/react-dom.development.js".into(),
            babel_url: "https://unpkg.com/@babel/standalone@7/babel.min.js".into(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAI,
            model: None,
            api_base: None,
            temperature: 0.4,
            max_tokens: 4000,
            timeout_secs: 120,
            bind: "127.0.0.1:3000".into(),
            session_ttl_secs: crate::session::DEFAULT_IDLE_TTL_SECS,
            preview: PreviewAssets::default(),
        }
    }
}

impl Config {
    pub fn model(&self) -> String {
        self.model.clone().unwrap_or_else(|| {
            match self.provider {
                ProviderKind::OpenAI => "openai/gpt-oss-120b",
                ProviderKind::Anthropic => "claude-sonnet-4-20250514",
            }
            .to_string()
        })
    }

    pub fn api_base(&self) -> String {
        self.api_base.clone().unwrap_or_else(|| {
            match self.provider {
                ProviderKind::OpenAI => "https://api.groq.com/openai/v1",
                ProviderKind::Anthropic => "https://api.anthropic.com",
            }
            .to_string()
        })
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("invalid config file")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Config file (if any) with command-line overrides applied.
    pub fn resolve(args: &Args) -> anyhow::Result<Self> {
        let mut cfg = match &args.config {
            Some(p) => Self::load(Path::new(p))?,
            None => Self::default(),
        };
        if let Some(p) = args.provider {
            cfg.provider = p;
        }
        if let Some(m) = &args.model {
            cfg.model = Some(m.clone());
        }
        if let Some(b) = &args.api_base {
            cfg.api_base = Some(b.clone());
        }
        if let Some(t) = args.timeout_secs {
            cfg.timeout_secs = t;
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_provider_defaults() {
        let mut cfg = Config::default();
        assert_eq!(cfg.api_base(), "https://api.groq.com/openai/v1");
        cfg.provider = ProviderKind::Anthropic;
        assert_eq!(cfg.api_base(), "https://api.anthropic.com");
        assert_eq!(cfg.model(), "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            provider = "anthropic"
            max_tokens = 2000

            [preview]
            babel_url = "https://cdn.example/babel.js"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.provider, ProviderKind::Anthropic);
        assert_eq!(cfg.max_tokens, 2000);
        assert_eq!(cfg.timeout_secs, 120);
        assert_eq!(cfg.session_ttl_secs, 3600);
        assert_eq!(cfg.preview.babel_url, "https://cdn.example/babel.js");
        assert!(cfg.preview.react_url.contains("react@18"));
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model = \"from-file\"\ntimeout_secs = 30").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let args = Args::try_parse_from(["vibe_ui", "--config", &path, "--timeout-secs", "5", "serve"]).unwrap();
        let cfg = Config::resolve(&args).unwrap();
        assert_eq!(cfg.model(), "from-file");
        assert_eq!(cfg.timeout_secs, 5);
    }
}
