use std::fmt;

use thiserror::Error;

/// Pipeline stage that produced structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Planner,
    Generator,
    Explainer,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Planner => "planner",
            Stage::Generator => "generator",
            Stage::Explainer => "explainer",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum GenError {
    #[error("{0}")]
    MissingInput(&'static str),

    #[error("AI Error: {body}")]
    Provider { status: Option<u16>, body: String },

    #[error("Generation failed: {stage} returned malformed output: {message}")]
    MalformedOutput { stage: Stage, message: String },

    #[error("Invalid component used: {}. Only allowed: {}", .found.join(", "), crate::usage::AllowedComponent::names().join(", "))]
    DisallowedComponent { found: Vec<String> },

    #[error("a generation is already running for session {0}")]
    Busy(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("preview error: {0}")]
    Preview(String),
}

impl GenError {
    pub fn provider(status: Option<u16>, body: impl Into<String>) -> Self {
        GenError::Provider { status, body: body.into() }
    }

    pub fn malformed(stage: Stage, message: impl Into<String>) -> Self {
        GenError::MalformedOutput { stage, message: message.into() }
    }
}

impl From<reqwest::Error> for GenError {
    fn from(e: reqwest::Error) -> Self {
        GenError::Provider {
            status: e.status().map(|s| s.as_u16()),
            body: e.to_string(),
        }
    }
}
