//! Errors raised while parsing or validating session data.

use thiserror::Error;

/// Errors from the rules layer. All of them are configuration problems.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("unknown knowledge tier '{0}'")]
    UnknownTier(String),

    #[error("invalid knowledge level '{0}'")]
    InvalidKnowledgeLevel(String),

    #[error("unknown interaction type '{0}'")]
    UnknownInteractionType(String),

    #[error("invalid session setup: {0}")]
    InvalidSetup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
