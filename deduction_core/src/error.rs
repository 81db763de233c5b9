//! Error types for the deduction core.

use deduction_rules::{CharacterId, GoalId, RulesError, SecretId, SessionId};
use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the core.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the deduction core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed knowledge tier, invalid setup or config. Fatal during initialization.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unknown character, secret or goal reference. Local to the caller.
    #[error("not found: {0}")]
    NotFound(NotFound),

    /// An action pack failed validation.
    #[error("malformed action from {character}: {reason}")]
    MalformedAction {
        character: CharacterId,
        reason: String,
    },

    /// The decision collaborator did not answer in time.
    #[error("collaborator timed out after {0:?}")]
    CollaboratorTimeout(Duration),

    /// The collaborator failed outright.
    #[error("collaborator failed: {0}")]
    Collaborator(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    /// A mutation was attempted after the session terminated.
    #[error("session {0} has terminated")]
    SessionTerminated(SessionId),
}

/// What could not be found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("character '{0}'")]
    Character(CharacterId),

    #[error("secret '{secret}' of character '{character}'")]
    Secret {
        character: CharacterId,
        secret: SecretId,
    },

    #[error("goal '{goal}' of character '{character}'")]
    Goal { character: CharacterId, goal: GoalId },
}

impl CoreError {
    pub fn character_not_found(id: &CharacterId) -> Self {
        CoreError::NotFound(NotFound::Character(id.clone()))
    }

    pub fn secret_not_found(character: &CharacterId, secret: &SecretId) -> Self {
        CoreError::NotFound(NotFound::Secret {
            character: character.clone(),
            secret: secret.clone(),
        })
    }

    pub fn malformed(character: &CharacterId, reason: impl Into<String>) -> Self {
        CoreError::MalformedAction {
            character: character.clone(),
            reason: reason.into(),
        }
    }

    /// Whether the retry-then-skip policy applies to this error.
    pub fn is_turn_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::MalformedAction { .. }
                | CoreError::CollaboratorTimeout(_)
                | CoreError::Collaborator(_)
        )
    }
}

impl From<RulesError> for CoreError {
    fn from(err: RulesError) -> Self {
        CoreError::Configuration(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Persistence(err.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Persistence(err.to_string())
    }
}
