//! Progression operation errors.

use ghostplay_domain::DomainError;

use crate::infrastructure::ports::{ErrorKind, RepoError};

/// Errors that can occur during progression operations.
///
/// Every variant maps onto one [`ErrorKind`]; callers branch on
/// [`ProgressionError::kind`] rather than on messages.
#[derive(Debug, thiserror::Error)]
pub enum ProgressionError {
    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Invalid player data: {0}")]
    InvalidData(String),

    #[error("Failed to {operation}: {message}")]
    Serialization {
        operation: &'static str,
        message: String,
    },

    #[error("Failed to {operation}: {source}")]
    Repo {
        operation: &'static str,
        #[source]
        source: RepoError,
    },
}

impl ProgressionError {
    pub fn player_not_found(key: impl std::fmt::Display) -> Self {
        Self::PlayerNotFound(key.to_string())
    }

    pub fn serialization(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Serialization {
            operation,
            message: err.to_string(),
        }
    }

    /// Wrap a storage failure with the operation that was running.
    pub fn repo(operation: &'static str) -> impl FnOnce(RepoError) -> Self {
        move |source| Self::Repo { operation, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PlayerNotFound(_) => ErrorKind::PlayerNotFound,
            Self::InvalidData(_) => ErrorKind::InvalidData,
            Self::Serialization { .. } => ErrorKind::SerializationFailure,
            Self::Repo { source, .. } => source.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::PlayerNotFound
    }
}

impl From<DomainError> for ProgressionError {
    fn from(err: DomainError) -> Self {
        Self::InvalidData(err.to_string())
    }
}
