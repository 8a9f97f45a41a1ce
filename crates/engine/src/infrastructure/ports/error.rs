//! Error types for port operations.

/// The closed set of failure kinds every core operation reports.
///
/// Match on this rather than on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Backend unreachable or a query failed at the driver level.
    DatabaseConnection,
    /// Expected absence of a player.
    PlayerNotFound,
    /// Caller supplied malformed input.
    InvalidData,
    /// Extra data or flags could not be encoded or decoded.
    SerializationFailure,
}

/// Repository operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Entity not found - includes entity type and ID for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Backend unavailable or query failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    DatabaseConnection {
        operation: &'static str,
        message: String,
    },

    /// Required fields missing or malformed, or a uniqueness rule was broken.
    #[error("Invalid player data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepoError {
    /// Create a NotFound error with entity type and ID context.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Create a DatabaseConnection error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::DatabaseConnection {
            operation,
            message: message.to_string(),
        }
    }

    /// Create an InvalidData error.
    pub fn invalid(message: impl ToString) -> Self {
        Self::InvalidData(message.to_string())
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::PlayerNotFound,
            Self::DatabaseConnection { .. } => ErrorKind::DatabaseConnection,
            Self::InvalidData(_) => ErrorKind::InvalidData,
            Self::Serialization(_) => ErrorKind::SerializationFailure,
        }
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
