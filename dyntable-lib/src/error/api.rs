//! Collaborator error types

/// Errors reported by an injected collaborator (fetch, commit, delete, search).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The collaborator rejected the request.
    #[error("{message}")]
    Rejected {
        /// Human-readable message, shown to the user as-is.
        message: String,
        /// Backend-specific error code, if available.
        code: Option<String>,
    },

    /// Transport failure before a response arrived.
    #[error("Network error: {0}")]
    Network(String),
}

impl ApiError {
    /// Creates a new rejection error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            code: None,
        }
    }

    /// Creates a new rejection error with a backend error code.
    pub fn rejected_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Returns the message suitable for a user-facing notification.
    pub fn message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Returns the backend error code if available.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// A batch of record updates where at least one update was rejected.
///
/// Pending changes are left untouched when this is returned.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{} of {attempted} record update(s) failed: {}", .failures.len(), first_message(.failures))]
pub struct CommitError {
    /// Number of per-record updates that were issued.
    pub attempted: usize,
    /// The rejected updates, keyed by record id.
    pub failures: Vec<(String, ApiError)>,
}

impl CommitError {
    /// Returns the ids of the records whose update was rejected.
    pub fn failed_ids(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|(id, _)| id.as_str())
    }
}

fn first_message(failures: &[(String, ApiError)]) -> String {
    failures
        .first()
        .map(|(_, e)| e.message())
        .unwrap_or_default()
}
