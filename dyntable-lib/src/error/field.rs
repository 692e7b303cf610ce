//! Typed access failures on rows

/// A typed [`Row`](crate::model::Row) getter could not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Row {record_id} has no field '{key}'")]
    Missing { record_id: String, key: String },

    #[error("Row {record_id} field '{key}' holds {actual}, not {expected}")]
    TypeMismatch {
        record_id: String,
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl FieldError {
    pub(crate) fn missing(record_id: &str, key: &str) -> Self {
        Self::Missing {
            record_id: record_id.to_string(),
            key: key.to_string(),
        }
    }

    pub(crate) fn mismatch(record_id: &str, key: &str, expected: &'static str, actual: &'static str) -> Self {
        Self::TypeMismatch {
            record_id: record_id.to_string(),
            key: key.to_string(),
            expected,
            actual,
        }
    }

    /// The flat key that was looked up.
    pub fn key(&self) -> &str {
        match self {
            Self::Missing { key, .. } | Self::TypeMismatch { key, .. } => key,
        }
    }
}
