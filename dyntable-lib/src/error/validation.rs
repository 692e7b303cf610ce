//! Validation error types

/// A proposed edit that failed a local format rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValidationError {
    /// The record the edit targeted.
    pub record_id: String,
    /// The column header the edit targeted.
    pub column_header: String,
    /// Human-readable validation error message.
    pub message: String,
}

impl FieldValidationError {
    /// Creates a new validation error.
    pub fn new(
        record_id: impl Into<String>,
        column_header: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            column_header: column_header.into(),
            message: message.into(),
        }
    }

    /// The standard "Enter a valid ..." rejection for a column.
    pub fn invalid_value(record_id: impl Into<String>, column_header: &str) -> Self {
        Self::new(record_id, column_header, format!("Enter a valid {}", column_header))
    }

    /// Rejection for a column whose metadata has not been loaded.
    pub fn metadata_missing(record_id: impl Into<String>, column_header: &str) -> Self {
        Self::new(
            record_id,
            column_header,
            format!("Field information for {} is not loaded", column_header),
        )
    }

    /// Rejection for a column that is not updateable.
    pub fn read_only(record_id: impl Into<String>, column_header: &str) -> Self {
        Self::new(record_id, column_header, format!("{} cannot be edited", column_header))
    }
}

impl std::fmt::Display for FieldValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.column_header, self.record_id, self.message)
    }
}
