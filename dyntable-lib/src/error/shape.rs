//! Payload shape errors raised at the assimilation boundary

/// A collaborator payload that does not have the expected shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    /// A raw record has no usable `Id` field.
    #[error("Record at position {index} has no Id")]
    MissingId { index: usize },

    /// A record's `Id` is not a string.
    #[error("Record at position {index} has a non-string Id ({actual})")]
    InvalidId { index: usize, actual: &'static str },

    /// Two records in the same result share an `Id`.
    #[error("Duplicate record Id {id} at position {index}")]
    DuplicateId { index: usize, id: String },
}
