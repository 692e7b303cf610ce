//! Error types

mod api;
mod field;
mod shape;
mod validation;

pub use api::*;
pub use field::*;
pub use shape::*;
pub use validation::*;

/// Which retrieval call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalKind {
    /// The record fetch.
    Records,
    /// The column metadata fetch.
    Metadata,
}

impl RetrievalKind {
    /// Title used for the notification raised on failure.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Records => "Error retrieving record data",
            Self::Metadata => "Error retrieving field properties",
        }
    }
}

impl std::fmt::Display for RetrievalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Records => write!(f, "records"),
            Self::Metadata => write!(f, "column metadata"),
        }
    }
}

/// Errors surfaced to the caller of the table engine.
///
/// Local validation failures never appear here; they are kept in the
/// reconciler's row error state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A record or metadata fetch was rejected.
    #[error("Failed to retrieve {kind}: {source}")]
    Retrieval {
        kind: RetrievalKind,
        #[source]
        source: ApiError,
    },

    /// A search request was rejected.
    #[error("Search failed: {0}")]
    Search(#[source] ApiError),

    /// One or more record updates were rejected.
    #[error(transparent)]
    Commit(#[from] CommitError),

    /// The delete collaborator rejected a delete.
    #[error("Unable to delete record {record_id}: {source}")]
    Delete {
        record_id: String,
        #[source]
        source: ApiError,
    },

    /// A collaborator returned data that does not fit the expected shape.
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// The record id is not part of the current row set.
    #[error("Record {0} is not in the current row set")]
    UnknownRecord(String),
}

impl Error {
    pub(crate) fn retrieval(kind: RetrievalKind, source: ApiError) -> Self {
        Self::Retrieval { kind, source }
    }
}
