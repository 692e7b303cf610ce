//! Collaborator contracts
//!
//! The table engine never talks to a server directly. Record retrieval,
//! updates, deletes and search are injected as trait objects, so any
//! backend (or a deterministic fake) can be plugged in.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use dyntable_lib::backend::InMemoryBackend;
//! use dyntable_lib::{DynamicTable, config::TableConfig};
//!
//! let backend = Arc::new(InMemoryBackend::new());
//! let table = DynamicTable::builder(TableConfig::new("Contact", "Id,Name,Phone"))
//!     .source(backend.clone())
//!     .committer(backend.clone())
//!     .deleter(backend)
//!     .build();
//! ```

mod memory;

pub use memory::*;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ApiError;
use crate::model::FieldMetadata;
use crate::model::RawRecord;
use crate::model::Value;

/// Parameters of a record fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRequest {
    pub object_name: String,
    pub field_paths: Vec<String>,
    /// Opaque filter expression, passed through untouched.
    pub filter: Option<String>,
    /// Record the table is anchored to (e.g. the page's record).
    pub anchor_record_id: Option<String>,
    pub limit: Option<usize>,
}

/// Parameters of a relationship search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub object_name: String,
    pub field_paths: Vec<String>,
    /// Paths matched against the query.
    pub search_field_paths: Vec<String>,
    pub query: String,
    /// Ids that must not appear in the result.
    pub excluded_ids: Vec<String>,
    pub filter: Option<String>,
    pub anchor_record_id: Option<String>,
    pub limit: Option<usize>,
}

/// Field values to write to one record, keyed by field API name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    pub record_id: String,
    pub fields: BTreeMap<String, Value>,
}

/// Retrieves records and column metadata.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetches records with their field properties, ordered like
    /// `request.field_paths`.
    async fn fetch_records(&self, request: &FetchRequest) -> Result<Vec<RawRecord>, ApiError>;

    /// Fetches column metadata, parallel to `field_paths`.
    async fn fetch_column_metadata(
        &self,
        object_name: &str,
        field_paths: &[String],
    ) -> Result<Vec<FieldMetadata>, ApiError>;
}

/// Applies field updates to a record.
#[async_trait]
pub trait RecordCommitter: Send + Sync {
    /// Updates one record.
    async fn update_record(&self, patch: &RecordPatch) -> Result<(), ApiError>;
}

/// Deletes records.
#[async_trait]
pub trait RecordDeleter: Send + Sync {
    /// Deletes one record.
    async fn delete_record(&self, record_id: &str) -> Result<(), ApiError>;
}

/// Searches for candidate records of a relationship.
#[async_trait]
pub trait RecordSearch: Send + Sync {
    /// Returns records matching `request.query`, never including
    /// `request.excluded_ids`.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawRecord>, ApiError>;
}
