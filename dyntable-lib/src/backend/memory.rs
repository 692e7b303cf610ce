//! In-memory backend using DashMap

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use super::FetchRequest;
use super::RecordCommitter;
use super::RecordDeleter;
use super::RecordPatch;
use super::RecordSearch;
use super::RecordSource;
use super::SearchRequest;
use crate::error::ApiError;
use crate::model::FieldMetadata;
use crate::model::RawRecord;
use crate::model::keys::NAME_FIELD;

/// Error code carried by updates and deletes of a missing record.
pub const NOT_FOUND: &str = "NOT_FOUND";

/// A collaborator call, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    FetchRecords,
    FetchMetadata,
    Update,
    Delete,
    Search,
}

/// An in-memory record store implementing every collaborator trait.
///
/// Records keep their insertion order. Failures can be injected per call
/// kind or per record id, which makes it suitable as a deterministic fake.
/// Filters are accepted but not evaluated.
///
/// # Example
///
/// ```
/// use dyntable_lib::backend::InMemoryBackend;
/// use dyntable_lib::model::RawRecord;
///
/// let backend = InMemoryBackend::new();
/// backend.insert_record(RawRecord::new("Contact", "003A").set("Name", "Ada"));
/// assert_eq!(backend.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    records: DashMap<String, (usize, RawRecord)>,
    metadata: DashMap<String, FieldMetadata>,
    call_failures: DashMap<Call, ApiError>,
    record_failures: DashMap<String, ApiError>,
    calls: DashMap<Call, usize>,
    searches: Mutex<Vec<SearchRequest>>,
    seq: AtomicUsize,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record, keyed by its `Id`.
    ///
    /// Records without a string `Id` are ignored.
    pub fn insert_record(&self, record: RawRecord) {
        let Some(id) = record.id().map(str::to_string) else {
            log::warn!("Ignoring record without Id");
            return;
        };
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.records.insert(id, (seq, record));
    }

    /// Registers the metadata returned for a field path.
    pub fn insert_metadata(&self, path: &str, metadata: FieldMetadata) {
        self.metadata.insert(path.to_ascii_lowercase(), metadata);
    }

    /// Makes every call of the given kind fail until cleared.
    pub fn fail(&self, call: Call, error: ApiError) {
        self.call_failures.insert(call, error);
    }

    /// Makes updates and deletes of one record fail until cleared.
    pub fn fail_record(&self, record_id: impl Into<String>, error: ApiError) {
        self.record_failures.insert(record_id.into(), error);
    }

    /// Removes every injected failure.
    pub fn clear_failures(&self) {
        self.call_failures.clear();
        self.record_failures.clear();
    }

    /// Number of calls of the given kind so far.
    pub fn calls(&self, call: Call) -> usize {
        self.calls.get(&call).map(|n| *n).unwrap_or(0)
    }

    /// Returns a copy of a stored record.
    pub fn record(&self, record_id: &str) -> Option<RawRecord> {
        self.records.get(record_id).map(|entry| entry.value().1.clone())
    }

    /// Search requests received so far, oldest first.
    pub async fn searches(&self) -> Vec<SearchRequest> {
        self.searches.lock().await.clone()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn enter(&self, call: Call) -> Result<(), ApiError> {
        *self.calls.entry(call).or_insert(0) += 1;
        match self.call_failures.get(&call) {
            Some(error) => Err(error.value().clone()),
            None => Ok(()),
        }
    }

    fn check_record(&self, record_id: &str) -> Result<(), ApiError> {
        match self.record_failures.get(record_id) {
            Some(error) => Err(error.value().clone()),
            None => Ok(()),
        }
    }

    fn ordered(&self) -> Vec<RawRecord> {
        let mut all: Vec<(usize, RawRecord)> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by_key(|(seq, _)| *seq);
        all.into_iter().map(|(_, record)| record).collect()
    }
}

#[async_trait]
impl RecordSource for InMemoryBackend {
    async fn fetch_records(&self, request: &FetchRequest) -> Result<Vec<RawRecord>, ApiError> {
        self.enter(Call::FetchRecords)?;
        if let Some(filter) = &request.filter {
            log::debug!("In-memory backend ignores filter '{}'", filter);
        }

        let records = self
            .ordered()
            .into_iter()
            .filter(|r| r.obj_name.eq_ignore_ascii_case(&request.object_name))
            .take(request.limit.unwrap_or(usize::MAX))
            .collect();
        Ok(records)
    }

    async fn fetch_column_metadata(
        &self,
        object_name: &str,
        field_paths: &[String],
    ) -> Result<Vec<FieldMetadata>, ApiError> {
        self.enter(Call::FetchMetadata)?;
        field_paths
            .iter()
            .map(|path| {
                self.metadata
                    .get(&path.to_ascii_lowercase())
                    .map(|m| m.value().clone())
                    .ok_or_else(|| {
                        ApiError::rejected(format!("No field '{}' on {}", path, object_name))
                    })
            })
            .collect()
    }
}

#[async_trait]
impl RecordCommitter for InMemoryBackend {
    async fn update_record(&self, patch: &RecordPatch) -> Result<(), ApiError> {
        self.enter(Call::Update)?;
        self.check_record(&patch.record_id)?;

        let mut entry = self
            .records
            .get_mut(&patch.record_id)
            .ok_or_else(|| not_found(&patch.record_id))?;
        let record = &mut entry.value_mut().1;
        for (api_name, value) in &patch.fields {
            record.record.insert(api_name.clone(), value.clone());
            for property in record
                .field_properties
                .iter_mut()
                .filter(|p| &p.field_api_name == api_name && p.link_id.is_none())
            {
                property.field_value = value.clone();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecordDeleter for InMemoryBackend {
    async fn delete_record(&self, record_id: &str) -> Result<(), ApiError> {
        self.enter(Call::Delete)?;
        self.check_record(record_id)?;
        self.records
            .remove(record_id)
            .map(|_| ())
            .ok_or_else(|| not_found(record_id))
    }
}

fn not_found(record_id: &str) -> ApiError {
    ApiError::rejected_with_code(format!("Record {} not found", record_id), NOT_FOUND)
}

#[async_trait]
impl RecordSearch for InMemoryBackend {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawRecord>, ApiError> {
        self.enter(Call::Search)?;
        self.searches.lock().await.push(request.clone());

        let query = request.query.to_lowercase();
        let default_paths = [NAME_FIELD.to_string()];
        let paths: &[String] = if request.search_field_paths.is_empty() {
            &default_paths
        } else {
            &request.search_field_paths
        };

        let results = self
            .ordered()
            .into_iter()
            .filter(|r| r.obj_name.eq_ignore_ascii_case(&request.object_name))
            .filter(|r| {
                r.id()
                    .is_some_and(|id| !request.excluded_ids.iter().any(|x| x == id))
            })
            .filter(|r| {
                paths.iter().any(|path| {
                    r.record
                        .get(path)
                        .and_then(|v| v.to_text())
                        .is_some_and(|text| text.to_lowercase().contains(&query))
                })
            })
            .take(request.limit.unwrap_or(usize::MAX))
            .collect();
        Ok(results)
    }
}
