//! The editable table

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::assimilate::assimilate;
use crate::backend::RecordCommitter;
use crate::backend::RecordDeleter;
use crate::backend::RecordSearch;
use crate::backend::RecordSource;
use crate::config::SearchConfig;
use crate::config::TableConfig;
use crate::edit::EditOutcome;
use crate::edit::EditReconciler;
use crate::edit::ErrorState;
use crate::edit::PendingChange;
use crate::error::ApiError;
use crate::error::Error;
use crate::error::RetrievalKind;
use crate::event::Notification;
use crate::event::TableEvent;
use crate::model::FieldMetadata;
use crate::model::Row;
use crate::model::Value;
use crate::schema::ColumnDefinition;
use crate::schema::ColumnSchemaBuilder;
use crate::schema::FieldDescriptor;
use crate::schema::RowAction;
use crate::schema::parse_row_actions;
use crate::search::SearchSelectionTracker;

const EVENT_CAPACITY: usize = 128;

pub const COMMIT_SUCCESS_TITLE: &str = "Success";
pub const COMMIT_ERROR_TITLE: &str = "Error updating records";
pub const DELETE_SUCCESS_TITLE: &str = "Record Deleted";
pub const DELETE_ERROR_TITLE: &str = "Error deleting record";

// =============================================================================
// Navigation
// =============================================================================

/// A request to navigate to a record page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReference {
    pub record_id: String,
    /// Set for `edit`, which opens the object's edit form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_api_name: Option<String>,
    pub action: RowAction,
}

/// Result of [`DynamicTable::handle_row_action`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowActionOutcome {
    /// The view layer should navigate.
    Navigate(PageReference),
    /// The record was deleted and its row removed.
    Deleted,
}

// =============================================================================
// DynamicTable
// =============================================================================

/// An editable table over records of one object type.
///
/// Columns derive from the configured field paths and the column metadata;
/// rows derive from the fetched records. Both are recomputed whenever their
/// inputs change, and both are handed out as shared snapshots.
///
/// Retrieval, commit and delete failures are logged, published as an error
/// [`Notification`] and returned. The table keeps its last good state.
pub struct DynamicTable {
    config: TableConfig,
    descriptors: Vec<FieldDescriptor>,
    actions: Vec<RowAction>,
    metadata: Option<Arc<Vec<FieldMetadata>>>,
    columns: Arc<Vec<ColumnDefinition>>,
    reconciler: EditReconciler,
    selected: Arc<Vec<String>>,
    source: Arc<dyn RecordSource>,
    committer: Arc<dyn RecordCommitter>,
    deleter: Arc<dyn RecordDeleter>,
    events: broadcast::Sender<TableEvent>,
}

impl DynamicTable {
    /// Creates a new builder for the given configuration.
    pub fn builder(config: TableConfig) -> DynamicTableBuilder<Missing, Missing, Missing> {
        DynamicTableBuilder::new(config)
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Fetches metadata and records.
    ///
    /// Both fetches run even if the first fails; the first error is returned.
    pub async fn load(&mut self) -> Result<(), Error> {
        let metadata = self.refresh_metadata().await;
        let records = self.refresh_records().await;
        metadata.and(records)
    }

    /// Fetches column metadata, replacing any earlier metadata.
    pub async fn refresh_metadata(&mut self) -> Result<(), Error> {
        let paths: Vec<String> = self.descriptors.iter().map(|d| d.path.clone()).collect();
        log::debug!("Fetching metadata for {} path(s) of {}", paths.len(), self.config.obj_api_name);

        match self
            .source
            .fetch_column_metadata(&self.config.obj_api_name, &paths)
            .await
        {
            Ok(metadata) => {
                self.reconciler
                    .set_column_metadata(&self.descriptors, Some(metadata.as_slice()));
                self.metadata = Some(Arc::new(metadata));
                self.rebuild_columns();
                Ok(())
            }
            Err(e) => Err(self.retrieval_failed(RetrievalKind::Metadata, e)),
        }
    }

    /// Re-fetches records. Pending edits stay laid over the fresh rows.
    pub async fn refresh_records(&mut self) -> Result<(), Error> {
        let request = self.config.fetch_request();
        let records = match self.source.fetch_records(&request).await {
            Ok(records) => records,
            Err(e) => return Err(self.retrieval_failed(RetrievalKind::Records, e)),
        };

        let assimilated = match assimilate(&records) {
            Ok(assimilated) => assimilated,
            Err(e) => {
                log::warn!("Malformed records from source: {}", e);
                self.notify(Notification::error(RetrievalKind::Records.title(), e.to_string()));
                return Err(e.into());
            }
        };
        log::debug!("Loaded {} row(s)", assimilated.rows.len());

        let linkified_changed = *self.reconciler.linkified() != assimilated.linkified;
        self.reconciler.load(assimilated);
        if linkified_changed {
            self.rebuild_columns();
        }

        let rows = self.reconciler.rows();
        if self.selected.iter().any(|id| !rows.iter().any(|r| r.id() == id)) {
            let kept = self
                .selected
                .iter()
                .filter(|id| rows.iter().any(|r| r.id() == id.as_str()))
                .cloned()
                .collect();
            self.selected = Arc::new(kept);
            self.publish_row_selection();
        }
        Ok(())
    }

    fn retrieval_failed(&self, kind: RetrievalKind, e: ApiError) -> Error {
        log::warn!("{}: {}", kind.title(), e);
        self.notify(Notification::error(kind.title(), e.message()));
        Error::retrieval(kind, e)
    }

    fn rebuild_columns(&mut self) {
        let linkified = self.reconciler.linkified();
        let columns = ColumnSchemaBuilder::new(&self.descriptors)
            .metadata(self.metadata.as_deref().map(Vec::as_slice))
            .linkified(&linkified)
            .enforce_accessible(self.config.enforce_accessible_fields)
            .actions(&self.actions)
            .build();
        self.columns = Arc::new(columns);
    }

    /// Current columns. Empty until metadata has been fetched.
    pub fn columns(&self) -> Arc<Vec<ColumnDefinition>> {
        Arc::clone(&self.columns)
    }

    /// Current rows, with pending edits applied.
    pub fn rows(&self) -> Arc<Vec<Row>> {
        self.reconciler.rows()
    }

    pub fn row(&self, record_id: &str) -> Option<&Row> {
        self.reconciler.row(record_id)
    }

    /// The last fetched column metadata.
    pub fn metadata(&self) -> Option<Arc<Vec<FieldMetadata>>> {
        self.metadata.clone()
    }

    /// Row and field level validation errors.
    pub fn errors(&self) -> &ErrorState {
        self.reconciler.errors()
    }

    pub fn pending(&self) -> Vec<PendingChange> {
        self.reconciler.pending()
    }

    pub fn is_dirty(&self) -> bool {
        self.reconciler.is_dirty()
    }

    /// Whether the row selection checkboxes are shown.
    pub fn show_checkbox_column(&self) -> bool {
        !self.config.hide_checkbox_column
    }

    /// Applies a cell or inline widget edit.
    ///
    /// Publishes [`TableEvent::CellChanged`] unless the edit is rejected.
    pub fn apply_edit(
        &mut self,
        record_id: &str,
        column_header: &str,
        value: impl Into<Value>,
    ) -> EditOutcome {
        let outcome = self.reconciler.apply_edit(record_id, column_header, value.into());
        if !outcome.is_rejected() {
            let _ = self.events.send(TableEvent::CellChanged {
                record_id: record_id.to_string(),
                column_header: column_header.to_string(),
                pending: Arc::new(self.reconciler.pending()),
            });
        }
        outcome
    }

    /// Commits every pending change, then re-fetches the records.
    ///
    /// Returns the number of records updated. On failure no pending change
    /// is cleared.
    pub async fn commit(&mut self) -> Result<usize, Error> {
        if !self.reconciler.is_dirty() {
            return Ok(0);
        }

        match self.reconciler.commit(self.committer.as_ref()).await {
            Ok(updated) => {
                self.notify(Notification::success(
                    COMMIT_SUCCESS_TITLE,
                    "Successfully updated records!",
                ));
                if let Err(e) = self.refresh_records().await {
                    log::warn!("Re-fetch after commit failed: {}", e);
                }
                Ok(updated)
            }
            Err(e) => {
                log::warn!(
                    "Commit rejected for {}",
                    e.failed_ids().collect::<Vec<_>>().join(", ")
                );
                let message = e
                    .failures
                    .first()
                    .map(|(_, api)| api.message())
                    .unwrap_or_else(|| e.to_string());
                self.notify(Notification::error(COMMIT_ERROR_TITLE, message));
                Err(e.into())
            }
        }
    }

    /// Handles a row action from the action column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRecord`] if the row is not present and
    /// [`Error::Delete`] if the delete collaborator rejects the delete; the
    /// row is kept in that case.
    pub async fn handle_row_action(
        &mut self,
        action: RowAction,
        record_id: &str,
    ) -> Result<RowActionOutcome, Error> {
        let row = self
            .reconciler
            .row(record_id)
            .ok_or_else(|| Error::UnknownRecord(record_id.to_string()))?;
        let object_name = row.object_name().to_string();

        match action {
            RowAction::View => Ok(RowActionOutcome::Navigate(PageReference {
                record_id: record_id.to_string(),
                object_api_name: None,
                action,
            })),
            RowAction::Edit => Ok(RowActionOutcome::Navigate(PageReference {
                record_id: record_id.to_string(),
                object_api_name: Some(object_name),
                action,
            })),
            RowAction::Delete => {
                self.delete(record_id).await?;
                Ok(RowActionOutcome::Deleted)
            }
        }
    }

    async fn delete(&mut self, record_id: &str) -> Result<(), Error> {
        if let Err(e) = self.deleter.delete_record(record_id).await {
            log::warn!("Delete of {} failed: {}", record_id, e);
            self.notify(Notification::error(
                DELETE_ERROR_TITLE,
                format!("Unable to delete record due to {}", e.message()),
            ));
            return Err(Error::Delete {
                record_id: record_id.to_string(),
                source: e,
            });
        }

        log::info!("Deleted record {}", record_id);
        self.reconciler.remove_row(record_id);
        if self.selected.iter().any(|id| id == record_id) {
            self.selected = Arc::new(
                self.selected
                    .iter()
                    .filter(|id| id.as_str() != record_id)
                    .cloned()
                    .collect(),
            );
            self.publish_row_selection();
        }
        self.notify(Notification::success(
            DELETE_SUCCESS_TITLE,
            "Record deleted successfully",
        ));
        Ok(())
    }

    /// Replaces the set of checked rows. Ids not in the row set are ignored.
    pub fn select_rows<I, S>(&mut self, record_ids: I) -> Arc<Vec<Row>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = self.reconciler.rows();
        let mut selected = Vec::new();
        for id in record_ids {
            let id = id.as_ref();
            if rows.iter().any(|r| r.id() == id) && !selected.iter().any(|s| s == id) {
                selected.push(id.to_string());
            }
        }
        self.selected = Arc::new(selected);
        self.publish_row_selection()
    }

    /// Currently checked rows.
    pub fn selected_rows(&self) -> Arc<Vec<Row>> {
        let rows = self.reconciler.rows();
        Arc::new(
            self.selected
                .iter()
                .filter_map(|id| rows.iter().find(|r| r.id() == id.as_str()).cloned())
                .collect(),
        )
    }

    fn publish_row_selection(&self) -> Arc<Vec<Row>> {
        let rows = self.selected_rows();
        let _ = self.events.send(TableEvent::RowSelectionChanged {
            rows: Arc::clone(&rows),
        });
        rows
    }

    /// Replaces the field paths. Columns stay empty until the next
    /// [`DynamicTable::refresh_metadata`].
    pub fn set_field_paths(&mut self, field_paths: impl Into<String>) {
        self.config.field_paths = field_paths.into();
        self.descriptors = self.config.field_descriptors();
        self.metadata = None;
        self.reconciler.set_column_metadata(&self.descriptors, None);
        self.rebuild_columns();
    }

    pub fn set_enforce_accessible(&mut self, enforce: bool) {
        self.config.enforce_accessible_fields = enforce;
        self.rebuild_columns();
    }

    /// Replaces the comma-separated row actions.
    pub fn set_actions(&mut self, actions: Option<&str>) {
        self.config.actions = actions.map(str::to_string);
        self.actions = parse_row_actions(actions);
        self.rebuild_columns();
    }

    /// Creates a search widget that publishes on this table's channel.
    pub fn search_tracker(
        &self,
        config: SearchConfig,
        search: Arc<dyn RecordSearch>,
    ) -> SearchSelectionTracker {
        SearchSelectionTracker::new(config, search).with_events(self.events.clone())
    }

    /// Subscribes to table events.
    pub fn subscribe(&self) -> broadcast::Receiver<TableEvent> {
        self.events.subscribe()
    }

    fn notify(&self, notification: Notification) {
        let _ = self.events.send(TableEvent::Notification(notification));
    }
}

impl std::fmt::Debug for DynamicTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicTable")
            .field("config", &self.config)
            .field("columns", &self.columns.len())
            .field("rows", &self.reconciler.rows().len())
            .field("dirty", &self.reconciler.is_dirty())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for a [`DynamicTable`].
///
/// The record source, committer and deleter are required; `build` only
/// exists once all three are set.
pub struct DynamicTableBuilder<Source, Committer, Deleter> {
    config: TableConfig,
    source: Source,
    committer: Committer,
    deleter: Deleter,
    event_capacity: usize,
}

impl DynamicTableBuilder<Missing, Missing, Missing> {
    pub fn new(config: TableConfig) -> Self {
        Self {
            config,
            source: Missing,
            committer: Missing,
            deleter: Missing,
            event_capacity: EVENT_CAPACITY,
        }
    }
}

impl<C, D> DynamicTableBuilder<Missing, C, D> {
    /// Sets the record and metadata source.
    pub fn source(
        self,
        source: Arc<dyn RecordSource>,
    ) -> DynamicTableBuilder<Set<Arc<dyn RecordSource>>, C, D> {
        DynamicTableBuilder {
            config: self.config,
            source: Set(source),
            committer: self.committer,
            deleter: self.deleter,
            event_capacity: self.event_capacity,
        }
    }
}

impl<S, D> DynamicTableBuilder<S, Missing, D> {
    /// Sets the committer used by [`DynamicTable::commit`].
    pub fn committer(
        self,
        committer: Arc<dyn RecordCommitter>,
    ) -> DynamicTableBuilder<S, Set<Arc<dyn RecordCommitter>>, D> {
        DynamicTableBuilder {
            config: self.config,
            source: self.source,
            committer: Set(committer),
            deleter: self.deleter,
            event_capacity: self.event_capacity,
        }
    }
}

impl<S, C> DynamicTableBuilder<S, C, Missing> {
    /// Sets the deleter used by the delete row action.
    pub fn deleter(
        self,
        deleter: Arc<dyn RecordDeleter>,
    ) -> DynamicTableBuilder<S, C, Set<Arc<dyn RecordDeleter>>> {
        DynamicTableBuilder {
            config: self.config,
            source: self.source,
            committer: self.committer,
            deleter: Set(deleter),
            event_capacity: self.event_capacity,
        }
    }
}

impl<S, C, D> DynamicTableBuilder<S, C, D> {
    /// Sets the event channel capacity.
    ///
    /// Defaults to 128. Slow subscribers lag rather than block the table.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

impl
    DynamicTableBuilder<
        Set<Arc<dyn RecordSource>>,
        Set<Arc<dyn RecordCommitter>>,
        Set<Arc<dyn RecordDeleter>>,
    >
{
    /// Builds the table. Nothing is fetched until [`DynamicTable::load`].
    pub fn build(self) -> DynamicTable {
        let (events, _) = broadcast::channel(self.event_capacity);
        let descriptors = self.config.field_descriptors();
        let actions = self.config.row_actions();
        DynamicTable {
            config: self.config,
            descriptors,
            actions,
            metadata: None,
            columns: Arc::default(),
            reconciler: EditReconciler::new(),
            selected: Arc::default(),
            source: self.source.0,
            committer: self.committer.0,
            deleter: self.deleter.0,
            events,
        }
    }
}
