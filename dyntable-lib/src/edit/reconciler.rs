//! Edit reconciliation
//!
//! Per record id the reconciler moves between `Clean` (no pending change)
//! and `Dirty` (a pending change with at least one field). A valid edit
//! makes a record dirty, reverting every field to its fetched value or a
//! successful commit makes it clean again, and a failed commit leaves it
//! dirty with the same fields.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use super::ErrorState;
use super::canonical;
use crate::assimilate::Assimilated;
use crate::assimilate::ColumnBindings;
use crate::backend::RecordCommitter;
use crate::backend::RecordPatch;
use crate::error::CommitError;
use crate::error::FieldValidationError;
use crate::model::FieldMetadata;
use crate::model::Row;
use crate::model::Value;
use crate::schema::FieldDescriptor;
use crate::schema::LinkifiedColumns;

/// Uncommitted edits of one record, keyed by column header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChange {
    pub record_id: String,
    pub fields: BTreeMap<String, Value>,
}

/// Result of [`EditReconciler::apply_edit`].
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The edit was merged into the record's pending change.
    Applied,
    /// The value equals the fetched value; the field is no longer pending.
    Reverted,
    /// The edit failed validation and was not merged.
    Rejected(FieldValidationError),
}

impl EditOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Accumulates cell and widget edits into per-record pending changes.
#[derive(Debug, Clone, Default)]
pub struct EditReconciler {
    original: Arc<Vec<Row>>,
    rows: Arc<Vec<Row>>,
    bindings: Arc<ColumnBindings>,
    linkified: Arc<LinkifiedColumns>,
    /// Headers open to edits; `None` until column metadata is known.
    editable: Option<Arc<BTreeSet<String>>>,
    pending: Arc<BTreeMap<String, PendingChange>>,
    errors: ErrorState,
}

impl EditReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the row set with freshly assimilated rows.
    ///
    /// Pending edits of rows still present are laid over the new rows;
    /// pending edits and errors of rows that disappeared are dropped.
    pub fn load(&mut self, assimilated: Assimilated) {
        let Assimilated {
            rows,
            linkified,
            bindings,
        } = assimilated;

        let mut display = rows.clone();
        let pending = Arc::make_mut(&mut self.pending);
        pending.retain(|id, _| rows.iter().any(|r| r.id() == id));
        for change in pending.values() {
            if let Some(row) = display.iter_mut().find(|r| r.id() == change.record_id) {
                for (header, value) in &change.fields {
                    row.set_display_value(header, value.clone());
                }
            }
        }

        let stale: Vec<String> = self
            .errors
            .snapshot()
            .keys()
            .filter(|id| !rows.iter().any(|r| r.id() == id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            self.errors.clear_row(&id);
        }

        self.original = Arc::new(rows);
        self.rows = Arc::new(display);
        self.bindings = Arc::new(bindings);
        self.linkified = Arc::new(linkified);
    }

    /// Derives which column headers accept edits from the column metadata.
    ///
    /// A column is editable when its field is updateable, is not the
    /// identifier and is not reached through a relationship. Without
    /// metadata, or with metadata that does not line up with the
    /// descriptors, every edit is rejected as missing metadata.
    pub fn set_column_metadata(
        &mut self,
        descriptors: &[FieldDescriptor],
        metadata: Option<&[FieldMetadata]>,
    ) {
        self.editable = metadata
            .filter(|m| m.len() == descriptors.len())
            .map(|metadata| {
                let headers = descriptors
                    .iter()
                    .zip(metadata)
                    .filter(|(d, m)| {
                        m.is_updateable
                            && !d.is_identifier_field
                            && !d.is_extended()
                            && !m.is_extended_path
                    })
                    .map(|(_, m)| m.column_header.clone())
                    .collect();
                Arc::new(headers)
            });
    }

    /// Current rows, with pending edits applied.
    pub fn rows(&self) -> Arc<Vec<Row>> {
        Arc::clone(&self.rows)
    }

    /// Looks up a current row by id.
    pub fn row(&self, record_id: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.id() == record_id)
    }

    pub fn bindings(&self) -> Arc<ColumnBindings> {
        Arc::clone(&self.bindings)
    }

    pub fn linkified(&self) -> Arc<LinkifiedColumns> {
        Arc::clone(&self.linkified)
    }

    pub fn errors(&self) -> &ErrorState {
        &self.errors
    }

    /// Pending changes, ordered by record id.
    pub fn pending(&self) -> Vec<PendingChange> {
        self.pending.values().cloned().collect()
    }

    /// Pending change of one record.
    pub fn pending_for(&self, record_id: &str) -> Option<&PendingChange> {
        self.pending.get(record_id)
    }

    /// Returns true if any record has uncommitted edits.
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Applies one edit of `column_header` on `record_id`.
    ///
    /// The raw value is canonicalized for the column's field type and checked
    /// against its format rule. Invalid edits are recorded as row errors and
    /// never reach the pending set; a valid edit clears any earlier error for
    /// the same row and column.
    pub fn apply_edit(&mut self, record_id: &str, column_header: &str, raw: Value) -> EditOutcome {
        let Some(index) = self.rows.iter().position(|r| r.id() == record_id) else {
            log::warn!("Edit of {} on unknown record {}", column_header, record_id);
            return EditOutcome::Rejected(FieldValidationError::new(
                record_id,
                column_header,
                "Record is not in the current row set",
            ));
        };

        let Some(binding) = self.bindings.get(column_header) else {
            return self.reject(FieldValidationError::metadata_missing(record_id, column_header));
        };
        let field_type = binding.field_type;

        match &self.editable {
            None => {
                return self.reject(FieldValidationError::metadata_missing(record_id, column_header));
            }
            Some(editable) if !editable.contains(column_header) => {
                return self.reject(FieldValidationError::read_only(record_id, column_header));
            }
            Some(_) => {}
        }

        let value = match canonical::canonicalize(field_type, raw) {
            Some(value) if canonical::is_valid(field_type, &value) => value,
            _ => return self.reject(FieldValidationError::invalid_value(record_id, column_header)),
        };

        if self.errors.clear(record_id, column_header) {
            log::debug!("Cleared error on {} of {}", column_header, record_id);
        }

        let unchanged = self
            .original
            .iter()
            .find(|r| r.id() == record_id)
            .map(|r| r.display_value(column_header).cloned().unwrap_or_default())
            .and_then(|fetched| canonical::canonicalize(field_type, fetched))
            .is_some_and(|fetched| fetched == value);

        Arc::make_mut(&mut self.rows)[index].set_display_value(column_header, value.clone());

        let pending = Arc::make_mut(&mut self.pending);
        if unchanged {
            if let Some(change) = pending.get_mut(record_id) {
                change.fields.remove(column_header);
                if change.fields.is_empty() {
                    pending.remove(record_id);
                }
            }
            log::debug!("{} of {} reverted to fetched value", column_header, record_id);
            EditOutcome::Reverted
        } else {
            pending
                .entry(record_id.to_string())
                .or_insert_with(|| PendingChange {
                    record_id: record_id.to_string(),
                    fields: BTreeMap::new(),
                })
                .fields
                .insert(column_header.to_string(), value);
            EditOutcome::Applied
        }
    }

    fn reject(&mut self, error: FieldValidationError) -> EditOutcome {
        log::warn!("Rejected edit: {}", error);
        self.errors
            .record(&error.record_id, &error.column_header, &error.message);
        EditOutcome::Rejected(error)
    }

    /// Translates pending changes into patches keyed by field API name.
    pub fn patches(&self) -> Vec<RecordPatch> {
        self.pending
            .values()
            .map(|change| {
                let fields = change
                    .fields
                    .iter()
                    .map(|(header, value)| {
                        let api_name = match self.bindings.get(header) {
                            Some(binding) => binding.field_api_name.clone(),
                            None => {
                                log::warn!("No field binding for '{}', committing under its header", header);
                                header.clone()
                            }
                        };
                        (api_name, value.clone())
                    })
                    .collect();
                RecordPatch {
                    record_id: change.record_id.clone(),
                    fields,
                }
            })
            .collect()
    }

    /// Submits one update per dirty record.
    ///
    /// All updates must succeed for the pending set to clear; on any failure
    /// every pending change is kept as-is for a retry. Returns the number of
    /// records updated.
    pub async fn commit(&mut self, committer: &dyn RecordCommitter) -> Result<usize, CommitError> {
        let patches = self.patches();
        if patches.is_empty() {
            return Ok(0);
        }

        let results = join_all(patches.iter().map(|patch| committer.update_record(patch))).await;
        let failures: Vec<_> = patches
            .iter()
            .zip(results)
            .filter_map(|(patch, result)| result.err().map(|e| (patch.record_id.clone(), e)))
            .collect();

        if !failures.is_empty() {
            log::warn!(
                "{} of {} record updates failed, keeping pending changes",
                failures.len(),
                patches.len()
            );
            return Err(CommitError {
                attempted: patches.len(),
                failures,
            });
        }

        self.pending = Arc::new(BTreeMap::new());
        self.original = Arc::clone(&self.rows);
        log::info!("Committed {} record(s)", patches.len());
        Ok(patches.len())
    }

    /// Removes a row along with its pending change and errors.
    pub fn remove_row(&mut self, record_id: &str) -> bool {
        let before = self.rows.len();
        Arc::make_mut(&mut self.rows).retain(|r| r.id() != record_id);
        Arc::make_mut(&mut self.original).retain(|r| r.id() != record_id);
        Arc::make_mut(&mut self.pending).remove(record_id);
        self.errors.clear_row(record_id);
        self.rows.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assimilate::assimilate;
    use crate::model::FieldProperty;
    use crate::model::FieldType;
    use crate::model::RawRecord;

    const PATHS: &str = "Id,Field_A__c,Field_B__c,Phone,Account.Name";

    fn contact(id: &str) -> RawRecord {
        RawRecord::new("Contact", id)
            .property(FieldProperty::new("A", "Field_A__c", FieldType::Integer, 0i64))
            .property(FieldProperty::new("B", "Field_B__c", FieldType::Integer, 0i64))
            .property(FieldProperty::new("Phone", "Phone", FieldType::Phone, "555-000-0000"))
            .property(FieldProperty::new("Contact ID", "Id", FieldType::Id, id))
            .property(
                FieldProperty::new("Account Name", "Name", FieldType::String, "Acme")
                    .linked("001A", "Account Name"),
            )
    }

    fn metadata() -> Vec<FieldMetadata> {
        vec![
            FieldMetadata::new("Contact ID", "Id", FieldType::Id),
            FieldMetadata::new("A", "Field_A__c", FieldType::Integer).updateable(true),
            FieldMetadata::new("B", "Field_B__c", FieldType::Integer).updateable(true),
            FieldMetadata::new("Phone", "Phone", FieldType::Phone).updateable(true),
            FieldMetadata::new("Account Name", "Name", FieldType::String)
                .updateable(true)
                .extended(true),
        ]
    }

    fn loaded(ids: &[&str]) -> EditReconciler {
        let records: Vec<_> = ids.iter().map(|id| contact(id)).collect();
        let mut reconciler = EditReconciler::new();
        reconciler.load(assimilate(&records).unwrap());
        let descriptors = FieldDescriptor::parse_all(Some(PATHS));
        reconciler.set_column_metadata(&descriptors, Some(metadata().as_slice()));
        reconciler
    }

    #[test]
    fn test_merge_law() {
        let mut r = loaded(&["r1"]);
        assert_eq!(r.apply_edit("r1", "A", Value::Int(1)), EditOutcome::Applied);
        assert_eq!(r.apply_edit("r1", "B", Value::Int(2)), EditOutcome::Applied);

        let pending = r.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].fields["A"], Value::Int(1));
        assert_eq!(pending[0].fields["B"], Value::Int(2));

        r.apply_edit("r1", "A", Value::Int(3));
        let change = r.pending_for("r1").unwrap();
        assert_eq!(change.fields["A"], Value::Int(3));
        assert_eq!(change.fields["B"], Value::Int(2));
    }

    #[test]
    fn test_phone_validation_counts() {
        let mut r = loaded(&["r1"]);
        assert!(r.apply_edit("r1", "Phone", Value::from("abc")).is_rejected());
        assert_eq!(r.errors().count(), 1);
        assert!(r.pending().is_empty());

        assert!(r.apply_edit("r1", "Phone", Value::from("abc")).is_rejected());
        assert_eq!(r.errors().count(), 1);

        assert_eq!(
            r.apply_edit("r1", "Phone", Value::from("(555) 123-4567")),
            EditOutcome::Applied
        );
        assert_eq!(r.errors().count(), 0);
        assert!(r.errors().row("r1").is_none());
    }

    #[test]
    fn test_valid_phone_keeps_count() {
        let mut r = loaded(&["r1", "r2"]);
        r.apply_edit("r2", "Phone", Value::from("abc"));
        assert_eq!(r.errors().count(), 1);

        r.apply_edit("r1", "Phone", Value::from("(555) 123-4567"));
        assert_eq!(r.errors().count(), 1);
    }

    #[test]
    fn test_missing_binding_rejected() {
        let mut r = loaded(&["r1"]);
        let outcome = r.apply_edit("r1", "Unknown", Value::from("x"));
        assert!(outcome.is_rejected());
        assert_eq!(r.errors().count(), 1);
    }

    #[test]
    fn test_unknown_record_rejected_without_error_state() {
        let mut r = loaded(&["r1"]);
        assert!(r.apply_edit("zz", "A", Value::Int(1)).is_rejected());
        assert_eq!(r.errors().count(), 0);
    }

    #[test]
    fn test_edit_shows_in_rows_and_revert_cleans() {
        let mut r = loaded(&["r1"]);
        r.apply_edit("r1", "A", Value::from("5"));
        assert_eq!(r.row("r1").unwrap().display_value("A"), Some(&Value::Int(5)));
        assert!(r.is_dirty());

        assert_eq!(r.apply_edit("r1", "A", Value::Int(0)), EditOutcome::Reverted);
        assert!(!r.is_dirty());
        assert!(r.pending_for("r1").is_none());
    }

    #[test]
    fn test_patches_use_api_names() {
        let mut r = loaded(&["r1"]);
        r.apply_edit("r1", "A", Value::Int(9));
        let patches = r.patches();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].record_id, "r1");
        assert_eq!(patches[0].fields["Field_A__c"], Value::Int(9));
    }

    #[test]
    fn test_reload_keeps_pending_overlay() {
        let mut r = loaded(&["r1", "r2"]);
        r.apply_edit("r1", "A", Value::Int(4));
        r.apply_edit("r2", "A", Value::Int(4));
        r.apply_edit("r2", "Phone", Value::from("nope"));

        r.load(assimilate(&[contact("r1")]).unwrap());
        assert_eq!(r.row("r1").unwrap().display_value("A"), Some(&Value::Int(4)));
        assert!(r.pending_for("r2").is_none());
        assert_eq!(r.errors().count(), 0);
    }

    #[test]
    fn test_remove_row() {
        let mut r = loaded(&["r1", "r2"]);
        r.apply_edit("r1", "A", Value::Int(4));
        assert!(r.remove_row("r1"));
        assert!(!r.remove_row("r1"));
        assert_eq!(r.rows().len(), 1);
        assert!(!r.is_dirty());
    }

    #[test]
    fn test_read_only_columns_rejected() {
        let mut r = loaded(&["r1"]);

        let outcome = r.apply_edit("r1", "Contact ID", Value::from("hijack"));
        assert!(outcome.is_rejected());
        let outcome = r.apply_edit("r1", "Account Name", Value::from("Globex"));
        assert!(outcome.is_rejected());

        assert!(r.patches().is_empty());
        assert_eq!(r.errors().count(), 2);
        assert_eq!(r.errors().row("r1").unwrap().messages[0], "Contact ID cannot be edited");
    }

    #[test]
    fn test_edits_rejected_until_metadata_known() {
        let records = vec![contact("r1")];
        let mut r = EditReconciler::new();
        r.load(assimilate(&records).unwrap());
        assert!(r.apply_edit("r1", "A", Value::Int(1)).is_rejected());

        let descriptors = FieldDescriptor::parse_all(Some("Id,Field_A__c"));
        r.set_column_metadata(&descriptors, Some(metadata().as_slice()));
        assert!(r.apply_edit("r1", "A", Value::Int(1)).is_rejected());

        let descriptors = FieldDescriptor::parse_all(Some(PATHS));
        r.set_column_metadata(&descriptors, Some(metadata().as_slice()));
        assert_eq!(r.apply_edit("r1", "A", Value::Int(1)), EditOutcome::Applied);
        assert_eq!(r.errors().count(), 0);
    }
}
