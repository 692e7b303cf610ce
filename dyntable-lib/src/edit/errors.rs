//! Row and field level error state

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

/// Outstanding validation errors of one row.
///
/// `messages` and `field_names` are parallel: entry `i` is the message for
/// column header `field_names[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowErrors {
    pub messages: Vec<String>,
    pub field_names: Vec<String>,
    pub title: String,
}

impl RowErrors {
    fn position(&self, column_header: &str) -> Option<usize> {
        self.field_names.iter().position(|f| f == column_header)
    }

    fn retitle(&mut self) {
        self.title = format!("We found {} error(s)", self.field_names.len());
    }

    /// Number of field errors on this row.
    pub fn len(&self) -> usize {
        self.field_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field_names.is_empty()
    }
}

/// All outstanding validation errors, by record id.
///
/// Invariants: a row with no field errors is absent from the map, and
/// `count` equals the total number of field errors across all rows.
/// The map is copy-on-write; snapshots handed out by
/// [`ErrorState::snapshot`] never change under the reader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorState {
    rows: Arc<BTreeMap<String, RowErrors>>,
    count: usize,
}

impl ErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error for a row/column pair.
    ///
    /// Returns `true` if the pair had no error before (the count went up).
    /// Re-reporting the same pair replaces its message and leaves the count
    /// unchanged. Every message names its column, so distinct (row, message)
    /// pairs are distinct cells; a newer message for the same cell replaces
    /// the older one instead of being counted again.
    pub fn record(&mut self, record_id: &str, column_header: &str, message: &str) -> bool {
        let rows = Arc::make_mut(&mut self.rows);
        let row = rows.entry(record_id.to_string()).or_default();

        let added = match row.position(column_header) {
            Some(i) => {
                row.messages[i] = message.to_string();
                false
            }
            None => {
                row.messages.push(message.to_string());
                row.field_names.push(column_header.to_string());
                true
            }
        };
        row.retitle();
        if added {
            self.count += 1;
        }
        added
    }

    /// Clears the error of a row/column pair.
    ///
    /// Returns `true` if an error was removed (the count went down).
    pub fn clear(&mut self, record_id: &str, column_header: &str) -> bool {
        let has_error = self
            .rows
            .get(record_id)
            .and_then(|row| row.position(column_header))
            .is_some();
        if !has_error {
            return false;
        }

        let rows = Arc::make_mut(&mut self.rows);
        let now_empty = match rows.get_mut(record_id) {
            Some(row) => {
                if let Some(i) = row.position(column_header) {
                    row.messages.remove(i);
                    row.field_names.remove(i);
                    row.retitle();
                }
                row.is_empty()
            }
            None => false,
        };
        if now_empty {
            rows.remove(record_id);
        }
        self.count = self.count.saturating_sub(1);
        true
    }

    /// Drops every error of a row.
    pub fn clear_row(&mut self, record_id: &str) {
        if !self.rows.contains_key(record_id) {
            return;
        }
        if let Some(row) = Arc::make_mut(&mut self.rows).remove(record_id) {
            self.count = self.count.saturating_sub(row.len());
        }
    }

    /// Total number of outstanding field errors.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Errors of one row.
    pub fn row(&self, record_id: &str) -> Option<&RowErrors> {
        self.rows.get(record_id)
    }

    /// Immutable snapshot of the per-row error map.
    pub fn snapshot(&self) -> Arc<BTreeMap<String, RowErrors>> {
        Arc::clone(&self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_once_per_pair() {
        let mut errors = ErrorState::new();
        assert!(errors.record("r1", "Phone", "Enter a valid Phone"));
        assert!(!errors.record("r1", "Phone", "Enter a valid Phone"));
        assert!(errors.record("r1", "Email", "Enter a valid Email"));
        assert!(errors.record("r2", "Phone", "Enter a valid Phone"));

        assert_eq!(errors.count(), 3);
        assert_eq!(errors.row("r1").unwrap().title, "We found 2 error(s)");
    }

    #[test]
    fn test_newer_message_replaces_older_for_same_cell() {
        let mut errors = ErrorState::new();
        errors.record("r1", "Phone", "Field information for Phone is not loaded");
        assert!(!errors.record("r1", "Phone", "Enter a valid Phone"));

        assert_eq!(errors.count(), 1);
        assert_eq!(errors.row("r1").unwrap().messages, vec!["Enter a valid Phone"]);
    }

    #[test]
    fn test_clear_removes_empty_rows() {
        let mut errors = ErrorState::new();
        errors.record("r1", "Phone", "Enter a valid Phone");

        assert!(!errors.clear("r1", "Email"));
        assert!(errors.clear("r1", "Phone"));
        assert!(!errors.clear("r1", "Phone"));
        assert_eq!(errors.count(), 0);
        assert!(errors.row("r1").is_none());
    }

    #[test]
    fn test_snapshot_is_isolated() {
        let mut errors = ErrorState::new();
        errors.record("r1", "Phone", "Enter a valid Phone");
        let before = errors.snapshot();

        errors.clear("r1", "Phone");
        assert_eq!(before.len(), 1);
        assert!(errors.snapshot().is_empty());
    }

    #[test]
    fn test_clear_row() {
        let mut errors = ErrorState::new();
        errors.record("r1", "Phone", "a");
        errors.record("r1", "Email", "b");
        errors.record("r2", "Phone", "c");
        errors.clear_row("r1");
        assert_eq!(errors.count(), 1);
    }
}
