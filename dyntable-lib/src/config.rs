//! Table and search configuration

use std::time::Duration;

use serde::Deserialize;

use crate::backend::FetchRequest;
use crate::backend::SearchRequest;
use crate::schema::FieldDescriptor;
use crate::schema::RowAction;
use crate::schema::parse_field_paths;
use crate::schema::parse_row_actions;

/// Configuration of an editable table.
///
/// Deserializes from camelCase JSON, so a table can be described in a
/// fixture file.
///
/// # Example
///
/// ```
/// use dyntable_lib::config::TableConfig;
///
/// let config = TableConfig::new("Contact", "Id, Name, Phone")
///     .with_actions("view,delete")
///     .with_record_limit(50);
/// assert_eq!(config.field_descriptors().len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableConfig {
    /// Title shown above the table.
    pub title: Option<String>,

    /// API name of the object whose records are listed.
    pub obj_api_name: String,

    /// Comma-separated field paths, e.g. `"Id,Name,Account.Name"`.
    pub field_paths: String,

    /// Opaque filter passed through to the record source.
    pub where_clause: Option<String>,

    /// Record the table is anchored to.
    pub record_id: Option<String>,

    /// Maximum number of records to fetch.
    pub record_limit: Option<usize>,

    /// Comma-separated row actions (`view`, `edit`, `delete`).
    pub actions: Option<String>,

    pub hide_checkbox_column: bool,

    /// Skip columns whose field is not accessible.
    pub enforce_accessible_fields: bool,
}

impl TableConfig {
    /// Creates a config for the given object and field paths.
    pub fn new(obj_api_name: impl Into<String>, field_paths: impl Into<String>) -> Self {
        Self {
            obj_api_name: obj_api_name.into(),
            field_paths: field_paths.into(),
            ..Default::default()
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the filter expression.
    pub fn with_where_clause(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    /// Sets the anchor record id.
    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    /// Sets the record limit.
    pub fn with_record_limit(mut self, limit: usize) -> Self {
        self.record_limit = Some(limit);
        self
    }

    /// Sets the comma-separated row actions.
    pub fn with_actions(mut self, actions: impl Into<String>) -> Self {
        self.actions = Some(actions.into());
        self
    }

    /// Sets whether inaccessible fields are skipped.
    pub fn with_enforce_accessible_fields(mut self, enforce: bool) -> Self {
        self.enforce_accessible_fields = enforce;
        self
    }

    /// Parsed field paths.
    pub fn paths(&self) -> Vec<String> {
        parse_field_paths(Some(&self.field_paths))
    }

    /// Field descriptors, in path order.
    pub fn field_descriptors(&self) -> Vec<FieldDescriptor> {
        FieldDescriptor::parse_all(Some(&self.field_paths))
    }

    /// Parsed row actions.
    pub fn row_actions(&self) -> Vec<RowAction> {
        parse_row_actions(self.actions.as_deref())
    }

    /// The fetch request this config describes.
    pub fn fetch_request(&self) -> FetchRequest {
        FetchRequest {
            object_name: self.obj_api_name.clone(),
            field_paths: self.paths(),
            filter: self.where_clause.clone(),
            anchor_record_id: self.record_id.clone(),
            limit: self.record_limit,
        }
    }
}

/// Configuration of a relationship search widget.
///
/// Default limit: 10 results. Default debounce: 300ms.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    pub obj_api_name: String,

    /// Comma-separated paths fetched for each candidate.
    pub field_paths: String,

    /// Comma-separated paths matched against the query.
    pub field_paths_for_search: String,

    pub where_clause: Option<String>,

    pub record_id: Option<String>,

    pub limit: usize,

    /// Quiet interval after the last keystroke, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            obj_api_name: String::new(),
            field_paths: String::new(),
            field_paths_for_search: String::new(),
            where_clause: None,
            record_id: None,
            limit: 10,
            debounce_ms: 300,
        }
    }
}

impl SearchConfig {
    /// Creates a search config for the given object and field paths.
    pub fn new(obj_api_name: impl Into<String>, field_paths: impl Into<String>) -> Self {
        Self {
            obj_api_name: obj_api_name.into(),
            field_paths: field_paths.into(),
            ..Default::default()
        }
    }

    /// Sets the paths matched against the query.
    pub fn with_search_paths(mut self, paths: impl Into<String>) -> Self {
        self.field_paths_for_search = paths.into();
        self
    }

    /// Sets the filter expression.
    pub fn with_where_clause(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    /// Sets the anchor record id.
    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    /// Sets the result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the debounce interval.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = debounce.as_millis() as u64;
        self
    }

    /// The debounce interval.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Builds the search request for a query and the currently selected ids.
    pub fn search_request(&self, query: &str, excluded_ids: Vec<String>) -> SearchRequest {
        SearchRequest {
            object_name: self.obj_api_name.clone(),
            field_paths: parse_field_paths(Some(&self.field_paths)),
            search_field_paths: parse_field_paths(Some(&self.field_paths_for_search)),
            query: query.to_string(),
            excluded_ids,
            filter: self.where_clause.clone(),
            anchor_record_id: self.record_id.clone(),
            limit: Some(self.limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_config_from_json() {
        let json = r#"{
            "objApiName": "Contact",
            "fieldPaths": "Id, Name ,Phone",
            "recordLimit": 25,
            "actions": "View,DELETE,bogus",
            "enforceAccessibleFields": true
        }"#;
        let config: TableConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.paths(), vec!["Id", "Name", "Phone"]);
        assert_eq!(config.row_actions(), vec![RowAction::View, RowAction::Delete]);
        assert!(config.enforce_accessible_fields);
        assert_eq!(config.fetch_request().limit, Some(25));
    }

    #[test]
    fn test_table_config_setters() {
        let config = TableConfig::new("Contact", "Id,Name")
            .with_title("Contacts")
            .with_where_clause("Name != null");
        assert_eq!(config.title.as_deref(), Some("Contacts"));
        assert_eq!(config.fetch_request().filter.as_deref(), Some("Name != null"));
        assert!(!config.hide_checkbox_column);
    }

    #[test]
    fn test_search_config_defaults() {
        let config: SearchConfig = serde_json::from_str(r#"{"objApiName": "Account"}"#).unwrap();
        assert_eq!(config.limit, 10);
        assert_eq!(config.debounce(), Duration::from_millis(300));
    }

    #[test]
    fn test_search_request() {
        let config = SearchConfig::new("Account", "Id,Name")
            .with_search_paths("Name")
            .with_limit(5);
        let request = config.search_request("acme", vec!["001A".into()]);
        assert_eq!(request.search_field_paths, vec!["Name"]);
        assert_eq!(request.excluded_ids, vec!["001A"]);
        assert_eq!(request.limit, Some(5));
    }
}
