//! Column definitions consumed by the rendering layer

use std::collections::BTreeMap;

use serde::Serialize;

use super::RowAction;
use crate::model::DisplayType;
use crate::model::PicklistOption;

/// One render-ready table column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Column label.
    pub label: String,
    /// Row key the column reads its value from.
    #[serde(rename = "fieldName")]
    pub key: String,
    /// How the value is rendered.
    #[serde(rename = "type")]
    pub display_type: DisplayType,
    /// Whether cells may be edited. Mirrors the field's updateable flag.
    pub editable: bool,
    pub sortable: bool,
    /// Extra attributes for link, widget and action columns.
    #[serde(rename = "typeAttributes", skip_serializing_if = "Option::is_none")]
    pub widget: Option<WidgetAttributes>,
}

/// Display-type specific attributes of a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum WidgetAttributes {
    /// Render the value as a link; the visible text is read from `label_key`.
    Link { label_key: String, target: String },

    /// Inline single-select widget.
    Picklist {
        options: Vec<PicklistOption>,
        /// Row key holding the current value.
        value_key: String,
        /// Row key identifying the owning record.
        context_key: String,
        field_api_name: String,
    },

    /// Inline relationship lookup widget.
    Lookup {
        object_api_name: String,
        icon: String,
        /// Row key holding the raw relationship id.
        value_key: String,
        /// Row key identifying the owning record.
        context_key: String,
        field_api_name: String,
    },

    /// Row action menu.
    Actions {
        actions: Vec<ActionItem>,
        menu_alignment: String,
    },
}

/// One entry of the row action menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionItem {
    pub label: String,
    pub name: String,
}

impl From<RowAction> for ActionItem {
    fn from(action: RowAction) -> Self {
        Self {
            label: action.label().to_string(),
            name: action.name().to_string(),
        }
    }
}

/// Columns whose values render as links, with the name their link label is
/// stored under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkifiedColumns {
    labels: BTreeMap<String, String>,
}

impl LinkifiedColumns {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a column header as linkified.
    pub fn insert(&mut self, column_header: impl Into<String>, link_label: impl Into<String>) {
        self.labels.insert(column_header.into(), link_label.into());
    }

    /// Returns true if the column header is linkified.
    pub fn contains(&self, column_header: &str) -> bool {
        self.labels.contains_key(column_header)
    }

    /// Returns the link label name for a linkified column.
    pub fn label_name(&self, column_header: &str) -> Option<&str> {
        self.labels.get(column_header).map(String::as_str)
    }

    /// Iterates over linkified column headers in sorted order.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
