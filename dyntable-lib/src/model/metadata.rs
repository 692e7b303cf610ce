//! Column metadata types

use serde::Deserialize;
use serde::Serialize;

use super::FieldType;

/// Server-reported metadata for one requested field path.
///
/// The metadata list returned by
/// [`RecordSource::fetch_column_metadata`](crate::backend::RecordSource::fetch_column_metadata)
/// is parallel to the requested field paths: index `i` describes path `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetadata {
    /// Column header (field label) shown to the user.
    pub column_header: String,

    /// API name of the field on the base object.
    pub field_api_name: String,

    /// Raw field type tag.
    pub field_type: FieldType,

    /// Whether the current user may update the field.
    #[serde(default)]
    pub is_updateable: bool,

    /// Whether the current user may read the field.
    #[serde(default = "default_true")]
    pub is_accessible: bool,

    /// Whether the path traverses a relationship.
    #[serde(default)]
    pub is_extended_path: bool,

    /// Link target id for linkified columns.
    #[serde(default)]
    pub link_id: Option<String>,

    /// Link label field for linkified columns.
    #[serde(default)]
    pub link_label: Option<String>,

    /// Picklist option labels, parallel to `picklist_values`.
    #[serde(default)]
    pub picklist_labels: Vec<String>,

    /// Picklist option values, parallel to `picklist_labels`.
    #[serde(default)]
    pub picklist_values: Vec<String>,

    /// Display name of the related object (reference fields).
    #[serde(default)]
    pub rel_obj_name: Option<String>,

    /// API name of the related object (reference fields).
    #[serde(default)]
    pub rel_obj_api_name: Option<String>,
}

fn default_true() -> bool {
    true
}

impl FieldMetadata {
    /// Creates metadata for a plain field with the given header, API name and type.
    pub fn new(
        column_header: impl Into<String>,
        field_api_name: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            column_header: column_header.into(),
            field_api_name: field_api_name.into(),
            field_type,
            is_updateable: false,
            is_accessible: true,
            is_extended_path: false,
            link_id: None,
            link_label: None,
            picklist_labels: Vec::new(),
            picklist_values: Vec::new(),
            rel_obj_name: None,
            rel_obj_api_name: None,
        }
    }

    /// Sets the updateable flag.
    pub fn updateable(mut self, updateable: bool) -> Self {
        self.is_updateable = updateable;
        self
    }

    /// Sets the accessible flag.
    pub fn accessible(mut self, accessible: bool) -> Self {
        self.is_accessible = accessible;
        self
    }

    /// Marks the field as reached through a relationship traversal.
    pub fn extended(mut self, extended: bool) -> Self {
        self.is_extended_path = extended;
        self
    }

    /// Sets the picklist options from `(label, value)` pairs.
    pub fn with_picklist<L, V>(mut self, options: impl IntoIterator<Item = (L, V)>) -> Self
    where
        L: Into<String>,
        V: Into<String>,
    {
        let (labels, values) = options
            .into_iter()
            .map(|(l, v)| (l.into(), v.into()))
            .unzip();
        self.picklist_labels = labels;
        self.picklist_values = values;
        self
    }

    /// Sets the related object for reference fields.
    pub fn with_relationship(mut self, name: impl Into<String>, api_name: impl Into<String>) -> Self {
        self.rel_obj_name = Some(name.into());
        self.rel_obj_api_name = Some(api_name.into());
        self
    }

    /// Returns the picklist options as label/value pairs, in metadata order.
    pub fn picklist_options(&self) -> Vec<PicklistOption> {
        if self.picklist_labels.len() != self.picklist_values.len() {
            log::warn!(
                "Picklist for '{}' has {} labels but {} values",
                self.column_header,
                self.picklist_labels.len(),
                self.picklist_values.len()
            );
        }
        self.picklist_labels
            .iter()
            .zip(&self.picklist_values)
            .map(|(label, value)| PicklistOption {
                label: label.clone(),
                value: value.clone(),
            })
            .collect()
    }

    /// Returns true if this is a reference to a custom object relationship.
    pub fn is_custom_relationship(&self) -> bool {
        self.field_api_name.ends_with("__c")
    }
}

/// A single picklist option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PicklistOption {
    /// The display label.
    pub label: String,
    /// The stored value.
    pub value: String,
}
