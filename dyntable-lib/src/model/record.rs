//! Raw record payloads returned by the fetch and search collaborators

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use super::FieldType;
use super::Value;

/// One resolved field of a raw record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldProperty {
    /// Column header (field label).
    pub column_header: String,

    /// API name of the field on the base object.
    pub field_api_name: String,

    /// Raw field type tag.
    pub field_type: FieldType,

    /// The resolved value, following relationship traversals.
    #[serde(default)]
    pub field_value: Value,

    /// Id of the record this value links to, if any.
    #[serde(default)]
    pub link_id: Option<String>,

    /// Name under which the link label is stored.
    #[serde(default)]
    pub link_label: Option<String>,
}

impl FieldProperty {
    /// Creates a new field property.
    pub fn new(
        column_header: impl Into<String>,
        field_api_name: impl Into<String>,
        field_type: FieldType,
        field_value: impl Into<Value>,
    ) -> Self {
        Self {
            column_header: column_header.into(),
            field_api_name: field_api_name.into(),
            field_type,
            field_value: field_value.into(),
            link_id: None,
            link_label: None,
        }
    }

    /// Sets the link target and label name.
    pub fn linked(mut self, link_id: impl Into<String>, link_label: impl Into<String>) -> Self {
        self.link_id = Some(link_id.into());
        self.link_label = Some(link_label.into());
        self
    }
}

/// A raw record paired with its resolved field properties.
///
/// `field_properties` is ordered like the requested field paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// The record's own fields, keyed by API name.
    pub record: BTreeMap<String, Value>,

    /// Resolved properties, one per requested field path.
    #[serde(default)]
    pub field_properties: Vec<FieldProperty>,

    /// API name of the object type the record belongs to.
    pub obj_name: String,
}

impl RawRecord {
    /// Creates a raw record with the given id and object type.
    pub fn new(obj_name: impl Into<String>, id: impl Into<String>) -> Self {
        let mut record = BTreeMap::new();
        record.insert("Id".to_string(), Value::String(id.into()));
        Self {
            record,
            field_properties: Vec::new(),
            obj_name: obj_name.into(),
        }
    }

    /// Sets a raw field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.record.insert(field.into(), value.into());
        self
    }

    /// Appends a resolved field property (builder pattern).
    pub fn property(mut self, property: FieldProperty) -> Self {
        self.field_properties.push(property);
        self
    }

    /// Returns the record id, if present and a string.
    pub fn id(&self) -> Option<&str> {
        self.record.get("Id").and_then(Value::as_str)
    }
}
