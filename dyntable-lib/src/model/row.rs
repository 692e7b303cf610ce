//! Flattened table row

use std::collections::BTreeMap;

use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeMap;

use super::Value;
use super::keys;
use crate::error::FieldError;

/// A flattened, render-ready row.
///
/// Holds the raw record fields plus one display value per column, link
/// targets and labels for linkified columns, and the navigable name link.
/// Use [`display_value`](Row::display_value) and friends rather than
/// building keys by hand.
///
/// Serializes as one flat object (raw fields, display keys, link keys,
/// `RecName`, `objName`) for a stateless view layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub(crate) id: String,
    pub(crate) object_name: String,
    pub(crate) fields: BTreeMap<String, Value>,
}

impl Row {
    /// Returns the record id. Unique within a result page.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the API name of the object type the row belongs to.
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// Returns the value stored under a flat key (raw field or column key).
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns the display value of a column.
    pub fn display_value(&self, column_header: &str) -> Option<&Value> {
        self.fields.get(&keys::display_key(column_header))
    }

    /// Returns the link target (`/<id>`) of a linkified column.
    pub fn link_target(&self, column_header: &str) -> Option<&str> {
        self.fields
            .get(&keys::link_target_key(column_header))
            .and_then(Value::as_str)
    }

    /// Returns the label shown for a link, by link label name.
    pub fn link_label(&self, link_label: &str) -> Option<&Value> {
        self.fields.get(&keys::link_label_key(link_label))
    }

    /// Returns the navigable link to the record itself (`/<id>`).
    pub fn name_link(&self) -> Option<&str> {
        self.fields.get(keys::NAME_LINK_KEY).and_then(Value::as_str)
    }

    pub(crate) fn set_display_value(&mut self, column_header: &str, value: Value) {
        self.fields.insert(keys::display_key(column_header), value);
    }

    /// Reads a flat key as a string. `Ok(None)` means the key holds null.
    pub fn get_string(&self, key: &str) -> Result<Option<&str>, FieldError> {
        match self.typed(key)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.as_str())),
            other => Err(FieldError::mismatch(&self.id, key, "string", other.type_name())),
        }
    }

    /// Reads a flat key as a boolean.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, FieldError> {
        match self.typed(key)? {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(*b)),
            other => Err(FieldError::mismatch(&self.id, key, "bool", other.type_name())),
        }
    }

    /// Reads a flat key as an integer.
    pub fn get_int(&self, key: &str) -> Result<Option<i64>, FieldError> {
        match self.typed(key)? {
            Value::Null => Ok(None),
            Value::Int(n) => Ok(Some(*n)),
            other => Err(FieldError::mismatch(&self.id, key, "int", other.type_name())),
        }
    }

    /// Reads a column's display value as a string.
    pub fn display_string(&self, column_header: &str) -> Result<Option<&str>, FieldError> {
        self.get_string(&keys::display_key(column_header))
    }

    fn typed(&self, key: &str) -> Result<&Value, FieldError> {
        self.fields
            .get(key)
            .ok_or_else(|| FieldError::missing(&self.id, key))
    }
}

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("objName", &self.object_name)?;
        map.end()
    }
}
