//! Raw field types and the display types they render as

use serde::Deserialize;
use serde::Serialize;

/// Raw field type tag reported by the metadata collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Boolean,
    Currency,
    Combobox,
    DataCategoryGroupReference,
    Id,
    Date,
    DateTime,
    Integer,
    Long,
    Decimal,
    Double,
    Email,
    Percent,
    Phone,
    Picklist,
    MultiPicklist,
    Reference,
    TextArea,
    Time,
    Url,
    /// Any tag not listed above. Rendered as text.
    #[serde(other)]
    Unknown,
}

impl FieldType {
    /// Maps the raw type to the display type used by the table.
    pub fn display_type(&self) -> DisplayType {
        match self {
            Self::Boolean => DisplayType::Boolean,
            Self::Currency => DisplayType::Currency,
            Self::Date | Self::DateTime => DisplayType::Date,
            Self::Integer | Self::Long | Self::Decimal | Self::Double => DisplayType::Number,
            Self::Email => DisplayType::Email,
            Self::Percent => DisplayType::Percent,
            Self::Phone => DisplayType::Phone,
            Self::Reference => DisplayType::Id,
            Self::Url => DisplayType::Url,
            Self::String
            | Self::Combobox
            | Self::DataCategoryGroupReference
            | Self::Id
            | Self::Picklist
            | Self::MultiPicklist
            | Self::TextArea
            | Self::Time
            | Self::Unknown => DisplayType::Text,
        }
    }

    /// Returns true for numeric types stored as exact decimals.
    pub fn is_decimal(&self) -> bool {
        matches!(
            self,
            Self::Currency | Self::Decimal | Self::Double | Self::Percent
        )
    }

    /// Returns true for whole-number types.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Integer | Self::Long)
    }
}

/// Display/widget type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    Text,
    Boolean,
    Currency,
    Date,
    Number,
    Email,
    Percent,
    Phone,
    Id,
    Url,
    /// Inline single-select widget.
    Picklist,
    /// Inline relationship lookup widget.
    Lookup,
    /// Row action menu.
    Action,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_type_map() {
        assert_eq!(FieldType::Phone.display_type(), DisplayType::Phone);
        assert_eq!(FieldType::Reference.display_type(), DisplayType::Id);
        assert_eq!(FieldType::DateTime.display_type(), DisplayType::Date);
        assert_eq!(FieldType::Long.display_type(), DisplayType::Number);
        assert_eq!(FieldType::Picklist.display_type(), DisplayType::Text);
    }

    #[test]
    fn test_deserialize_unknown_tag() {
        let t: FieldType = serde_json::from_str(r#""ENCRYPTEDSTRING""#).unwrap();
        assert_eq!(t, FieldType::Unknown);
        assert_eq!(t.display_type(), DisplayType::Text);

        let t: FieldType = serde_json::from_str(r#""MULTIPICKLIST""#).unwrap();
        assert_eq!(t, FieldType::MultiPicklist);
    }
}
