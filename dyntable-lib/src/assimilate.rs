//! Record assimilation
//!
//! Flattens raw record/field-property pairs into [`Row`]s. Pure: the same
//! input always yields equal output, with no side effects.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::error::ShapeError;
use crate::model::FieldType;
use crate::model::RawRecord;
use crate::model::Row;
use crate::model::Value;
use crate::model::keys;
use crate::schema::LinkifiedColumns;

/// What a column header maps back to on the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBinding {
    /// API name used when committing edits.
    pub field_api_name: String,
    /// Raw field type, used to canonicalize and validate edits.
    pub field_type: FieldType,
}

/// Column header to binding map.
pub type ColumnBindings = BTreeMap<String, ColumnBinding>;

/// Output of [`assimilate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assimilated {
    /// Flattened rows, in input order.
    pub rows: Vec<Row>,
    /// Columns that carried a link target on any row.
    pub linkified: LinkifiedColumns,
    /// Column header to field binding.
    pub bindings: ColumnBindings,
}

/// Flattens raw records into rows.
///
/// # Errors
///
/// Returns [`ShapeError`] if a record has no string `Id` or two records
/// share an `Id`.
pub fn assimilate(records: &[RawRecord]) -> Result<Assimilated, ShapeError> {
    let mut out = Assimilated::default();
    let mut seen = BTreeSet::new();

    for (index, raw) in records.iter().enumerate() {
        let id = record_id(raw, index)?;
        if !seen.insert(id.clone()) {
            return Err(ShapeError::DuplicateId { index, id });
        }

        let mut fields = raw.record.clone();
        for property in &raw.field_properties {
            let header = property.column_header.as_str();
            fields.insert(keys::display_key(header), property.field_value.clone());
            out.bindings.insert(
                header.to_string(),
                ColumnBinding {
                    field_api_name: property.field_api_name.clone(),
                    field_type: property.field_type,
                },
            );

            if let Some(link_id) = property.link_id.as_deref().filter(|l| !l.is_empty()) {
                let link_label = property.link_label.as_deref().unwrap_or(header);
                fields.insert(
                    keys::link_target_key(header),
                    Value::String(keys::navigation_path(link_id)),
                );
                fields.insert(keys::link_label_key(link_label), property.field_value.clone());
                out.linkified.insert(header, link_label);
            }
        }
        fields.insert(
            keys::NAME_LINK_KEY.to_string(),
            Value::String(keys::navigation_path(&id)),
        );

        out.rows.push(Row {
            id,
            object_name: raw.obj_name.clone(),
            fields,
        });
    }

    log::debug!(
        "Assimilated {} rows, {} linkified columns",
        out.rows.len(),
        out.linkified.len()
    );
    Ok(out)
}

fn record_id(raw: &RawRecord, index: usize) -> Result<String, ShapeError> {
    match raw.record.get(keys::ID_FIELD) {
        None | Some(Value::Null) => Err(ShapeError::MissingId { index }),
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(Value::String(_)) => Err(ShapeError::MissingId { index }),
        Some(other) => Err(ShapeError::InvalidId {
            index,
            actual: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldProperty;

    fn contact(id: &str, name: &str, phone: &str) -> RawRecord {
        RawRecord::new("Contact", id)
            .set("Name", name)
            .set("AccountId", "001A")
            .property(FieldProperty::new("Name", "Name", FieldType::String, name))
            .property(FieldProperty::new("Phone", "Phone", FieldType::Phone, phone))
            .property(
                FieldProperty::new("Account Name", "Name", FieldType::String, "Acme")
                    .linked("001A", "AccountLabel"),
            )
    }

    #[test]
    fn test_assimilate_flattens_row() {
        let out = assimilate(&[contact("003A", "Ada", "555-123-4567")]).unwrap();
        let row = &out.rows[0];

        assert_eq!(row.id(), "003A");
        assert_eq!(row.object_name(), "Contact");
        assert_eq!(row.name_link(), Some("/003A"));
        assert_eq!(row.display_value("Phone"), Some(&Value::from("555-123-4567")));
        assert_eq!(row.link_target("Account Name"), Some("/001A"));
        assert_eq!(row.link_label("AccountLabel"), Some(&Value::from("Acme")));
        assert_eq!(row.get_string("AccountId").unwrap(), Some("001A"));

        assert!(out.linkified.contains("Account Name"));
        assert!(!out.linkified.contains("Phone"));
        assert_eq!(out.bindings["Phone"].field_type, FieldType::Phone);
    }

    #[test]
    fn test_display_column_does_not_clobber_raw_field() {
        let raw = RawRecord::new("Custom__c", "a01")
            .set("Name", "raw name")
            .property(FieldProperty::new("Name", "Label__c", FieldType::String, "label value"));
        let out = assimilate(&[raw]).unwrap();
        let row = &out.rows[0];

        assert_eq!(row.get_string("Name").unwrap(), Some("raw name"));
        assert_eq!(row.display_value("Name"), Some(&Value::from("label value")));
        assert_eq!(row.get_string("Id").unwrap(), Some("a01"));
    }

    #[test]
    fn test_assimilate_is_idempotent() {
        let input = vec![contact("003A", "Ada", "1"), contact("003B", "Grace", "2")];
        let first = assimilate(&input).unwrap();
        let second = assimilate(&input).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.rows).unwrap(),
            serde_json::to_string(&second.rows).unwrap()
        );
    }

    #[test]
    fn test_shape_errors() {
        let mut no_id = RawRecord::new("Contact", "x");
        no_id.record.remove("Id");
        assert_eq!(
            assimilate(&[no_id]),
            Err(ShapeError::MissingId { index: 0 })
        );

        let numeric = RawRecord::new("Contact", "x").set("Id", 5i64);
        assert_eq!(
            assimilate(&[numeric]),
            Err(ShapeError::InvalidId { index: 0, actual: "int" })
        );

        let dup = contact("003A", "Ada", "1");
        assert!(matches!(
            assimilate(&[dup.clone(), dup]),
            Err(ShapeError::DuplicateId { index: 1, .. })
        ));
    }
}
