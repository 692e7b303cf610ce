//! Collision-safe row keys
//!
//! Display values, link targets and link labels are stored in the same flat
//! map as the raw record fields. Each gets a reserved suffix so a column
//! header that happens to equal a raw field name (a custom field labelled
//! "Name", say) never overwrites the raw value. Outside this module the
//! suffixes are reached only through [`Row`](super::Row) accessors and the
//! `key` of a [`ColumnDefinition`](crate::schema::ColumnDefinition).

/// Raw identifier field.
pub const ID_FIELD: &str = "Id";

/// Raw name field.
pub const NAME_FIELD: &str = "Name";

/// Key holding the navigable link to the record itself.
pub(crate) const NAME_LINK_KEY: &str = "RecName";

const DISPLAY_SUFFIX: &str = "@_@";
const LINK_TARGET_SUFFIX: &str = "_^_";
const LINK_LABEL_SUFFIX: &str = "^_^";

pub(crate) fn display_key(column_header: &str) -> String {
    format!("{}{}", column_header, DISPLAY_SUFFIX)
}

pub(crate) fn link_target_key(column_header: &str) -> String {
    format!("{}{}", column_header, LINK_TARGET_SUFFIX)
}

pub(crate) fn link_label_key(link_label: &str) -> String {
    format!("{}{}", link_label, LINK_LABEL_SUFFIX)
}

pub(crate) fn navigation_path(record_id: &str) -> String {
    format!("/{}", record_id)
}
