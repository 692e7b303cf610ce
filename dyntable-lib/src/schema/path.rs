//! Field path parsing

use crate::model::keys::ID_FIELD;
use crate::model::keys::NAME_FIELD;

/// Splits a comma-separated field path list into trimmed, non-empty paths.
///
/// Whitespace is allowed anywhere and removed. `None` or an empty string
/// yields an empty list, which callers treat as "no columns".
///
/// # Example
///
/// ```
/// use dyntable_lib::schema::parse_field_paths;
///
/// let paths = parse_field_paths(Some(" Id, Name ,Account.Name,, "));
/// assert_eq!(paths, vec!["Id", "Name", "Account.Name"]);
/// ```
pub fn parse_field_paths(list: Option<&str>) -> Vec<String> {
    let Some(list) = list else {
        return Vec::new();
    };
    list.split(',')
        .map(|token| token.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|token| !token.is_empty())
        .collect()
}

/// A requested field path and its role in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// The field path, e.g. `Phone` or `Account.Name`.
    pub path: String,
    /// The path names the record identifier.
    pub is_identifier_field: bool,
    /// The path names the record's name field.
    pub is_name_path_field: bool,
}

impl FieldDescriptor {
    /// Creates a descriptor for a single path.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            is_identifier_field: path.eq_ignore_ascii_case(ID_FIELD),
            is_name_path_field: path.eq_ignore_ascii_case(NAME_FIELD),
            path,
        }
    }

    /// Parses a field path list into descriptors, preserving order.
    pub fn parse_all(list: Option<&str>) -> Vec<Self> {
        parse_field_paths(list).into_iter().map(Self::new).collect()
    }

    /// Returns true if the path traverses a relationship.
    pub fn is_extended(&self) -> bool {
        self.path.split('.').count() > 1
    }
}
