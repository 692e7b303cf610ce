//! Row actions

use serde::Serialize;

/// An action offered in the trailing row-action column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowAction {
    View,
    Edit,
    Delete,
}

impl RowAction {
    /// Parses a single action token, case-insensitively.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "VIEW" => Some(Self::View),
            "EDIT" => Some(Self::Edit),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::View => "View",
            Self::Edit => "Edit",
            Self::Delete => "Delete",
        }
    }

    /// Action name carried by row-action events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

/// Parses a comma-separated action list, e.g. `"view, Edit ,delete"`.
///
/// Unrecognized tokens are ignored and repeated actions are listed once.
pub fn parse_row_actions(list: Option<&str>) -> Vec<RowAction> {
    let mut actions = Vec::new();
    for token in list.unwrap_or_default().split(',') {
        match RowAction::parse(token.trim()) {
            Some(action) if !actions.contains(&action) => actions.push(action),
            Some(_) => {}
            None if token.trim().is_empty() => {}
            None => log::debug!("Ignoring unknown row action '{}'", token.trim()),
        }
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_row_actions() {
        assert_eq!(
            parse_row_actions(Some(" VIEW,bogus, delete ,view")),
            vec![RowAction::View, RowAction::Delete]
        );
        assert!(parse_row_actions(None).is_empty());
        assert!(parse_row_actions(Some("")).is_empty());
    }
}
