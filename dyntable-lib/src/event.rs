//! Events emitted to the view layer
//!
//! Every event carries the slice of state a stateless view needs to
//! re-render. Payloads are reference counted, so cloning an event for each
//! subscriber is cheap.

use std::sync::Arc;

use serde::Serialize;

use crate::assimilate::ColumnBindings;
use crate::edit::PendingChange;
use crate::model::Row;
use crate::schema::LinkifiedColumns;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    Success,
    Error,
}

/// A display-only notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            variant: NotificationVariant::Success,
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            variant: NotificationVariant::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.variant == NotificationVariant::Error
    }
}

/// State change notifications.
#[derive(Debug, Clone)]
pub enum TableEvent {
    /// The set of checked rows changed.
    RowSelectionChanged { rows: Arc<Vec<Row>> },

    /// A cell or inline widget edit was applied or reverted.
    CellChanged {
        record_id: String,
        column_header: String,
        pending: Arc<Vec<PendingChange>>,
    },

    /// New search candidates arrived (or the results were cleared).
    SearchResultsChanged {
        rows: Arc<Vec<Row>>,
        linkified: Arc<LinkifiedColumns>,
        bindings: Arc<ColumnBindings>,
    },

    /// A search candidate was selected or a selection removed.
    SelectionChanged {
        selected: Arc<Vec<Row>>,
        linkified: Arc<LinkifiedColumns>,
    },

    Notification(Notification),
}

impl TableEvent {
    /// Returns the notification, if this is one.
    pub fn as_notification(&self) -> Option<&Notification> {
        match self {
            Self::Notification(n) => Some(n),
            _ => None,
        }
    }
}
