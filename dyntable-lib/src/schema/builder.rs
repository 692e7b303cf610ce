//! Column schema derivation

use super::ActionItem;
use super::ColumnDefinition;
use super::FieldDescriptor;
use super::LinkifiedColumns;
use super::RowAction;
use super::WidgetAttributes;
use crate::model::DisplayType;
use crate::model::FieldMetadata;
use crate::model::FieldType;
use crate::model::keys;

const LINK_TARGET: &str = "_blank";
const GENERIC_RECORD_ICON: &str = "standard:record";

/// Builds the ordered column list from field descriptors and their
/// parallel metadata.
///
/// The identifier field never gets a column of its own; it is reachable
/// through the name column's link. Without metadata (not fetched yet, or
/// fetched for a different path list) the result is empty.
///
/// # Example
///
/// ```
/// use dyntable_lib::model::{FieldMetadata, FieldType};
/// use dyntable_lib::schema::{ColumnSchemaBuilder, FieldDescriptor};
///
/// let descriptors = FieldDescriptor::parse_all(Some("Id,Name"));
/// let metadata = vec![
///     FieldMetadata::new("Record ID", "Id", FieldType::Id),
///     FieldMetadata::new("Name", "Name", FieldType::String),
/// ];
/// let columns = ColumnSchemaBuilder::new(&descriptors)
///     .metadata(Some(metadata.as_slice()))
///     .build();
/// assert_eq!(columns.len(), 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ColumnSchemaBuilder<'a> {
    descriptors: &'a [FieldDescriptor],
    metadata: Option<&'a [FieldMetadata]>,
    linkified: Option<&'a LinkifiedColumns>,
    enforce_accessible: bool,
    actions: &'a [RowAction],
}

impl<'a> ColumnSchemaBuilder<'a> {
    /// Creates a builder for the given descriptors.
    pub fn new(descriptors: &'a [FieldDescriptor]) -> Self {
        Self {
            descriptors,
            metadata: None,
            linkified: None,
            enforce_accessible: false,
            actions: &[],
        }
    }

    /// Sets the metadata list, parallel to the descriptors.
    pub fn metadata(mut self, metadata: Option<&'a [FieldMetadata]>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sets the linkified columns discovered during assimilation.
    pub fn linkified(mut self, linkified: &'a LinkifiedColumns) -> Self {
        self.linkified = Some(linkified);
        self
    }

    /// Skips fields the user cannot read.
    pub fn enforce_accessible(mut self, enforce: bool) -> Self {
        self.enforce_accessible = enforce;
        self
    }

    /// Appends a row action column when non-empty.
    pub fn actions(mut self, actions: &'a [RowAction]) -> Self {
        self.actions = actions;
        self
    }

    /// Builds the column list.
    pub fn build(&self) -> Vec<ColumnDefinition> {
        let Some(metadata) = self.metadata else {
            log::debug!("Column metadata not loaded yet, no columns");
            return Vec::new();
        };
        if metadata.len() != self.descriptors.len() {
            log::warn!(
                "Column metadata has {} entries for {} field paths, ignoring it",
                metadata.len(),
                self.descriptors.len()
            );
            return Vec::new();
        }

        let mut columns: Vec<ColumnDefinition> = self
            .descriptors
            .iter()
            .zip(metadata)
            .filter(|(descriptor, _)| !descriptor.is_identifier_field)
            .filter(|(_, meta)| !self.enforce_accessible || meta.is_accessible)
            .map(|(descriptor, meta)| self.column_for(descriptor, meta))
            .collect();

        if !self.actions.is_empty() {
            columns.push(action_column(self.actions));
        }
        columns
    }

    fn column_for(&self, descriptor: &FieldDescriptor, meta: &FieldMetadata) -> ColumnDefinition {
        let extended = meta.is_extended_path || descriptor.is_extended();

        if descriptor.is_name_path_field {
            return name_column(meta);
        }
        if meta.field_type == FieldType::Picklist && !extended {
            return picklist_column(meta);
        }
        if meta.field_type == FieldType::Reference && !extended {
            return lookup_column(meta);
        }
        self.plain_column(meta)
    }

    fn plain_column(&self, meta: &FieldMetadata) -> ColumnDefinition {
        let header = meta.column_header.as_str();
        let link_label = self
            .linkified
            .and_then(|linkified| linkified.label_name(header));

        match link_label {
            Some(label_name) => ColumnDefinition {
                label: header.to_string(),
                key: keys::link_target_key(header),
                display_type: DisplayType::Url,
                editable: meta.is_updateable,
                sortable: true,
                widget: Some(WidgetAttributes::Link {
                    label_key: keys::link_label_key(label_name),
                    target: LINK_TARGET.to_string(),
                }),
            },
            None => ColumnDefinition {
                label: header.to_string(),
                key: keys::display_key(header),
                display_type: meta.field_type.display_type(),
                editable: meta.is_updateable,
                sortable: true,
                widget: None,
            },
        }
    }
}

fn name_column(meta: &FieldMetadata) -> ColumnDefinition {
    ColumnDefinition {
        label: meta.column_header.clone(),
        key: keys::NAME_LINK_KEY.to_string(),
        display_type: DisplayType::Url,
        editable: meta.is_updateable,
        sortable: true,
        widget: Some(WidgetAttributes::Link {
            label_key: keys::NAME_FIELD.to_string(),
            target: LINK_TARGET.to_string(),
        }),
    }
}

fn picklist_column(meta: &FieldMetadata) -> ColumnDefinition {
    ColumnDefinition {
        label: meta.column_header.clone(),
        key: keys::display_key(&meta.column_header),
        display_type: DisplayType::Picklist,
        editable: meta.is_updateable,
        sortable: true,
        widget: Some(WidgetAttributes::Picklist {
            options: meta.picklist_options(),
            value_key: keys::display_key(&meta.column_header),
            context_key: keys::ID_FIELD.to_string(),
            field_api_name: meta.field_api_name.clone(),
        }),
    }
}

fn lookup_column(meta: &FieldMetadata) -> ColumnDefinition {
    let label = meta
        .rel_obj_name
        .clone()
        .unwrap_or_else(|| meta.column_header.clone());

    ColumnDefinition {
        label,
        key: keys::display_key(&meta.column_header),
        display_type: DisplayType::Lookup,
        editable: meta.is_updateable,
        sortable: true,
        widget: Some(WidgetAttributes::Lookup {
            object_api_name: meta.rel_obj_api_name.clone().unwrap_or_default(),
            icon: lookup_icon(meta),
            value_key: meta.field_api_name.clone(),
            context_key: keys::ID_FIELD.to_string(),
            field_api_name: meta.field_api_name.clone(),
        }),
    }
}

fn lookup_icon(meta: &FieldMetadata) -> String {
    if meta.is_custom_relationship() {
        return GENERIC_RECORD_ICON.to_string();
    }
    match meta.rel_obj_api_name.as_deref().or(meta.rel_obj_name.as_deref()) {
        Some(name) => format!("standard:{}", name.to_lowercase().replace(' ', "_")),
        None => GENERIC_RECORD_ICON.to_string(),
    }
}

fn action_column(actions: &[RowAction]) -> ColumnDefinition {
    ColumnDefinition {
        label: String::new(),
        key: String::new(),
        display_type: DisplayType::Action,
        editable: false,
        sortable: false,
        widget: Some(WidgetAttributes::Actions {
            actions: actions.iter().copied().map(ActionItem::from).collect(),
            menu_alignment: "right".to_string(),
        }),
    }
}
