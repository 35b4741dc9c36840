use serde::Serialize;

use crate::browser::selectors::field_name;

// ============================================================================
// Raw DOM facts
// ============================================================================

/// Editability and requiredness attributes of one element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ElementFlags {
    pub disabled: bool,
    pub readonly: bool,
    pub required: bool,
}

/// Everything the classifier needs to know about one field container,
/// read from the live page in a single pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldSnapshot {
    /// Container id, e.g. `field-name`
    pub id: String,
    /// Lowercase container tag, e.g. `vaadin-combo-box`
    pub tag: String,
    pub container: ElementFlags,
    /// Flags of the inner `input`/`textarea`, if the container has one
    pub inner: Option<ElementFlags>,
    pub has_relation_add: bool,
    pub has_relation_remove: bool,
    pub has_relation_available: bool,
    pub has_relation_selected: bool,
    pub value: Option<String>,
}

impl FieldSnapshot {
    /// Entity-field part of the id, without the `field-` prefix.
    pub fn name(&self) -> &str {
        field_name(&self.id)
    }
}

// ============================================================================
// Classified field
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FieldKind {
    /// Audit and scoping fields maintained by the application
    System,
    /// Ids and foreign-key references
    EntityIdentifier,
    Combo,
    /// Two lists plus add/remove actions
    RelationEditor,
    PlainText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub kind: FieldKind,
    pub required: bool,
    pub editable: bool,
    pub current_value: Option<String>,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        field_name(&self.id)
    }

    /// Fields the create step fills in.
    pub fn is_populatable(&self) -> bool {
        self.editable && self.kind != FieldKind::System
    }
}
