use crate::fields::field_model::{FieldDescriptor, FieldKind, FieldSnapshot};

/// Name fragments of audit and scoping fields.
pub const SYSTEM_MARKERS: [&str; 5] = ["created", "updated", "modified", "version", "company"];

/// Name fragments of combos treated as required even when not marked so.
pub const FORCED_SELECTION_MARKERS: [&str; 2] = ["status", "approval"];

type Rule = fn(&FieldSnapshot) -> bool;

/// Classification rules in priority order. The first matching rule wins;
/// `PlainText` is the fallback when none match.
pub const RULES: &[(FieldKind, Rule)] = &[
    (FieldKind::System, is_system),
    (FieldKind::EntityIdentifier, is_entity_identifier),
    (FieldKind::Combo, is_combo),
    (FieldKind::RelationEditor, is_relation_editor),
];

pub fn classify_kind(snapshot: &FieldSnapshot) -> FieldKind {
    RULES
        .iter()
        .find(|(_, rule)| rule(snapshot))
        .map(|(kind, _)| *kind)
        .unwrap_or(FieldKind::PlainText)
}

pub fn classify(snapshot: &FieldSnapshot) -> FieldDescriptor {
    let kind = classify_kind(snapshot);
    FieldDescriptor {
        id: snapshot.id.clone(),
        kind,
        required: is_required(snapshot, kind),
        editable: is_editable(snapshot, kind),
        current_value: snapshot.value.clone(),
    }
}

fn is_system(s: &FieldSnapshot) -> bool {
    let name = s.name().to_lowercase();
    SYSTEM_MARKERS.iter().any(|m| name.contains(m))
}

fn is_entity_identifier(s: &FieldSnapshot) -> bool {
    let name = s.name();
    let lower = name.to_lowercase();
    lower == "id" || lower.ends_with("-id") || lower.ends_with("_id") || name.ends_with("Id")
}

fn is_combo(s: &FieldSnapshot) -> bool {
    s.tag.contains("combo-box") || s.tag.contains("select")
}

fn is_relation_editor(s: &FieldSnapshot) -> bool {
    s.has_relation_add && s.has_relation_remove && s.has_relation_available && s.has_relation_selected
}

/// Container flags win; a disabled or read-only container disables the
/// field whatever its inner input reports.
pub fn is_editable(s: &FieldSnapshot, kind: FieldKind) -> bool {
    if s.container.disabled || s.container.readonly {
        return false;
    }
    match s.inner {
        Some(inner) => !inner.disabled && !inner.readonly,
        // Nothing to type into
        None => kind != FieldKind::PlainText,
    }
}

pub fn is_required(s: &FieldSnapshot, kind: FieldKind) -> bool {
    s.container.required
        || s.inner.map(|i| i.required).unwrap_or(false)
        || (kind == FieldKind::Combo && has_forced_selection_marker(s.name()))
}

pub fn has_forced_selection_marker(name: &str) -> bool {
    let lower = name.to_lowercase();
    FORCED_SELECTION_MARKERS.iter().any(|m| lower.contains(m))
}
