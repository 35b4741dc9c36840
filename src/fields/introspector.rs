use tracing::{debug, info};

use crate::browser::controls::read_field_value;
use crate::browser::probe::DomProbe;
use crate::browser::selectors::{
    by_id, within, FIELD, INNER_INPUT, RELATION_ADD, RELATION_AVAILABLE, RELATION_REMOVE,
    RELATION_SELECTED,
};
use crate::error::{recover, SweepResult};
use crate::fields::classifier::{classify, has_forced_selection_marker};
use crate::fields::field_model::{ElementFlags, FieldDescriptor, FieldKind, FieldSnapshot};

/// Id suffixes that mark a field as the row's human-facing identity.
const PRIMARY_SUFFIXES: [&str; 3] = ["name", "title", "code"];

/// Reads and classifies every `field-*` container on the current page.
///
/// Nothing is cached: the form may be rebuilt after any navigation or save,
/// so callers introspect again whenever they need fresh descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldIntrospector;

impl FieldIntrospector {
    pub fn new() -> Self {
        Self
    }

    /// Descriptors for all fields in DOM order. A field whose snapshot
    /// fails is logged and left out.
    pub fn introspect(&self, probe: &mut dyn DomProbe) -> SweepResult<Vec<FieldDescriptor>> {
        let count = probe.count(FIELD)?;
        let mut descriptors = Vec::with_capacity(count as usize);

        for index in 0..count {
            let context = format!("classify field #{}", index);
            let Some(Some(snapshot)) = recover(&context, self.snapshot(probe, index))? else {
                continue;
            };
            let descriptor = classify(&snapshot);
            debug!(
                field = %descriptor.id,
                kind = ?descriptor.kind,
                required = descriptor.required,
                editable = descriptor.editable,
                "field classified"
            );
            descriptors.push(descriptor);
        }

        info!(fields = descriptors.len(), "fields introspected");
        Ok(descriptors)
    }

    /// Raw facts for the `index`-th field container. `None` if it has no id.
    pub fn snapshot(&self, probe: &mut dyn DomProbe, index: u32) -> SweepResult<Option<FieldSnapshot>> {
        let Some(id) = probe
            .attribute(FIELD, index, "id")?
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
        else {
            return Ok(None);
        };
        let tag = probe.tag_name(FIELD, index)?.unwrap_or_default();

        let container_sel = by_id(&id);
        let inner_sel = within(&id, INNER_INPUT);
        let container = flags(probe, &container_sel);
        let inner = if probe.exists(&inner_sel) {
            Some(flags(probe, &inner_sel))
        } else {
            None
        };

        let snapshot = FieldSnapshot {
            has_relation_add: probe.exists(&within(&id, RELATION_ADD)),
            has_relation_remove: probe.exists(&within(&id, RELATION_REMOVE)),
            has_relation_available: probe.exists(&within(&id, RELATION_AVAILABLE)),
            has_relation_selected: probe.exists(&within(&id, RELATION_SELECTED)),
            value: read_field_value(probe, &id)?,
            id,
            tag,
            container,
            inner,
        };
        Ok(Some(snapshot))
    }
}

fn flags(probe: &mut dyn DomProbe, selector: &str) -> ElementFlags {
    ElementFlags {
        disabled: probe.has_attribute(selector, 0, "disabled"),
        readonly: probe.has_attribute(selector, 0, "readonly"),
        required: probe.has_attribute(selector, 0, "required"),
    }
}

/// Field whose value identifies the row: an editable text or combo field,
/// preferring `*name`/`*title`/`*code` ids and text over combos.
/// Identifier and system fields are never chosen.
pub fn primary_field(fields: &[FieldDescriptor]) -> Option<&FieldDescriptor> {
    let candidates = |kind: FieldKind| {
        fields
            .iter()
            .filter(move |f| f.editable && f.kind == kind)
    };
    let suffixed = |f: &&FieldDescriptor| {
        let name = f.name().to_lowercase();
        PRIMARY_SUFFIXES.iter().any(|s| name.ends_with(s))
    };

    candidates(FieldKind::PlainText)
        .find(suffixed)
        .or_else(|| candidates(FieldKind::Combo).find(suffixed))
        .or_else(|| candidates(FieldKind::PlainText).next())
        .or_else(|| candidates(FieldKind::Combo).next())
}

/// Status/approval combos get a retried selection during create.
pub fn needs_forced_selection(field: &FieldDescriptor) -> bool {
    field.kind == FieldKind::Combo && has_forced_selection_marker(field.name())
}
