use tracing::{info, warn};

use crate::browser::controls::settle;
use crate::browser::probe::DomProbe;
use crate::browser::selectors::{
    relation_items, within, RELATION_ADD, RELATION_AVAILABLE, RELATION_REMOVE, RELATION_SELECTED,
};
use crate::error::{SweepError, SweepResult};
use crate::orchestrator::sweep_config::Waits;

/// One add and one remove on a two-list membership editor.
///
/// Moves the first available item to the selected list and then moves it
/// back, so membership ends where it started. `Ok(false)` when the
/// available list is empty.
pub fn exercise_relation(probe: &mut dyn DomProbe, field_id: &str, waits: &Waits) -> SweepResult<bool> {
    let available = relation_items(field_id, RELATION_AVAILABLE);
    let selected = relation_items(field_id, RELATION_SELECTED);

    let available_before = probe.count(&available)?;
    if available_before == 0 {
        warn!(field = field_id, "relation editor has nothing available");
        return Ok(false);
    }
    let selected_before = probe.count(&selected)?;
    let item = probe.text(&available, 0)?.unwrap_or_default().trim().to_string();

    probe.click(&available, 0)?;
    probe.click(&within(field_id, RELATION_ADD), 0)?;
    settle(probe, waits.action_ms, "Relation Add")?;

    let selected_after_add = probe.count(&selected)?;
    if selected_after_add <= selected_before {
        return Err(SweepError::verification(
            "Relation add",
            format!("'{}' did not move to the selected list of {}", item, field_id),
        ));
    }

    let index = probe
        .texts(&selected)?
        .iter()
        .position(|t| *t == item)
        .unwrap_or(selected_after_add as usize - 1) as u32;
    probe.click(&selected, index)?;
    probe.click(&within(field_id, RELATION_REMOVE), 0)?;
    settle(probe, waits.action_ms, "Relation Remove")?;

    let selected_after_remove = probe.count(&selected)?;
    if selected_after_remove != selected_before {
        return Err(SweepError::verification(
            "Relation remove",
            format!(
                "selected list of {} has {} items, expected {}",
                field_id, selected_after_remove, selected_before
            ),
        ));
    }

    info!(field = field_id, item = %item, "relation editor add/remove exercised");
    Ok(true)
}
