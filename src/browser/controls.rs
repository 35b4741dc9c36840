use tracing::{debug, info};

use crate::browser::probe::DomProbe;
use crate::browser::selectors::{
    by_id, within, COMBO_OPTION, CONFIRM_YES, DIALOG_DISMISS, ERROR_DIALOG, GRID, GRID_CELL,
    INNER_INPUT, OPEN_DIALOG,
};
use crate::error::{SweepError, SweepResult};
use crate::orchestrator::sweep_config::Waits;

// ============================================================================
// Fail-fast check
// ============================================================================

/// Raise `BlockingErrorDialog` if the application's error dialog is open.
pub fn check_blocking_dialog(probe: &mut dyn DomProbe, control_point: &str) -> SweepResult<()> {
    if probe.count(ERROR_DIALOG)? == 0 {
        return Ok(());
    }
    let detail = probe
        .text(ERROR_DIALOG, 0)
        .ok()
        .flatten()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .map(|t| t.chars().take(200).collect::<String>())
        .unwrap_or_else(|| "(no details)".to_string());
    Err(SweepError::BlockingErrorDialog {
        control_point: control_point.to_string(),
        detail,
    })
}

/// Wait, then run the fail-fast check.
pub fn settle(probe: &mut dyn DomProbe, ms: u64, control_point: &str) -> SweepResult<()> {
    probe.wait_ms(ms)?;
    check_blocking_dialog(probe, control_point)
}

/// Click the first match, wait, then run the fail-fast check.
pub fn click_and_settle(
    probe: &mut dyn DomProbe,
    selector: &str,
    ms: u64,
    control_point: &str,
) -> SweepResult<()> {
    probe.click(selector, 0)?;
    settle(probe, ms, control_point)
}

// ============================================================================
// Dialogs
// ============================================================================

/// Close open dialog overlays: dismiss button first, Escape otherwise.
///
/// Returns `true` when no overlay is left open.
pub fn close_open_dialogs(probe: &mut dyn DomProbe, waits: &Waits) -> SweepResult<bool> {
    for _attempt in 0..2 {
        if probe.count(OPEN_DIALOG)? == 0 {
            return Ok(true);
        }
        if probe.exists(DIALOG_DISMISS) {
            probe.click(DIALOG_DISMISS, 0)?;
        } else {
            probe.press_key("Escape")?;
        }
        probe.wait_ms(waits.action_ms)?;
    }
    Ok(probe.count(OPEN_DIALOG)? == 0)
}

/// Answer "yes" to a confirmation dialog if one is showing.
pub fn confirm_if_present(probe: &mut dyn DomProbe, waits: &Waits) -> SweepResult<bool> {
    if !probe.exists(CONFIRM_YES) {
        return Ok(false);
    }
    probe.click(CONFIRM_YES, 0)?;
    settle(probe, waits.action_ms, "Confirmation Dialog")?;
    Ok(true)
}

// ============================================================================
// Grid
// ============================================================================

pub fn grid_present(probe: &mut dyn DomProbe) -> bool {
    probe.exists(GRID)
}

/// Rendered cell count; grows and shrinks with the grid's row cardinality.
pub fn grid_row_count(probe: &mut dyn DomProbe) -> SweepResult<u32> {
    probe.count(GRID_CELL)
}

pub fn select_grid_row(probe: &mut dyn DomProbe, index: u32, waits: &Waits) -> SweepResult<()> {
    probe.click(GRID_CELL, index)?;
    settle(probe, waits.action_ms, "Grid Row Selection")
}

/// Index of the first cell whose trimmed text equals `text`.
pub fn find_grid_row(probe: &mut dyn DomProbe, text: &str) -> SweepResult<Option<u32>> {
    let cells = probe.texts(GRID_CELL)?;
    Ok(cells.iter().position(|c| c == text.trim()).map(|i| i as u32))
}

// ============================================================================
// Fields
// ============================================================================

/// Current value of a field container, `None` when blank.
pub fn read_field_value(probe: &mut dyn DomProbe, field_id: &str) -> SweepResult<Option<String>> {
    let value = probe.value(&by_id(field_id))?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

pub fn fill_field(
    probe: &mut dyn DomProbe,
    field_id: &str,
    value: &str,
    waits: &Waits,
) -> SweepResult<()> {
    probe.fill(&within(field_id, INNER_INPUT), value)?;
    probe.wait_ms(waits.action_ms.min(300))?;
    debug!(field = field_id, value, "filled field");
    Ok(())
}

/// Open the combo's overlay and list its option labels.
pub fn combo_options(
    probe: &mut dyn DomProbe,
    field_id: &str,
    waits: &Waits,
) -> SweepResult<Vec<String>> {
    probe.click(&by_id(field_id), 0)?;
    probe.wait_ms(waits.action_ms)?;
    probe.texts(COMBO_OPTION)
}

/// Select the first non-blank option. `None` if the combo offers nothing.
pub fn select_first_option(
    probe: &mut dyn DomProbe,
    field_id: &str,
    waits: &Waits,
) -> SweepResult<Option<String>> {
    let options = combo_options(probe, field_id, waits)?;
    let index = options.iter().position(|o| !o.is_empty());
    pick_option(probe, field_id, &options, index, waits)
}

/// Select any option whose label differs from `current`.
///
/// Falls back to the first option when every label equals `current`.
pub fn select_different_option(
    probe: &mut dyn DomProbe,
    field_id: &str,
    current: Option<&str>,
    waits: &Waits,
) -> SweepResult<Option<String>> {
    let current = current.map(str::trim).unwrap_or("");
    let options = combo_options(probe, field_id, waits)?;
    let index = options
        .iter()
        .position(|o| !o.is_empty() && o != current)
        .or_else(|| options.iter().position(|o| !o.is_empty()));
    pick_option(probe, field_id, &options, index, waits)
}

fn pick_option(
    probe: &mut dyn DomProbe,
    field_id: &str,
    options: &[String],
    index: Option<usize>,
    waits: &Waits,
) -> SweepResult<Option<String>> {
    match index {
        Some(i) => {
            probe.click(COMBO_OPTION, i as u32)?;
            probe.wait_ms(waits.action_ms)?;
            info!(field = field_id, option = %options[i], "selected combo option");
            Ok(Some(options[i].clone()))
        }
        None => {
            probe.press_key("Escape")?;
            Ok(None)
        }
    }
}
