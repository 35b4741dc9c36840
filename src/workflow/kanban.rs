use serde::Serialize;
use tracing::{info, warn};

use crate::browser::controls::settle;
use crate::browser::probe::DomProbe;
use crate::browser::selectors::{
    by_id, within, KANBAN_BACKLOG_ATTR, KANBAN_BOARD, KANBAN_CARD, KANBAN_COLUMN, NUMBER_INPUT,
};
use crate::error::{recover, SweepError, SweepResult};
use crate::orchestrator::sweep_config::Waits;

/// Which best-effort kanban exercises went through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KanbanReport {
    pub numeric_edit: bool,
    pub moved_between_columns: bool,
    pub backlog_round_trip: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KanbanColumn {
    pub id: String,
    pub backlog: bool,
}

pub fn kanban_present(probe: &mut dyn DomProbe) -> bool {
    probe.exists(KANBAN_BOARD)
}

/// Columns in board order.
pub fn read_columns(probe: &mut dyn DomProbe) -> SweepResult<Vec<KanbanColumn>> {
    let count = probe.count(KANBAN_COLUMN)?;
    let mut columns = Vec::with_capacity(count as usize);
    for i in 0..count {
        let Some(id) = probe.attribute(KANBAN_COLUMN, i, "id")? else {
            continue;
        };
        let backlog = probe.has_attribute(KANBAN_COLUMN, i, KANBAN_BACKLOG_ATTR);
        columns.push(KanbanColumn { id, backlog });
    }
    Ok(columns)
}

/// Card edit, column move and backlog round trip. Each step is logged on
/// failure and never stops the others; only a blocking error dialog or a
/// lost driver propagates.
pub fn exercise_kanban(probe: &mut dyn DomProbe, waits: &Waits, page: &str) -> SweepResult<KanbanReport> {
    let mut report = KanbanReport::default();

    report.numeric_edit = recover("kanban numeric edit", edit_numeric(probe, waits))?.unwrap_or(false);

    let columns = recover("kanban columns", read_columns(probe))?.unwrap_or_default();
    let lanes: Vec<&KanbanColumn> = columns.iter().filter(|c| !c.backlog).collect();
    let backlog = columns.iter().find(|c| c.backlog);

    if lanes.len() >= 2 {
        report.moved_between_columns =
            recover("kanban column move", move_between(probe, &lanes[0].id, &lanes[1].id, waits))?
                .unwrap_or(false);
    } else {
        warn!(page, lanes = lanes.len(), "fewer than two kanban lanes, move skipped");
    }

    match (backlog, lanes.first()) {
        (Some(backlog), Some(lane)) => {
            report.backlog_round_trip =
                recover("kanban backlog", backlog_round_trip(probe, &backlog.id, &lane.id, waits))?
                    .unwrap_or(false);
        }
        _ => warn!(page, "no backlog column, backlog move skipped"),
    }

    info!(
        page,
        numeric_edit = report.numeric_edit,
        moved = report.moved_between_columns,
        backlog = report.backlog_round_trip,
        "kanban exercised"
    );
    Ok(report)
}

/// Increment the first numeric input found on a card.
fn edit_numeric(probe: &mut dyn DomProbe, waits: &Waits) -> SweepResult<bool> {
    let selector = format!("{} {}", KANBAN_CARD, NUMBER_INPUT);
    if !probe.exists(&selector) {
        return Ok(false);
    }
    let current = probe
        .value(&selector)?
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(0.0);
    let next = format!("{}", current + 1.0);
    probe.fill(&selector, &next)?;
    probe.press_key("Enter")?;
    settle(probe, waits.action_ms, "Kanban Numeric Edit")?;
    Ok(true)
}

fn cards_in(column_id: &str) -> String {
    within(column_id, KANBAN_CARD)
}

/// Drag a card from `from` to `to` and check both counts moved by one.
fn drag_card(probe: &mut dyn DomProbe, from: &str, to: &str, waits: &Waits) -> SweepResult<bool> {
    let from_before = probe.count(&cards_in(from))?;
    if from_before == 0 {
        return Ok(false);
    }
    let to_before = probe.count(&cards_in(to))?;

    probe.drag(&cards_in(from), &by_id(to))?;
    settle(probe, waits.action_ms, "Kanban Drag")?;

    let from_after = probe.count(&cards_in(from))?;
    let to_after = probe.count(&cards_in(to))?;
    if from_after + 1 != from_before || to_after != to_before + 1 {
        return Err(SweepError::verification(
            "Kanban drag",
            format!(
                "{} -> {}: source {} -> {}, target {} -> {}",
                from, to, from_before, from_after, to_before, to_after
            ),
        ));
    }
    Ok(true)
}

/// Move one card between two lanes, in whichever direction has a card.
fn move_between(probe: &mut dyn DomProbe, a: &str, b: &str, waits: &Waits) -> SweepResult<bool> {
    if drag_card(probe, a, b, waits)? {
        return Ok(true);
    }
    drag_card(probe, b, a, waits)
}

/// Move a card into the backlog and back out again.
fn backlog_round_trip(probe: &mut dyn DomProbe, backlog: &str, lane: &str, waits: &Waits) -> SweepResult<bool> {
    if drag_card(probe, lane, backlog, waits)? {
        return drag_card(probe, backlog, lane, waits);
    }
    if drag_card(probe, backlog, lane, waits)? {
        return drag_card(probe, lane, backlog, waits);
    }
    Ok(false)
}
