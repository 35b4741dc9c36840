use tracing::{info, warn};

use crate::browser::controls::{
    click_and_settle, combo_options, confirm_if_present, fill_field, find_grid_row, grid_present,
    grid_row_count, read_field_value, select_different_option, select_first_option,
    select_grid_row,
};
use crate::browser::probe::DomProbe;
use crate::browser::selectors::{
    by_id, COMBO_OPTION, CRUD_DELETE, CRUD_NEW, CRUD_REFRESH, CRUD_SAVE, STATUS_FIELD,
};
use crate::error::{recover, SweepError, SweepResult};
use crate::fields::field_model::{FieldDescriptor, FieldKind};
use crate::fields::introspector::{needs_forced_selection, primary_field, FieldIntrospector};
use crate::orchestrator::run_context::RunContext;
use crate::orchestrator::sweep_config::{Waits, WorkflowSettings};
use crate::workflow::relation::exercise_relation;
use crate::workflow::workflow_model::{StepStatus, WorkflowOutcome, WorkflowState, WorkflowStep};

/// Attempts at a status/approval selection before giving up.
const FORCED_SELECTION_ATTEMPTS: u32 = 2;

// ============================================================================
// Executor
// ============================================================================

/// Create, update, status change and guarded delete against the CRUD page
/// currently loaded.
pub struct CrudWorkflowExecutor<'a> {
    settings: &'a WorkflowSettings,
    waits: Waits,
    introspector: FieldIntrospector,
}

impl<'a> CrudWorkflowExecutor<'a> {
    pub fn new(settings: &'a WorkflowSettings, waits: Waits) -> Self {
        Self {
            settings,
            waits,
            introspector: FieldIntrospector::new(),
        }
    }

    /// Creation marker for a page: `<marker_prefix><page>`.
    pub fn marker_for(&self, page: &str) -> String {
        format!("{}{}", self.settings.marker_prefix, page)
    }

    /// Run every step. Step failures are recorded in the outcome; only a
    /// blocking error dialog or a lost driver ends the workflow early.
    pub fn run(
        &self,
        probe: &mut dyn DomProbe,
        ctx: &mut RunContext,
        page: &str,
    ) -> SweepResult<WorkflowOutcome> {
        let mut outcome = WorkflowOutcome::default();
        if grid_present(probe) {
            outcome.before_row_count = Some(grid_row_count(probe)?);
        }

        let result = self.create(probe, page, &mut outcome);
        record_step(&mut outcome, WorkflowStep::Create, result)?;
        if let Some(marker) = outcome.created_marker.as_deref() {
            ctx.record_marker(page, marker);
        }
        ctx.capture(probe, page, "create");

        if outcome.state != WorkflowState::Saved {
            for step in [WorkflowStep::Update, WorkflowStep::StatusChange, WorkflowStep::Delete] {
                outcome.record(step, StepStatus::Skipped("create did not save".to_string()));
            }
            return Ok(finish(outcome, page));
        }

        let result = self.update(probe, page, &mut outcome);
        record_step(&mut outcome, WorkflowStep::Update, result)?;
        if let Some(marker) = outcome.created_marker.as_deref() {
            ctx.record_marker(page, marker);
        }
        ctx.capture(probe, page, "update");

        let result = self.change_status(probe, &outcome);
        record_step(&mut outcome, WorkflowStep::StatusChange, result)?;
        ctx.capture(probe, page, "status");

        let result = self.delete(probe, &mut outcome);
        record_step(&mut outcome, WorkflowStep::Delete, result)?;
        if outcome.state == WorkflowState::Deleted {
            ctx.forget_marker(page);
        }
        ctx.capture(probe, page, "delete");

        Ok(finish(outcome, page))
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    pub fn create(
        &self,
        probe: &mut dyn DomProbe,
        page: &str,
        outcome: &mut WorkflowOutcome,
    ) -> SweepResult<StepStatus> {
        if !probe.is_enabled(CRUD_NEW) {
            return Err(SweepError::verification("Create", "New control missing or disabled"));
        }
        click_and_settle(probe, CRUD_NEW, self.waits.action_ms, "CRUD New")?;
        outcome.advance(WorkflowState::Created);

        let fields = self.introspector.introspect(probe)?;
        let primary = primary_field(&fields).map(|f| (f.id.clone(), f.kind));
        let primary_id = primary.as_ref().map(|(id, _)| id.clone());
        let marker = self.marker_for(page);
        let mut written_primary = None;
        let mut filled = 0;
        let mut warnings = Vec::new();

        for field in fields.iter().filter(|f| f.is_populatable()) {
            let is_primary = primary_id.as_deref() == Some(field.id.as_str());
            match self.populate(probe, field, is_primary, &marker) {
                Ok(Some(value)) => {
                    filled += 1;
                    if is_primary {
                        written_primary = Some(value);
                    }
                }
                Ok(None) => {}
                Err(e) if e.is_recoverable() => {
                    warn!(field = %field.id, error = %e, "field not populated");
                    warnings.push(format!("{}: {}", field.id, e));
                }
                Err(e) => return Err(e),
            }
        }
        info!(page, filled, primary = ?primary_id, "form populated");

        // Only text this run typed identifies its own row; a picked option
        // is shared with existing rows.
        let own_marker = match primary {
            Some((_, FieldKind::PlainText)) => written_primary.clone().filter(|v| *v == marker),
            _ => None,
        };
        if own_marker.is_none() {
            warnings.push("no primary text field written, delete will be skipped".to_string());
        }

        if !probe.exists(CRUD_SAVE) {
            return Err(SweepError::verification("Create", "Save control missing"));
        }
        click_and_settle(probe, CRUD_SAVE, self.waits.save_ms, "CRUD Save")?;

        let read_back = match primary_id.as_deref() {
            Some(id) => read_field_value(probe, id)?,
            None => None,
        };
        self.refresh(probe)?;
        outcome.advance(WorkflowState::Saved);
        outcome.created_marker = own_marker;

        if let Some(before) = outcome.before_row_count {
            let after = grid_row_count(probe)?;
            outcome.after_create_row_count = Some(after);
            if after <= before {
                warnings.push(format!("grid did not grow after create ({} -> {})", before, after));
            }
        }

        if let (Some(written), Some(read)) = (written_primary.as_deref(), read_back.as_deref()) {
            if written != read {
                return Err(SweepError::verification(
                    "Create",
                    format!("primary field reads '{}' after save, wrote '{}'", read, written),
                ));
            }
        } else if written_primary.is_some() {
            warnings.push("primary field blank after save".to_string());
        }

        Ok(status_from(warnings))
    }

    /// Fill one field by kind. Returns the value written, if any.
    fn populate(
        &self,
        probe: &mut dyn DomProbe,
        field: &FieldDescriptor,
        is_primary: bool,
        marker: &str,
    ) -> SweepResult<Option<String>> {
        match field.kind {
            FieldKind::System => Ok(None),
            FieldKind::PlainText => {
                if !is_primary && field.current_value.is_some() {
                    return Ok(None);
                }
                let value = if is_primary {
                    marker.to_string()
                } else {
                    format!("{}-{}", marker, field.name())
                };
                fill_field(probe, &field.id, &value, &self.waits)?;
                Ok(Some(value))
            }
            FieldKind::Combo if needs_forced_selection(field) => self.force_selection(probe, &field.id),
            FieldKind::Combo => select_first_option(probe, &field.id, &self.waits),
            FieldKind::RelationEditor => {
                exercise_relation(probe, &field.id, &self.waits)?;
                Ok(None)
            }
            FieldKind::EntityIdentifier => {
                if !field.required || field.current_value.is_some() {
                    return Ok(None);
                }
                self.fill_identifier(probe, &field.id, marker)
            }
        }
    }

    /// Select until the field reads back a value.
    fn force_selection(&self, probe: &mut dyn DomProbe, field_id: &str) -> SweepResult<Option<String>> {
        for attempt in 1..=FORCED_SELECTION_ATTEMPTS {
            let chosen = if attempt == 1 {
                select_first_option(probe, field_id, &self.waits)?
            } else {
                select_different_option(probe, field_id, None, &self.waits)?
            };
            if chosen.is_some() && read_field_value(probe, field_id)?.is_some() {
                return Ok(chosen);
            }
            warn!(field = field_id, attempt, "status selection did not stick, retrying");
        }
        Err(SweepError::verification(
            "Forced selection",
            format!("{} still blank after {} attempts", field_id, FORCED_SELECTION_ATTEMPTS),
        ))
    }

    /// Required identifier with no value: pick an option if it offers any,
    /// otherwise type the marker.
    fn fill_identifier(
        &self,
        probe: &mut dyn DomProbe,
        field_id: &str,
        marker: &str,
    ) -> SweepResult<Option<String>> {
        let options = combo_options(probe, field_id, &self.waits)?;
        if let Some(index) = options.iter().position(|o| !o.is_empty()) {
            probe.click(COMBO_OPTION, index as u32)?;
            probe.wait_ms(self.waits.action_ms)?;
            return Ok(Some(options[index].clone()));
        }
        probe.press_key("Escape")?;
        fill_field(probe, field_id, marker, &self.waits)?;
        Ok(Some(marker.to_string()))
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    pub fn update(
        &self,
        probe: &mut dyn DomProbe,
        page: &str,
        outcome: &mut WorkflowOutcome,
    ) -> SweepResult<StepStatus> {
        if !grid_present(probe) || grid_row_count(probe)? == 0 {
            return Ok(StepStatus::Skipped("no grid rows to select".to_string()));
        }
        let mut warnings = Vec::new();
        let marker_row = self.locate_marker_row(probe, outcome.created_marker.as_deref())?;
        let row = match marker_row {
            Some(row) => row,
            None => {
                warnings.push("created row not found, updating the first row".to_string());
                0
            }
        };
        select_grid_row(probe, row, &self.waits)?;

        let fields = self.introspector.introspect(probe)?;
        for field in fields.iter().filter(|f| f.kind == FieldKind::RelationEditor && f.editable) {
            recover(&format!("relation {}", field.id), exercise_relation(probe, &field.id, &self.waits))?;
        }

        let Some(primary) = primary_field(&fields) else {
            return Ok(StepStatus::Skipped("no editable primary field".to_string()));
        };
        let primary_id = primary.id.clone();
        let primary_kind = primary.kind;
        let before = read_field_value(probe, &primary_id)?;

        let written = match primary_kind {
            FieldKind::Combo => select_different_option(probe, &primary_id, before.as_deref(), &self.waits)?,
            _ => {
                let value = format!(
                    "{}{}",
                    self.settings.update_prefix,
                    before.as_deref().unwrap_or(page)
                );
                fill_field(probe, &primary_id, &value, &self.waits)?;
                Some(value)
            }
        };
        outcome.advance(WorkflowState::Updated);

        click_and_settle(probe, CRUD_SAVE, self.waits.save_ms, "CRUD Save (update)")?;
        self.refresh(probe)?;
        outcome.advance(WorkflowState::Saved);

        // Read back from the stored row, not the form that was just edited
        let stored_row = match (primary_kind, written.as_deref()) {
            (FieldKind::PlainText, Some(value)) => find_grid_row(probe, value)?.unwrap_or(row),
            _ => row,
        };
        select_grid_row(probe, stored_row, &self.waits)?;
        let after = read_field_value(probe, &primary_id)?;

        // The marker follows only the row this run created
        if marker_row.is_some() && primary_kind == FieldKind::PlainText && after.is_some() {
            outcome.created_marker = after.clone();
        }

        info!(page, field = %primary_id, before = ?before, after = ?after, "primary field updated");
        if after == before {
            warnings.push(format!("{} unchanged after update", primary_id));
        }
        Ok(status_from(warnings))
    }

    // ------------------------------------------------------------------
    // Status change
    // ------------------------------------------------------------------

    pub fn change_status(&self, probe: &mut dyn DomProbe, outcome: &WorkflowOutcome) -> SweepResult<StepStatus> {
        if !probe.exists(CRUD_SAVE) {
            return Ok(StepStatus::Skipped("no save control".to_string()));
        }
        let Some(status_id) = probe.attribute(STATUS_FIELD, 0, "id")? else {
            return Ok(StepStatus::Skipped("no status field".to_string()));
        };
        let marker_row = self.locate_marker_row(probe, outcome.created_marker.as_deref())?;
        if let Some(row) = marker_row {
            select_grid_row(probe, row, &self.waits)?;
        }
        if !probe.is_enabled(&by_id(&status_id)) {
            return Ok(StepStatus::Skipped(format!("{} is disabled", status_id)));
        }

        let before = read_field_value(probe, &status_id)?;
        if select_different_option(probe, &status_id, before.as_deref(), &self.waits)?.is_none() {
            return Ok(StepStatus::Skipped(format!("{} offers no options", status_id)));
        }
        click_and_settle(probe, CRUD_SAVE, self.waits.save_ms, "Status Save")?;
        self.refresh(probe)?;
        if let Some(row) = self.locate_marker_row(probe, outcome.created_marker.as_deref())?.or(marker_row) {
            select_grid_row(probe, row, &self.waits)?;
        }
        let after = read_field_value(probe, &status_id)?;

        info!(field = %status_id, before = ?before, after = ?after, "status transition");
        if after == before {
            return Err(SweepError::verification(
                "Status change",
                format!("{} still reads {:?}", status_id, before),
            ));
        }
        Ok(StepStatus::Passed)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete the row this run created, and nothing else.
    ///
    /// Skipped unless the marker is found both in the grid and in the
    /// primary field of the selected row's form.
    pub fn delete(&self, probe: &mut dyn DomProbe, outcome: &mut WorkflowOutcome) -> SweepResult<StepStatus> {
        let Some(marker) = outcome.created_marker.clone() else {
            return Ok(StepStatus::Skipped("no creation marker".to_string()));
        };
        if !grid_present(probe) {
            return Ok(StepStatus::Skipped("no grid".to_string()));
        }
        let Some(row) = find_grid_row(probe, &marker)? else {
            warn!(marker = %marker, "created row not in grid, delete skipped");
            return Ok(StepStatus::Skipped(format!("'{}' not found in grid", marker)));
        };
        select_grid_row(probe, row, &self.waits)?;

        let fields = self.introspector.introspect(probe)?;
        let shown = primary_field(&fields).and_then(|f| f.current_value.as_deref());
        if shown != Some(marker.as_str()) {
            warn!(marker = %marker, shown = ?shown, "primary field does not show marker, delete skipped");
            return Ok(StepStatus::Skipped(format!("'{}' not shown in form", marker)));
        }
        if !probe.is_enabled(CRUD_DELETE) {
            return Err(SweepError::verification("Delete", "Delete control missing or disabled"));
        }

        let before = grid_row_count(probe)?;
        click_and_settle(probe, CRUD_DELETE, self.waits.action_ms, "CRUD Delete")?;
        confirm_if_present(probe, &self.waits)?;
        probe.wait_ms(self.waits.save_ms)?;
        self.refresh(probe)?;

        let after = grid_row_count(probe)?;
        outcome.after_row_count = Some(after);
        info!(marker = %marker, before, after, "delete completed");
        if after >= before {
            return Err(SweepError::verification(
                "Delete",
                format!("grid did not shrink ({} -> {})", before, after),
            ));
        }
        outcome.advance(WorkflowState::Deleted);
        Ok(StepStatus::Passed)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn refresh(&self, probe: &mut dyn DomProbe) -> SweepResult<()> {
        if probe.exists(CRUD_REFRESH) {
            click_and_settle(probe, CRUD_REFRESH, self.waits.action_ms, "CRUD Refresh")?;
        }
        Ok(())
    }

    fn locate_marker_row(&self, probe: &mut dyn DomProbe, marker: Option<&str>) -> SweepResult<Option<u32>> {
        match marker {
            Some(m) => find_grid_row(probe, m),
            None => Ok(None),
        }
    }
}

/// Record a step result; recoverable errors become `Failed`.
fn record_step(
    outcome: &mut WorkflowOutcome,
    step: WorkflowStep,
    result: SweepResult<StepStatus>,
) -> SweepResult<()> {
    let status = match result {
        Ok(status) => status,
        Err(e) if e.is_recoverable() => {
            warn!(step = ?step, error = %e, "workflow step failed");
            StepStatus::Failed(e.to_string())
        }
        Err(e) => return Err(e),
    };
    if let StepStatus::Warned(msg) = &status {
        warn!(step = ?step, "{}", msg);
    }
    outcome.record(step, status);
    Ok(())
}

fn status_from(warnings: Vec<String>) -> StepStatus {
    if warnings.is_empty() {
        StepStatus::Passed
    } else {
        StepStatus::Warned(warnings.join("; "))
    }
}

fn finish(mut outcome: WorkflowOutcome, page: &str) -> WorkflowOutcome {
    outcome.succeeded = outcome.failures().is_empty()
        && outcome.history.contains(&WorkflowState::Saved);
    info!(
        page,
        succeeded = outcome.succeeded,
        state = ?outcome.state,
        marker = ?outcome.created_marker,
        "CRUD workflow finished"
    );
    outcome
}
