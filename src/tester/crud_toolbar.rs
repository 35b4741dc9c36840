use serde::Serialize;
use tracing::{info, warn};

use crate::browser::controls::click_and_settle;
use crate::browser::probe::DomProbe;
use crate::browser::selectors::{
    CRUD_CANCEL, CRUD_DELETE, CRUD_NEW, CRUD_REFRESH, CRUD_SAVE, GRID_SELECTED_CELL,
};
use crate::error::{SweepError, SweepResult};
use crate::tester::component_tester::{ComponentTester, PageScope, TesterKind};

/// Presence and enablement of one toolbar control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub present: bool,
    pub enabled: bool,
}

/// Snapshot of the CRUD toolbar and the grid selection it depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ToolbarState {
    pub new: ControlState,
    pub save: ControlState,
    pub delete: ControlState,
    pub refresh: ControlState,
    pub cancel: ControlState,
    pub row_selected: bool,
}

impl ToolbarState {
    pub fn read(probe: &mut dyn DomProbe) -> Self {
        let mut control = |selector: &str| ControlState {
            present: probe.exists(selector),
            enabled: probe.is_enabled(selector),
        };
        let new = control(CRUD_NEW);
        let save = control(CRUD_SAVE);
        let delete = control(CRUD_DELETE);
        let refresh = control(CRUD_REFRESH);
        let cancel = control(CRUD_CANCEL);
        Self {
            new,
            save,
            delete,
            refresh,
            cancel,
            row_selected: probe.exists(GRID_SELECTED_CELL),
        }
    }

    /// Hard expectations for the current selection state.
    ///
    /// Creating and refreshing must always be possible when offered;
    /// deleting must be possible once a row is selected.
    pub fn violations(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.new.present && !self.new.enabled {
            out.push("New is present but disabled".to_string());
        }
        if self.refresh.present && !self.refresh.enabled {
            out.push("Refresh is present but disabled".to_string());
        }
        if self.row_selected && self.delete.present && !self.delete.enabled {
            out.push("Delete is disabled although a row is selected".to_string());
        }
        out
    }

    /// Soft expectations, reported as warnings.
    pub fn oddities(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.row_selected && self.delete.enabled {
            out.push("Delete is enabled with no row selected".to_string());
        }
        if !self.new.present && !self.save.present {
            out.push("Neither New nor Save is offered".to_string());
        }
        out
    }
}

/// Checks each CRUD control is present and enabled as the selection state
/// requires, then exercises Refresh.
pub struct CrudToolbarTester;

impl ComponentTester for CrudToolbarTester {
    fn kind(&self) -> TesterKind {
        TesterKind::CrudToolbar
    }

    fn name(&self) -> &'static str {
        "CRUD Toolbar Tester"
    }

    fn test(&self, probe: &mut dyn DomProbe, scope: &PageScope) -> SweepResult<()> {
        let state = ToolbarState::read(probe);
        info!(
            page = %scope.page_name,
            new = state.new.present,
            save = state.save.present,
            delete = state.delete.present,
            refresh = state.refresh.present,
            cancel = state.cancel.present,
            row_selected = state.row_selected,
            "CRUD toolbar state"
        );

        for oddity in state.oddities() {
            warn!(page = %scope.page_name, "{}", oddity);
        }

        if state.refresh.enabled {
            click_and_settle(probe, CRUD_REFRESH, scope.waits.action_ms, "CRUD Refresh")?;
        }

        let violations = state.violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SweepError::verification("CRUD toolbar", violations.join("; ")))
        }
    }
}
