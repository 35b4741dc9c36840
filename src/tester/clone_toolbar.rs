use tracing::{info, warn};

use crate::browser::controls::{click_and_settle, close_open_dialogs};
use crate::browser::probe::DomProbe;
use crate::browser::selectors::{CLONE_BUTTON, OPEN_DIALOG};
use crate::error::{SweepError, SweepResult};
use crate::tester::component_tester::{ComponentTester, PageScope, TesterKind};

/// Opens the clone/copy-to dialog and closes it without cloning anything.
pub struct CloneToolbarTester;

impl ComponentTester for CloneToolbarTester {
    fn kind(&self) -> TesterKind {
        TesterKind::CloneToolbar
    }

    fn name(&self) -> &'static str {
        "Clone Toolbar Tester"
    }

    fn test(&self, probe: &mut dyn DomProbe, scope: &PageScope) -> SweepResult<()> {
        if !probe.is_enabled(CLONE_BUTTON) {
            // Usually disabled until a row is selected
            warn!(page = %scope.page_name, "clone control disabled, not opened");
            return Ok(());
        }

        click_and_settle(probe, CLONE_BUTTON, scope.waits.action_ms, "Clone Open")?;
        if !probe.wait_for(OPEN_DIALOG, scope.waits.selector_timeout_ms)? {
            return Err(SweepError::verification("Clone", "clone dialog did not open"));
        }

        if !close_open_dialogs(probe, &scope.waits)? {
            return Err(SweepError::verification("Clone", "clone dialog did not close"));
        }
        info!(page = %scope.page_name, "clone dialog opened and closed");
        Ok(())
    }
}
