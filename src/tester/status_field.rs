use tracing::info;

use crate::browser::controls::settle;
use crate::browser::probe::DomProbe;
use crate::browser::selectors::{COMBO_OPTION, STATUS_FIELD};
use crate::error::{SweepError, SweepResult};
use crate::tester::component_tester::{ComponentTester, PageScope, TesterKind};

/// Opens the status combo and checks it offers at least one status.
/// The selection is left unchanged.
pub struct StatusFieldTester;

impl ComponentTester for StatusFieldTester {
    fn kind(&self) -> TesterKind {
        TesterKind::StatusField
    }

    fn name(&self) -> &'static str {
        "Status Field Tester"
    }

    fn test(&self, probe: &mut dyn DomProbe, scope: &PageScope) -> SweepResult<()> {
        probe.click(STATUS_FIELD, 0)?;
        settle(probe, scope.waits.action_ms, "Status Field Open")?;
        let options = probe.texts(COMBO_OPTION)?;
        probe.press_key("Escape")?;

        info!(page = %scope.page_name, options = options.len(), "status options listed");
        if options.iter().all(|o| o.is_empty()) {
            return Err(SweepError::verification(
                "Status field",
                "status combo offers no options",
            ));
        }
        Ok(())
    }
}
