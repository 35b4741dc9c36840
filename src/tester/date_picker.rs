use tracing::info;

use crate::browser::controls::settle;
use crate::browser::probe::DomProbe;
use crate::browser::selectors::{DATE_PICKER, DATE_PICKER_OVERLAY};
use crate::error::{SweepError, SweepResult};
use crate::tester::component_tester::{ComponentTester, PageScope, TesterKind};

pub struct DatePickerTester;

impl ComponentTester for DatePickerTester {
    fn kind(&self) -> TesterKind {
        TesterKind::DatePicker
    }

    fn name(&self) -> &'static str {
        "Date Picker Tester"
    }

    fn test(&self, probe: &mut dyn DomProbe, scope: &PageScope) -> SweepResult<()> {
        let pickers = probe.count(DATE_PICKER)?;
        probe.click(DATE_PICKER, 0)?;
        settle(probe, scope.waits.action_ms, "Date Picker Open")?;

        let opened = probe.wait_for(DATE_PICKER_OVERLAY, scope.waits.selector_timeout_ms)?;
        probe.press_key("Escape")?;

        info!(page = %scope.page_name, pickers, opened, "date picker exercised");
        if !opened {
            return Err(SweepError::verification(
                "Date picker",
                "calendar overlay did not open",
            ));
        }
        Ok(())
    }
}
