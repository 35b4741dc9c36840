use tracing::{info, warn};

use crate::browser::controls::{grid_row_count, settle};
use crate::browser::probe::DomProbe;
use crate::browser::selectors::{GRID_CELL, GRID_FILTER, GRID_SORTER};
use crate::error::{SweepError, SweepResult};
use crate::tester::component_tester::{ComponentTester, PageScope, TesterKind};

/// Grid renders cells, sorts when sorters exist, and a filter field
/// narrows the visible cells and can be cleared back.
pub struct GridTester;

impl GridTester {
    fn test_sorting(&self, probe: &mut dyn DomProbe, scope: &PageScope) -> SweepResult<()> {
        if !probe.exists(GRID_SORTER) {
            info!(page = %scope.page_name, "grid has no sorters");
            return Ok(());
        }
        probe.click(GRID_SORTER, 0)?;
        settle(probe, scope.waits.action_ms, "Grid Sort Ascending")?;
        probe.click(GRID_SORTER, 0)?;
        settle(probe, scope.waits.action_ms, "Grid Sort Descending")?;
        info!(page = %scope.page_name, "grid sorted both directions");
        Ok(())
    }

    fn test_filter(&self, probe: &mut dyn DomProbe, scope: &PageScope, before: u32) -> SweepResult<()> {
        if !probe.exists(GRID_FILTER) {
            return Ok(());
        }
        let Some(needle) = probe
            .text(GRID_CELL, 0)?
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
        else {
            warn!(page = %scope.page_name, "first grid cell is blank, filter not exercised");
            return Ok(());
        };

        probe.fill(GRID_FILTER, &needle)?;
        settle(probe, scope.waits.action_ms, "Grid Filter")?;
        let filtered = grid_row_count(probe)?;

        probe.fill(GRID_FILTER, "")?;
        settle(probe, scope.waits.action_ms, "Grid Filter Clear")?;
        let restored = grid_row_count(probe)?;

        info!(page = %scope.page_name, before, filtered, restored, "grid filter exercised");

        if filtered == 0 || filtered > before {
            return Err(SweepError::verification(
                "Grid filter",
                format!("filtering by '{}' showed {} of {} cells", needle, filtered, before),
            ));
        }
        if restored != before {
            return Err(SweepError::verification(
                "Grid filter clear",
                format!("clearing the filter showed {} cells, expected {}", restored, before),
            ));
        }
        Ok(())
    }
}

impl ComponentTester for GridTester {
    fn kind(&self) -> TesterKind {
        TesterKind::Grid
    }

    fn name(&self) -> &'static str {
        "Grid Tester"
    }

    fn test(&self, probe: &mut dyn DomProbe, scope: &PageScope) -> SweepResult<()> {
        let cells = grid_row_count(probe)?;
        info!(page = %scope.page_name, cells, "grid rendered");

        self.test_sorting(probe, scope)?;

        if cells == 0 {
            warn!(page = %scope.page_name, "grid is empty, filter not exercised");
            return Ok(());
        }
        // Sorting may reorder but never changes cardinality
        let before = grid_row_count(probe)?;
        self.test_filter(probe, scope, before)
    }
}
