use serde::Serialize;

use crate::browser::probe::DomProbe;
use crate::error::SweepResult;
use crate::orchestrator::sweep_config::Waits;
use crate::tester::clone_toolbar::CloneToolbarTester;
use crate::tester::crud_toolbar::CrudToolbarTester;
use crate::tester::date_picker::DatePickerTester;
use crate::tester::grid::GridTester;
use crate::tester::panel::{PanelKind, PanelTester};
use crate::tester::status_field::StatusFieldTester;

// ============================================================================
// ComponentTester trait
// ============================================================================

/// Control families with a dedicated tester. Signatures refer to testers by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TesterKind {
    CrudToolbar,
    Grid,
    Attachment,
    Comment,
    StatusField,
    DatePicker,
    CloneToolbar,
}

impl TesterKind {
    pub const ALL: [TesterKind; 7] = [
        TesterKind::CrudToolbar,
        TesterKind::Grid,
        TesterKind::Attachment,
        TesterKind::Comment,
        TesterKind::StatusField,
        TesterKind::DatePicker,
        TesterKind::CloneToolbar,
    ];
}

/// The page a tester is looking at.
#[derive(Debug, Clone)]
pub struct PageScope {
    pub page_name: String,
    pub waits: Waits,
}

impl PageScope {
    pub fn new(page_name: &str, waits: Waits) -> Self {
        Self {
            page_name: page_name.to_string(),
            waits,
        }
    }
}

/// Exercises one control family on the current page.
///
/// Implementations either only read the page or undo what they did, so a
/// page can be tested repeatedly. Recoverable errors are reported to the
/// dispatcher; a blocking error dialog is returned as `BlockingErrorDialog`.
pub trait ComponentTester {
    fn kind(&self) -> TesterKind;

    fn name(&self) -> &'static str;

    fn test(&self, probe: &mut dyn DomProbe, scope: &PageScope) -> SweepResult<()>;
}

// ============================================================================
// Registry
// ============================================================================

/// One tester per kind.
pub struct TesterRegistry {
    testers: Vec<Box<dyn ComponentTester>>,
}

impl TesterRegistry {
    pub fn empty() -> Self {
        Self { testers: Vec::new() }
    }

    /// All seven built-in testers.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(CrudToolbarTester));
        registry.register(Box::new(GridTester));
        registry.register(Box::new(PanelTester::new(PanelKind::Attachment)));
        registry.register(Box::new(PanelTester::new(PanelKind::Comment)));
        registry.register(Box::new(StatusFieldTester));
        registry.register(Box::new(DatePickerTester));
        registry.register(Box::new(CloneToolbarTester));
        registry
    }

    /// Add a tester, replacing any existing one of the same kind.
    pub fn register(&mut self, tester: Box<dyn ComponentTester>) {
        self.testers.retain(|t| t.kind() != tester.kind());
        self.testers.push(tester);
    }

    pub fn get(&self, kind: TesterKind) -> Option<&dyn ComponentTester> {
        self.testers
            .iter()
            .find(|t| t.kind() == kind)
            .map(|t| &**t)
    }

    pub fn len(&self) -> usize {
        self.testers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.testers.is_empty()
    }
}

impl Default for TesterRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
