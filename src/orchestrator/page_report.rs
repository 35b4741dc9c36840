use serde::Serialize;

use crate::error::{SweepError, SweepResult};
use crate::navigation::discoverer::NavigationTarget;
use crate::orchestrator::run_context::Counters;
use crate::tester::component_tester::TesterKind;
use crate::workflow::kanban::KanbanReport;
use crate::workflow::workflow_model::WorkflowOutcome;

// ============================================================================
// Per-page result
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageVerdict {
    /// Every tester and workflow step passed
    Passed,
    /// Tested to the end, with recoverable failures
    Degraded,
    /// Stopped early by a blocking error dialog or a failed navigation
    Fatal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub target: NavigationTarget,
    pub verdict: PageVerdict,
    /// Signature names detected across all tabs, in first-seen order
    pub signatures: Vec<String>,
    pub testers_run: Vec<TesterKind>,
    pub tabs_visited: u32,
    pub has_grid: bool,
    pub has_crud_toolbar: bool,
    pub has_kanban: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow: Option<WorkflowOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kanban: Option<KanbanReport>,
    pub failures: Vec<String>,
    pub screenshots: Vec<String>,
}

impl PageReport {
    pub fn new(target: &NavigationTarget) -> Self {
        Self {
            target: target.clone(),
            verdict: PageVerdict::Passed,
            signatures: Vec::new(),
            testers_run: Vec::new(),
            tabs_visited: 0,
            has_grid: false,
            has_crud_toolbar: false,
            has_kanban: false,
            workflow: None,
            kanban: None,
            failures: Vec::new(),
            screenshots: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.target.display_name()
    }

    /// Note a recoverable failure; the page continues.
    pub fn degrade(&mut self, message: impl Into<String>) {
        self.failures.push(message.into());
        if self.verdict == PageVerdict::Passed {
            self.verdict = PageVerdict::Degraded;
        }
    }

    pub fn fail(&mut self, error: &SweepError) {
        self.failures.push(error.to_string());
        self.verdict = PageVerdict::Fatal;
    }
}

// ============================================================================
// Run summary
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub counters: Counters,
    pub passed: usize,
    pub degraded: usize,
    pub fatal: usize,
    pub screenshots: usize,
    /// Set when a run-fatal error ended the sweep
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    pub pages: Vec<PageReport>,
}

impl RunSummary {
    pub fn from_pages(counters: Counters, pages: Vec<PageReport>, screenshots: usize) -> Self {
        let count = |v: PageVerdict| pages.iter().filter(|p| p.verdict == v).count();
        Self {
            counters,
            passed: count(PageVerdict::Passed),
            degraded: count(PageVerdict::Degraded),
            fatal: count(PageVerdict::Fatal),
            screenshots,
            aborted: None,
            duration_ms: None,
            pages,
        }
    }

    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn aborted_by(mut self, error: &SweepError) -> Self {
        self.aborted = Some(error.to_string());
        self
    }

    /// Not aborted, and every tested page passed.
    pub fn all_passed(&self) -> bool {
        self.aborted.is_none() && self.degraded == 0 && self.fatal == 0
    }

    pub fn to_json(&self) -> SweepResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SweepError::JsonSerialize {
            context: "run summary".to_string(),
            source: e,
        })
    }
}

// ============================================================================
// Console rendering
// ============================================================================

/// Format the summary for the terminal.
///
/// ```text
/// === Page Sweep ===
///
/// ✓ PASS      Activities (grid, crud; 4 testers)
/// ~ DEGRADED  Projects (grid; 2 testers)
///     [FAIL] Grid filter check failed: ...
/// ✗ FATAL     Users
///     [FAIL] Blocking error dialog after CRUD Save: ...
///
/// Pages: 3 visited, 3 tested, 2 with grid, 1 with CRUD toolbar, 0 with kanban
/// Testers executed: 6, screenshots: 9
/// === Results: 1 passed, 1 degraded, 1 fatal (3 total) ===
/// ```
pub fn format_console_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str("=== Page Sweep ===\n\n");

    for page in &summary.pages {
        let marker = match page.verdict {
            PageVerdict::Passed => "\u{2713} PASS    ",
            PageVerdict::Degraded => "~ DEGRADED",
            PageVerdict::Fatal => "\u{2717} FATAL   ",
        };
        let mut traits = Vec::new();
        if page.has_grid {
            traits.push("grid");
        }
        if page.has_crud_toolbar {
            traits.push("crud");
        }
        if page.has_kanban {
            traits.push("kanban");
        }
        let detail = if traits.is_empty() {
            format!("{} testers", page.testers_run.len())
        } else {
            format!("{}; {} testers", traits.join(", "), page.testers_run.len())
        };
        out.push_str(&format!("{}  {} ({})\n", marker, page.name(), detail));
        for failure in &page.failures {
            out.push_str(&format!("    [FAIL] {}\n", failure));
        }
    }

    let c = &summary.counters;
    out.push_str(&format!(
        "\nPages: {} visited, {} tested, {} with grid, {} with CRUD toolbar, {} with kanban\n",
        c.pages_visited, c.pages_tested, c.pages_with_grid, c.pages_with_crud, c.pages_with_kanban
    ));
    out.push_str(&format!(
        "Testers executed: {}, screenshots: {}\n",
        c.testers_executed, summary.screenshots
    ));
    if let Some(reason) = &summary.aborted {
        out.push_str(&format!("[ABORTED] {}\n", reason));
    }

    out.push_str(&format!(
        "=== Results: {} passed, {} degraded, {} fatal ({} total)",
        summary.passed,
        summary.degraded,
        summary.fatal,
        summary.pages.len()
    ));
    if let Some(ms) = summary.duration_ms {
        out.push_str(&format!(" in {:.1}s", ms as f64 / 1000.0));
    }
    out.push_str(" ===\n");
    out
}
