use std::collections::BTreeSet;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::browser::controls::{close_open_dialogs, grid_present, settle};
use crate::browser::probe::DomProbe;
use crate::browser::selectors::{CRUD_TOOLBAR_PROBE, NAV_BUTTON, TAB};
use crate::error::{recover, Severity, SweepError, SweepResult};
use crate::navigation::discoverer::{NavigationDiscoverer, NavigationFilter, NavigationTarget};
use crate::orchestrator::page_report::{PageReport, PageVerdict, RunSummary};
use crate::orchestrator::run_context::RunContext;
use crate::orchestrator::sweep_config::{LoginConfig, SweepConfig};
use crate::signature::catalog::{SignatureCatalog, SignatureFilter};
use crate::signature::detector::detect;
use crate::signature::dispatch::DispatchTable;
use crate::tester::component_tester::{PageScope, TesterKind, TesterRegistry};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{SweepEvent, SweepPhase};
use crate::workflow::executor::CrudWorkflowExecutor;
use crate::workflow::kanban::{exercise_kanban, kanban_present};

/// CRUD toolbar controls that must be present to run the CRUD workflow.
const CRUD_TOOLBAR_MIN_CONTROLS: usize = 2;

// ============================================================================
// Orchestrator
// ============================================================================

/// Drives a whole sweep: login, discovery, then every selected page.
pub struct PageTestOrchestrator<'a> {
    config: &'a SweepConfig,
    filter: NavigationFilter,
    catalog: SignatureCatalog,
    registry: TesterRegistry,
    tracer: TraceLogger,
}

impl<'a> PageTestOrchestrator<'a> {
    /// Standard catalog (narrowed by the configured signature filter),
    /// standard testers, and a trace file at `config.trace_path`.
    pub fn new(config: &'a SweepConfig, filter: NavigationFilter) -> Self {
        let signature_filter = SignatureFilter::from_settings(&config.signatures);
        Self {
            config,
            filter,
            catalog: SignatureCatalog::standard().filtered(&signature_filter),
            registry: TesterRegistry::standard(),
            tracer: TraceLogger::new(&config.trace_path),
        }
    }

    pub fn with_catalog(mut self, catalog: SignatureCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_registry(mut self, registry: TesterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn catalog(&self) -> &SignatureCatalog {
        &self.catalog
    }

    /// Run the sweep. Never fails: a run-fatal error is reported in
    /// `RunSummary::aborted` next to whatever pages were tested before it.
    pub fn run(&self, probe: &mut dyn DomProbe) -> RunSummary {
        let started = Instant::now();
        let mut ctx = RunContext::new(&self.config.screenshot_dir);
        let mut pages = Vec::new();

        let result = self.sweep(probe, &mut ctx, &mut pages);

        let mut summary = RunSummary::from_pages(ctx.counters, pages, ctx.screenshots().len())
            .with_duration(started.elapsed().as_millis());
        if let Err(e) = result {
            error!(error = %e, "sweep aborted");
            summary = summary.aborted_by(&e);
        }

        let c = &summary.counters;
        info!(
            pages_visited = c.pages_visited,
            pages_tested = c.pages_tested,
            pages_with_grid = c.pages_with_grid,
            pages_with_crud = c.pages_with_crud,
            testers_executed = c.testers_executed,
            "sweep complete"
        );
        self.tracer.record(
            &SweepEvent::now(SweepPhase::RunSummary)
                .with_count("pages_visited", c.pages_visited.into())
                .with_count("pages_tested", c.pages_tested.into())
                .with_count("pages_with_grid", c.pages_with_grid.into())
                .with_count("pages_with_crud", c.pages_with_crud.into())
                .with_count("pages_with_kanban", c.pages_with_kanban.into())
                .with_count("testers_executed", c.testers_executed.into())
                .with_outcome(if summary.all_passed() { "passed" } else { "failed" }),
        );
        self.tracer.flush();
        summary
    }

    fn sweep(
        &self,
        probe: &mut dyn DomProbe,
        ctx: &mut RunContext,
        pages: &mut Vec<PageReport>,
    ) -> SweepResult<()> {
        if let Some(login) = &self.config.login {
            self.login(probe, login)?;
        }

        let targets = self.discover_targets(probe)?;
        ctx.counters.targets_selected = targets.len() as u32;

        for (i, target) in targets.iter().enumerate() {
            info!(
                page = target.display_name(),
                route = %target.route,
                "testing page {}/{}",
                i + 1,
                targets.len()
            );
            pages.push(self.test_page(probe, ctx, target)?);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Login and discovery
    // ------------------------------------------------------------------

    pub fn login(&self, probe: &mut dyn DomProbe, login: &LoginConfig) -> SweepResult<()> {
        let waits = &self.config.waits;
        probe.navigate(&self.config.url_for(&login.route))?;
        probe.wait_ms(waits.navigation_ms)?;

        if !probe.wait_for(&login.username_selector, waits.selector_timeout_ms)? {
            return Err(SweepError::ElementNotFound {
                selector: login.username_selector.clone(),
                context: "login form".to_string(),
            });
        }
        probe.fill(&login.username_selector, &login.username)?;
        probe.fill(&login.password_selector, &login.password)?;
        probe.click(&login.submit_selector, 0)?;
        settle(probe, waits.navigation_ms, "Login")?;

        info!(user = %login.username, "logged in");
        Ok(())
    }

    /// Load the navigation surface and return the targets selected by the filter.
    pub fn discover_targets(&self, probe: &mut dyn DomProbe) -> SweepResult<Vec<NavigationTarget>> {
        let waits = &self.config.waits;
        let surface = &self.config.navigation_route;
        probe.navigate(&self.config.url_for(surface))?;
        settle(probe, waits.navigation_ms, "Navigation Surface")?;
        if !probe.wait_for(NAV_BUTTON, waits.selector_timeout_ms)? {
            warn!(surface = %surface, "no navigation buttons appeared before timeout");
        }

        let result = NavigationDiscoverer::new().discover_filtered(probe, &self.filter, surface);
        let event = SweepEvent::now(SweepPhase::Discovery).with_page(surface);
        match &result {
            Ok(targets) => self.tracer.record(
                &event
                    .with_count("selected", targets.len() as u64)
                    .with_names(targets.iter().map(|t| t.route.clone()))
                    .with_outcome("ok"),
            ),
            Err(e) => self.tracer.record(&event.with_outcome(e)),
        }
        result
    }

    // ------------------------------------------------------------------
    // Page
    // ------------------------------------------------------------------

    /// Test one target. Only a run-fatal error is returned; anything else
    /// ends up in the report.
    pub fn test_page(
        &self,
        probe: &mut dyn DomProbe,
        ctx: &mut RunContext,
        target: &NavigationTarget,
    ) -> SweepResult<PageReport> {
        let mut report = PageReport::new(target);
        let name = target.display_name().to_string();
        let first_shot = ctx.screenshots().len();

        if let Err(e) = self.exercise_page(probe, ctx, target, &mut report) {
            if e.severity() == Severity::RunFatal {
                return Err(e);
            }
            error!(page = %name, error = %e, "page test stopped");
            report.fail(&e);
            ctx.capture(probe, &name, "failure");
        }

        if let Err(e) = close_open_dialogs(probe, &self.config.waits) {
            if e.severity() == Severity::RunFatal {
                return Err(e);
            }
            warn!(page = %name, error = %e, "could not close dialogs after page");
        }
        ctx.capture(probe, &name, "end");

        if report.verdict != PageVerdict::Fatal {
            ctx.counters.pages_tested += 1;
        }
        report.screenshots = ctx.screenshots()[first_shot..].to_vec();

        self.tracer.record(
            &SweepEvent::now(SweepPhase::PageVerdict)
                .with_page(&name)
                .with_count("testers_run", report.testers_run.len() as u64)
                .with_count("failures", report.failures.len() as u64)
                .with_names(report.signatures.iter())
                .with_outcome(format!("{:?}", report.verdict)),
        );
        info!(page = %name, verdict = ?report.verdict, "page finished");
        Ok(report)
    }

    fn exercise_page(
        &self,
        probe: &mut dyn DomProbe,
        ctx: &mut RunContext,
        target: &NavigationTarget,
        report: &mut PageReport,
    ) -> SweepResult<()> {
        let waits = self.config.waits;
        let name = target.display_name().to_string();
        let scope = PageScope::new(&name, waits);

        probe.navigate(&self.config.url_for(&target.route))?;
        ctx.counters.pages_visited += 1;
        settle(probe, waits.navigation_ms, &format!("Navigate {}", target.route))?;
        ctx.capture(probe, &name, "start");

        self.detect_and_dispatch(probe, ctx, &scope, report)?;

        // Explicit probes, independent of signature detection
        report.has_grid = grid_present(probe);
        if report.has_grid {
            ctx.counters.pages_with_grid += 1;
        }

        let toolbar_controls = CRUD_TOOLBAR_PROBE
            .iter()
            .filter(|selector| probe.exists(selector))
            .count();
        report.has_crud_toolbar = toolbar_controls >= CRUD_TOOLBAR_MIN_CONTROLS;
        if report.has_crud_toolbar {
            ctx.counters.pages_with_crud += 1;
            if self.config.workflow.enabled {
                let executor = CrudWorkflowExecutor::new(&self.config.workflow, waits);
                let outcome = executor.run(probe, ctx, &name)?;
                for failure in outcome.failures() {
                    report.degrade(failure);
                }
                self.tracer.record(
                    &SweepEvent::now(SweepPhase::Workflow)
                        .with_page(&name)
                        .with_count("steps", outcome.steps.len() as u64)
                        .with_outcome(if outcome.succeeded { "succeeded" } else { "failed" })
                        .with_detail(&outcome),
                );
                report.workflow = Some(outcome);
            } else {
                info!(page = %name, "CRUD workflow disabled");
            }
        }

        report.has_kanban = kanban_present(probe);
        if report.has_kanban {
            ctx.counters.pages_with_kanban += 1;
            let kanban = exercise_kanban(probe, &waits, &name)?;
            self.tracer.record(
                &SweepEvent::now(SweepPhase::Kanban)
                    .with_page(&name)
                    .with_detail(&kanban),
            );
            report.kanban = Some(kanban);
        }
        Ok(())
    }

    /// Detection and dispatch for each tab of the page (once if it has none).
    /// A tester runs at most once per page visit.
    fn detect_and_dispatch(
        &self,
        probe: &mut dyn DomProbe,
        ctx: &mut RunContext,
        scope: &PageScope,
        report: &mut PageReport,
    ) -> SweepResult<()> {
        let tabs = recover("count tabs", probe.count(TAB))?.unwrap_or(0);
        let mut visited: BTreeSet<TesterKind> = BTreeSet::new();

        for tab in 0..tabs.max(1) {
            if tabs > 0 {
                if probe.has_attribute(TAB, tab, "disabled") {
                    continue;
                }
                let context = format!("activate tab {}", tab);
                if recover(&context, probe.click(TAB, tab))?.is_none() {
                    continue;
                }
                settle(probe, scope.waits.action_ms, &format!("Tab {}", tab))?;
            }
            report.tabs_visited += 1;

            let detection = detect(&self.catalog, probe)?;
            for detected in &detection.detected {
                if !report.signatures.contains(&detected.name) {
                    report.signatures.push(detected.name.clone());
                }
            }
            self.tracer.record(
                &SweepEvent::now(SweepPhase::Detection)
                    .with_page(&scope.page_name)
                    .with_tab(tab)
                    .with_count("detected", detection.len() as u64)
                    .with_names(detection.detected.iter().map(|d| d.name.clone())),
            );

            let table = DispatchTable::from_detection(&detection);
            let dispatch = table.execute(probe, &self.registry, scope, &mut visited)?;
            for (kind, message) in &dispatch.failures {
                report.degrade(format!("{:?}: {}", kind, message));
            }
            ctx.counters.testers_executed += dispatch.executed.len() as u32;
            report.testers_run.extend(dispatch.executed.iter().copied());
            self.tracer.record(
                &SweepEvent::now(SweepPhase::Dispatch)
                    .with_page(&scope.page_name)
                    .with_tab(tab)
                    .with_count("executed", dispatch.executed.len() as u64)
                    .with_count("already_run", dispatch.already_run.len() as u64)
                    .with_count("failed", dispatch.failures.len() as u64)
                    .with_names(dispatch.executed.iter().map(|k| format!("{:?}", k))),
            );
        }

        // Back to the first tab for the CRUD workflow
        if tabs > 1 {
            recover("reactivate first tab", probe.click(TAB, 0))?;
            settle(probe, scope.waits.action_ms, "Tab 0")?;
        }
        Ok(())
    }
}
