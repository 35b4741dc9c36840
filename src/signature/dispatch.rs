use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::browser::controls::close_open_dialogs;
use crate::browser::probe::DomProbe;
use crate::error::{recover, SweepResult};
use crate::signature::signature_model::DetectionResult;
use crate::tester::component_tester::{PageScope, TesterKind, TesterRegistry};

/// One tester and the signatures that selected it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchEntry {
    pub tester: TesterKind,
    pub signatures: Vec<String>,
}

/// Detected signatures grouped by tester, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchTable {
    entries: Vec<DispatchEntry>,
}

/// What happened when a dispatch table ran.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    /// Testers invoked, in order
    pub executed: Vec<TesterKind>,
    /// Testers skipped because they already ran during this page visit
    pub already_run: Vec<TesterKind>,
    /// Testers that returned a recoverable error, with the message
    pub failures: Vec<(TesterKind, String)>,
}

impl DispatchTable {
    pub fn from_detection(result: &DetectionResult) -> Self {
        let mut entries: Vec<DispatchEntry> = Vec::new();
        for detected in &result.detected {
            match entries.iter_mut().find(|e| e.tester == detected.tester) {
                Some(entry) => entry.signatures.push(detected.name.clone()),
                None => entries.push(DispatchEntry {
                    tester: detected.tester,
                    signatures: vec![detected.name.clone()],
                }),
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[DispatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run each distinct tester once.
    ///
    /// `visited` holds the testers already run during this page visit and
    /// is updated in place. A tester's recoverable failure is logged and
    /// the remaining testers still run; page- and run-fatal errors
    /// propagate.
    pub fn execute(
        &self,
        probe: &mut dyn DomProbe,
        registry: &TesterRegistry,
        scope: &PageScope,
        visited: &mut BTreeSet<TesterKind>,
    ) -> SweepResult<DispatchReport> {
        let mut report = DispatchReport::default();

        for entry in &self.entries {
            if visited.contains(&entry.tester) {
                report.already_run.push(entry.tester);
                continue;
            }
            let Some(tester) = registry.get(entry.tester) else {
                warn!(tester = ?entry.tester, "no tester registered, skipping");
                continue;
            };

            info!(
                page = %scope.page_name,
                tester = tester.name(),
                signatures = ?entry.signatures,
                "running component tester"
            );

            recover("close dialogs before tester", close_open_dialogs(probe, &scope.waits))?;
            visited.insert(entry.tester);
            report.executed.push(entry.tester);

            if let Err(e) = tester.test(probe, scope) {
                if !e.is_recoverable() {
                    return Err(e);
                }
                error!(tester = tester.name(), error = %e, "component tester failed");
                report.failures.push((entry.tester, e.to_string()));
            }

            recover("close dialogs after tester", close_open_dialogs(probe, &scope.waits))?;
        }

        info!(
            page = %scope.page_name,
            testers_run = report.executed.len(),
            failed = report.failures.len(),
            "component tests complete"
        );
        Ok(report)
    }
}
