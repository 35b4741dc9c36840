use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

use page_sweep::browser::probe::DomProbe;
use page_sweep::browser::selectors::{CRUD_DELETE, CRUD_NEW, CRUD_SAVE, GRID};
use page_sweep::error::{SweepError, SweepResult};
use page_sweep::signature::catalog::{SignatureCatalog, SignatureFilter};
use page_sweep::signature::detector::{detect, matcher_hits};
use page_sweep::signature::dispatch::DispatchTable;
use page_sweep::signature::signature_model::Signature;
use page_sweep::tester::component_tester::{ComponentTester, PageScope, TesterKind, TesterRegistry};
use proptest::prelude::*;

mod common;
use crate::common::no_waits;
use crate::common::static_page::StaticPage;

// ============================================================================
// Helpers
// ============================================================================

/// Counts invocations; optionally fails with the given error.
struct ScriptedTester {
    kind: TesterKind,
    calls: Rc<Cell<u32>>,
    fail: Option<fn() -> SweepError>,
}

impl ScriptedTester {
    fn passing(kind: TesterKind, calls: &Rc<Cell<u32>>) -> Box<dyn ComponentTester> {
        Box::new(Self {
            kind,
            calls: Rc::clone(calls),
            fail: None,
        })
    }

    fn failing(kind: TesterKind, calls: &Rc<Cell<u32>>, fail: fn() -> SweepError) -> Box<dyn ComponentTester> {
        Box::new(Self {
            kind,
            calls: Rc::clone(calls),
            fail: Some(fail),
        })
    }
}

impl ComponentTester for ScriptedTester {
    fn kind(&self) -> TesterKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        "Scripted Tester"
    }

    fn test(&self, _probe: &mut dyn DomProbe, _scope: &PageScope) -> SweepResult<()> {
        self.calls.set(self.calls.get() + 1);
        match self.fail {
            Some(make) => Err(make()),
            None => Ok(()),
        }
    }
}

fn scope() -> PageScope {
    PageScope::new("Activities", no_waits())
}

fn crud_only_page() -> StaticPage {
    StaticPage::new().with_count(CRUD_SAVE, 1).with_count(CRUD_DELETE, 1)
}

// ============================================================================
// Detection
// ============================================================================

#[test]
fn save_and_delete_alone_satisfy_crud_toolbar_signature() {
    let mut page = crud_only_page();
    let result = detect(&SignatureCatalog::standard(), &mut page).unwrap();

    assert!(result.contains("CRUD Toolbar Signature"));
    assert!(result.contains("CRUD Save Button Signature"));
    assert!(result.contains("CRUD Delete Button Signature"));
    assert!(!result.contains("Grid Signature"));

    let toolbar = result
        .detected
        .iter()
        .find(|d| d.name == "CRUD Toolbar Signature")
        .unwrap();
    assert_eq!(toolbar.hits, 2);
}

#[test]
fn single_toolbar_button_is_below_threshold() {
    let mut page = StaticPage::new().with_count(CRUD_NEW, 1);
    let result = detect(&SignatureCatalog::standard(), &mut page).unwrap();
    assert!(!result.contains("CRUD Toolbar Signature"));
}

#[test]
fn matcher_hits_sum_elements_across_patterns() {
    let mut page = StaticPage::new().with_count(GRID, 40).with_count("c-grid-pro", 2);
    let signature = Signature::for_selectors_min_match("Two Grids", &[GRID, "c-grid-pro", "#none"], 2, TesterKind::Grid);
    assert_eq!(matcher_hits(&signature, &mut page).unwrap(), 42);
}

#[test]
fn repeated_elements_of_one_pattern_reach_threshold() {
    let mut page = StaticPage::new().with_count(".row", 3);
    let rows = Signature::for_selectors_min_match("Rows", &[".row"], 2, TesterKind::Grid);
    let result = detect(&SignatureCatalog::new(vec![rows]), &mut page).unwrap();

    assert!(result.contains("Rows"));
    assert_eq!(result.detected[0].hits, 3);
}

#[test]
fn two_saves_alone_satisfy_crud_toolbar_signature() {
    let mut page = StaticPage::new().with_count(CRUD_SAVE, 2);
    let result = detect(&SignatureCatalog::standard(), &mut page).unwrap();
    assert!(result.contains("CRUD Toolbar Signature"));
}

#[test]
fn failing_matcher_counts_as_miss() {
    let mut page = StaticPage::new()
        .with_count(CRUD_SAVE, 1)
        .with_count(CRUD_DELETE, 1)
        .failing(CRUD_DELETE);
    let result = detect(&SignatureCatalog::standard(), &mut page).unwrap();

    assert!(result.contains("CRUD Save Button Signature"));
    assert!(!result.contains("CRUD Delete Button Signature"));
    assert!(!result.contains("CRUD Toolbar Signature"));
}

#[test]
fn min_matches_is_clamped_to_one() {
    let signature = Signature::for_selectors_min_match("Zero", &["#a"], 0, TesterKind::Grid);
    assert_eq!(signature.min_matches, 1);

    let mut empty = StaticPage::new();
    let catalog = SignatureCatalog::new(vec![signature]);
    assert!(detect(&catalog, &mut empty).unwrap().is_empty());
}

#[test]
fn empty_page_detects_nothing() {
    let mut page = StaticPage::new();
    let result = detect(&SignatureCatalog::standard(), &mut page).unwrap();
    assert!(result.is_empty());
}

proptest! {
    #[test]
    fn detected_iff_summed_matches_reach_threshold(
        counts in proptest::collection::vec(0u32..4, 1..8),
        min in 1u32..12,
    ) {
        let selectors: Vec<String> = (0..counts.len()).map(|i| format!("#m{}", i)).collect();
        let refs: Vec<&str> = selectors.iter().map(String::as_str).collect();
        let signature = Signature::for_selectors_min_match("Prop", &refs, min, TesterKind::Grid);

        let mut page = StaticPage::new();
        for (selector, count) in selectors.iter().zip(&counts) {
            page = page.with_count(selector, *count);
        }
        let hits: u32 = counts.iter().sum();

        let result = detect(&SignatureCatalog::new(vec![signature]), &mut page).unwrap();
        prop_assert_eq!(result.contains("Prop"), hits >= min);
    }
}

// ============================================================================
// Dispatch
// ============================================================================

#[test]
fn signatures_sharing_a_tester_dispatch_once() {
    let mut page = crud_only_page();
    let result = detect(&SignatureCatalog::standard(), &mut page).unwrap();
    let table = DispatchTable::from_detection(&result);

    assert_eq!(table.len(), 1);
    assert_eq!(table.entries()[0].tester, TesterKind::CrudToolbar);
    assert_eq!(table.entries()[0].signatures.len(), 3);

    let calls = Rc::new(Cell::new(0));
    let mut registry = TesterRegistry::empty();
    registry.register(ScriptedTester::passing(TesterKind::CrudToolbar, &calls));

    let mut visited = BTreeSet::new();
    let report = table.execute(&mut page, &registry, &scope(), &mut visited).unwrap();
    assert_eq!(report.executed, vec![TesterKind::CrudToolbar]);
    assert_eq!(calls.get(), 1);
}

#[test]
fn dispatch_is_idempotent_within_a_visit() {
    let mut page = crud_only_page().with_count(GRID, 1);
    let result = detect(&SignatureCatalog::standard(), &mut page).unwrap();
    let table = DispatchTable::from_detection(&result);

    let crud_calls = Rc::new(Cell::new(0));
    let grid_calls = Rc::new(Cell::new(0));
    let mut registry = TesterRegistry::empty();
    registry.register(ScriptedTester::passing(TesterKind::CrudToolbar, &crud_calls));
    registry.register(ScriptedTester::passing(TesterKind::Grid, &grid_calls));

    let mut visited = BTreeSet::new();
    let first = table.execute(&mut page, &registry, &scope(), &mut visited).unwrap();
    let second = table.execute(&mut page, &registry, &scope(), &mut visited).unwrap();

    assert_eq!(first.executed.len(), 2);
    assert!(second.executed.is_empty());
    assert_eq!(second.already_run.len(), 2);
    assert_eq!(crud_calls.get(), 1);
    assert_eq!(grid_calls.get(), 1);
}

#[test]
fn failing_tester_does_not_stop_the_others() {
    let mut page = crud_only_page().with_count(GRID, 1);
    let result = detect(&SignatureCatalog::standard(), &mut page).unwrap();
    let table = DispatchTable::from_detection(&result);

    let crud_calls = Rc::new(Cell::new(0));
    let grid_calls = Rc::new(Cell::new(0));
    let mut registry = TesterRegistry::empty();
    registry.register(ScriptedTester::failing(TesterKind::CrudToolbar, &crud_calls, || {
        SweepError::verification("CRUD toolbar", "New is disabled")
    }));
    registry.register(ScriptedTester::passing(TesterKind::Grid, &grid_calls));

    let mut visited = BTreeSet::new();
    let report = table.execute(&mut page, &registry, &scope(), &mut visited).unwrap();

    assert_eq!(report.executed, vec![TesterKind::CrudToolbar, TesterKind::Grid]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, TesterKind::CrudToolbar);
    assert!(report.failures[0].1.contains("New is disabled"));
    assert_eq!(grid_calls.get(), 1);
}

#[test]
fn blocking_dialog_in_tester_propagates() {
    let mut page = crud_only_page().with_count(GRID, 1);
    let result = detect(&SignatureCatalog::standard(), &mut page).unwrap();
    let table = DispatchTable::from_detection(&result);

    let crud_calls = Rc::new(Cell::new(0));
    let grid_calls = Rc::new(Cell::new(0));
    let mut registry = TesterRegistry::empty();
    registry.register(ScriptedTester::failing(TesterKind::CrudToolbar, &crud_calls, || {
        SweepError::BlockingErrorDialog {
            control_point: "CRUD Refresh".into(),
            detail: "NullPointerException".into(),
        }
    }));
    registry.register(ScriptedTester::passing(TesterKind::Grid, &grid_calls));

    let mut visited = BTreeSet::new();
    let err = table
        .execute(&mut page, &registry, &scope(), &mut visited)
        .unwrap_err();

    assert!(matches!(err, SweepError::BlockingErrorDialog { .. }));
    assert_eq!(grid_calls.get(), 0);
}

#[test]
fn unregistered_tester_is_skipped() {
    let mut page = crud_only_page();
    let result = detect(&SignatureCatalog::standard(), &mut page).unwrap();
    let table = DispatchTable::from_detection(&result);

    let mut visited = BTreeSet::new();
    let report = table
        .execute(&mut page, &TesterRegistry::empty(), &scope(), &mut visited)
        .unwrap();
    assert!(report.executed.is_empty());
    assert!(visited.is_empty());
}

#[test]
fn standard_registry_covers_every_kind() {
    let registry = TesterRegistry::standard();
    assert_eq!(registry.len(), TesterKind::ALL.len());
    for kind in TesterKind::ALL {
        assert_eq!(registry.get(kind).map(|t| t.kind()), Some(kind));
    }
}

#[test]
fn every_catalog_tester_is_registered() {
    let registry = TesterRegistry::standard();
    for signature in SignatureCatalog::standard().signatures() {
        assert!(registry.get(signature.tester).is_some(), "{}", signature.name);
    }
}

// ============================================================================
// Filter
// ============================================================================

#[test]
fn filter_include_and_exclude_are_case_insensitive() {
    let filter = SignatureFilter::new(&["CRUD".to_string()], &[" delete ".to_string()]);
    let catalog = SignatureCatalog::standard().filtered(&filter);
    let names: Vec<&str> = catalog.signatures().iter().map(|s| s.name.as_str()).collect();

    assert_eq!(names, vec!["CRUD Toolbar Signature", "CRUD Save Button Signature"]);
}

#[test]
fn inactive_filter_keeps_catalog_order() {
    let filter = SignatureFilter::new(&[], &["  ".to_string()]);
    assert!(!filter.is_active());
    let full = SignatureCatalog::standard();
    let filtered = full.filtered(&filter);
    assert_eq!(filtered.signatures(), full.signatures());
}

#[test]
fn filtered_catalog_never_detects_excluded_signatures() {
    let filter = SignatureFilter::new(&[], &["toolbar".to_string()]);
    let catalog = SignatureCatalog::standard().filtered(&filter);
    let mut page = crud_only_page();
    let result = detect(&catalog, &mut page).unwrap();

    assert!(!result.contains("CRUD Toolbar Signature"));
    assert!(result.contains("CRUD Save Button Signature"));
}
