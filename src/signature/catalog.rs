use tracing::info;

use crate::browser::selectors::{
    CLONE_BUTTON, CRUD_CANCEL, CRUD_DELETE, CRUD_EDIT, CRUD_NEW, CRUD_REFRESH, CRUD_SAVE,
    DATE_PICKER, GRID,
};
use crate::orchestrator::sweep_config::SignatureSettings;
use crate::signature::signature_model::Signature;
use crate::tester::component_tester::TesterKind;

/// Ordered list of signatures evaluated on every page.
#[derive(Debug, Clone)]
pub struct SignatureCatalog {
    signatures: Vec<Signature>,
}

impl SignatureCatalog {
    pub fn new(signatures: Vec<Signature>) -> Self {
        Self { signatures }
    }

    /// The catalog for the control families this crate knows how to test.
    pub fn standard() -> Self {
        use TesterKind::*;
        Self::new(vec![
            Signature::for_selectors_min_match(
                "CRUD Toolbar Signature",
                &[CRUD_NEW, CRUD_SAVE, CRUD_DELETE, CRUD_REFRESH, CRUD_EDIT, CRUD_CANCEL],
                2,
                CrudToolbar,
            ),
            Signature::for_selector("CRUD Save Button Signature", CRUD_SAVE, CrudToolbar),
            Signature::for_selector("CRUD Delete Button Signature", CRUD_DELETE, CrudToolbar),
            Signature::for_selector("Clone Button Signature", CLONE_BUTTON, CloneToolbar),
            Signature::for_selector("Grid Signature", GRID, Grid),
            Signature::for_selector(
                "Attachment Signature",
                "#custom-attachment-component, vaadin-upload",
                Attachment,
            ),
            Signature::for_selector(
                "Attachment Tab Signature",
                "vaadin-tab:has-text('Attachments'), vaadin-accordion-panel:has-text('Attachments')",
                Attachment,
            ),
            Signature::for_selector("Comment Signature", "#custom-comment-component", Comment),
            Signature::for_selector(
                "Comment Tab Signature",
                "vaadin-tab:has-text('Comments'), vaadin-accordion-panel:has-text('Comments')",
                Comment,
            ),
            Signature::for_selector(
                "Status Combo Signature",
                "#field-status, vaadin-combo-box[id*='status'], [id*='status-combo']",
                StatusField,
            ),
            Signature::for_selector("Date Picker Signature", DATE_PICKER, DatePicker),
        ])
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Subset of the catalog passing `filter`, order preserved.
    pub fn filtered(&self, filter: &SignatureFilter) -> SignatureCatalog {
        if filter.is_active() {
            info!(include = ?filter.include, exclude = ?filter.exclude, "signature filter active");
        }
        SignatureCatalog::new(
            self.signatures
                .iter()
                .filter(|s| filter.accepts(&s.name))
                .cloned()
                .collect(),
        )
    }
}

/// Include/exclude keyword lists matched case-insensitively against signature names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl SignatureFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Self {
        let normalize = |list: &[String]| {
            list.iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect::<Vec<_>>()
        };
        Self {
            include: normalize(include),
            exclude: normalize(exclude),
        }
    }

    pub fn from_settings(settings: &SignatureSettings) -> Self {
        Self::new(&settings.include, &settings.exclude)
    }

    pub fn is_active(&self) -> bool {
        !self.include.is_empty() || !self.exclude.is_empty()
    }

    /// Empty include list accepts everything not excluded.
    pub fn accepts(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        if self.exclude.iter().any(|k| lower.contains(k.as_str())) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|k| lower.contains(k.as_str()))
    }
}
