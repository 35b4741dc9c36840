use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::browser::controls::{click_and_settle, confirm_if_present, settle};
use crate::browser::probe::DomProbe;
use crate::browser::selectors::{DIALOG_FILE, DIALOG_SAVE, DIALOG_TEXT, OPEN_DIALOG};
use crate::error::{SweepError, SweepResult};
use crate::orchestrator::run_context::sanitize_filename;
use crate::tester::component_tester::{ComponentTester, PageScope, TesterKind};

/// Attachment and comment panels share one layout and one add/delete cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Attachment,
    Comment,
}

impl PanelKind {
    pub fn slug(&self) -> &'static str {
        match self {
            PanelKind::Attachment => "attachment",
            PanelKind::Comment => "comment",
        }
    }

    pub fn container(&self) -> String {
        format!("#custom-{}-component", self.slug())
    }

    pub fn add_button(&self) -> String {
        format!("#cbutton-{}-add", self.slug())
    }

    pub fn delete_button(&self) -> String {
        format!("#cbutton-{}-delete", self.slug())
    }

    pub fn download_button(&self) -> String {
        format!("#cbutton-{}-download", self.slug())
    }

    /// Cells of the panel's own item grid.
    pub fn items(&self) -> String {
        format!("#custom-{}-grid vaadin-grid-cell-content", self.slug())
    }
}

/// Adds an item through the panel's dialog, checks it is listed, then
/// deletes it again.
pub struct PanelTester {
    kind: PanelKind,
}

impl PanelTester {
    pub fn new(kind: PanelKind) -> Self {
        Self { kind }
    }

    pub fn panel(&self) -> PanelKind {
        self.kind
    }

    /// Fill the add dialog. Returns the text the new item is listed under
    /// and the file written for an upload, if any.
    fn fill_dialog(&self, probe: &mut dyn DomProbe, scope: &PageScope) -> SweepResult<(String, Option<PathBuf>)> {
        match self.kind {
            PanelKind::Comment => {
                let text = format!("Comment-{}", scope.page_name);
                probe.fill(DIALOG_TEXT, &text)?;
                Ok((text, None))
            }
            PanelKind::Attachment => {
                let file_name = format!("attachment-{}.txt", sanitize_filename(&scope.page_name));
                let path = std::env::temp_dir().join(&file_name);
                fs::write(&path, format!("page-sweep attachment for {}\n", scope.page_name))?;
                if let Err(e) = probe.set_input_files(DIALOG_FILE, &path.to_string_lossy()) {
                    remove_upload(&path);
                    return Err(e);
                }
                Ok((file_name, Some(path)))
            }
        }
    }

    /// Save the dialog, check the item is listed, then delete it.
    fn save_and_remove(&self, probe: &mut dyn DomProbe, scope: &PageScope, label: &str) -> SweepResult<()> {
        let slug = self.kind.slug();
        click_and_settle(probe, DIALOG_SAVE, scope.waits.save_ms, &format!("{} Save", slug))?;

        let Some(row) = self.item_listed(probe, label)? else {
            return Err(SweepError::verification(
                format!("{} add", slug),
                format!("'{}' not listed after save", label),
            ));
        };
        info!(page = %scope.page_name, panel = slug, item = %label, "item added");

        let delete = self.kind.delete_button();
        if !probe.exists(&delete) {
            warn!(page = %scope.page_name, panel = slug, "no delete control, item left in place");
            return Ok(());
        }
        probe.click(&self.kind.items(), row)?;
        settle(probe, scope.waits.action_ms, &format!("{} Select", slug))?;
        click_and_settle(probe, &delete, scope.waits.action_ms, &format!("{} Delete", slug))?;
        confirm_if_present(probe, &scope.waits)?;

        if self.item_listed(probe, label)?.is_some() {
            return Err(SweepError::verification(
                format!("{} delete", slug),
                format!("'{}' still listed after delete", label),
            ));
        }
        info!(page = %scope.page_name, panel = slug, item = %label, "item deleted");
        Ok(())
    }

    fn item_listed(&self, probe: &mut dyn DomProbe, label: &str) -> SweepResult<Option<u32>> {
        let items = probe.texts(&self.kind.items())?;
        Ok(items.iter().position(|t| t.contains(label)).map(|i| i as u32))
    }
}

impl ComponentTester for PanelTester {
    fn kind(&self) -> TesterKind {
        match self.kind {
            PanelKind::Attachment => TesterKind::Attachment,
            PanelKind::Comment => TesterKind::Comment,
        }
    }

    fn name(&self) -> &'static str {
        match self.kind {
            PanelKind::Attachment => "Attachment Tester",
            PanelKind::Comment => "Comment Tester",
        }
    }

    fn test(&self, probe: &mut dyn DomProbe, scope: &PageScope) -> SweepResult<()> {
        let slug = self.kind.slug();
        let add = self.kind.add_button();

        if !probe.is_enabled(&add) {
            return Err(SweepError::verification(
                format!("{} panel", slug),
                format!("add control {} missing or disabled", add),
            ));
        }
        if probe.exists(&self.kind.download_button()) {
            info!(page = %scope.page_name, panel = slug, "download control present");
        }

        click_and_settle(probe, &add, scope.waits.action_ms, &format!("{} Add", slug))?;
        if !probe.wait_for(OPEN_DIALOG, scope.waits.selector_timeout_ms)? {
            return Err(SweepError::WaitTimeout {
                selector: OPEN_DIALOG.to_string(),
                timeout_ms: scope.waits.selector_timeout_ms,
            });
        }

        let (label, upload) = self.fill_dialog(probe, scope)?;
        let result = self.save_and_remove(probe, scope, &label);
        if let Some(path) = upload {
            remove_upload(&path);
        }
        result
    }
}

fn remove_upload(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "attachment file not removed");
    }
}
