use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::browser::probe::DomProbe;

/// Coverage counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub targets_selected: u32,
    pub pages_visited: u32,
    pub pages_tested: u32,
    pub pages_with_grid: u32,
    pub pages_with_crud: u32,
    pub pages_with_kanban: u32,
    pub testers_executed: u32,
}

/// Per-run bookkeeping, created when a sweep starts and dropped when it ends.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub counters: Counters,
    screenshot_dir: String,
    screenshot_index: u32,
    screenshots: Vec<String>,
    /// Last creation marker per page name
    markers: BTreeMap<String, String>,
}

impl RunContext {
    pub fn new(screenshot_dir: &str) -> Self {
        Self {
            counters: Counters::default(),
            screenshot_dir: screenshot_dir.to_string(),
            screenshot_index: 0,
            screenshots: Vec::new(),
            markers: BTreeMap::new(),
        }
    }

    /// Save `NNN-<page>-<step>.png`. Failures are logged and yield `None`.
    pub fn capture(&mut self, probe: &mut dyn DomProbe, page: &str, step: &str) -> Option<String> {
        self.screenshot_index += 1;
        let file_name = format!(
            "{:03}-{}-{}.png",
            self.screenshot_index,
            sanitize_filename(page),
            sanitize_filename(step)
        );
        let path = Path::new(&self.screenshot_dir).join(file_name);
        let path = path.to_string_lossy().to_string();

        if let Err(e) = fs::create_dir_all(&self.screenshot_dir) {
            warn!(dir = %self.screenshot_dir, error = %e, "cannot create screenshot directory");
            return None;
        }
        match probe.screenshot(&path) {
            Ok(()) => {
                debug!(path = %path, "screenshot saved");
                self.screenshots.push(path.clone());
                Some(path)
            }
            Err(e) => {
                warn!(path = %path, error = %e, "screenshot failed");
                None
            }
        }
    }

    pub fn screenshots(&self) -> &[String] {
        &self.screenshots
    }

    pub fn record_marker(&mut self, page: &str, marker: &str) {
        self.markers.insert(page.to_string(), marker.to_string());
    }

    pub fn marker(&self, page: &str) -> Option<&str> {
        self.markers.get(page).map(String::as_str)
    }

    pub fn forget_marker(&mut self, page: &str) {
        self.markers.remove(page);
    }
}

/// Lowercase, with runs of anything but ASCII letters and digits collapsed to `-`.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "page".to_string()
    } else {
        trimmed.to_string()
    }
}
