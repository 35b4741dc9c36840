use crate::error::SweepResult;

/// Query and act on the live page by CSS selector.
///
/// Every component borrows the probe for the duration of one call and never
/// keeps it. Queries that match nothing are a normal outcome: counts return
/// `0` and lookups return `None`.
pub trait DomProbe {
    /// Assign the page location directly.
    fn navigate(&mut self, url: &str) -> SweepResult<()>;

    fn current_url(&mut self) -> SweepResult<String>;

    /// Number of elements matching `selector`.
    fn count(&mut self, selector: &str) -> SweepResult<u32>;

    /// Attribute `name` of the `index`-th match. `Some("")` for a bare boolean attribute.
    fn attribute(&mut self, selector: &str, index: u32, name: &str) -> SweepResult<Option<String>>;

    /// Text content of the `index`-th match.
    fn text(&mut self, selector: &str, index: u32) -> SweepResult<Option<String>>;

    /// Lowercase tag name of the `index`-th match.
    fn tag_name(&mut self, selector: &str, index: u32) -> SweepResult<Option<String>>;

    /// `value` property of the first match.
    fn value(&mut self, selector: &str) -> SweepResult<Option<String>>;

    fn click(&mut self, selector: &str, index: u32) -> SweepResult<()>;

    /// Replace the value of the first match.
    fn fill(&mut self, selector: &str, value: &str) -> SweepResult<()>;

    /// Attach a local file to a file input.
    fn set_input_files(&mut self, selector: &str, path: &str) -> SweepResult<()>;

    fn press_key(&mut self, key: &str) -> SweepResult<()>;

    /// Drag the first `source` match onto the first `target` match.
    fn drag(&mut self, source: &str, target: &str) -> SweepResult<()>;

    /// Fixed delay.
    fn wait_ms(&mut self, ms: u64) -> SweepResult<()>;

    /// Poll until `selector` matches. `Ok(false)` on timeout.
    fn wait_for(&mut self, selector: &str, timeout_ms: u64) -> SweepResult<bool>;

    fn screenshot(&mut self, path: &str) -> SweepResult<()>;

    // ------------------------------------------------------------------
    // Provided helpers
    // ------------------------------------------------------------------

    /// `true` if anything matches. Query failures count as absence.
    fn exists(&mut self, selector: &str) -> bool {
        self.count(selector).map(|c| c > 0).unwrap_or(false)
    }

    /// `true` if the attribute is present on the `index`-th match.
    fn has_attribute(&mut self, selector: &str, index: u32, name: &str) -> bool {
        match self.attribute(selector, index, name) {
            Ok(Some(value)) => value != "false",
            _ => false,
        }
    }

    /// `true` if the first match exists and is not disabled.
    fn is_enabled(&mut self, selector: &str) -> bool {
        self.exists(selector) && !self.has_attribute(selector, 0, "disabled")
    }

    /// Trimmed text of every match, in DOM order.
    fn texts(&mut self, selector: &str) -> SweepResult<Vec<String>> {
        let count = self.count(selector)?;
        let mut out = Vec::with_capacity(count as usize);
        for i in 0..count {
            out.push(self.text(selector, i)?.unwrap_or_default().trim().to_string());
        }
        Ok(out)
    }
}
