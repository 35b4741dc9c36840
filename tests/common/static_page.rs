use std::collections::{HashMap, HashSet};

use page_sweep::browser::probe::DomProbe;
use page_sweep::error::{SweepError, SweepResult};

/// A frozen page: every query is answered from exact-selector tables,
/// every action is recorded and changes nothing.
#[derive(Debug, Default)]
pub struct StaticPage {
    counts: HashMap<String, u32>,
    attributes: HashMap<(String, u32, String), String>,
    texts: HashMap<(String, u32), String>,
    tags: HashMap<(String, u32), String>,
    values: HashMap<String, String>,
    failing: HashSet<String>,
    pub url: String,
    pub actions: Vec<String>,
}

impl StaticPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, selector: &str, count: u32) -> Self {
        self.counts.insert(selector.to_string(), count);
        self
    }

    pub fn with_attr(mut self, selector: &str, index: u32, name: &str, value: &str) -> Self {
        self.attributes
            .insert((selector.to_string(), index, name.to_string()), value.to_string());
        self
    }

    pub fn with_text(mut self, selector: &str, index: u32, text: &str) -> Self {
        self.texts.insert((selector.to_string(), index), text.to_string());
        self
    }

    pub fn with_tag(mut self, selector: &str, index: u32, tag: &str) -> Self {
        self.tags.insert((selector.to_string(), index), tag.to_string());
        self
    }

    pub fn with_value(mut self, selector: &str, value: &str) -> Self {
        self.values.insert(selector.to_string(), value.to_string());
        self
    }

    /// Queries on `selector` fail with a driver protocol error.
    pub fn failing(mut self, selector: &str) -> Self {
        self.failing.insert(selector.to_string());
        self
    }

    pub fn clicked(&self, selector: &str) -> bool {
        let prefix = format!("click {}#", selector);
        self.actions.iter().any(|a| a.starts_with(&prefix))
    }

    fn check(&self, command: &str, selector: &str) -> SweepResult<()> {
        if self.failing.contains(selector) {
            return Err(SweepError::DriverProtocol {
                command: command.to_string(),
                error: format!("selector '{}' rejected", selector),
            });
        }
        Ok(())
    }
}

impl DomProbe for StaticPage {
    fn navigate(&mut self, url: &str) -> SweepResult<()> {
        self.actions.push(format!("navigate {}", url));
        self.url = url.to_string();
        Ok(())
    }

    fn current_url(&mut self) -> SweepResult<String> {
        Ok(self.url.clone())
    }

    fn count(&mut self, selector: &str) -> SweepResult<u32> {
        self.check("count", selector)?;
        Ok(self.counts.get(selector).copied().unwrap_or(0))
    }

    fn attribute(&mut self, selector: &str, index: u32, name: &str) -> SweepResult<Option<String>> {
        self.check("attribute", selector)?;
        Ok(self
            .attributes
            .get(&(selector.to_string(), index, name.to_string()))
            .cloned())
    }

    fn text(&mut self, selector: &str, index: u32) -> SweepResult<Option<String>> {
        self.check("text", selector)?;
        Ok(self.texts.get(&(selector.to_string(), index)).cloned())
    }

    fn tag_name(&mut self, selector: &str, index: u32) -> SweepResult<Option<String>> {
        self.check("tag_name", selector)?;
        Ok(self.tags.get(&(selector.to_string(), index)).cloned())
    }

    fn value(&mut self, selector: &str) -> SweepResult<Option<String>> {
        self.check("value", selector)?;
        Ok(self.values.get(selector).cloned())
    }

    fn click(&mut self, selector: &str, index: u32) -> SweepResult<()> {
        self.check("click", selector)?;
        self.actions.push(format!("click {}#{}", selector, index));
        Ok(())
    }

    fn fill(&mut self, selector: &str, value: &str) -> SweepResult<()> {
        self.check("fill", selector)?;
        self.actions.push(format!("fill {}={}", selector, value));
        Ok(())
    }

    fn set_input_files(&mut self, selector: &str, path: &str) -> SweepResult<()> {
        self.actions.push(format!("upload {}={}", selector, path));
        Ok(())
    }

    fn press_key(&mut self, key: &str) -> SweepResult<()> {
        self.actions.push(format!("key {}", key));
        Ok(())
    }

    fn drag(&mut self, source: &str, target: &str) -> SweepResult<()> {
        self.actions.push(format!("drag {} -> {}", source, target));
        Ok(())
    }

    fn wait_ms(&mut self, _ms: u64) -> SweepResult<()> {
        Ok(())
    }

    fn wait_for(&mut self, selector: &str, _timeout_ms: u64) -> SweepResult<bool> {
        Ok(self.counts.get(selector).copied().unwrap_or(0) > 0)
    }

    fn screenshot(&mut self, path: &str) -> SweepResult<()> {
        self.actions.push(format!("screenshot {}", path));
        Ok(())
    }
}
