use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Run phase a trace line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepPhase {
    Discovery,
    Detection,
    Dispatch,
    Workflow,
    Kanban,
    PageVerdict,
    RunSummary,
}

/// One JSONL line of the run trace.
#[derive(Debug, Serialize)]
pub struct SweepEvent {
    pub timestamp_ms: u128,
    pub phase: SweepPhase,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab: Option<u32>,

    /// Counts relevant to the phase, e.g. `{"detected": 3}`
    pub counts: serde_json::Map<String, serde_json::Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl SweepEvent {
    pub fn now(phase: SweepPhase) -> Self {
        Self {
            // A clock before 1970 logs 0
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            phase,
            page: None,
            tab: None,
            counts: serde_json::Map::new(),
            names: vec![],
            outcome: None,
            detail: None,
        }
    }

    pub fn with_page(mut self, page: &str) -> Self {
        self.page = Some(page.to_string());
        self
    }

    pub fn with_tab(mut self, tab: u32) -> Self {
        self.tab = Some(tab);
        self
    }

    pub fn with_count(mut self, key: &str, value: u64) -> Self {
        self.counts.insert(key.to_string(), value.into());
        self
    }

    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.names = names.into_iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_outcome(mut self, outcome: impl ToString) -> Self {
        self.outcome = Some(outcome.to_string());
        self
    }

    /// Attach any serializable value; dropped silently if it cannot be serialized.
    pub fn with_detail<T: Serialize>(mut self, detail: &T) -> Self {
        self.detail = serde_json::to_value(detail).ok();
        self
    }
}
