use serde::Serialize;

// ============================================================================
// State machine
// ============================================================================

/// CRUD workflow progress for one page visit.
///
/// `Idle → Created → Saved → (Updated → Saved)* → Deleted`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkflowState {
    Idle,
    Created,
    Saved,
    Updated,
    Deleted,
}

impl WorkflowState {
    pub fn can_transition(self, to: WorkflowState) -> bool {
        matches!(
            (self, to),
            (WorkflowState::Idle, WorkflowState::Created)
                | (WorkflowState::Created, WorkflowState::Saved)
                | (WorkflowState::Saved, WorkflowState::Updated)
                | (WorkflowState::Updated, WorkflowState::Saved)
                | (WorkflowState::Saved, WorkflowState::Deleted)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkflowStep {
    Create,
    Update,
    StatusChange,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    Passed,
    /// Completed, with an expectation that did not hold
    Warned(String),
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: WorkflowStep,
    pub status: StepStatus,
}

// ============================================================================
// Outcome
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowOutcome {
    /// Grid cells before create, `None` without a grid
    pub before_row_count: Option<u32>,
    pub after_create_row_count: Option<u32>,
    /// Grid cells after delete
    pub after_row_count: Option<u32>,
    /// Primary-field value of the row this run created, following updates
    pub created_marker: Option<String>,
    pub succeeded: bool,
    pub state: WorkflowState,
    pub history: Vec<WorkflowState>,
    pub steps: Vec<StepRecord>,
}

impl Default for WorkflowOutcome {
    fn default() -> Self {
        Self {
            before_row_count: None,
            after_create_row_count: None,
            after_row_count: None,
            created_marker: None,
            succeeded: false,
            state: WorkflowState::Idle,
            history: vec![WorkflowState::Idle],
            steps: Vec::new(),
        }
    }
}

impl WorkflowOutcome {
    /// Move to `to`; ignored (returns `false`) if the transition is not allowed.
    pub fn advance(&mut self, to: WorkflowState) -> bool {
        if !self.state.can_transition(to) {
            return false;
        }
        self.state = to;
        self.history.push(to);
        true
    }

    pub fn record(&mut self, step: WorkflowStep, status: StepStatus) {
        self.steps.push(StepRecord { step, status });
    }

    pub fn status_of(&self, step: WorkflowStep) -> Option<&StepStatus> {
        self.steps.iter().find(|r| r.step == step).map(|r| &r.status)
    }

    pub fn failures(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|r| match &r.status {
                StepStatus::Failed(msg) => Some(format!("{:?}: {}", r.step, msg)),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|r| match &r.status {
                StepStatus::Warned(msg) => Some(format!("{:?}: {}", r.step, msg)),
                _ => None,
            })
            .collect()
    }
}
