use thiserror::Error;
use tracing::warn;

/// How far an error is allowed to travel before it stops the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Logged at the step boundary; the surrounding loop continues.
    Recoverable,
    /// Ends testing of the current page; the sweep moves on.
    PageFatal,
    /// Ends the whole sweep.
    RunFatal,
}

#[derive(Debug, Error)]
pub enum SweepError {
    /// Page driver subprocess failed to spawn
    #[error("Failed to spawn {script} (is Node.js installed?): {source}")]
    DriverSpawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// Pipe to the page driver broke or returned nothing
    #[error("Page driver I/O: {0}")]
    DriverIo(String),

    /// Page driver answered `ok: false`
    #[error("Page driver rejected '{command}': {error}")]
    DriverProtocol { command: String, error: String },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Element '{selector}' not found: {context}")]
    ElementNotFound { selector: String, context: String },

    #[error("Timed out after {timeout_ms}ms waiting for '{selector}'")]
    WaitTimeout { selector: String, timeout_ms: u64 },

    /// The application under test raised its error dialog
    #[error("Blocking error dialog after {control_point}: {detail}")]
    BlockingErrorDialog { control_point: String, detail: String },

    #[error("{step} check failed: {detail}")]
    Verification { step: String, detail: String },

    #[error("No navigation targets discovered on '{surface}'")]
    NoNavigationTargets { surface: String },

    #[error("Navigation target '{0}' not found")]
    TargetNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SweepError {
    pub fn verification(step: impl Into<String>, detail: impl Into<String>) -> Self {
        SweepError::Verification {
            step: step.into(),
            detail: detail.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SweepError::BlockingErrorDialog { .. } => Severity::PageFatal,
            SweepError::DriverSpawn { .. }
            | SweepError::DriverIo(_)
            | SweepError::JsonParse { .. }
            | SweepError::NoNavigationTargets { .. }
            | SweepError::TargetNotFound(_) => Severity::RunFatal,
            _ => Severity::Recoverable,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.severity() == Severity::Recoverable
    }
}

pub type SweepResult<T> = Result<T, SweepError>;

/// Step boundary: swallow a recoverable error with a warning, propagate the rest.
pub fn recover<T>(context: &str, result: SweepResult<T>) -> SweepResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_recoverable() => {
            warn!(step = context, error = %e, "step failed, continuing");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
