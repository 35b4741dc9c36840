pub mod browser;
pub mod cli;
pub mod error;
pub mod fields;
pub mod navigation;
pub mod orchestrator;
pub mod signature;
pub mod tester;
pub mod trace;
pub mod workflow;

pub use error::{Severity, SweepError, SweepResult};
