pub mod orchestrator;
pub mod page_report;
pub mod run_context;
pub mod sweep_config;
