pub mod executor;
pub mod kanban;
pub mod relation;
pub mod workflow_model;
