pub mod controls;
pub mod probe;
pub mod selectors;
pub mod session;
