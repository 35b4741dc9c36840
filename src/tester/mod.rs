pub mod clone_toolbar;
pub mod component_tester;
pub mod crud_toolbar;
pub mod date_picker;
pub mod grid;
pub mod panel;
pub mod status_field;
