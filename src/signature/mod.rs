pub mod catalog;
pub mod detector;
pub mod dispatch;
pub mod signature_model;
