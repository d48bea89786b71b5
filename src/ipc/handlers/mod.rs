pub mod analytics;
pub mod core;
pub mod grades;
pub mod reports;
