pub mod dashboard;
pub mod form;

pub use dashboard::{Dashboard, DashboardView, InputMode};
