//! Gradewatch store: SQLite-backed grade reconciliation and the
//! notification-subscription registry.
mod store;
mod types;

pub use store::GradeStore;
pub use types::{ExamChange, StoreError};
