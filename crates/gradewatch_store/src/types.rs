use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// One exam row that was inserted or replaced by an upsert.
///
/// Callers decide what to do with these; the store itself never dispatches
/// notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamChange {
    pub department: String,
    pub lecture_id: i64,
    pub lecture: String,
    pub exam: String,
}
