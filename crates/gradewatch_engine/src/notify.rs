use gradewatch_store::ExamChange;
use portal_logging::watch_info;

/// Consumer of the change events an upsert reports.
///
/// Delivery to actual users happens in an external front end; the engine
/// only hands the batch over.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, changes: &[ExamChange]);
}

/// Default sink: writes one log line per change.
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, changes: &[ExamChange]) {
        for change in changes {
            watch_info!(
                "Grade change in \"{}\": {} / {}",
                change.department,
                change.lecture,
                change.exam
            );
        }
    }
}
