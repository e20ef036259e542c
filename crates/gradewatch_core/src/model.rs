/// Exam name synthesized for lectures graded by a single pass/fail survey.
pub const SURVEY_EXAM_NAME: &str = "Letter Grade";

/// Weight recorded for the synthesized survey entry.
pub const SURVEY_EXAM_PERCENTAGE: &str = "100%";

/// One named grade component of a lecture, with its weight and recorded date.
///
/// Values are kept exactly as scraped; the store compares them verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamEntry {
    pub name: String,
    pub percentage: String,
    pub date: String,
}

/// One lecture row together with its exam entries, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LectureResult {
    pub name: String,
    pub exams: Vec<ExamEntry>,
}

/// The full outcome of one session run, consumed by the store and discarded.
pub type ScrapeResult = Vec<LectureResult>;
