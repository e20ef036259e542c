use gradewatch_core::{
    ExamEntry, LectureResult, ScrapeResult, SURVEY_EXAM_NAME, SURVEY_EXAM_PERCENTAGE,
};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

// Markup assumptions about the supported portal's results grid. The grid
// holds one `lecture-row` per lecture (class `survey` marks pass/fail
// survey grading) and one `exam-detail` block per non-surveyed lecture,
// in the same order. The index alignment between the two collections is
// tuned against this layout and is not expected to generalize.
const PRIMARY_ROW: &str = "tr.lecture-row";
const DETAIL_BLOCK: &str = "tr.exam-detail";
const DETAIL_ENTRY: &str = "tr.exam-entry";
const SURVEY_CLASS: &str = "survey";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("row mismatch: {primary} primary rows, {surveyed} surveyed, {detail} detail blocks")]
    RowMismatch {
        primary: usize,
        surveyed: usize,
        detail: usize,
    },
    #[error("malformed {0} row")]
    MalformedRow(&'static str),
    #[error("bad selector: {0}")]
    BadSelector(&'static str),
}

/// Parses the results grid into the lecture/exam hierarchy, preserving
/// source row order.
///
/// A surveyed lecture has no detail block; a single "Letter Grade" entry
/// with full weight is synthesized from the primary row. A non-surveyed
/// lecture reads its detail block, offset by the number of surveyed rows
/// seen so far.
pub fn extract_results(html: &str) -> Result<ScrapeResult, ExtractError> {
    let doc = Html::parse_document(html);
    let primary_sel = selector(PRIMARY_ROW)?;
    let detail_sel = selector(DETAIL_BLOCK)?;
    let entry_sel = selector(DETAIL_ENTRY)?;
    let cell_sel = selector("td")?;

    let primary_rows: Vec<ElementRef<'_>> = doc.select(&primary_sel).collect();
    let detail_blocks: Vec<ElementRef<'_>> = doc.select(&detail_sel).collect();
    let surveyed = primary_rows.iter().filter(|row| is_surveyed(row)).count();

    if primary_rows.len() - surveyed != detail_blocks.len() {
        return Err(ExtractError::RowMismatch {
            primary: primary_rows.len(),
            surveyed,
            detail: detail_blocks.len(),
        });
    }

    let mut results = Vec::with_capacity(primary_rows.len());
    let mut surveyed_seen = 0usize;
    for (index, row) in primary_rows.iter().enumerate() {
        let cells = cell_texts(*row, &cell_sel);
        let name = cells
            .first()
            .filter(|name| !name.is_empty())
            .cloned()
            .ok_or(ExtractError::MalformedRow("lecture"))?;

        if is_surveyed(row) {
            surveyed_seen += 1;
            let date = cells
                .get(1)
                .cloned()
                .ok_or(ExtractError::MalformedRow("lecture"))?;
            results.push(LectureResult {
                name,
                exams: vec![ExamEntry {
                    name: SURVEY_EXAM_NAME.to_string(),
                    percentage: SURVEY_EXAM_PERCENTAGE.to_string(),
                    date,
                }],
            });
        } else {
            let block = detail_blocks
                .get(index - surveyed_seen)
                .ok_or(ExtractError::MalformedRow("detail"))?;
            let mut exams = Vec::new();
            for entry in block.select(&entry_sel) {
                let cells = cell_texts(entry, &cell_sel);
                match cells.as_slice() {
                    [name, percentage, date, ..] => exams.push(ExamEntry {
                        name: name.clone(),
                        percentage: percentage.clone(),
                        date: date.clone(),
                    }),
                    _ => return Err(ExtractError::MalformedRow("exam")),
                }
            }
            results.push(LectureResult { name, exams });
        }
    }

    Ok(results)
}

fn selector(css: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::BadSelector(css))
}

fn cell_texts(row: ElementRef<'_>, cell_sel: &Selector) -> Vec<String> {
    row.select(cell_sel)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

fn is_surveyed(row: &ElementRef<'_>) -> bool {
    row.value().classes().any(|class| class == SURVEY_CLASS)
}
