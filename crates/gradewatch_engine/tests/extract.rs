use gradewatch_engine::{extract_results, ExtractError};
use pretty_assertions::assert_eq;

fn lecture_row(name: &str, date: &str) -> String {
    format!("<tr class=\"lecture-row\"><td>{name}</td><td>{date}</td></tr>")
}

fn surveyed_row(name: &str, date: &str) -> String {
    format!("<tr class=\"lecture-row survey\"><td>{name}</td><td>{date}</td></tr>")
}

fn detail_block(entries: &[(&str, &str, &str)]) -> String {
    let rows: String = entries
        .iter()
        .map(|(name, percentage, date)| {
            format!(
                "<tr class=\"exam-entry\"><td>{name}</td><td>{percentage}</td><td>{date}</td></tr>"
            )
        })
        .collect();
    format!("<tr class=\"exam-detail\"><td><table><tbody>{rows}</tbody></table></td></tr>")
}

fn grid(rows: &[String]) -> String {
    format!(
        "<table id=\"resultsGrid\"><tbody>{}</tbody></table>",
        rows.concat()
    )
}

#[test]
fn aligned_grid_with_one_surveyed_lecture() {
    let html = grid(&[
        lecture_row("Algorithms", "2024-03-01"),
        lecture_row("Operating Systems", "2024-03-02"),
        surveyed_row("Seminar", "2024-04-15"),
        lecture_row("Databases", "2024-03-03"),
        lecture_row("Networks", "2024-03-04"),
        detail_block(&[
            ("Midterm", "40%", "2024-03-01"),
            ("Final", "60%", "2024-06-01"),
        ]),
        detail_block(&[("Final", "100%", "2024-06-02")]),
        detail_block(&[("Midterm", "50%", "2024-03-03")]),
        detail_block(&[("Quiz", "10%", "2024-03-04")]),
    ]);

    let results = extract_results(&html).unwrap();

    assert_eq!(results.len(), 5);
    assert_eq!(results[0].name, "Algorithms");
    assert_eq!(results[0].exams.len(), 2);
    assert_eq!(results[0].exams[0].name, "Midterm");
    assert_eq!(results[0].exams[0].percentage, "40%");

    // The surveyed lecture gets its single synthesized entry.
    assert_eq!(results[2].name, "Seminar");
    assert_eq!(results[2].exams.len(), 1);
    assert_eq!(results[2].exams[0].name, "Letter Grade");
    assert_eq!(results[2].exams[0].percentage, "100%");
    assert_eq!(results[2].exams[0].date, "2024-04-15");

    // Rows after the surveyed one read the shifted detail blocks.
    assert_eq!(results[3].name, "Databases");
    assert_eq!(results[3].exams[0].name, "Midterm");
    assert_eq!(results[4].name, "Networks");
    assert_eq!(results[4].exams[0].name, "Quiz");
}

#[test]
fn short_detail_collection_fails_the_invariant() {
    let html = grid(&[
        lecture_row("Algorithms", "2024-03-01"),
        lecture_row("Operating Systems", "2024-03-02"),
        surveyed_row("Seminar", "2024-04-15"),
        lecture_row("Databases", "2024-03-03"),
        lecture_row("Networks", "2024-03-04"),
        detail_block(&[("Midterm", "40%", "2024-03-01")]),
        detail_block(&[("Final", "100%", "2024-06-02")]),
        detail_block(&[("Midterm", "50%", "2024-03-03")]),
    ]);

    let err = extract_results(&html).unwrap_err();
    assert_eq!(
        err,
        ExtractError::RowMismatch {
            primary: 5,
            surveyed: 1,
            detail: 3,
        }
    );
}

#[test]
fn empty_grid_extracts_nothing() {
    let results = extract_results(&grid(&[])).unwrap();
    assert!(results.is_empty());
}

#[test]
fn exam_row_with_missing_cells_is_malformed() {
    let html = grid(&[
        lecture_row("Algorithms", "2024-03-01"),
        "<tr class=\"exam-detail\"><td><table><tbody>\
         <tr class=\"exam-entry\"><td>Midterm</td><td>40%</td></tr>\
         </tbody></table></td></tr>"
            .to_string(),
    ]);

    let err = extract_results(&html).unwrap_err();
    assert_eq!(err, ExtractError::MalformedRow("exam"));
}

#[test]
fn lecture_without_name_cell_is_malformed() {
    let html = grid(&[
        "<tr class=\"lecture-row\"></tr>".to_string(),
        detail_block(&[("Midterm", "40%", "2024-03-01")]),
    ]);

    let err = extract_results(&html).unwrap_err();
    assert_eq!(err, ExtractError::MalformedRow("lecture"));
}
