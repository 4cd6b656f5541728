// src/reports/csv.rs

use chrono::NaiveDate;

use crate::models::quiz_result::QuizResult;

pub const CSV_HEADER: &str =
    "Rank,Team Name,College,Score (%),Correct Answers,Total Questions,Time Taken";

/// Renders ranked results as CSV, one line per result.
///
/// Team and college are always quoted since both commonly contain commas.
pub fn results_csv(results: &[QuizResult]) -> String {
    let mut out = String::from(CSV_HEADER);
    for r in results {
        out.push('\n');
        out.push_str(&format!(
            "{},{},{},{:.1}%,{},{},{}",
            r.rank,
            quoted(&r.team),
            quoted(&r.college),
            r.score,
            r.correct,
            r.total,
            r.time_taken
        ));
    }
    out
}

/// `quiz_results_<YYYY-MM-DD>.csv`
pub fn export_filename(date: NaiveDate) -> String {
    format!("quiz_results_{}.csv", date.format("%Y-%m-%d"))
}

fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
