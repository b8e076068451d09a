//! Report exports: outstanding dues and patient statements.

mod due_report;
mod statement;

pub use due_report::*;
pub use statement::*;

/// Escape a string for CSV output.
pub(crate) fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
