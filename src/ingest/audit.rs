// Per-document audit text: what was read, from where, and how well.

use crate::models::ExtractedDocument;

const RULE_WIDTH: usize = 50;

/// Header plus extracted text, ready to be written next to the analysis.
pub fn audit_text(doc: &ExtractedDocument) -> String {
    format!(
        "Source: {}\nDate: {}\nConfidence: {:.1}%\nMethod: {}\n{}\n\n{}",
        doc.path.display(),
        doc.date.format("%Y-%m-%d"),
        doc.confidence,
        doc.method,
        "=".repeat(RULE_WIDTH),
        doc.text
    )
}

/// File name for a document's audit text: every character outside
/// `[A-Za-z0-9_.-]` becomes `_`, then `.txt` is appended.
pub fn audit_file_name(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{safe}.txt")
}
