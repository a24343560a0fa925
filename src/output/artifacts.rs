// On-disk artifacts of a run: one audit text per document and the bundle
// as JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::ingest::audit::{audit_file_name, audit_text};
use crate::models::{AnalysisBundle, ExtractedDocument};

/// Write `extracted_texts/<sanitized name>.txt` for each document. Returns
/// how many were written; individual failures are logged and skipped.
pub fn write_audit_texts(documents: &[ExtractedDocument], output_dir: &Path) -> Result<usize> {
    let dir = output_dir.join("extracted_texts");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = 0;
    for doc in documents {
        let path = dir.join(audit_file_name(&doc.filename));
        match std::fs::write(&path, audit_text(doc)) {
            Ok(()) => written += 1,
            Err(e) => warn!(file = %path.display(), error = %e, "Failed to write audit text"),
        }
    }
    Ok(written)
}

/// Write the bundle to `analysis.json`.
pub fn write_bundle_json(bundle: &AnalysisBundle, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let path = output_dir.join("analysis.json");
    let json = serde_json::to_string_pretty(bundle).context("Failed to serialize analysis")?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
