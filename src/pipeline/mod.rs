// Batch pipeline: input discovery, cancellation and the end-to-end run.

pub mod analyze;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

pub use analyze::Pipeline;

/// File extensions accepted as input (matched case-insensitively).
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "tiff", "tif", "bmp", "pdf"];

/// Cooperative cancellation shared between the caller and a running batch.
/// Checked before each file starts; work already in flight finishes.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Which kind of input a path is, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Image,
    Pdf,
}

pub fn input_kind(path: &Path) -> Option<InputKind> {
    let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
    if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    Some(if ext == "pdf" {
        InputKind::Pdf
    } else {
        InputKind::Image
    })
}

/// Expand the given paths into the ordered list of supported input files.
///
/// Directories contribute their direct entries sorted by file name (no
/// recursion). Explicit files are kept in the order given. Unsupported
/// files are skipped with a warning.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("Failed to read directory {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && input_kind(p).is_some())
                .collect();
            entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
            inputs.extend(entries);
        } else if input_kind(path).is_some() {
            inputs.push(path.clone());
        } else {
            warn!(file = %path.display(), "Unsupported file type, skipping");
        }
    }
    Ok(inputs)
}
