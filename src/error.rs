// Error taxonomy for the extraction pipeline.
//
// None of these abort a batch on their own. A failed image, OCR attempt or
// PDF is logged and skipped; a failed vectorization only empties the semantic
// groups. Orchestration code wraps these in anyhow with context.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The source image could not be opened or decoded. Fatal for that file only.
    #[error("could not load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// One preprocessing variant / layout mode combination failed.
    #[error("OCR attempt {method} failed: {reason}")]
    OcrAttempt { method: String, reason: String },

    /// The OCR engine binary is missing altogether.
    #[error("OCR engine not available: {0}")]
    OcrUnavailable(String),

    /// A PDF could not be rendered to page images.
    #[error("could not convert PDF {path}: {reason}")]
    PdfConversion { path: PathBuf, reason: String },

    /// TF-IDF vectorization produced nothing usable (e.g. empty vocabulary).
    #[error("vectorization failed: {0}")]
    Vectorization(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    pub fn ocr_attempt(method: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::OcrAttempt {
            method: method.into(),
            reason: reason.into(),
        }
    }
}
