// Document ingestion: page images in, dated text records out.
//
// Each file goes through OCR, is discarded if it yields fewer than ten
// words, and otherwise gets a date from its file name. Files are processed
// with bounded concurrency but results keep input order, so everything
// downstream is deterministic.

pub mod audit;
pub mod date;

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::error::AnalysisError;
use crate::models::ExtractedDocument;
use crate::ocr::OcrExtractor;
use crate::pipeline::CancelFlag;

pub use date::{DateExtractor, DateOrder};

/// Documents with fewer words than this are dropped.
pub const MIN_DOCUMENT_WORDS: usize = 10;

pub struct DocumentIngester {
    extractor: OcrExtractor,
    dates: DateExtractor,
}

impl DocumentIngester {
    pub fn new(extractor: OcrExtractor, dates: DateExtractor) -> Self {
        Self { extractor, dates }
    }

    /// OCR one page image. `Ok(None)` when the text is too thin to use.
    ///
    /// The date comes from the file name; rendered PDF pages carry the
    /// PDF's stem, so they inherit its date.
    pub async fn ingest_file(&self, path: &Path) -> Result<Option<ExtractedDocument>, AnalysisError> {
        let result = self.extractor.extract(path).await?;

        let words = result.text.split_whitespace().count();
        if result.text.trim().is_empty() || words < MIN_DOCUMENT_WORDS {
            debug!(
                file = %path.display(),
                words,
                method = %result.method,
                "Discarding document with too little text"
            );
            return Ok(None);
        }

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let date = self.dates.extract_or_today(&filename);

        let doc = ExtractedDocument::new(
            path.to_path_buf(),
            date,
            result.text,
            result.confidence,
            result.method,
        );
        debug!(
            file = %doc.filename,
            words = doc.word_count,
            confidence = doc.confidence,
            "Extracted document"
        );
        Ok(Some(doc))
    }

    /// Ingest a batch, at most `concurrency` files in flight, preserving
    /// input order. Failed and thin files are logged and skipped. Files not
    /// yet started when `cancel` is set are skipped as well.
    pub async fn ingest_all(
        &self,
        paths: &[PathBuf],
        concurrency: usize,
        cancel: &CancelFlag,
        progress: &ProgressBar,
    ) -> Vec<ExtractedDocument> {
        let results: Vec<Option<ExtractedDocument>> = stream::iter(paths.iter().map(|path| async move {
            if cancel.is_cancelled() {
                debug!(file = %path.display(), "Cancelled before start, skipping");
                progress.inc(1);
                return None;
            }
            let outcome = match self.ingest_file(path).await {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Failed to process file, skipping");
                    None
                }
            };
            progress.inc(1);
            outcome
        }))
        .buffered(concurrency.max(1))
        .collect()
        .await;

        let documents: Vec<ExtractedDocument> = results.into_iter().flatten().collect();
        info!(
            files = paths.len(),
            documents = documents.len(),
            "Ingestion complete"
        );
        documents
    }
}
