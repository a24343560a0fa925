// End-to-end analysis of a batch of exam papers.
//
// Stages:
//   1. expand inputs, render PDFs to page images (batch-scoped temp dir)
//   2. OCR every page with bounded concurrency (order preserved)
//   3. join barrier: wait for all documents
//   4. mine topics per document, then aggregate, score and group
//
// Only steps 1-2 touch the outside world; step 4 is a pure function of the
// documents and can be run on its own.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use super::{collect_inputs, input_kind, CancelFlag, InputKind};
use crate::config::Config;
use crate::ingest::{DateExtractor, DocumentIngester};
use crate::models::{AnalysisBundle, AnalysisSummary, ExtractedDocument, TopicOccurrence};
use crate::ocr::{ImagePreprocessor, OcrEngine, OcrExtractor, PageDirectory, PdfRenderer};
use crate::scoring::heat::heat_index;
use crate::scoring::{FrequencyAnalyzer, PredictionScorer};
use crate::topics::semantic::SemanticGrouper;
use crate::topics::tfidf::TfIdfVectorizer;
use crate::topics::{AcademicVocabulary, PhraseMiner, TopicExtractor};

pub struct Pipeline {
    ingester: DocumentIngester,
    renderer: Arc<dyn PdfRenderer>,
    topics: Box<dyn TopicExtractor>,
    vocabulary: AcademicVocabulary,
    grouper: SemanticGrouper,
    concurrency: usize,
    output_dir: PathBuf,
    show_progress: bool,
}

impl Pipeline {
    /// Wire up the default components from configuration. The OCR engine
    /// and PDF renderer are injected so tests can script them.
    pub fn from_config(
        config: &Config,
        engine: Arc<dyn OcrEngine>,
        renderer: Arc<dyn PdfRenderer>,
    ) -> Result<Self> {
        config.validate()?;
        let vocabulary = config.vocabulary()?;

        let preprocessor = if config.debug {
            ImagePreprocessor::with_debug_dir(config.debug_image_dir())
        } else {
            ImagePreprocessor::new()
        };
        let dates = DateExtractor::new(config.date_order).context("Invalid date pattern")?;
        let ingester = DocumentIngester::new(OcrExtractor::new(engine, preprocessor), dates);

        let miner = PhraseMiner::new(vocabulary.clone(), config.use_lemmatization)?;
        let grouper = SemanticGrouper::new(
            config.similarity_threshold,
            TfIdfVectorizer::for_vocabulary(&vocabulary)?,
        );

        Ok(Self {
            ingester,
            renderer,
            topics: Box::new(miner),
            vocabulary,
            grouper,
            concurrency: config.concurrency,
            output_dir: config.output_dir.clone(),
            show_progress: !config.verbose,
        })
    }

    /// Show or hide the progress bar.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run the whole batch. `Ok(None)` means no data: no supported inputs,
    /// no usable documents, or no topics.
    pub async fn run(&self, inputs: &[PathBuf], cancel: &CancelFlag) -> Result<Option<AnalysisBundle>> {
        let files = collect_inputs(inputs)?;
        if files.is_empty() {
            warn!("No supported input files found");
            return Ok(None);
        }

        // Rendered pages live until this guard drops at the end of the run
        let pages = if files.iter().any(|f| input_kind(f) == Some(InputKind::Pdf)) {
            Some(PageDirectory::new().context("Failed to create page directory")?)
        } else {
            None
        };

        let mut images = Vec::with_capacity(files.len());
        for (index, file) in files.iter().enumerate() {
            match (input_kind(file), &pages) {
                (Some(InputKind::Pdf), Some(pages)) => {
                    if cancel.is_cancelled() {
                        debug!(file = %file.display(), "Cancelled; not rendering PDF");
                        continue;
                    }
                    // One directory per PDF so equal stems cannot collide
                    let out_dir = pages.path().join(format!("pdf_{index}"));
                    if let Err(e) = std::fs::create_dir(&out_dir) {
                        warn!(file = %file.display(), error = %e, "Skipping PDF");
                        continue;
                    }
                    match self.renderer.render(file, &out_dir).await {
                        Ok(rendered) => images.extend(rendered),
                        Err(e) => warn!(file = %file.display(), error = %e, "Skipping PDF"),
                    }
                }
                _ => images.push(file.clone()),
            }
        }

        info!(inputs = files.len(), pages = images.len(), "Starting OCR");
        let progress = self.progress_bar(images.len());
        let documents = self
            .ingester
            .ingest_all(&images, self.concurrency, cancel, &progress)
            .await;
        progress.finish_and_clear();

        if cancel.is_cancelled() {
            warn!(
                documents = documents.len(),
                "Cancelled; analyzing documents extracted so far"
            );
        }

        Ok(self.analyze_documents(documents, images.len()))
    }

    /// Aggregate already-extracted documents into the analysis bundle.
    pub fn analyze_documents(
        &self,
        documents: Vec<ExtractedDocument>,
        total_files: usize,
    ) -> Option<AnalysisBundle> {
        if documents.is_empty() {
            warn!("No documents with enough text to analyze");
            return None;
        }

        let occurrences: Vec<TopicOccurrence> = documents
            .iter()
            .flat_map(|doc| {
                let source = doc.source();
                self.topics
                    .extract(&doc.text)
                    .into_iter()
                    .map(move |topic| TopicOccurrence {
                        topic,
                        source: source.clone(),
                    })
            })
            .collect();

        if occurrences.is_empty() {
            warn!(documents = documents.len(), "No topics found in any document");
            return None;
        }

        let n = documents.len();
        let report = FrequencyAnalyzer::new(self.vocabulary.keywords.clone()).analyze(&occurrences, n);
        let predictions = PredictionScorer::new(self.vocabulary.keywords.clone()).score(&report);
        let heat = heat_index(&report);
        let semantic_groups = self.grouper.group(&occurrences, n);

        let summary = AnalysisSummary {
            total_files,
            successful_extractions: n,
            total_topics: predictions.len(),
            unique_topics: report.unique_topics.len(),
            high_priority_topics: predictions
                .iter()
                .filter(|p| p.likelihood_category.is_high_priority())
                .count(),
            output_directory: self.output_dir.clone(),
        };

        info!(
            documents = n,
            topics = summary.unique_topics,
            predictions = summary.total_topics,
            high_priority = summary.high_priority_topics,
            groups = semantic_groups.len(),
            "Analysis complete"
        );

        Some(AnalysisBundle {
            documents,
            predictions,
            topic_stats: report.repeated,
            semantic_groups,
            heat_index: heat,
            summary,
        })
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("  OCR [{bar:30}] {pos}/{len} ({eta})") {
            pb.set_style(style);
        }
        pb
    }
}
