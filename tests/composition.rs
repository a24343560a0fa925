// Composition tests: verifying that the stages chain together correctly.
//
// These tests exercise the data flow between modules:
//   PDFs -> page images -> OCR -> documents -> topics -> frequency -> predictions
//   -> report and artifacts
// with a scripted OCR engine, a recording PDF renderer and no external tools. Everything is written
// under a temporary directory.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use image::{GrayImage, Luma};

use pastpaper::config::Config;
use pastpaper::error::AnalysisError;
use pastpaper::models::{ExtractedDocument, LikelihoodCategory};
use pastpaper::ocr::{OcrEngine, OcrOutput, OcrWord, PdfRenderer};
use pastpaper::output::{artifacts, markdown};
use pastpaper::pipeline::{CancelFlag, Pipeline};

/// Returns the scripted text for whichever page a staged variant came from.
struct PageTextEngine {
    pages: Vec<(String, String)>,
}

#[async_trait]
impl OcrEngine for PageTextEngine {
    async fn recognize(&self, image: &Path, _layout_mode: u8) -> Result<OcrOutput, AnalysisError> {
        let name = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (_, text) = self
            .pages
            .iter()
            .find(|(stem, _)| name.starts_with(&format!("{stem}_")))
            .ok_or_else(|| AnalysisError::ocr_attempt("scripted", "unknown page"))?;
        Ok(OcrOutput {
            text: text.clone(),
            words: text
                .split_whitespace()
                .map(|w| OcrWord {
                    text: w.to_string(),
                    confidence: 91.0,
                })
                .collect(),
        })
    }
}

/// Renders every PDF as one page image and records each call's target
/// directory.
#[derive(Default)]
struct RecordingRenderer {
    out_dirs: Mutex<Vec<PathBuf>>,
}

impl RecordingRenderer {
    fn out_dirs(&self) -> Vec<PathBuf> {
        self.out_dirs.lock().unwrap().clone()
    }
}

#[async_trait]
impl PdfRenderer for RecordingRenderer {
    async fn render(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
        self.out_dirs.lock().unwrap().push(out_dir.to_path_buf());
        let stem = pdf.file_stem().unwrap().to_string_lossy().into_owned();
        let page = out_dir.join(format!("{stem}_page_1.png"));
        page_image().save(&page).unwrap();
        Ok(vec![page])
    }
}

const PAGES: [(&str, &str); 4] = [
    (
        "stats_2019",
        "Normal Distribution.\n\
         Q2. Compute the Pearson correlation coefficient for the paired heights and weights below.",
    ),
    (
        "stats_2020",
        "Normal Distribution.\n\
         Q2. Construct a Latin Square Design for five fertilizer treatments on wheat plots.",
    ),
    (
        "stats_2021",
        "Normal Distribution.\n\
         Q2. Describe the Kruskal Wallis procedure for comparing several independent groups.",
    ),
    (
        "stats_2022",
        "Q1. Explain Markov Chain transition matrices and stationary behaviour with an example.",
    ),
];

fn page_image() -> GrayImage {
    let mut img = GrayImage::from_pixel(600, 800, Luma([240]));
    for y in 200..230 {
        for x in 40..560 {
            img.put_pixel(x, y, Luma([15]));
        }
    }
    img
}

fn write_pages(dir: &Path) {
    for (stem, _) in PAGES {
        page_image().save(dir.join(format!("{stem}.png"))).unwrap();
    }
}

fn pipeline(output_dir: &Path, pages: &[(&str, &str)]) -> Pipeline {
    pipeline_with(output_dir, pages, Arc::new(RecordingRenderer::default()))
}

fn pipeline_with(
    output_dir: &Path,
    pages: &[(&str, &str)],
    renderer: Arc<dyn PdfRenderer>,
) -> Pipeline {
    let config = Config {
        output_dir: output_dir.to_path_buf(),
        concurrency: 2,
        ..Config::default()
    };
    let engine = Arc::new(PageTextEngine {
        pages: pages
            .iter()
            .map(|(s, t)| (s.to_string(), t.to_string()))
            .collect(),
    });
    Pipeline::from_config(&config, engine, renderer)
        .unwrap()
        .with_progress(false)
}

// ============================================================
// Chain: images -> OCR -> topics -> predictions
// ============================================================

#[tokio::test]
async fn topic_in_three_of_four_papers_is_very_high() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_pages(input.path());

    let bundle = pipeline(output.path(), &PAGES)
        .run(&[input.path().to_path_buf()], &CancelFlag::new())
        .await
        .unwrap()
        .expect("analysis should produce data");

    assert_eq!(bundle.summary.total_files, 4);
    assert_eq!(bundle.summary.successful_extractions, 4);
    let files: Vec<&str> = bundle.documents.iter().map(|d| d.filename.as_str()).collect();
    assert_eq!(
        files,
        vec!["stats_2019.png", "stats_2020.png", "stats_2021.png", "stats_2022.png"]
    );

    let top = &bundle.predictions[0];
    assert_eq!(top.topic.as_str(), "distribution normal");
    assert_eq!(top.frequency, 3);
    assert_eq!(top.document_count, 3);
    assert!((top.coverage_percentage - 75.0).abs() < 1e-9);
    assert_eq!(top.likelihood_category, LikelihoodCategory::VeryHigh);
    assert_eq!(
        top.sources,
        vec!["stats_2019.png", "stats_2020.png", "stats_2021.png"]
    );
    assert!(bundle.summary.high_priority_topics >= 1);
}

#[tokio::test]
async fn unreadable_batch_has_no_data() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_pages(input.path());

    // Engine knows none of the pages, so every file fails OCR
    let result = pipeline(output.path(), &[])
        .run(&[input.path().to_path_buf()], &CancelFlag::new())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn empty_input_directory_has_no_data() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let result = pipeline(output.path(), &PAGES)
        .run(&[input.path().to_path_buf()], &CancelFlag::new())
        .await
        .unwrap();
    assert!(result.is_none());
}

// ============================================================
// Chain: PDFs -> rendered pages -> OCR
// ============================================================

const EXAM_TEXT: &str = "Normal Distribution.\n\
     Q2. Compute the Pearson correlation coefficient for the paired heights and weights below.";

#[tokio::test]
async fn pdf_pages_are_ingested_and_cleaned_up() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    std::fs::write(input.path().join("exam_2021-06-01.pdf"), b"").unwrap();

    let renderer = Arc::new(RecordingRenderer::default());
    let bundle = pipeline_with(output.path(), &[("exam_2021-06-01", EXAM_TEXT)], renderer.clone())
        .run(&[input.path().to_path_buf()], &CancelFlag::new())
        .await
        .unwrap()
        .expect("rendered pages should produce data");

    assert_eq!(bundle.documents.len(), 1);
    let doc = &bundle.documents[0];
    assert_eq!(doc.filename, "exam_2021-06-01_page_1.png");
    assert_eq!(doc.date, NaiveDate::from_ymd_opt(2021, 6, 1).unwrap());

    let out_dirs = renderer.out_dirs();
    assert_eq!(out_dirs.len(), 1);
    assert!(!out_dirs[0].exists(), "page directory should be removed after the run");
}

#[tokio::test]
async fn pdfs_with_the_same_stem_keep_their_own_pages() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let a = first.path().join("exam.pdf");
    let b = second.path().join("exam.pdf");
    std::fs::write(&a, b"").unwrap();
    std::fs::write(&b, b"").unwrap();

    let renderer = Arc::new(RecordingRenderer::default());
    let bundle = pipeline_with(output.path(), &[("exam", EXAM_TEXT)], renderer.clone())
        .run(&[a, b], &CancelFlag::new())
        .await
        .unwrap()
        .expect("both PDFs should produce data");

    let out_dirs = renderer.out_dirs();
    assert_eq!(out_dirs.len(), 2);
    assert_ne!(out_dirs[0], out_dirs[1]);
    assert_eq!(bundle.documents.len(), 2);
    assert_ne!(bundle.documents[0].path, bundle.documents[1].path);
}

#[tokio::test]
async fn cancelled_run_renders_no_pdfs() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    std::fs::write(input.path().join("exam.pdf"), b"").unwrap();

    let cancel = CancelFlag::new();
    cancel.cancel();
    let renderer = Arc::new(RecordingRenderer::default());
    let result = pipeline_with(output.path(), &[("exam", EXAM_TEXT)], renderer.clone())
        .run(&[input.path().to_path_buf()], &cancel)
        .await
        .unwrap();

    assert!(result.is_none());
    assert!(renderer.out_dirs().is_empty());
}

// ============================================================
// Chain: documents -> bundle -> report and artifacts
// ============================================================

fn doc(name: &str, text: &str) -> ExtractedDocument {
    ExtractedDocument::new(
        PathBuf::from(format!("/scans/{name}")),
        NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
        text.to_string(),
        64.0,
        "otsu_psm3".to_string(),
    )
}

#[test]
fn single_mentions_rank_with_keyword_bonus() {
    let output = tempfile::tempdir().unwrap();
    let documents = vec![
        doc("a.png", "Explain the Bubble Sort Algorithm with a worked example of ten numbers."),
        doc("b.png", "Discuss Hypothesis Testing using the paired samples of student marks today."),
    ];
    let bundle = pipeline(output.path(), &PAGES)
        .analyze_documents(documents, 2)
        .expect("topics should be found");

    // Nothing repeats, but academic phrases still qualify on one mention
    assert!(!bundle.predictions.is_empty());
    assert!(bundle.predictions.iter().all(|p| p.frequency == 1));
    assert_eq!(bundle.summary.total_topics, bundle.predictions.len());
    assert!(bundle.summary.unique_topics >= bundle.summary.total_topics);
    assert!(bundle.heat_index.iter().all(|h| h.heat == 1));
    assert!(bundle.semantic_groups.len() <= 10);
}

#[test]
fn artifacts_and_report_written() {
    let output = tempfile::tempdir().unwrap();
    let documents = vec![
        doc("paper one.png", "Normal Distribution.\nState the properties of the Normal Distribution curve today."),
        doc("paper two.png", "Normal Distribution.\nFit a Poisson Regression model to the accident counts here."),
    ];
    let bundle = pipeline(output.path(), &PAGES)
        .analyze_documents(documents, 2)
        .expect("topics should be found");

    let written = artifacts::write_audit_texts(&bundle.documents, output.path()).unwrap();
    assert_eq!(written, 2);
    let audit = std::fs::read_to_string(output.path().join("extracted_texts/paper_one.png.txt")).unwrap();
    assert!(audit.starts_with("Source: /scans/paper one.png\nDate: 2020-03-01\nConfidence: 64.0%"));

    let json_path = artifacts::write_bundle_json(&bundle, output.path()).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
    assert_eq!(json["summary"]["successful_extractions"], 2);

    let report = markdown::write_report(&bundle, output.path()).unwrap();
    assert!(report.ends_with("reports/analysis_report.md"));
    let md = std::fs::read_to_string(report).unwrap();
    assert!(md.contains("Distribution Normal"));
    assert!(md.contains("Low confidence (< 70%): 2 documents"));
}
