// Markdown analysis report.
//
// A readable summary of one analysis bundle: what was read and how well,
// which topics to prioritize, which near-duplicates cluster together. Rendering is
// a pure function of the bundle so it can be tested without touching disk.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::models::{AnalysisBundle, ExtractedDocument, LikelihoodCategory, Prediction};

/// OCR confidence at or above this counts as high quality.
pub const HIGH_CONFIDENCE: f64 = 85.0;
/// OCR confidence at or above this (and below HIGH) counts as medium.
pub const MEDIUM_CONFIDENCE: f64 = 70.0;

const MAX_SECONDARY: usize = 10;
const MAX_FALLBACK_PRIORITY: usize = 5;
const MAX_GROUP_MEMBERS_SHOWN: usize = 6;

/// Documents bucketed by OCR confidence: (high, medium, low).
pub fn confidence_buckets(documents: &[ExtractedDocument]) -> (usize, usize, usize) {
    documents.iter().fold((0, 0, 0), |(high, medium, low), doc| {
        if doc.confidence >= HIGH_CONFIDENCE {
            (high + 1, medium, low)
        } else if doc.confidence >= MEDIUM_CONFIDENCE {
            (high, medium + 1, low)
        } else {
            (high, medium, low + 1)
        }
    })
}

/// Render the full report. `generated` is the timestamp line.
pub fn render_report(bundle: &AnalysisBundle, generated: &str) -> String {
    let mut md = String::new();
    let summary = &bundle.summary;

    // writeln! into a String cannot fail
    let _ = writeln!(md, "# Exam Topic Analysis Report\n");
    let _ = writeln!(md, "Generated: {generated}\n");

    let _ = writeln!(md, "## Summary\n");
    let _ = writeln!(md, "| | |");
    let _ = writeln!(md, "|---|---|");
    let _ = writeln!(md, "| Files processed | {} |", summary.total_files);
    let _ = writeln!(md, "| Documents analyzed | {} |", summary.successful_extractions);
    let _ = writeln!(md, "| Unique topics | {} |", summary.unique_topics);
    let _ = writeln!(md, "| Predicted topics | {} |", summary.total_topics);
    let _ = writeln!(
        md,
        "| Repeated topics | {} |",
        bundle.predictions.iter().filter(|p| p.frequency >= 2).count()
    );
    let _ = writeln!(md, "| High-priority topics | {} |\n", summary.high_priority_topics);

    render_quality(&mut md, &bundle.documents);

    if bundle.predictions.is_empty() {
        render_heat_index(&mut md, bundle);
    } else {
        render_predictions(&mut md, &bundle.predictions);
    }

    render_groups(&mut md, bundle);
    render_files(&mut md, &bundle.documents);

    md
}

fn render_quality(md: &mut String, documents: &[ExtractedDocument]) {
    if documents.is_empty() {
        return;
    }
    let avg_confidence =
        documents.iter().map(|d| d.confidence).sum::<f64>() / documents.len() as f64;
    let total_words: usize = documents.iter().map(|d| d.word_count).sum();
    let (high, medium, low) = confidence_buckets(documents);

    let _ = writeln!(md, "## Document Quality\n");
    let _ = writeln!(md, "- Average OCR confidence: {avg_confidence:.1}%");
    let _ = writeln!(md, "- Total words processed: {total_words}");
    let _ = writeln!(
        md,
        "- Average words per document: {}",
        total_words / documents.len()
    );
    let _ = writeln!(md, "- High confidence (>= 85%): {high} documents");
    let _ = writeln!(md, "- Medium confidence (70-84%): {medium} documents");
    let _ = writeln!(md, "- Low confidence (< 70%): {low} documents\n");
    if low > 0 {
        let _ = writeln!(
            md,
            "> {low} document(s) had low OCR confidence. Re-scanning them may improve results.\n"
        );
    }
}

fn render_predictions(md: &mut String, predictions: &[Prediction]) {
    let priority: Vec<&Prediction> = predictions
        .iter()
        .filter(|p| p.likelihood_category.is_high_priority())
        .collect();

    let _ = writeln!(md, "## Priority Topics\n");
    if priority.is_empty() {
        let _ = writeln!(
            md,
            "No topic met the high-priority threshold. Highest scoring topics:\n"
        );
        for (i, p) in predictions.iter().take(MAX_FALLBACK_PRIORITY).enumerate() {
            let _ = writeln!(
                md,
                "{}. **{}** (score {:.2}), {} time(s) in {} document(s)",
                i + 1,
                p.topic.display_name(),
                p.likelihood_score,
                p.frequency,
                p.document_count
            );
        }
        md.push('\n');
    } else {
        let _ = writeln!(
            md,
            "| # | Topic | Likelihood | Score | Frequency | Documents | Coverage | Sources |"
        );
        let _ = writeln!(md, "|---|---|---|---|---|---|---|---|");
        for (i, p) in priority.iter().enumerate() {
            let _ = writeln!(
                md,
                "| {} | {} | {} | {:.2} | {} | {} | {:.1}% | {} |",
                i + 1,
                p.topic.display_name(),
                p.likelihood_category,
                p.likelihood_score,
                p.frequency,
                p.document_count,
                p.coverage_percentage,
                p.sources.join(", ")
            );
        }
        md.push('\n');
    }

    let secondary: Vec<&Prediction> = predictions
        .iter()
        .filter(|p| p.likelihood_category == LikelihoodCategory::Medium)
        .take(MAX_SECONDARY)
        .collect();
    if !secondary.is_empty() {
        let _ = writeln!(md, "## Secondary Topics\n");
        for (i, p) in secondary.iter().enumerate() {
            let _ = writeln!(
                md,
                "{}. {} (score {:.2}), {} time(s) in {} document(s)",
                i + 1,
                p.topic.display_name(),
                p.likelihood_score,
                p.frequency,
                p.document_count
            );
        }
        md.push('\n');
    }
}

fn render_heat_index(md: &mut String, bundle: &AnalysisBundle) {
    if bundle.heat_index.is_empty() {
        return;
    }
    let _ = writeln!(md, "## Topic Heat Index\n");
    let _ = writeln!(
        md,
        "No topic repeated often enough to predict. All identified topics:\n"
    );
    let _ = writeln!(md, "| # | Topic | Mentions | Heat |");
    let _ = writeln!(md, "|---|---|---|---|");
    for (i, entry) in bundle.heat_index.iter().enumerate() {
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} |",
            i + 1,
            entry.topic.display_name(),
            entry.mentions,
            "*".repeat(entry.heat as usize)
        );
    }
    md.push('\n');
}

fn render_groups(md: &mut String, bundle: &AnalysisBundle) {
    if bundle.semantic_groups.is_empty() {
        return;
    }
    let _ = writeln!(md, "## Related Topic Groups\n");
    for (i, group) in bundle.semantic_groups.iter().enumerate() {
        let _ = writeln!(
            md,
            "{}. {} topics, average similarity {:.2}",
            i + 1,
            group.size,
            group.avg_similarity
        );
        for member in group.members.iter().take(MAX_GROUP_MEMBERS_SHOWN) {
            let _ = writeln!(
                md,
                "   - {} ({})",
                member.topic.display_name(),
                member.source.filename
            );
        }
        if group.members.len() > MAX_GROUP_MEMBERS_SHOWN {
            let _ = writeln!(
                md,
                "   - ... and {} more",
                group.members.len() - MAX_GROUP_MEMBERS_SHOWN
            );
        }
    }
    md.push('\n');
}

fn render_files(md: &mut String, documents: &[ExtractedDocument]) {
    let _ = writeln!(md, "## Processed Files\n");
    let _ = writeln!(md, "| File | Date | Confidence | Words | Method |");
    let _ = writeln!(md, "|---|---|---|---|---|");
    for doc in documents {
        let _ = writeln!(
            md,
            "| {} | {} | {:.1}% | {} | {} |",
            doc.filename, doc.date, doc.confidence, doc.word_count, doc.method
        );
    }
}

/// Write `reports/analysis_report.md` under `output_dir`.
pub fn write_report(bundle: &AnalysisBundle, output_dir: &Path) -> Result<PathBuf> {
    let dir = output_dir.join("reports");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join("analysis_report.md");
    let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    std::fs::write(&path, render_report(bundle, &generated))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
