// Data models: the types that flow through the analysis pipeline.
//
// Kept separate from the modules that produce them so output code and
// callers can depend on the shapes without pulling in OCR or scoring.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A canonical topic phrase.
///
/// Equality is equality of the normalized form, so every raw variant that
/// normalizes to the same string is the same topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Wrap an already-normalized phrase.
    pub fn new(canonical: impl Into<String>) -> Self {
        Topic(canonical.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn word_count(&self) -> usize {
        self.0.split_whitespace().count()
    }

    /// True if any of the given keywords occurs as a substring of the topic.
    pub fn mentions_any(&self, keywords: &[String]) -> bool {
        keywords.iter().any(|k| self.0.contains(k.as_str()))
    }

    /// Title-cased form for human-facing output ("normal distribution" ->
    /// "Normal Distribution").
    pub fn display_name(&self) -> String {
        self.0
            .split_whitespace()
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text pulled out of one page image, plus what we know about it.
/// Immutable once built by the ingester.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub filename: String,
    pub path: PathBuf,
    pub date: NaiveDate,
    pub text: String,
    /// Mean OCR confidence of the winning attempt, 0-100
    pub confidence: f64,
    /// Winning preprocessing variant and layout mode, e.g. "otsu_psm6"
    pub method: String,
    pub word_count: usize,
    pub char_count: usize,
}

impl ExtractedDocument {
    pub fn new(
        path: PathBuf,
        date: NaiveDate,
        text: String,
        confidence: f64,
        method: String,
    ) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let word_count = text.split_whitespace().count();
        let char_count = text.chars().count();

        Self {
            filename,
            path,
            date,
            text,
            confidence: confidence.clamp(0.0, 100.0),
            method,
            word_count,
            char_count,
        }
    }

    pub fn source(&self) -> TopicSource {
        TopicSource {
            filename: self.filename.clone(),
            date: self.date,
        }
    }
}

/// Where a topic occurrence came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSource {
    pub filename: String,
    pub date: NaiveDate,
}

/// One topic found in one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicOccurrence {
    pub topic: Topic,
    pub source: TopicSource,
}

/// Corpus-wide statistics for a single topic, recomputed each run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicStats {
    pub topic: Topic,
    pub frequency: usize,
    pub document_count: usize,
    pub coverage_percentage: f64,
    pub sources: Vec<TopicSource>,
}

/// Likelihood buckets for a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LikelihoodCategory {
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl LikelihoodCategory {
    /// Bucket a topic. First matching rule wins; raw counts can promote a
    /// topic regardless of its score.
    pub fn classify(score: f64, frequency: usize, document_count: usize) -> Self {
        if score >= 0.6 || frequency >= 3 {
            LikelihoodCategory::VeryHigh
        } else if score >= 0.4 || frequency >= 2 {
            LikelihoodCategory::High
        } else if score >= 0.2 || document_count >= 1 {
            LikelihoodCategory::Medium
        } else {
            LikelihoodCategory::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LikelihoodCategory::Low => "Low",
            LikelihoodCategory::Medium => "Medium",
            LikelihoodCategory::High => "High",
            LikelihoodCategory::VeryHigh => "Very High",
        }
    }

    pub fn is_high_priority(&self) -> bool {
        matches!(self, LikelihoodCategory::High | LikelihoodCategory::VeryHigh)
    }
}

impl fmt::Display for LikelihoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A ranked guess that a topic will come up again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub topic: Topic,
    pub frequency: usize,
    pub document_count: usize,
    pub coverage_percentage: f64,
    /// Weighted sum plus keyword bonus. Not clamped, can exceed 1.0.
    pub likelihood_score: f64,
    pub likelihood_category: LikelihoodCategory,
    /// At most three source filenames
    pub sources: Vec<String>,
}

/// Near-duplicate topic phrases clustered by TF-IDF cosine similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticGroup {
    pub size: usize,
    /// Mean similarity of the non-anchor members to the anchor
    pub avg_similarity: f64,
    /// Anchor first, then members in occurrence order
    pub members: Vec<TopicOccurrence>,
}

/// One row of the topic heat index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatEntry {
    pub topic: Topic,
    pub mentions: usize,
    /// 1 to 3
    pub heat: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_files: usize,
    pub successful_extractions: usize,
    /// Topics that made it into the predictions
    pub total_topics: usize,
    /// Distinct normalized topics across all documents
    pub unique_topics: usize,
    pub high_priority_topics: usize,
    pub output_directory: PathBuf,
}

/// Everything one analysis run produces. Pure data; rendering and
/// persistence are up to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisBundle {
    pub documents: Vec<ExtractedDocument>,
    pub predictions: Vec<Prediction>,
    pub topic_stats: Vec<TopicStats>,
    pub semantic_groups: Vec<SemanticGroup>,
    pub heat_index: Vec<HeatEntry>,
    pub summary: AnalysisSummary,
}
