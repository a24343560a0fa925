// Likelihood scoring for repeated topics.
//
// score = 0.4 * frequency + 0.4 * spread + 0.2 * consistency + keyword bonus
//
// frequency   = min(f / max(N, 2), 1)   how often, relative to corpus size
// spread      = min(dc / N, 1)          how many distinct papers
// consistency = f / dc                  mentions per paper
//
// The keyword bonus is flat, so the sum is not clamped and can exceed 1.0.

use tracing::info;

use super::frequency::{coverage, descending, FrequencyReport};
use crate::models::{LikelihoodCategory, Prediction, TopicStats};

/// Relative weights of the score components.
pub struct PredictionWeights {
    pub frequency: f64,
    pub spread: f64,
    pub consistency: f64,
    /// Flat bonus for topics that mention an academic keyword
    pub academic_bonus: f64,
}

impl Default for PredictionWeights {
    fn default() -> Self {
        Self {
            frequency: 0.4,
            spread: 0.4,
            consistency: 0.2,
            academic_bonus: 0.2,
        }
    }
}

/// Score components for one topic, before weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreComponents {
    pub frequency: f64,
    pub spread: f64,
    pub consistency: f64,
    pub academic: bool,
}

impl ScoreComponents {
    pub fn compute(frequency: usize, document_count: usize, total_documents: usize, academic: bool) -> Self {
        let f = frequency as f64;
        let dc = document_count as f64;
        let n = total_documents as f64;
        Self {
            frequency: (f / n.max(2.0)).min(1.0),
            spread: if n > 0.0 { (dc / n).min(1.0) } else { 0.0 },
            consistency: if dc > 0.0 { f / dc } else { 0.0 },
            academic,
        }
    }

    pub fn likelihood(&self, weights: &PredictionWeights) -> f64 {
        let bonus = if self.academic { weights.academic_bonus } else { 0.0 };
        self.frequency * weights.frequency
            + self.spread * weights.spread
            + self.consistency * weights.consistency
            + bonus
    }
}

// Fallback predictions when nothing repeats
const FALLBACK_LIMIT: usize = 10;
const FALLBACK_SCORE: f64 = 0.3;
const MAX_SOURCES: usize = 3;

pub struct PredictionScorer {
    keywords: Vec<String>,
    weights: PredictionWeights,
}

impl PredictionScorer {
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            keywords,
            weights: PredictionWeights::default(),
        }
    }

    /// Rank the repeated topics. Falls back to placeholder predictions for
    /// up to ten unique topics when nothing repeats.
    pub fn score(&self, report: &FrequencyReport) -> Vec<Prediction> {
        let n = report.total_documents;

        if report.repeated.is_empty() {
            let fallback = self.fallback(report);
            if !fallback.is_empty() {
                info!(count = fallback.len(), "No repeated topics, using fallback predictions");
            }
            return fallback;
        }

        let mut predictions: Vec<Prediction> = report
            .repeated
            .iter()
            .map(|stats| {
                let components = ScoreComponents::compute(
                    stats.frequency,
                    stats.document_count,
                    n,
                    stats.topic.mentions_any(&self.keywords),
                );
                let score = components.likelihood(&self.weights);
                Prediction {
                    topic: stats.topic.clone(),
                    frequency: stats.frequency,
                    document_count: stats.document_count,
                    coverage_percentage: stats.coverage_percentage,
                    likelihood_score: score,
                    likelihood_category: LikelihoodCategory::classify(
                        score,
                        stats.frequency,
                        stats.document_count,
                    ),
                    sources: source_names(stats),
                }
            })
            .collect();

        // sort_by is stable: equal scores keep aggregation order
        predictions.sort_by(|a, b| descending(a.likelihood_score, b.likelihood_score));
        predictions
    }

    fn fallback(&self, report: &FrequencyReport) -> Vec<Prediction> {
        report
            .unique_topics
            .iter()
            .take(FALLBACK_LIMIT)
            .map(|stats| Prediction {
                topic: stats.topic.clone(),
                frequency: 1,
                document_count: 1,
                coverage_percentage: coverage(1, report.total_documents),
                likelihood_score: FALLBACK_SCORE,
                likelihood_category: LikelihoodCategory::Medium,
                sources: source_names(stats),
            })
            .collect()
    }
}

fn source_names(stats: &TopicStats) -> Vec<String> {
    stats
        .sources
        .iter()
        .take(MAX_SOURCES)
        .map(|s| s.filename.clone())
        .collect()
}
