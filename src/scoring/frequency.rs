// Corpus-wide topic frequency and coverage.
//
// Every (topic, document) occurrence counts once toward frequency. A topic
// makes the "repeated" view if it was seen at least twice, or once when it
// mentions an academic keyword. Everything else is only kept in the unique
// topic list, which feeds the fallback predictions.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::{Topic, TopicOccurrence, TopicSource, TopicStats};

/// Output of one frequency pass.
#[derive(Debug, Clone, Default)]
pub struct FrequencyReport {
    /// Topics meeting the inclusion rule, sorted by (frequency,
    /// document_count) descending; ties keep first-seen order
    pub repeated: Vec<TopicStats>,
    /// Every distinct topic, in first-seen order
    pub unique_topics: Vec<TopicStats>,
    /// Corpus size the coverage figures were computed against
    pub total_documents: usize,
}

pub struct FrequencyAnalyzer {
    keywords: Vec<String>,
}

impl FrequencyAnalyzer {
    pub fn new(keywords: Vec<String>) -> Self {
        Self { keywords }
    }

    pub fn analyze(&self, occurrences: &[TopicOccurrence], total_documents: usize) -> FrequencyReport {
        let mut order: Vec<&Topic> = Vec::new();
        let mut sources: HashMap<&Topic, Vec<TopicSource>> = HashMap::new();
        for occurrence in occurrences {
            let entry = sources.entry(&occurrence.topic).or_insert_with(|| {
                order.push(&occurrence.topic);
                Vec::new()
            });
            entry.push(occurrence.source.clone());
        }

        let unique_topics: Vec<TopicStats> = order
            .iter()
            .map(|topic| {
                let topic_sources = sources.remove(*topic).unwrap_or_default();
                stats(topic, topic_sources, total_documents)
            })
            .collect();

        let mut repeated: Vec<TopicStats> = unique_topics
            .iter()
            .filter(|s| s.frequency >= 2 || (s.frequency == 1 && s.topic.mentions_any(&self.keywords)))
            .cloned()
            .collect();
        repeated.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| b.document_count.cmp(&a.document_count))
        });

        debug!(
            occurrences = occurrences.len(),
            unique = unique_topics.len(),
            repeated = repeated.len(),
            "Topic frequencies computed"
        );

        FrequencyReport {
            repeated,
            unique_topics,
            total_documents,
        }
    }
}

fn stats(topic: &Topic, sources: Vec<TopicSource>, total_documents: usize) -> TopicStats {
    let document_count = sources
        .iter()
        .map(|s| s.filename.as_str())
        .collect::<HashSet<_>>()
        .len();
    TopicStats {
        topic: topic.clone(),
        frequency: sources.len(),
        document_count,
        coverage_percentage: coverage(document_count, total_documents),
        sources,
    }
}

/// Share of the corpus, as a percentage, that a topic appears in.
pub fn coverage(document_count: usize, total_documents: usize) -> f64 {
    if total_documents == 0 {
        return 0.0;
    }
    100.0 * document_count as f64 / total_documents as f64
}

/// Descending float comparison used by the score sorts.
pub(crate) fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn occ(topic: &str, file: &str) -> TopicOccurrence {
        TopicOccurrence {
            topic: Topic::new(topic),
            source: TopicSource {
                filename: file.to_string(),
                date: NaiveDate::from_ymd_opt(2023, 5, 10).unwrap(),
            },
        }
    }

    fn analyzer() -> FrequencyAnalyzer {
        FrequencyAnalyzer::new(vec!["distribution".into(), "test".into()])
    }

    #[test]
    fn test_counts_and_coverage() {
        let occurrences = vec![
            occ("distribution normal", "a.png"),
            occ("distribution normal", "b.png"),
            occ("latin square", "c.png"),
        ];
        let report = analyzer().analyze(&occurrences, 3);
        let normal = &report.repeated[0];
        assert_eq!(normal.frequency, 2);
        assert_eq!(normal.document_count, 2);
        assert!((normal.coverage_percentage - 66.7).abs() < 0.05);
    }

    #[test]
    fn test_single_mention_needs_keyword() {
        let occurrences = vec![occ("hash table", "a.png"), occ("anova test", "a.png")];
        let report = analyzer().analyze(&occurrences, 1);
        let names: Vec<&str> = report.repeated.iter().map(|s| s.topic.as_str()).collect();
        assert_eq!(names, vec!["anova test"]);
        assert_eq!(report.unique_topics.len(), 2);
    }

    #[test]
    fn test_sorted_by_frequency_then_documents_stable() {
        let occurrences = vec![
            occ("alpha beta", "a.png"),
            occ("alpha beta", "b.png"),
            occ("gamma delta", "a.png"),
            occ("gamma delta", "b.png"),
            occ("gamma delta", "c.png"),
            occ("kappa lambda", "a.png"),
            occ("kappa lambda", "b.png"),
        ];
        let report = analyzer().analyze(&occurrences, 3);
        let names: Vec<&str> = report.repeated.iter().map(|s| s.topic.as_str()).collect();
        assert_eq!(names, vec!["gamma delta", "alpha beta", "kappa lambda"]);
    }

    #[test]
    fn test_unique_topics_first_seen_order() {
        let occurrences = vec![occ("zeta eta", "a.png"), occ("alpha beta", "a.png")];
        let report = analyzer().analyze(&occurrences, 1);
        assert_eq!(report.unique_topics[0].topic.as_str(), "zeta eta");
    }

    #[test]
    fn test_zero_documents_coverage() {
        assert_eq!(coverage(0, 0), 0.0);
    }
}
