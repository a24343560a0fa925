// Semantic grouping of near-duplicate topics.
//
// Normalization only merges exact reorderings. Phrases such as "markov chain"
// and "markov chain process" stay separate topics, so this pass vectorizes
// every occurrence with TF-IDF and greedily groups the ones whose cosine
// similarity to an anchor clears a threshold.

use std::cmp::Ordering;

use tracing::{debug, warn};

use super::similarity::pairwise;
use super::tfidf::TfIdfVectorizer;
use crate::models::{SemanticGroup, TopicOccurrence};

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;
const MAX_GROUPS: usize = 10;
const MIN_GROUP_SIZE: usize = 2;

/// A group found by the greedy pass, as indices into the input.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexGroup {
    /// Anchor first, then the members in input order
    pub members: Vec<usize>,
    pub avg_similarity: f64,
}

/// Greedy grouping over a square similarity matrix.
///
/// Walks items in order; each unprocessed item anchors a candidate group of
/// every later unprocessed item with similarity strictly above `threshold`.
/// Candidates of at least two items become groups and are marked processed.
/// `avg_similarity` is the mean similarity of the non-anchor members to the
/// anchor.
pub fn greedy_groups(similarity: &[Vec<f64>], threshold: f64) -> Vec<IndexGroup> {
    let n = similarity.len();
    let mut processed = vec![false; n];
    let mut groups = Vec::new();

    for anchor in 0..n {
        if processed[anchor] {
            continue;
        }

        let mut members = vec![anchor];
        for other in anchor + 1..n {
            if !processed[other] && similarity[anchor][other] > threshold {
                members.push(other);
            }
        }

        if members.len() < MIN_GROUP_SIZE {
            continue;
        }

        let linked = &members[1..];
        let avg_similarity =
            linked.iter().map(|&m| similarity[anchor][m]).sum::<f64>() / linked.len() as f64;
        for &m in &members {
            processed[m] = true;
        }
        groups.push(IndexGroup {
            members,
            avg_similarity,
        });
    }

    groups
}

/// Clusters topic occurrences by TF-IDF cosine similarity.
pub struct SemanticGrouper {
    pub threshold: f64,
    vectorizer: TfIdfVectorizer,
}

impl SemanticGrouper {
    pub fn new(threshold: f64, vectorizer: TfIdfVectorizer) -> Self {
        Self {
            threshold,
            vectorizer,
        }
    }

    /// Group `occurrences` (one entry per topic per document, not
    /// de-duplicated). Returns at most ten groups, largest and tightest
    /// first. Never fails: too little input or a vectorization error
    /// yields no groups.
    pub fn group(&self, occurrences: &[TopicOccurrence], document_count: usize) -> Vec<SemanticGroup> {
        if document_count < 2 || occurrences.len() < 2 {
            debug!(
                documents = document_count,
                occurrences = occurrences.len(),
                "Not enough material for semantic grouping"
            );
            return Vec::new();
        }

        let phrases: Vec<&str> = occurrences.iter().map(|o| o.topic.as_str()).collect();
        let matrix = match self.vectorizer.fit_transform(&phrases) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "Semantic grouping skipped");
                return Vec::new();
            }
        };

        let similarity = pairwise(&matrix.rows);
        let mut groups: Vec<SemanticGroup> = greedy_groups(&similarity, self.threshold)
            .into_iter()
            .map(|g| SemanticGroup {
                size: g.members.len(),
                avg_similarity: g.avg_similarity,
                members: g.members.iter().map(|&i| occurrences[i].clone()).collect(),
            })
            .collect();

        // Stable: equal groups keep discovery order
        groups.sort_by(|a, b| {
            b.size.cmp(&a.size).then_with(|| {
                b.avg_similarity
                    .partial_cmp(&a.avg_similarity)
                    .unwrap_or(Ordering::Equal)
            })
        });
        groups.truncate(MAX_GROUPS);

        debug!(groups = groups.len(), "Semantic grouping complete");
        groups
    }
}
