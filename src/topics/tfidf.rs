// TF-IDF vectorization of short topic phrases.
//
// Each phrase is one document. Features are unigrams and bigrams of the
// non-stopword tokens, capped to the most frequent terms. Rows are dense and
// L2-normalized so the dot product of two rows is their cosine similarity.
//
// IDF uses the smoothed form ln((1 + n) / (1 + df)) + 1, so a term present in
// every phrase still carries weight 1 instead of vanishing.

use std::collections::{HashMap, HashSet};

use regex_lite::Regex;
use tracing::debug;

use crate::error::AnalysisError;
use crate::topics::AcademicVocabulary;

/// Vocabulary cap applied when the caller does not choose one.
pub const DEFAULT_MAX_FEATURES: usize = 500;

/// A fitted TF-IDF matrix: one row per input phrase.
#[derive(Debug, Clone)]
pub struct TfIdfMatrix {
    /// Feature terms, in column order
    pub vocabulary: Vec<String>,
    /// L2-normalized rows, one per input phrase
    pub rows: Vec<Vec<f64>>,
}

/// TF-IDF vectorizer over unigrams and bigrams.
pub struct TfIdfVectorizer {
    /// Largest n-gram length (1 = unigrams only)
    pub max_ngram: usize,
    /// How many features to keep, by total corpus count
    pub max_features: usize,
    stop_words: HashSet<String>,
    token: Regex,
}

impl TfIdfVectorizer {
    /// Vectorizer that drops the same stopwords topic normalization does.
    pub fn for_vocabulary(vocabulary: &AcademicVocabulary) -> Result<Self, AnalysisError> {
        Self::with_stop_words(vocabulary.stopwords.clone())
    }

    /// Vectorizer with an explicit stop word list.
    pub fn with_stop_words(stop_words: Vec<String>) -> Result<Self, AnalysisError> {
        let token = Regex::new(r"\b\w\w+\b")
            .map_err(|e| AnalysisError::Vectorization(format!("token pattern: {e}")))?;
        Ok(Self {
            max_ngram: 2,
            max_features: DEFAULT_MAX_FEATURES,
            stop_words: stop_words.into_iter().map(|w| w.to_lowercase()).collect(),
            token,
        })
    }

    fn terms(&self, phrase: &str) -> Vec<String> {
        let lowered = phrase.to_lowercase();
        let tokens: Vec<&str> = self
            .token
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .collect();

        let mut terms = Vec::new();
        for n in 1..=self.max_ngram.max(1) {
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Fit the vocabulary on `phrases` and transform them.
    ///
    /// Fails with `Vectorization` when no phrase contributes a single term
    /// (all stop words, or empty input).
    pub fn fit_transform(&self, phrases: &[&str]) -> Result<TfIdfMatrix, AnalysisError> {
        let per_phrase: Vec<Vec<String>> = phrases.iter().map(|p| self.terms(p)).collect();

        // Total count and document frequency per term
        let mut totals: HashMap<&str, usize> = HashMap::new();
        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for terms in &per_phrase {
            let mut seen = HashSet::new();
            for term in terms {
                *totals.entry(term.as_str()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *document_frequency.entry(term.as_str()).or_insert(0) += 1;
                }
            }
        }

        if totals.is_empty() {
            return Err(AnalysisError::Vectorization(
                "empty vocabulary; phrases contain only stop words".to_string(),
            ));
        }

        // Keep the most frequent terms, ties broken alphabetically, then
        // order columns alphabetically
        let mut ranked: Vec<(&str, usize)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);
        let mut vocabulary: Vec<String> = ranked.iter().map(|(t, _)| t.to_string()).collect();
        vocabulary.sort();

        let column: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let n = phrases.len() as f64;
        let idf: Vec<f64> = vocabulary
            .iter()
            .map(|t| {
                let df = document_frequency.get(t.as_str()).copied().unwrap_or(0) as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let rows = per_phrase
            .iter()
            .map(|terms| {
                let mut row = vec![0.0; vocabulary.len()];
                for term in terms {
                    if let Some(&col) = column.get(term.as_str()) {
                        row[col] += 1.0;
                    }
                }
                for (value, weight) in row.iter_mut().zip(&idf) {
                    *value *= weight;
                }
                let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm > f64::EPSILON {
                    for value in &mut row {
                        *value /= norm;
                    }
                }
                row
            })
            .collect();

        debug!(
            phrases = phrases.len(),
            features = vocabulary.len(),
            "Fitted TF-IDF vocabulary"
        );

        Ok(TfIdfMatrix { vocabulary, rows })
    }
}
