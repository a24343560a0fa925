// Subject vocabulary that drives topic mining.
//
// Keywords, trigger words, instruction prefixes, boilerplate and stopwords are
// plain data. The defaults target statistics and computer science papers; a
// deployment for another subject swaps them via a JSON file
// (PASTPAPER_VOCABULARY). Every list is an ordered Vec so discovery order,
// and with it tie-breaking in sorted output, is reproducible.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stop_words::{get, LANGUAGE};

const ACADEMIC_KEYWORDS: &[&str] = &[
    // Statistics
    "distribution", "probability", "hypothesis", "regression", "correlation",
    "variance", "mean", "median", "standard deviation", "confidence interval",
    "sampling", "estimation", "test", "significance", "parametric", "non-parametric",
    "design", "experiment", "analysis", "model", "markov", "chain", "process",
    "stochastic", "random", "variable", "function", "chi-square", "anova",
    "kruskal", "wilcoxon", "mann-whitney", "friedman", "spearman", "kendall",
    "binomial", "poisson", "normal", "exponential", "gamma", "beta",
    "randomized", "factorial", "block", "latin square", "nested",
    // Computer science
    "algorithm", "data structure", "database", "network", "security",
    "software", "programming", "system", "operating", "compiler",
    "machine learning", "artificial intelligence", "neural network",
    "tree", "graph", "hash", "sorting", "searching", "complexity",
    "big o", "dynamic programming", "greedy", "divide conquer",
];

const TRIGGER_WORDS: &[&str] = &[
    "test", "analysis", "method", "distribution", "design", "model",
    "algorithm", "theory", "principle", "technique", "approach", "procedure",
];

// Order matters: each prefix is stripped at most once, in this order.
const INSTRUCTION_PREFIXES: &[&str] = &[
    "what is", "define", "explain", "describe", "write short note on",
    "discuss", "list", "briefly explain", "give", "state", "mention",
    "how", "why", "when", "where",
];

const BOILERPLATE: &[&str] = &[
    "related to computer science", "computer science and information technology",
    "information technology", "related to", "example related", "page", "question",
    "answer", "following question", "the following", "as follows", "marks",
    "explain briefly", "short answer", "long answer", "unit", "chapter",
    "section", "part", "what is", "define", "list", "write short note",
    "write note", "short note", "give", "state", "mention", "discuss",
];

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// The subject-specific word lists used by cleaning, mining, normalization
/// and scoring. All entries are expected in lowercase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcademicVocabulary {
    /// Substrings that mark a phrase as academic content
    pub keywords: Vec<String>,
    /// Words that start a topic fragment ("... test for independence")
    pub trigger_words: Vec<String>,
    /// Leading instructional phrases stripped from candidates
    pub instruction_prefixes: Vec<String>,
    /// Exact phrases that are never topics
    pub boilerplate: Vec<String>,
    /// Words dropped during normalization and TF-IDF vectorization
    pub stopwords: Vec<String>,
}

impl Default for AcademicVocabulary {
    fn default() -> Self {
        Self {
            keywords: owned(ACADEMIC_KEYWORDS),
            trigger_words: owned(TRIGGER_WORDS),
            instruction_prefixes: owned(INSTRUCTION_PREFIXES),
            boilerplate: owned(BOILERPLATE),
            // NLTK English list; needs the `nltk` feature of stop-words
            stopwords: get(LANGUAGE::English),
        }
    }
}

impl AcademicVocabulary {
    /// Load a vocabulary from a JSON file. Missing lists fall back to the
    /// defaults, so a file can override just `keywords`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vocabulary file {}", path.display()))?;
        let mut vocabulary: AcademicVocabulary = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid vocabulary JSON in {}", path.display()))?;
        vocabulary.lowercase_all();
        Ok(vocabulary)
    }

    /// True if the (lowercase) text contains any keyword as a substring.
    pub fn mentions_keyword(&self, lowercase_text: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| lowercase_text.contains(k.as_str()))
    }

    pub fn is_boilerplate(&self, lowercase_phrase: &str) -> bool {
        self.boilerplate.iter().any(|b| b == lowercase_phrase)
    }

    fn lowercase_all(&mut self) {
        for list in [
            &mut self.keywords,
            &mut self.trigger_words,
            &mut self.instruction_prefixes,
            &mut self.boilerplate,
            &mut self.stopwords,
        ] {
            for entry in list.iter_mut() {
                *entry = entry.trim().to_lowercase();
            }
            list.retain(|e| !e.is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keyword_substring_match() {
        let vocab = AcademicVocabulary::default();
        assert!(vocab.mentions_keyword("sampling distributions"));
        assert!(!vocab.mentions_keyword("seating plan"));
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.json");
        std::fs::write(&path, r#"{"keywords": ["Enzyme", " osmosis "]}"#).unwrap();

        let vocab = AcademicVocabulary::from_json_file(&path).unwrap();
        assert_eq!(vocab.keywords, vec!["enzyme", "osmosis"]);
        assert_eq!(vocab.trigger_words, AcademicVocabulary::default().trigger_words);
        assert!(vocab.stopwords.iter().any(|w| w == "the"));
    }

    #[test]
    fn test_default_stopwords_keep_academic_keywords() {
        let vocab = AcademicVocabulary::default();
        assert!(vocab.stopwords.iter().any(|w| w == "between"));
        for keyword in ["mean", "test", "system", "process", "normal"] {
            assert!(
                !vocab.stopwords.iter().any(|w| w == keyword),
                "{keyword} must not be a stopword"
            );
        }
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocab.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(AcademicVocabulary::from_json_file(&path).is_err());
    }
}
