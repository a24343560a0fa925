// Canonical topic form.
//
// Normalization decides topic identity: lowercase, drop stopwords and tiny
// words, lemmatize, and for short phrases sort the words so "distribution
// sampling" and "sampling distribution" collapse into one topic.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use super::vocabulary::AcademicVocabulary;

/// Phrases with at most this many significant words are made order-insensitive.
const MAX_SORTED_WORDS: usize = 3;

#[derive(Debug, Error)]
pub enum LemmatizeError {
    #[error("cannot lemmatize empty token")]
    EmptyToken,
    #[error("lemmatizer rejected {0:?}")]
    Rejected(String),
}

/// Reduces an inflected word to its dictionary form.
///
/// Implementations must be stable: lemmatizing a lemma returns it unchanged.
pub trait Lemmatizer: Send + Sync {
    fn lemmatize(&self, word: &str) -> Result<String, LemmatizeError>;
}

/// Rule-based noun lemmatizer: plural to singular, with an exception table
/// for the irregular plurals that show up in exam papers.
pub struct NounLemmatizer;

const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("analyses", "analysis"),
    ("hypotheses", "hypothesis"),
    ("theses", "thesis"),
    ("bases", "basis"),
    ("axes", "axis"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("children", "child"),
    ("women", "woman"),
    ("men", "man"),
];

// Words that end in "s" but are already singular.
const INVARIANT: &[&str] = &[
    "bias", "series", "species", "news", "chaos", "lens", "gas", "canvas",
    "atlas", "alias", "corpus", "status", "calculus", "stimulus", "radius",
    "physics", "mathematics", "economics", "statistics",
];

impl Lemmatizer for NounLemmatizer {
    fn lemmatize(&self, word: &str) -> Result<String, LemmatizeError> {
        if word.is_empty() {
            return Err(LemmatizeError::EmptyToken);
        }
        if let Some((_, lemma)) = IRREGULAR_PLURALS.iter().find(|(plural, _)| *plural == word) {
            return Ok(lemma.to_string());
        }
        if word.chars().count() <= 3
            || INVARIANT.contains(&word)
            || word.ends_with("ss")
            || word.ends_with("us")
            || word.ends_with("is")
        {
            return Ok(word.to_string());
        }

        let lemma = if word.len() > 4 && word.ends_with("ies") {
            format!("{}y", &word[..word.len() - 3])
        } else if word.ends_with("sses") {
            word[..word.len() - 2].to_string()
        } else if word.ends_with("ches") || word.ends_with("shes") || word.ends_with("xes") {
            word[..word.len() - 2].to_string()
        } else if let Some(stem) = word.strip_suffix('s') {
            stem.to_string()
        } else {
            word.to_string()
        };

        if lemma.chars().count() < 3 {
            Ok(word.to_string())
        } else {
            Ok(lemma)
        }
    }
}

/// Produces the canonical topic string for a cleaned phrase.
pub struct PhraseNormalizer {
    stopwords: HashSet<String>,
    lemmatizer: Option<Box<dyn Lemmatizer>>,
}

impl PhraseNormalizer {
    pub fn new(vocabulary: &AcademicVocabulary, lemmatizer: Option<Box<dyn Lemmatizer>>) -> Self {
        Self {
            stopwords: vocabulary.stopwords.iter().cloned().collect(),
            lemmatizer,
        }
    }

    /// Normalize a phrase. May return an empty string when every word is
    /// filtered out; callers decide whether the result is long enough.
    pub fn normalize(&self, phrase: &str) -> String {
        let lowered = phrase.to_lowercase();
        let mut words: Vec<String> = self.significant(lowered.split_whitespace());

        if let Some(lemmatizer) = &self.lemmatizer {
            if !words.is_empty() {
                match words
                    .iter()
                    .map(|w| lemmatizer.lemmatize(w))
                    .collect::<Result<Vec<_>, _>>()
                {
                    // A lemma can itself be a stopword ("others" -> "other")
                    Ok(lemmas) => words = self.significant(lemmas.iter().map(String::as_str)),
                    Err(e) => {
                        debug!(phrase = %lowered, error = %e, "Lemmatization failed, keeping surface forms");
                    }
                }
            }
        }

        if words.len() <= MAX_SORTED_WORDS {
            words.sort();
        }

        words.join(" ")
    }

    fn significant<'a>(&self, words: impl Iterator<Item = &'a str>) -> Vec<String> {
        words
            .filter(|w| w.chars().count() > 2 && !self.stopwords.contains(*w))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer(lemmatize: bool) -> PhraseNormalizer {
        let lemmatizer: Option<Box<dyn Lemmatizer>> = if lemmatize {
            Some(Box::new(NounLemmatizer))
        } else {
            None
        };
        PhraseNormalizer::new(&AcademicVocabulary::default(), lemmatizer)
    }

    #[test]
    fn test_reordering_collapses() {
        let n = normalizer(true);
        assert_eq!(
            n.normalize("sampling distribution"),
            n.normalize("Distribution Sampling")
        );
        assert_eq!(n.normalize("sampling distribution"), "distribution sampling");
    }

    #[test]
    fn test_stopwords_and_short_words_dropped() {
        let n = normalizer(false);
        assert_eq!(n.normalize("the test of an ANOVA"), "anova test");
    }

    #[test]
    fn test_long_phrases_keep_order() {
        let n = normalizer(false);
        assert_eq!(
            n.normalize("randomized complete block design model"),
            "randomized complete block design model"
        );
    }

    #[test]
    fn test_plural_lemmatized() {
        let n = normalizer(true);
        assert_eq!(n.normalize("hypothesis tests"), "hypothesis test");
        assert_eq!(n.normalize("binary search trees"), "binary search tree");
        assert_eq!(n.normalize("factorial analyses"), "analysis factorial");
    }

    #[test]
    fn test_noun_lemmatizer_rules() {
        let l = NounLemmatizer;
        assert_eq!(l.lemmatize("studies").unwrap(), "study");
        assert_eq!(l.lemmatize("classes").unwrap(), "class");
        assert_eq!(l.lemmatize("approaches").unwrap(), "approach");
        assert_eq!(l.lemmatize("process").unwrap(), "process");
        assert_eq!(l.lemmatize("bias").unwrap(), "bias");
        assert_eq!(l.lemmatize("matrices").unwrap(), "matrix");
        assert!(l.lemmatize("").is_err());
    }

    #[test]
    fn test_noun_lemmatizer_is_stable() {
        let l = NounLemmatizer;
        for word in ["studies", "classes", "analyses", "tests", "boxes", "values"] {
            let once = l.lemmatize(word).unwrap();
            let twice = l.lemmatize(&once).unwrap();
            assert_eq!(once, twice, "lemma of {word} not stable");
        }
    }

    struct FailingLemmatizer;

    impl Lemmatizer for FailingLemmatizer {
        fn lemmatize(&self, word: &str) -> Result<String, LemmatizeError> {
            Err(LemmatizeError::Rejected(word.to_string()))
        }
    }

    #[test]
    fn test_lemmatizer_failure_falls_back() {
        let n = PhraseNormalizer::new(
            &AcademicVocabulary::default(),
            Some(Box::new(FailingLemmatizer)),
        );
        assert_eq!(n.normalize("hypothesis tests"), "hypothesis tests");
    }

    #[test]
    fn test_idempotent() {
        let n = normalizer(true);
        for phrase in [
            "Sampling Distributions",
            "the chi-square tests of independence",
            "studies of others",
            "randomized complete block designs with blocks",
        ] {
            let once = n.normalize(phrase);
            assert_eq!(n.normalize(&once), once, "not idempotent for {phrase}");
        }
    }
}
