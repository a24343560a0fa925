// Pattern-based topic mining.
//
// Four independent passes over the document text, each feeding candidates
// through cleaning and normalization into one ordered, de-duplicated set:
//
//   1. 2-4 word n-grams that contain an academic keyword
//   2. runs of two or more Capitalized Words
//   3. fragments starting at a trigger word ("test", "model", ...), cut to 5 words
//   4. each keyword with one neighbouring word on either side
//
// The passes overlap heavily; the union after normalization is what counts.

use std::collections::HashSet;

use anyhow::{Context, Result};
use regex_lite::Regex;

use super::clean::PhraseCleaner;
use super::normalize::{Lemmatizer, NounLemmatizer, PhraseNormalizer};
use super::traits::TopicExtractor;
use super::vocabulary::AcademicVocabulary;
use crate::models::Topic;

const NGRAM_SIZES: [usize; 3] = [2, 3, 4];
const MAX_FRAGMENT_WORDS: usize = 5;
const MIN_TOPIC_WORDS: usize = 2;

/// The default topic extractor.
pub struct PhraseMiner {
    vocabulary: AcademicVocabulary,
    cleaner: PhraseCleaner,
    normalizer: PhraseNormalizer,
    capitalized: Regex,
    trigger: Option<Regex>,
    keyword_context: Vec<(String, Regex)>,
}

impl PhraseMiner {
    /// Build a miner over `vocabulary`, lemmatizing with the built-in noun
    /// lemmatizer when `use_lemmatization` is set.
    pub fn new(vocabulary: AcademicVocabulary, use_lemmatization: bool) -> Result<Self> {
        let lemmatizer: Option<Box<dyn Lemmatizer>> = if use_lemmatization {
            Some(Box::new(NounLemmatizer))
        } else {
            None
        };
        Self::with_lemmatizer(vocabulary, lemmatizer)
    }

    pub fn with_lemmatizer(
        vocabulary: AcademicVocabulary,
        lemmatizer: Option<Box<dyn Lemmatizer>>,
    ) -> Result<Self> {
        let cleaner = PhraseCleaner::new(&vocabulary).context("Invalid instruction prefix")?;
        let normalizer = PhraseNormalizer::new(&vocabulary, lemmatizer);

        let capitalized = Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b")?;

        let trigger = if vocabulary.trigger_words.is_empty() {
            None
        } else {
            let alternatives: Vec<String> = vocabulary
                .trigger_words
                .iter()
                .map(|w| regex_lite::escape(w))
                .collect();
            Some(Regex::new(&format!(
                r"(?i)\b(?:{})\b[^.]*?(?:[.!?]|$)",
                alternatives.join("|")
            ))?)
        };

        let keyword_context = vocabulary
            .keywords
            .iter()
            .map(|keyword| {
                let pattern = format!(r"(?i)\b\w*\s*{}\s*\w*\b", regex_lite::escape(keyword));
                Regex::new(&pattern)
                    .map(|re| (keyword.clone(), re))
                    .with_context(|| format!("Invalid keyword pattern for {keyword:?}"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            vocabulary,
            cleaner,
            normalizer,
            capitalized,
            trigger,
            keyword_context,
        })
    }

    /// Clean and normalize one raw candidate, adding it if it survives.
    fn admit(&self, candidate: &str, topics: &mut TopicSet) {
        let Some(cleaned) = self.cleaner.clean(candidate) else {
            return;
        };
        let normalized = self.normalizer.normalize(&cleaned);
        if normalized.split_whitespace().count() >= MIN_TOPIC_WORDS {
            topics.insert(normalized);
        }
    }

    fn keyword_ngrams(&self, lowercase: &str, topics: &mut TopicSet) {
        let words: Vec<&str> = lowercase.split_whitespace().collect();
        for i in 0..words.len() {
            for n in NGRAM_SIZES {
                if i + n > words.len() {
                    continue;
                }
                let ngram = words[i..i + n].join(" ");
                if self.vocabulary.mentions_keyword(&ngram) {
                    self.admit(&ngram, topics);
                }
            }
        }
    }

    fn capitalized_runs(&self, text: &str, topics: &mut TopicSet) {
        for m in self.capitalized.find_iter(text) {
            if m.as_str().split_whitespace().count() >= 2 {
                self.admit(m.as_str(), topics);
            }
        }
    }

    fn trigger_fragments(&self, text: &str, topics: &mut TopicSet) {
        let Some(trigger) = &self.trigger else {
            return;
        };
        for m in trigger.find_iter(text) {
            let fragment = m.as_str().trim_matches(&['.', ',', '!', '?'][..]);
            let words: Vec<&str> = fragment.split_whitespace().take(MAX_FRAGMENT_WORDS).collect();
            if words.len() >= 2 {
                self.admit(&words.join(" "), topics);
            }
        }
    }

    fn keyword_windows(&self, text: &str, lowercase: &str, topics: &mut TopicSet) {
        for (keyword, pattern) in &self.keyword_context {
            if !lowercase.contains(keyword.as_str()) {
                continue;
            }
            for m in pattern.find_iter(text) {
                self.admit(m.as_str(), topics);
            }
        }
    }
}

impl TopicExtractor for PhraseMiner {
    fn extract(&self, text: &str) -> Vec<Topic> {
        // OCR output is line-broken arbitrarily; mine it as one line
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let lowercase = text.to_lowercase();

        let mut topics = TopicSet::default();
        self.keyword_ngrams(&lowercase, &mut topics);
        self.capitalized_runs(&text, &mut topics);
        self.trigger_fragments(&text, &mut topics);
        self.keyword_windows(&text, &lowercase, &mut topics);

        topics.into_topics()
    }
}

/// Insertion-ordered set of canonical phrases.
#[derive(Default)]
struct TopicSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl TopicSet {
    fn insert(&mut self, phrase: String) {
        if self.seen.insert(phrase.clone()) {
            self.ordered.push(phrase);
        }
    }

    fn into_topics(self) -> Vec<Topic> {
        self.ordered.into_iter().map(Topic::new).collect()
    }
}
