// Candidate phrase cleaning.
//
// Exam papers wrap every topic in noise: question numbers, "Explain ...",
// "(5 marks)". Cleaning peels that off and rejects what is left if it is too
// short, numeric or pure boilerplate. Cleaning keeps case; normalization
// lowercases later.

use regex_lite::Regex;

use super::vocabulary::AcademicVocabulary;

/// Strips enumeration markers, instructional prefixes and mark annotations
/// from raw candidate phrases.
pub struct PhraseCleaner {
    numeric_only: Regex,
    enumeration: Vec<Regex>,
    prefixes: Vec<Regex>,
    marks: Vec<Regex>,
    punctuation: Regex,
    vocabulary: AcademicVocabulary,
}

impl PhraseCleaner {
    pub fn new(vocabulary: &AcademicVocabulary) -> Result<Self, regex_lite::Error> {
        let enumeration = [
            r"^\d+\s*[.:]?\s*",               // "1. " or "1 "
            r"(?i)^Q\d+\s*[.:]?\s*",          // "Q1. "
            r"(?i)^Question\s*\d+\s*[.:]?\s*", // "Question 1: "
            r"^\d+\s*[\)\]\}]\s*",          // "1) " or "1] "
            r"(?i)^[a-z]\)\s*",             // "a) "
        ]
        .into_iter()
        .map(Regex::new)
        .collect::<Result<Vec<_>, _>>()?;

        let prefixes = vocabulary
            .instruction_prefixes
            .iter()
            .map(|prefix| {
                let words: Vec<String> = prefix
                    .split_whitespace()
                    .map(regex_lite::escape)
                    .collect();
                Regex::new(&format!(r"(?i)^{}\s+", words.join(r"\s+")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let marks = [
            r"(?i)\s*\(\d+\s*marks?\)",
            r"(?i)\s*\[\d+\s*marks?\]",
            r"(?i)\s*\d+\s*marks?$",
        ]
        .into_iter()
        .map(Regex::new)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            numeric_only: Regex::new(r"^\d+$")?,
            enumeration,
            prefixes,
            marks,
            punctuation: Regex::new(r"[^\w\s-]")?,
            vocabulary: vocabulary.clone(),
        })
    }

    /// Clean a raw candidate. Returns None when nothing topic-like survives.
    pub fn clean(&self, phrase: &str) -> Option<String> {
        let phrase = phrase.trim();
        if self.numeric_only.is_match(phrase) || phrase.chars().count() < 3 {
            return None;
        }

        let mut phrase = phrase.to_string();
        for re in self.enumeration.iter().chain(&self.prefixes) {
            phrase = re.replace(&phrase, "").into_owned();
        }
        for re in &self.marks {
            phrase = re.replace_all(&phrase, "").into_owned();
        }

        let phrase = self.punctuation.replace_all(&phrase, " ");
        let phrase = phrase.split_whitespace().collect::<Vec<_>>().join(" ");

        if phrase.split_whitespace().count() < 2 {
            return None;
        }
        if self.vocabulary.is_boilerplate(&phrase.to_lowercase()) {
            return None;
        }

        Some(phrase)
    }
}
