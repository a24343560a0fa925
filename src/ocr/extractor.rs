// Best-of-many OCR extraction.
//
// Each page is preprocessed into three variants and every variant is run
// under seven layout modes: 21 engine calls per page. Each successful call
// becomes a scored candidate; the winner is picked by folding the candidates
// in order. Failed calls are logged and dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::debug;

use super::engine::{OcrEngine, OcrOutput, LAYOUT_MODES};
use super::preprocess::{file_stem, ImagePreprocessor, Variant};
use crate::error::AnalysisError;

/// Word confidences at or below this are ignored.
const MIN_TOKEN_CONFIDENCE: f64 = 30.0;
/// An attempt needs more confident tokens than this to be scored.
const MIN_CONFIDENT_TOKENS: usize = 4;
/// Word count at which the quality penalty for short text stops.
const FULL_QUALITY_WORDS: f64 = 20.0;
/// A winning text must be longer than this (trimmed).
const MIN_TEXT_CHARS: usize = 15;

pub const FAILED_METHOD: &str = "failed";

/// The chosen text for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrResult {
    pub text: String,
    /// 0 to 100
    pub confidence: f64,
    /// `<variant>_psm<mode>`, or "failed"
    pub method: String,
}

impl OcrResult {
    pub fn failed() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            method: FAILED_METHOD.to_string(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.method == FAILED_METHOD
    }
}

/// A scored attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub method: String,
    pub text: String,
    pub confidence: f64,
}

impl Candidate {
    /// Score an engine output. None when fewer than four tokens have a
    /// confidence above 30.
    pub fn from_output(method: String, output: OcrOutput) -> Option<Self> {
        let confidence = mean_confidence(&output)?;
        Some(Self {
            method,
            text: output.text.trim().to_string(),
            confidence,
        })
    }

    pub fn quality(&self) -> f64 {
        quality(valid_word_count(&self.text), self.confidence)
    }
}

/// Mean of the token confidences strictly above 30, if there are at least four.
pub fn mean_confidence(output: &OcrOutput) -> Option<f64> {
    let confident: Vec<f64> = output
        .words
        .iter()
        .map(|w| w.confidence)
        .filter(|c| *c > MIN_TOKEN_CONFIDENCE)
        .collect();
    if confident.len() < MIN_CONFIDENT_TOKENS {
        return None;
    }
    let mean = confident.iter().sum::<f64>() / confident.len() as f64;
    Some(mean.clamp(0.0, 100.0))
}

/// Words longer than one character.
pub fn valid_word_count(text: &str) -> usize {
    text.split_whitespace().filter(|w| w.chars().count() > 1).count()
}

/// `words * (confidence / 100) * min(words / 20, 1)`: rewards confident text
/// and penalizes fragments shorter than twenty words.
pub fn quality(valid_words: usize, confidence: f64) -> f64 {
    let words = valid_words as f64;
    words * (confidence / 100.0) * (words / FULL_QUALITY_WORDS).min(1.0)
}

/// Fold step: keep the incumbent unless the candidate scores strictly
/// higher and carries more than fifteen characters.
pub fn select_best(best: Option<Candidate>, candidate: Candidate) -> Option<Candidate> {
    let incumbent_quality = best.as_ref().map_or(0.0, Candidate::quality);
    if candidate.quality() > incumbent_quality && candidate.text.chars().count() > MIN_TEXT_CHARS {
        Some(candidate)
    } else {
        best
    }
}

/// Reduce candidates to the final result.
pub fn choose(candidates: impl IntoIterator<Item = Candidate>) -> OcrResult {
    match candidates.into_iter().fold(None, select_best) {
        Some(best) => OcrResult {
            text: best.text,
            confidence: best.confidence,
            method: best.method,
        },
        None => OcrResult::failed(),
    }
}

pub struct OcrExtractor {
    engine: Arc<dyn OcrEngine>,
    preprocessor: Arc<ImagePreprocessor>,
    layout_modes: Vec<u8>,
}

impl OcrExtractor {
    pub fn new(engine: Arc<dyn OcrEngine>, preprocessor: ImagePreprocessor) -> Self {
        Self {
            engine,
            preprocessor: Arc::new(preprocessor),
            layout_modes: LAYOUT_MODES.to_vec(),
        }
    }

    /// Extract the best text from one page image.
    ///
    /// Errors only when the image itself cannot be loaded or staged; engine
    /// failures are swallowed and, if nothing succeeds, yield
    /// `OcrResult::failed()`.
    pub async fn extract(&self, path: &Path) -> Result<OcrResult, AnalysisError> {
        let (_staging, variants) = self.stage_variants(path).await?;

        let mut candidates = Vec::new();
        for (variant, variant_path) in &variants {
            for &mode in &self.layout_modes {
                let method = format!("{variant}_psm{mode}");
                match self.engine.recognize(variant_path, mode).await {
                    Ok(output) => match Candidate::from_output(method, output) {
                        Some(candidate) => candidates.push(candidate),
                        None => debug!(variant = %variant, psm = mode, "Too few confident tokens"),
                    },
                    Err(e) => {
                        debug!(variant = %variant, psm = mode, error = %e, "OCR attempt failed");
                    }
                }
            }
        }

        let attempts = candidates.len();
        let result = choose(candidates);
        debug!(
            file = %path.display(),
            attempts,
            method = %result.method,
            confidence = result.confidence,
            "OCR selection complete"
        );
        Ok(result)
    }

    /// Preprocess on the blocking pool and write each variant to a scoped
    /// temp directory as `<stem>_<variant>.png`. The directory lives as long
    /// as the returned guard.
    async fn stage_variants(
        &self,
        path: &Path,
    ) -> Result<(TempDir, Vec<(Variant, PathBuf)>), AnalysisError> {
        let preprocessor = Arc::clone(&self.preprocessor);
        let path = path.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<_, AnalysisError> {
            let prepared = preprocessor.process_file(&path)?;
            let staging = tempfile::Builder::new().prefix("pastpaper-ocr").tempdir()?;
            let stem = file_stem(&path);

            let mut variants = Vec::with_capacity(prepared.len());
            for p in prepared {
                let variant_path = staging.path().join(format!("{stem}_{}.png", p.variant));
                p.image
                    .save(&variant_path)
                    .map_err(|source| AnalysisError::ImageLoad {
                        path: variant_path.clone(),
                        source,
                    })?;
                variants.push((p.variant, variant_path));
            }
            Ok((staging, variants))
        })
        .await
        .map_err(|e| AnalysisError::Io(std::io::Error::other(e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::engine::OcrWord;

    fn output(text: &str, conf: f64) -> OcrOutput {
        OcrOutput {
            text: text.to_string(),
            words: text
                .split_whitespace()
                .map(|w| OcrWord {
                    text: w.to_string(),
                    confidence: conf,
                })
                .collect(),
        }
    }

    #[test]
    fn test_mean_confidence_ignores_low_tokens() {
        let mut out = output("one two three four", 90.0);
        out.words.push(OcrWord {
            text: "x".into(),
            confidence: 10.0,
        });
        assert_eq!(mean_confidence(&out), Some(90.0));
    }

    #[test]
    fn test_mean_confidence_needs_four_tokens() {
        assert_eq!(mean_confidence(&output("one two three", 95.0)), None);
    }

    #[test]
    fn test_quality_formula() {
        // 10 words at 80%: 10 * 0.8 * 0.5
        assert!((quality(10, 80.0) - 4.0).abs() < 1e-10);
        // Beyond 20 words the penalty is gone
        assert!((quality(40, 50.0) - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_short_text_never_wins() {
        let c = Candidate::from_output("a_psm6".into(), output("ab cd ef gh", 99.0)).unwrap();
        assert_eq!(choose([c]), OcrResult::failed());
    }

    #[test]
    fn test_higher_quality_wins_ties_keep_first() {
        let weak = Candidate::from_output(
            "adaptive_psm6".into(),
            output("alpha beta gamma delta epsilon", 60.0),
        )
        .unwrap();
        let strong = Candidate::from_output(
            "otsu_psm3".into(),
            output("alpha beta gamma delta epsilon zeta eta theta", 85.0),
        )
        .unwrap();
        let tie = Candidate {
            method: "enhanced_psm6".into(),
            ..strong.clone()
        };

        let result = choose([weak, strong, tie]);
        assert_eq!(result.method, "otsu_psm3");
        assert!((result.confidence - 85.0).abs() < 1e-10);
    }

    #[test]
    fn test_no_candidates_is_failed() {
        let result = choose(Vec::new());
        assert_eq!(result.text, "");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.method, "failed");
        assert!(result.is_failed());
    }
}
