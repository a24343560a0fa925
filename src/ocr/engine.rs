// OCR engine trait and the Tesseract command-line implementation.
//
// The extractor only needs "recognize this image under this layout mode and
// give me words with confidences". Tesseract is driven through its CLI with
// TSV output, which carries a confidence per word; tests use a scripted
// engine behind the same trait.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::AnalysisError;

/// Page segmentation modes tried per variant, most structured first:
/// uniform block, single word, automatic, single line, single column,
/// sparse text, sparse text with orientation detection.
pub const LAYOUT_MODES: [u8; 7] = [6, 8, 3, 7, 4, 11, 12];

/// Characters the engine may emit.
pub const CHAR_WHITELIST: &str =
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz.,:;?!()[]{}\"-+=*/\\|@#$%^&_~ \n\t";

/// One recognized word.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    /// Engine confidence, 0 to 100 (-1 when the engine has none)
    pub confidence: f64,
}

/// Result of one recognition call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrOutput {
    /// Recognized text, words joined by spaces and lines by newlines
    pub text: String,
    pub words: Vec<OcrWord>,
}

/// Trait for OCR backends. Async because real engines run as child
/// processes or remote services.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize the text in `image` assuming page layout `layout_mode`.
    async fn recognize(&self, image: &Path, layout_mode: u8) -> Result<OcrOutput, AnalysisError>;
}

/// Runs the `tesseract` binary once per call.
pub struct TesseractEngine {
    binary: PathBuf,
    timeout: Duration,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn recognize(&self, image: &Path, layout_mode: u8) -> Result<OcrOutput, AnalysisError> {
        let method = format!("psm{layout_mode}");
        let mut command = Command::new(&self.binary);
        command
            .arg(image)
            .arg("stdout")
            .args(["--oem", "3", "--psm", &layout_mode.to_string()])
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={CHAR_WHITELIST}"))
            .arg("tsv")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        // Dropping the future on timeout kills the child
        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AnalysisError::OcrUnavailable(format!(
                    "{} not found (install tesseract-ocr)",
                    self.binary.display()
                )));
            }
            Ok(Err(e)) => return Err(AnalysisError::Io(e)),
            Err(_) => {
                return Err(AnalysisError::ocr_attempt(
                    method,
                    format!("timed out after {:?}", self.timeout),
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnalysisError::ocr_attempt(
                method,
                format!("tesseract exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let parsed = parse_tsv(&tsv);
        debug!(
            image = %image.display(),
            psm = layout_mode,
            words = parsed.words.len(),
            "Tesseract pass complete"
        );
        Ok(parsed)
    }
}

// Column positions in Tesseract's TSV output
const COL_LEVEL: usize = 0;
const COL_PAGE: usize = 1;
const COL_BLOCK: usize = 2;
const COL_PAR: usize = 3;
const COL_LINE: usize = 4;
const COL_CONF: usize = 10;
const COL_TEXT: usize = 11;
const WORD_LEVEL: &str = "5";

/// Parse Tesseract TSV into words and reconstructed text.
///
/// Only word-level rows (level 5) with non-blank text are kept. A change of
/// page, block, paragraph or line starts a new output line. Malformed rows
/// are skipped.
pub fn parse_tsv(tsv: &str) -> OcrOutput {
    let mut words = Vec::new();
    let mut lines: Vec<Vec<&str>> = Vec::new();
    let mut current_line: Option<[&str; 4]> = None;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() <= COL_TEXT || cols[COL_LEVEL] != WORD_LEVEL {
            continue;
        }
        let text = cols[COL_TEXT].trim();
        if text.is_empty() {
            continue;
        }
        let confidence = cols[COL_CONF].trim().parse::<f64>().unwrap_or(-1.0);

        let key = [cols[COL_PAGE], cols[COL_BLOCK], cols[COL_PAR], cols[COL_LINE]];
        if current_line != Some(key) || lines.is_empty() {
            lines.push(Vec::new());
            current_line = Some(key);
        }
        if let Some(line) = lines.last_mut() {
            line.push(text);
        }

        words.push(OcrWord {
            text: text.to_string(),
            confidence,
        });
    }

    let text = lines
        .iter()
        .map(|line| line.join(" "))
        .collect::<Vec<_>>()
        .join("\n");

    OcrOutput { text, words }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn row(level: u8, line: u8, word: u8, conf: &str, text: &str) -> String {
        format!("{level}\t1\t1\t1\t{line}\t{word}\t10\t10\t50\t20\t{conf}\t{text}")
    }

    #[test]
    fn test_parse_words_and_lines() {
        let tsv = [
            HEADER.to_string(),
            row(1, 0, 0, "-1", ""),
            row(4, 1, 0, "-1", ""),
            row(5, 1, 1, "96.5", "Explain"),
            row(5, 1, 2, "91", "Markov"),
            row(5, 1, 3, "88.25", "chains"),
            row(4, 2, 0, "-1", ""),
            row(5, 2, 1, "75", "(5"),
            row(5, 2, 2, "70", "marks)"),
        ]
        .join("\n");

        let out = parse_tsv(&tsv);
        assert_eq!(out.text, "Explain Markov chains\n(5 marks)");
        assert_eq!(out.words.len(), 5);
        assert!((out.words[0].confidence - 96.5).abs() < 1e-10);
    }

    #[test]
    fn test_blank_words_and_short_rows_skipped() {
        let tsv = [
            HEADER.to_string(),
            row(5, 1, 1, "95", "   "),
            "5\t1\t1".to_string(),
            row(5, 1, 2, "90", "Poisson"),
        ]
        .join("\n");
        let out = parse_tsv(&tsv);
        assert_eq!(out.text, "Poisson");
        assert_eq!(out.words.len(), 1);
    }

    #[test]
    fn test_unparseable_confidence_is_negative() {
        let tsv = [HEADER.to_string(), row(5, 1, 1, "n/a", "word")].join("\n");
        assert_eq!(parse_tsv(&tsv).words[0].confidence, -1.0);
    }

    #[test]
    fn test_empty_output() {
        assert_eq!(parse_tsv(""), OcrOutput::default());
        assert_eq!(parse_tsv(HEADER), OcrOutput::default());
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let engine = TesseractEngine::new(
            "/nonexistent/tesseract-binary",
            Duration::from_secs(5),
        );
        let err = engine
            .recognize(Path::new("page.png"), 6)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::OcrUnavailable(_)));
    }

    // `sh <script> stdout --oem ...` runs the script, which outlives the limit
    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_engine_is_failed_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("stall.sh");
        std::fs::write(&script, "sleep 5\n").unwrap();

        let engine = TesseractEngine::new("/bin/sh", Duration::from_millis(100));
        let started = std::time::Instant::now();
        let err = engine.recognize(&script, 6).await.unwrap_err();

        assert!(matches!(err, AnalysisError::OcrAttempt { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
