use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::ingest::DateOrder;
use crate::topics::semantic::DEFAULT_SIMILARITY_THRESHOLD;
use crate::topics::AcademicVocabulary;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. CLI flags
/// override individual fields after loading.
#[derive(Debug, Clone)]
pub struct Config {
    /// Where reports, audit texts and debug images go
    pub output_dir: PathBuf,
    pub use_lemmatization: bool,
    pub verbose: bool,
    /// Write every preprocessing variant to `<output_dir>/debug_images`
    pub debug: bool,
    pub similarity_threshold: f64,
    /// Files processed concurrently
    pub concurrency: usize,
    /// Upper bound on a single OCR engine or PDF renderer call
    pub ocr_timeout: Duration,
    pub pdf_dpi: u32,
    pub date_order: DateOrder,
    /// Optional JSON vocabulary replacing the built-in one
    pub vocabulary_path: Option<PathBuf>,
    pub tesseract_bin: PathBuf,
    pub pdftoppm_bin: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./pastpaper_output"),
            use_lemmatization: true,
            verbose: false,
            debug: false,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            concurrency: 4,
            ocr_timeout: Duration::from_secs(60),
            pdf_dpi: 300,
            date_order: DateOrder::Heuristic,
            vocabulary_path: None,
            tesseract_bin: PathBuf::from("tesseract"),
            pdftoppm_bin: PathBuf::from("pdftoppm"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables. Unset variables keep
    /// their defaults; malformed ones are an error naming the variable.
    pub fn load() -> Result<Self> {
        let defaults = Config::default();

        let date_order = match env::var("PASTPAPER_DATE_ORDER") {
            Ok(raw) => raw
                .parse::<DateOrder>()
                .map_err(|e| anyhow::anyhow!("PASTPAPER_DATE_ORDER: {e}"))?,
            Err(_) => defaults.date_order,
        };

        Ok(Self {
            output_dir: env::var("PASTPAPER_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            use_lemmatization: parse_var("PASTPAPER_LEMMATIZE", defaults.use_lemmatization)?,
            verbose: parse_var("PASTPAPER_VERBOSE", defaults.verbose)?,
            debug: parse_var("PASTPAPER_DEBUG", defaults.debug)?,
            similarity_threshold: parse_var(
                "PASTPAPER_SIMILARITY_THRESHOLD",
                defaults.similarity_threshold,
            )?,
            concurrency: parse_var("PASTPAPER_CONCURRENCY", defaults.concurrency)?,
            ocr_timeout: Duration::from_secs(parse_var(
                "PASTPAPER_OCR_TIMEOUT_SECS",
                defaults.ocr_timeout.as_secs(),
            )?),
            pdf_dpi: parse_var("PASTPAPER_PDF_DPI", defaults.pdf_dpi)?,
            date_order,
            vocabulary_path: env::var("PASTPAPER_VOCABULARY").ok().map(PathBuf::from),
            tesseract_bin: env::var("TESSERACT_BIN")
                .map(PathBuf::from)
                .unwrap_or(defaults.tesseract_bin),
            pdftoppm_bin: env::var("PDFTOPPM_BIN")
                .map(PathBuf::from)
                .unwrap_or(defaults.pdftoppm_bin),
        })
    }

    /// The configured vocabulary, or the built-in one.
    pub fn vocabulary(&self) -> Result<AcademicVocabulary> {
        match &self.vocabulary_path {
            Some(path) => AcademicVocabulary::from_json_file(path),
            None => Ok(AcademicVocabulary::default()),
        }
    }

    pub fn debug_image_dir(&self) -> PathBuf {
        self.output_dir.join("debug_images")
    }

    /// Check that the OCR engine binary can be found.
    /// Call this before any operation that runs OCR.
    pub fn require_ocr(&self) -> Result<()> {
        if !binary_available(&self.tesseract_bin) {
            anyhow::bail!(
                "Tesseract not found ({}). Install it with: apt install tesseract-ocr\n\
                 Or set TESSERACT_BIN to its location.",
                self.tesseract_bin.display()
            );
        }
        Ok(())
    }

    /// Check that the PDF renderer binary can be found.
    /// Only needed when the batch contains PDFs.
    pub fn require_pdf(&self) -> Result<()> {
        if !binary_available(&self.pdftoppm_bin) {
            anyhow::bail!(
                "pdftoppm not found ({}). Install it with: apt install poppler-utils\n\
                 Or set PDFTOPPM_BIN to its location.",
                self.pdftoppm_bin.display()
            );
        }
        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            anyhow::bail!(
                "similarity threshold must be between 0 and 1, got {}",
                self.similarity_threshold
            );
        }
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        Ok(())
    }
}

/// True when `bin` is an existing path or resolves on PATH.
pub fn binary_available(bin: &Path) -> bool {
    bin.is_file() || which::which(bin).is_ok()
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output_dir, PathBuf::from("./pastpaper_output"));
        assert!(config.use_lemmatization);
        assert_eq!(config.similarity_threshold, 0.3);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.pdf_dpi, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let config = Config {
            similarity_threshold: 1.5,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_binary_reported() {
        let config = Config {
            tesseract_bin: PathBuf::from("/nonexistent/tesseract"),
            pdftoppm_bin: PathBuf::from("/nonexistent/pdftoppm"),
            ..Config::default()
        };
        assert!(config.require_ocr().is_err());
        assert!(config.require_pdf().is_err());
    }
}
