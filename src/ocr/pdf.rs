// PDF to page images.
//
// OCR works on images, so every PDF is rendered to one PNG per page before
// ingestion. Pages land in a batch-scoped temporary directory that is
// removed when the batch finishes, however it finishes.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

use super::preprocess::file_stem;
use crate::error::AnalysisError;

/// Renders a PDF into page images.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Render every page of `pdf` into `out_dir` as `<stem>_page_<n>.png`
    /// and return the page paths in page order.
    async fn render(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, AnalysisError>;
}

/// Temporary directory holding rendered pages for one batch. Deleted on drop.
pub struct PageDirectory {
    dir: TempDir,
}

impl PageDirectory {
    pub fn new() -> Result<Self, AnalysisError> {
        let dir = tempfile::Builder::new().prefix("pastpaper-pages").tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Renders through poppler's `pdftoppm`.
pub struct PdftoppmRenderer {
    binary: PathBuf,
    dpi: u32,
    timeout: Duration,
}

impl PdftoppmRenderer {
    pub fn new(binary: impl Into<PathBuf>, dpi: u32, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            dpi,
            timeout,
        }
    }
}

#[async_trait]
impl PdfRenderer for PdftoppmRenderer {
    async fn render(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
        let stem = file_stem(pdf);
        let conversion_error = |reason: String| AnalysisError::PdfConversion {
            path: pdf.to_path_buf(),
            reason,
        };

        let mut command = Command::new(&self.binary);
        command
            .args(["-png", "-r", &self.dpi.to_string()])
            .arg(pdf)
            .arg(out_dir.join(format!("{stem}_page")))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(conversion_error(format!(
                    "{} not found (install poppler-utils)",
                    self.binary.display()
                )));
            }
            Ok(Err(e)) => return Err(conversion_error(e.to_string())),
            Err(_) => {
                return Err(conversion_error(format!("timed out after {:?}", self.timeout)))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(conversion_error(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let pages = collect_pages(out_dir, &stem).map_err(|e| conversion_error(e.to_string()))?;
        if pages.is_empty() {
            return Err(conversion_error("no pages rendered".to_string()));
        }
        debug!(pdf = %pdf.display(), pages = pages.len(), dpi = self.dpi, "Rendered PDF");
        Ok(pages)
    }
}

/// Rename pdftoppm's `<stem>_page-01.png` output to `<stem>_page_1.png`
/// and return the pages sorted by page number.
///
/// pdftoppm zero-pads page numbers to the width of the page count, so the
/// number is parsed rather than matched literally. An existing target is
/// never overwritten: that fails with `AlreadyExists`.
pub fn collect_pages(dir: &Path, stem: &str) -> std::io::Result<Vec<PathBuf>> {
    let prefix = format!("{stem}_page-");
    let mut pages: Vec<(u32, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(number) = name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(".png"))
            .and_then(|n| n.parse::<u32>().ok())
        else {
            continue;
        };

        let target = dir.join(format!("{stem}_page_{number}.png"));
        if target.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already rendered", target.display()),
            ));
        }
        std::fs::rename(entry.path(), &target)?;
        pages.push((number, target));
    }

    pages.sort_by_key(|(n, _)| *n);
    Ok(pages.into_iter().map(|(_, p)| p).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_pages_renames_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["exam_page-10.png", "exam_page-02.png", "exam_page-01.png", "other.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let pages = collect_pages(dir.path(), "exam").unwrap();
        let names: Vec<String> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["exam_page_1.png", "exam_page_2.png", "exam_page_10.png"]);
        assert!(dir.path().join("other.png").exists());
    }

    #[test]
    fn test_collect_pages_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("exam_page-1.png"), b"FIRST").unwrap();
        let first = collect_pages(dir.path(), "exam").unwrap();

        std::fs::write(dir.path().join("exam_page-1.png"), b"SECOND").unwrap();
        let err = collect_pages(dir.path(), "exam").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(&first[0]).unwrap(), b"FIRST");
    }

    #[test]
    fn test_page_directory_removed_on_drop() {
        let pages = PageDirectory::new().unwrap();
        let path = pages.path().to_path_buf();
        assert!(path.exists());
        drop(pages);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_binary_is_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PdftoppmRenderer::new("/nonexistent/pdftoppm", 300, Duration::from_secs(5));
        let err = renderer
            .render(Path::new("paper.pdf"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::PdfConversion { .. }));
    }
}
