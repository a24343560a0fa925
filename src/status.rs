// System status display: external tools, output directory, last run.

use anyhow::Result;
use colored::Colorize;

use crate::config::{binary_available, Config};

/// Display system status to the terminal.
pub fn show(config: &Config) -> Result<()> {
    let tool = |name: &str, bin: &std::path::Path, hint: &str| {
        if binary_available(bin) {
            println!("{name}: {} ({})", "found".green(), bin.display());
        } else {
            println!("{name}: {} ({})", "missing".red(), bin.display());
            println!("  {hint}");
        }
    };
    tool(
        "Tesseract",
        config.tesseract_bin.as_path(),
        "Install tesseract-ocr or set TESSERACT_BIN",
    );
    tool(
        "pdftoppm",
        config.pdftoppm_bin.as_path(),
        "Install poppler-utils or set PDFTOPPM_BIN (only needed for PDFs)",
    );

    let out = &config.output_dir;
    if !out.exists() {
        println!("Output directory: {} (not created yet)", out.display());
        println!("\nRun `pastpaper analyze <PATH>...` to produce a report.");
        return Ok(());
    }
    println!("Output directory: {}", out.display());

    let analysis = out.join("analysis.json");
    match std::fs::metadata(&analysis) {
        Ok(meta) => {
            let modified = meta
                .modified()
                .map(|t| {
                    chrono::DateTime::<chrono::Local>::from(t)
                        .format("%Y-%m-%d %H:%M")
                        .to_string()
                })
                .unwrap_or_else(|_| "unknown".to_string());
            println!(
                "Last analysis: {} ({}, written {})",
                analysis.display(),
                format_bytes(meta.len()),
                modified
            );
        }
        Err(_) => println!("Last analysis: none"),
    }

    let audit_count = std::fs::read_dir(out.join("extracted_texts"))
        .map(|entries| entries.filter_map(|e| e.ok()).count())
        .unwrap_or(0);
    println!("Extracted texts: {audit_count}");

    let report = out.join("reports").join("analysis_report.md");
    if report.exists() {
        println!("Report: {}", report.display());
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
