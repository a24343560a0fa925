use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};

use pastpaper::config::Config;
use pastpaper::ocr::{PdftoppmRenderer, TesseractEngine};
use pastpaper::output::{artifacts, markdown, terminal};
use pastpaper::pipeline::{collect_inputs, input_kind, CancelFlag, InputKind, Pipeline};
use pastpaper::topics::{PhraseMiner, TopicExtractor};

/// Pastpaper: predict recurring exam topics from scanned past papers.
///
/// Reads exam papers (images or PDFs), extracts their text with OCR, mines
/// academic topic phrases and ranks the ones most likely to come up again.
#[derive(Parser)]
#[command(name = "pastpaper", version, about)]
struct Cli {
    /// Log every step instead of showing a progress bar
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a batch of exam papers and write a report
    Analyze {
        /// Image files, PDFs or directories containing them
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output directory (default: ./pastpaper_output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable noun lemmatization of topic phrases
        #[arg(long)]
        no_lemmatize: bool,

        /// Save every preprocessed image variant for inspection
        #[arg(long)]
        debug: bool,

        /// Cosine similarity above which topics are grouped (0-1)
        #[arg(long)]
        similarity_threshold: Option<f64>,

        /// Number of files to OCR in parallel
        #[arg(long)]
        concurrency: Option<usize>,

        /// Print the analysis as JSON instead of tables
        #[arg(long)]
        json: bool,

        /// Number of predictions to show in the terminal
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Mine topic phrases from a plain text file (no OCR)
    Topics {
        /// The text file to read
        file: PathBuf,

        /// Disable noun lemmatization of topic phrases
        #[arg(long)]
        no_lemmatize: bool,
    },

    /// Show tool availability and the state of the output directory
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    config.verbose |= cli.verbose;

    let default_filter = if config.verbose {
        "pastpaper=debug"
    } else {
        "pastpaper=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Commands::Analyze {
            paths,
            output,
            no_lemmatize,
            debug,
            similarity_threshold,
            concurrency,
            json,
            limit,
        } => {
            if let Some(output) = output {
                config.output_dir = output;
            }
            if no_lemmatize {
                config.use_lemmatization = false;
            }
            config.debug |= debug;
            if let Some(threshold) = similarity_threshold {
                config.similarity_threshold = threshold;
            }
            if let Some(concurrency) = concurrency {
                config.concurrency = concurrency;
            }
            config.validate()?;

            let files = collect_inputs(&paths)?;
            if files.is_empty() {
                println!("No supported files found (png, jpg, jpeg, tiff, bmp, pdf).");
                return Ok(());
            }
            config.require_ocr()?;
            if files.iter().any(|f| input_kind(f) == Some(InputKind::Pdf)) {
                config.require_pdf()?;
            }

            let engine = Arc::new(TesseractEngine::new(
                config.tesseract_bin.clone(),
                config.ocr_timeout,
            ));
            let renderer = Arc::new(PdftoppmRenderer::new(
                config.pdftoppm_bin.clone(),
                config.pdf_dpi,
                config.ocr_timeout,
            ));
            let pipeline = Pipeline::from_config(&config, engine, renderer)?;

            let cancel = CancelFlag::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted; finishing the current files");
                    on_signal.cancel();
                }
            });

            println!("Analyzing {} file(s)...", files.len());
            let Some(bundle) = pipeline.run(&files, &cancel).await? else {
                println!(
                    "{}",
                    "No data: no document yielded enough text or topics to analyze.".yellow()
                );
                return Ok(());
            };

            match artifacts::write_audit_texts(&bundle.documents, &config.output_dir) {
                Ok(n) => info!(written = n, "Audit texts saved"),
                Err(e) => warn!(error = %e, "Failed to save audit texts"),
            }
            if let Err(e) = artifacts::write_bundle_json(&bundle, &config.output_dir) {
                warn!(error = %e, "Failed to save analysis JSON");
            }
            match markdown::write_report(&bundle, &config.output_dir) {
                Ok(path) => info!(path = %path.display(), "Report written"),
                Err(e) => warn!(error = %e, "Failed to write report"),
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&bundle)?);
            } else {
                terminal::display_bundle(&bundle, limit);
            }
        }

        Commands::Topics { file, no_lemmatize } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let miner = PhraseMiner::new(
                config.vocabulary()?,
                config.use_lemmatization && !no_lemmatize,
            )?;
            let topics = miner.extract(&text);
            terminal::display_topics(&topics);
        }

        Commands::Status => {
            pastpaper::status::show(&config)?;
        }
    }

    Ok(())
}
