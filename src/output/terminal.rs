// Colored terminal output for analysis results.
//
// This module handles all terminal-specific formatting: colors, tables,
// headers. The main.rs command handlers delegate here.

use colored::Colorize;

use crate::models::{AnalysisBundle, LikelihoodCategory, Prediction, Topic};

const TOPIC_WIDTH: usize = 40;

/// Display the ranked prediction table.
pub fn display_predictions(predictions: &[Prediction], limit: usize) {
    if predictions.is_empty() {
        println!("No predictions: no topics were found in the documents.");
        return;
    }

    let shown = predictions.len().min(limit);
    println!(
        "\n{}",
        format!("=== Predicted Topics (top {shown} of {}) ===", predictions.len()).bold()
    );
    println!();

    println!(
        "  {:>4}  {:<40} {:>6}  {:<10}  {:>5}  {:>8}",
        "Rank".dimmed(),
        "Topic".dimmed(),
        "Score".dimmed(),
        "Likelihood".dimmed(),
        "Freq".dimmed(),
        "Coverage".dimmed(),
    );
    println!("  {}", "-".repeat(84).dimmed());

    for (i, p) in predictions.iter().take(limit).enumerate() {
        println!(
            "  {:>4}. {:<40} {:>6.2}  {:<10}  {:>5}  {:>7.1}%",
            i + 1,
            super::truncate_chars(&p.topic.display_name(), TOPIC_WIDTH),
            p.likelihood_score,
            colorize_category(p.likelihood_category),
            p.frequency,
            p.coverage_percentage,
        );
    }
    println!();
}

/// Display the run summary, heat index fallback and semantic groups.
pub fn display_bundle(bundle: &AnalysisBundle, limit: usize) {
    let summary = &bundle.summary;

    println!("\n{}", "=== Analysis Summary ===".bold());
    println!(
        "  Files: {}  |  Documents analyzed: {}  |  Unique topics: {}",
        summary.total_files, summary.successful_extractions, summary.total_topics
    );

    let very_high = count_category(&bundle.predictions, LikelihoodCategory::VeryHigh);
    let high = count_category(&bundle.predictions, LikelihoodCategory::High);
    if very_high > 0 {
        println!("  {} {} very high likelihood topics", "!!".red().bold(), very_high);
    }
    if high > 0 {
        println!("  {} {} high likelihood topics", "!".bright_red(), high);
    }

    if bundle.predictions.is_empty() {
        display_heat_index(bundle);
    } else {
        display_predictions(&bundle.predictions, limit);
    }

    if !bundle.semantic_groups.is_empty() {
        println!(
            "{}",
            format!("=== Related Topics ({} groups) ===", bundle.semantic_groups.len()).bold()
        );
        for group in &bundle.semantic_groups {
            let names: Vec<String> = group
                .members
                .iter()
                .map(|m| m.topic.display_name())
                .collect();
            println!(
                "  [{:.2}] {}",
                group.avg_similarity,
                super::truncate_chars(&names.join(", "), 100).dimmed()
            );
        }
        println!();
    }

    println!(
        "  Output written to {}",
        summary.output_directory.display().to_string().cyan()
    );
}

fn display_heat_index(bundle: &AnalysisBundle) {
    if bundle.heat_index.is_empty() {
        return;
    }
    println!("\n{}", "=== Topic Heat Index ===".bold());
    println!();
    for entry in &bundle.heat_index {
        let flames = "*".repeat(entry.heat as usize);
        let flames = match entry.heat {
            3 => flames.red().bold(),
            2 => flames.yellow(),
            _ => flames.dimmed(),
        };
        println!(
            "  {:<3} {:<40} {} mention(s)",
            flames,
            super::truncate_chars(&entry.topic.display_name(), TOPIC_WIDTH),
            entry.mentions
        );
    }
    println!();
}

/// Display topics mined from a single text, in discovery order.
pub fn display_topics(topics: &[Topic]) {
    if topics.is_empty() {
        println!("No topics found.");
        return;
    }
    println!("\n{}", format!("=== Topics ({}) ===", topics.len()).bold());
    for topic in topics {
        println!("  {}", topic.as_str());
    }
    println!();
}

fn count_category(predictions: &[Prediction], category: LikelihoodCategory) -> usize {
    predictions
        .iter()
        .filter(|p| p.likelihood_category == category)
        .count()
}

/// Colorize a likelihood category.
fn colorize_category(category: LikelihoodCategory) -> colored::ColoredString {
    let label = category.as_str();
    match category {
        LikelihoodCategory::VeryHigh => label.red().bold(),
        LikelihoodCategory::High => label.bright_red(),
        LikelihoodCategory::Medium => label.yellow(),
        LikelihoodCategory::Low => label.green(),
    }
}
