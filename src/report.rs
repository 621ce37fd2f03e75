//! Turns the collected result records into persisted tabular output.
//!
//! The result collection arrives unordered; the reporter sorts its summary
//! view for readability but persists records as collected.

use crate::{ExperimentResult, ProbeResult};
use colored::*;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const CSV_COLUMNS: [&str; 11] = [
    "phase",
    "provider",
    "model",
    "paper",
    "paper_length",
    "attack_type",
    "payload_position",
    "mitigation",
    "soundness_score",
    "novelty_score",
    "response",
];

/// Writes the full result collection as pretty-printed JSON.
pub fn write_json(results: &[ExperimentResult], path: &Path) -> ProbeResult<()> {
    let json = serde_json::to_string_pretty(results)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

/// Writes the full result collection as CSV, one row per record.
pub fn write_csv(results: &[ExperimentResult], path: &Path) -> ProbeResult<()> {
    let mut file = File::create(path)?;
    writeln!(file, "{}", CSV_COLUMNS.join(","))?;
    for r in results {
        let fields = [
            csv_field(&r.phase),
            csv_field(&r.provider),
            csv_field(&r.model),
            csv_field(&r.paper),
            r.paper_length.to_string(),
            csv_field(&r.attack_type),
            csv_field(&r.payload_position),
            r.mitigation.to_string(),
            score_field(r.soundness_score),
            score_field(r.novelty_score),
            csv_field(&r.response),
        ];
        writeln!(file, "{}", fields.join(","))?;
    }
    Ok(())
}

fn score_field(score: Option<u8>) -> String {
    score.map(|s| s.to_string()).unwrap_or_default()
}

// Quote a field when it contains a delimiter, quote, or newline (RFC 4180).
fn csv_field(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Prints the key columns of every record, sorted by phase, paper and model.
pub fn print_summary(results: &[ExperimentResult]) {
    println!("\n{}", "--- Experiment Summary ---".bold().white());
    println!(
        "{:<11} {:<10} {:<24} {:<28} {:<11} {:<9} {:<10} {:>9} {:>7}",
        "phase",
        "provider",
        "model",
        "paper",
        "attack",
        "position",
        "mitigation",
        "soundness",
        "novelty"
    );

    let mut rows: Vec<&ExperimentResult> = results.iter().collect();
    rows.sort_by(|a, b| {
        (&a.phase, &a.paper, &a.model, &a.attack_type, &a.payload_position).cmp(&(
            &b.phase,
            &b.paper,
            &b.model,
            &b.attack_type,
            &b.payload_position,
        ))
    });

    for r in rows {
        println!(
            "{:<11} {:<10} {:<24} {:<28} {:<11} {:<9} {:<10} {:>9} {:>7}",
            r.phase,
            r.provider,
            r.model,
            r.paper,
            r.attack_type,
            r.payload_position,
            r.mitigation,
            score_field(r.soundness_score),
            score_field(r.novelty_score),
        );
    }
}
