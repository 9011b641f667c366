//! Ranked table and run summary writers.
//!
//! The table header is fixed; downstream tooling reads columns by name.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use pathwise_common::{PathwiseError, Result, ScoreRecord};
use serde::Serialize;
use tracing::info;

pub const TABLE_HEADER: [&str; 4] = ["gene", "selectivity_score", "propagation_score", "rank"];

/// Written in place of a score the gene did not receive.
pub const MISSING: &str = "NA";

fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| MISSING.to_string(), |s| s.to_string())
}

/// Write the ranked table as tab-separated text.
pub fn write_table<W: Write>(records: &[ScoreRecord], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    wtr.write_record(TABLE_HEADER)?;
    for rec in records {
        wtr.write_record([
            rec.gene.clone(),
            format_score(rec.selectivity_score),
            format_score(rec.propagation_score),
            rec.rank.to_string(),
        ])?;
    }
    wtr.flush().map_err(|e| PathwiseError::io("<table>", e))?;
    Ok(())
}

/// Write the table to `path`, or to stdout when `path` is `None`.
pub fn write_table_to(records: &[ScoreRecord], path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| PathwiseError::io(parent, e))?;
            }
            let file = File::create(path).map_err(|e| PathwiseError::io(path, e))?;
            write_table(records, file)?;
            info!(file = %path.display(), n_rows = records.len(), "Wrote ranked table");
        }
        None => {
            let stdout = io::stdout();
            write_table(records, stdout.lock())?;
        }
    }
    Ok(())
}

/// Write any serialisable summary as pretty JSON.
pub fn write_summary<T: Serialize>(summary: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json).map_err(|e| PathwiseError::io(path, e))?;
    info!(file = %path.display(), "Wrote run summary");
    Ok(())
}
