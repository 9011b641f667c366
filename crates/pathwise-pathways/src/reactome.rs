//! Reactome gene→pathway mapping dump.
//!
//! Headerless, 8 tab-separated columns:
//! - source identifier (e.g., "ENSG00000150907")
//! - gene identifier
//! - gene label, symbol first (e.g., "UBC [cytosol]")
//! - pathway stable ID (e.g., "R-HSA-69278")
//! - pathway URL
//! - pathway name
//! - evidence code
//! - species (e.g., "Homo sapiens")
//!
//! Several source IDs may resolve to the same root symbol; the index
//! collapses those memberships.

use std::path::Path;

use pathwise_common::{tsv, Result, SkippedRows};
use tracing::info;

use crate::index::MembershipRow;

const FIELD_COUNT: usize = 8;

/// Read membership rows for `species` from a Reactome mapping file.
///
/// Rows with the wrong field count are skipped and reported.
pub fn load_mapping(path: &Path, species: &str) -> Result<Vec<MembershipRow>> {
    info!(file = %path.display(), species, "Loading Reactome pathway mapping");

    let mut reader = tsv::open(path, false)?;
    let mut rows = Vec::new();
    let mut skipped = SkippedRows::default();
    let mut other_species = 0usize;

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) if !e.is_io_error() => {
                skipped.record(tsv::error_line(&e), "undecodable row");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if record.len() != FIELD_COUNT {
            skipped.record(tsv::line_of(&record), "expected 8 tab-separated fields");
            continue;
        }
        if record[7].trim() != species {
            other_species += 1;
            continue;
        }

        rows.push(MembershipRow {
            gene: root_symbol(&record[2]).to_string(),
            pathway_id: record[3].trim().to_string(),
            pathway_name: record[5].trim().to_string(),
        });
    }

    skipped.report(&path.display().to_string());
    info!(
        n_rows = rows.len(),
        other_species,
        "Parsed Reactome pathway mapping"
    );
    Ok(rows)
}

/// Symbol part of a gene label: the first whitespace-separated token.
pub fn root_symbol(label: &str) -> &str {
    label.split_whitespace().next().unwrap_or("")
}
