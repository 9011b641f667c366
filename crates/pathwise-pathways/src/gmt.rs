//! GMT gene set libraries (`term<TAB>description<TAB>gene1<TAB>gene2…`).
//!
//! Reactome's merged GMT embeds the stable ID in the term, e.g.
//! `Cell Cycle [R-HSA-1640170]`; that bracket becomes the pathway ID and the
//! remainder the name.

use std::path::Path;
use std::sync::OnceLock;

use pathwise_common::{tsv, Result, SkippedRows};
use regex::Regex;
use tracing::info;

use crate::index::MembershipRow;

/// Split a GMT term into `(pathway_id, pathway_name)`.
pub fn split_term(term: &str, id_pattern: &Regex) -> (String, String) {
    let term = term.trim();
    match id_pattern.captures(term) {
        Some(caps) => {
            let id = caps[1].trim().to_string();
            let name = id_pattern.replace(term, "").trim().to_string();
            (id, name)
        }
        None => (term.to_string(), term.to_string()),
    }
}

fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\[([^\]]+)\]").expect("static pattern"))
}

/// Read membership rows from a GMT file.
pub fn load_gmt(path: &Path) -> Result<Vec<MembershipRow>> {
    info!(file = %path.display(), "Loading GMT gene sets");

    let pattern = id_pattern();
    let mut reader = tsv::open(path, false)?;
    let mut rows = Vec::new();
    let mut skipped = SkippedRows::default();
    let mut n_sets = 0usize;

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) if !e.is_io_error() => {
                skipped.record(tsv::error_line(&e), "undecodable row");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if record.len() < 3 || record[0].trim().is_empty() {
            skipped.record(tsv::line_of(&record), "gene set needs a term and at least one gene");
            continue;
        }

        let (pathway_id, pathway_name) = split_term(&record[0], pattern);
        n_sets += 1;
        rows.extend(
            record
                .iter()
                .skip(2)
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(|gene| MembershipRow::new(gene, &pathway_id, &pathway_name)),
        );
    }

    skipped.report(&path.display().to_string());
    info!(n_sets, n_rows = rows.len(), "Parsed GMT gene sets");
    Ok(rows)
}
