//! Functional interaction tables.
//!
//! Two layouts are accepted:
//! - Reactome FI export, with header `Gene1 Gene2 Annotation Direction Score`.
//!   Direction is ignored (the graph is undirected) and Score is the weight.
//! - Headerless edge lists: `gene_a gene_b` or `gene_a gene_b weight`.
//!
//! An empty weight field means unweighted. A weight that does not parse
//! skips the row; a weight that parses but is negative or NaN is passed on
//! for the graph builder to reject.

use std::path::Path;

use pathwise_common::{tsv, PathwiseError, Result, SkippedRows};
use tracing::info;

use crate::graph::InteractionRow;

const FI_HEADER_PREFIX: &str = "Gene1";
const FI_FIELD_COUNT: usize = 5;
const FI_SCORE_IDX: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    ReactomeFi,
    EdgeList,
}

/// Read interaction rows from `path`.
pub fn load_interactions(path: &Path) -> Result<Vec<InteractionRow>> {
    info!(file = %path.display(), "Loading functional interactions");

    let mut reader = tsv::open(path, false)?;
    let mut rows = Vec::new();
    let mut skipped = SkippedRows::default();
    let mut layout: Option<Layout> = None;

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) if !e.is_io_error() => {
                skipped.record(tsv::error_line(&e), "undecodable row");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let line = tsv::line_of(&record);

        let current = match layout {
            Some(l) => l,
            None => {
                let detected = if record.get(0).map(str::trim) == Some(FI_HEADER_PREFIX) {
                    Layout::ReactomeFi
                } else {
                    Layout::EdgeList
                };
                layout = Some(detected);
                if detected == Layout::ReactomeFi {
                    if record.len() != FI_FIELD_COUNT {
                        return Err(PathwiseError::MalformedHeader {
                            file: path.to_path_buf(),
                            found: record.iter().collect::<Vec<_>>().join("\t"),
                        });
                    }
                    continue;
                }
                detected
            }
        };

        let weight_field = match current {
            Layout::ReactomeFi if record.len() == FI_FIELD_COUNT => record.get(FI_SCORE_IDX),
            Layout::ReactomeFi => {
                skipped.record(line, "expected 5 tab-separated fields");
                continue;
            }
            Layout::EdgeList if record.len() == 2 => None,
            Layout::EdgeList if record.len() == 3 => record.get(2),
            Layout::EdgeList => {
                skipped.record(line, "expected 2 or 3 tab-separated fields");
                continue;
            }
        };

        let weight = match weight_field.map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<f64>() {
                Ok(w) => Some(w),
                Err(_) => {
                    skipped.record(line, "unparsable weight");
                    continue;
                }
            },
        };

        rows.push(InteractionRow::new(record[0].trim(), record[1].trim(), weight));
    }

    skipped.report(&path.display().to_string());
    info!(n_rows = rows.len(), layout = ?layout, "Parsed functional interactions");
    Ok(rows)
}
