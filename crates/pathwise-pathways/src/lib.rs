//! pathwise-pathways — Pathway membership index and pathway selectivity scoring.
//!
//! Loaders turn Reactome mapping dumps, GMT libraries and GSEA output into
//! membership rows and disease pathway sets; `selectivity` scores genes over
//! the union of disease and target pathways.

pub mod index;
pub mod selectivity;
pub mod reactome;
pub mod gmt;
pub mod enrichment;

pub use index::{MembershipRow, PathwayIndex};
pub use selectivity::{score_selectivity, rank_by_selectivity, SelectivityScore};
pub use enrichment::{DiseasePathwaySource, GseaRecord, GseaResultsFile, PathwayListFile, StaticPathways};
