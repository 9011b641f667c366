use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathwiseError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{}: missing required column '{column}'", file.display())]
    MissingColumn { file: PathBuf, column: String },

    #[error("{}: unexpected header: {found}", file.display())]
    MalformedHeader { file: PathBuf, found: String },

    #[error("Seed set is empty: none of [{requested}] is a node of the interaction network")]
    EmptySeedSet { requested: String },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}

impl PathwiseError {
    /// Wrap an I/O error with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, PathwiseError>;
