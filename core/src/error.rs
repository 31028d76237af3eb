use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the indexing pipeline, persistence and query engine.
///
/// Empty corpora, empty results and out-of-vocabulary terms are not errors;
/// they produce empty collections.
#[derive(Debug, Error)]
pub enum Error {
    /// `min_frequency` is greater than `max_frequency`
    #[error("invalid frequency bounds: min {min} > max {max}")]
    InvalidFrequencyBounds { min: u32, max: u32 },

    /// Ranked queries need room for at least one result
    #[error("invalid result count: k must be greater than 0")]
    InvalidTopK,

    /// An index artifact is not on disk
    #[error("index file missing: {}", path.display())]
    Missing { path: PathBuf },

    /// An index artifact exists but cannot be trusted
    #[error("index file corrupt: {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// A corpus record could not be parsed
    #[error("bad corpus record in {} line {line}: {reason}", path.display())]
    Ingest { path: PathBuf, line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures of the persisted index, where a rebuild may help.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Missing { .. } | Error::Corrupt { .. } | Error::Io(_))
    }

    /// True for invalid caller-supplied parameters.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::InvalidFrequencyBounds { .. } | Error::InvalidTopK)
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Corrupt { path: path.into(), reason: reason.to_string() }
    }
}
