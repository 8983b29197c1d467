//! Error taxonomy shared by the analysis tools.
//!
//! Every variant here is fatal for the invoking binary: these tools are
//! one-shot batch jobs and surface failures to the CI pipeline through a
//! non-zero exit status. Empty input data is deliberately NOT an error;
//! statistics over an empty sequence come back as `None` fields instead
//! (see [`crate::stats::LatencySummary`]).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// A log, matrix or XML line did not match the expected shape.
    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// The subscriber SV counter went backwards inside one iteration.
    /// Disordered delivery makes every downstream number meaningless, so
    /// no partial report is produced.
    #[error(
        "disordered SV counter in stream {stream}, iteration {iteration}: \
         {previous} followed by {next}"
    )]
    Ordering {
        stream: String,
        iteration: u32,
        previous: u32,
        next: u32,
    },

    /// An input file is absent or unreadable.
    #[error("cannot read {}: {source}", path.display())]
    MissingFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JUnit XML could not be decoded.
    #[error("malformed XML in {}: {reason}", path.display())]
    Xml { path: PathBuf, reason: String },

    /// Histogram image could not be encoded or written.
    #[error("failed to write image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Shorthand for a line-level parse failure.
    pub fn parse(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        AnalysisError::Parse {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}
