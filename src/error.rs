use std::path::PathBuf;
use thiserror::Error;

/// Failure while fetching or parsing the dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("malformed dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Rejection of a category selection on confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Please select at least one category.")]
    NoCategorySelected,
    #[error("No data for the selected categories.")]
    EmptyGraph,
}
