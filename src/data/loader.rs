//! Dataset loading.
//!
//! Loading runs as explicit stages (fetch bytes, then parse) so each failure
//! surfaces as its own [`LoadError`] variant. The UI runs it on a background
//! thread and polls the returned receiver once per frame.

use super::types::RepostRecord;
use crate::error::LoadError;
use crate::graph::aggregate::extract_categories;
use reqwest::blocking::Client;
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

/// File name the dataset producer writes.
pub const DEFAULT_DATA_FILE: &str = "forwards_graph_2_level.json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Where the dataset lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
}

impl DataSource {
    /// Interpret a user-provided location: `http(s)://` prefixes are URLs,
    /// everything else is a filesystem path.
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            DataSource::Url(location.to_string())
        } else {
            DataSource::File(PathBuf::from(location))
        }
    }
}

impl Default for DataSource {
    fn default() -> Self {
        DataSource::File(PathBuf::from(DEFAULT_DATA_FILE))
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => f.write_str(url),
        }
    }
}

/// Loaded records plus the categories offered for filtering.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<RepostRecord>,
    pub categories: Vec<String>,
}

impl Dataset {
    pub fn new(records: Vec<RepostRecord>) -> Self {
        let categories = extract_categories(&records);
        Self {
            records,
            categories,
        }
    }
}

/// Fetch the raw bytes of the dataset.
fn fetch(source: &DataSource) -> Result<Vec<u8>, LoadError> {
    match source {
        DataSource::File(path) => std::fs::read(path).map_err(|source| LoadError::Read {
            path: path.clone(),
            source,
        }),
        DataSource::Url(url) => {
            let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
            let resp = client.get(url).send()?;
            if !resp.status().is_success() {
                return Err(LoadError::Status(resp.status().as_u16()));
            }
            Ok(resp.bytes()?.to_vec())
        }
    }
}

/// Parse a JSON array of repost records.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<RepostRecord>, LoadError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Load and parse the dataset, blocking the calling thread.
pub fn load_dataset(source: &DataSource) -> Result<Dataset, LoadError> {
    let started = Instant::now();
    tracing::info!("Loading dataset from {}", source);

    let bytes = fetch(source)?;
    tracing::debug!("Fetched {} bytes", bytes.len());

    let records = parse_records(&bytes)?;
    let dataset = Dataset::new(records);

    tracing::info!(
        "Loaded {} records, {} categories in {} ms",
        dataset.records.len(),
        dataset.categories.len(),
        started.elapsed().as_millis()
    );
    Ok(dataset)
}

/// Load the dataset on a background thread.
pub fn spawn_load(source: DataSource) -> Receiver<Result<Dataset, LoadError>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let result = load_dataset(&source);
        if let Err(ref e) = result {
            tracing::warn!("Dataset load failed: {}", e);
        }
        let _ = tx.send(result);
    });
    rx
}
