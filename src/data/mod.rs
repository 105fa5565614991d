//! Input dataset: record model and loading.

pub mod loader;
pub mod types;

pub use loader::{spawn_load, DataSource, Dataset};
pub use types::{Post, RepostRecord, SourceInfo, TargetInfo};
