//! Persistent settings for the viewer.

use crate::data::loader::DEFAULT_DATA_FILE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// All persistable UI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Dataset path or URL used when none is given on the command line
    #[serde(default = "default_data_source")]
    pub data_source: String,

    // Display
    #[serde(default = "default_true")]
    pub show_arrows: bool,
    #[serde(default)]
    pub render_labels: bool,
    #[serde(default = "default_edge_opacity")]
    pub edge_opacity: f32,
    /// Multiplier on node display size
    #[serde(default = "default_node_scale")]
    pub node_scale: f32,
}

fn default_data_source() -> String {
    DEFAULT_DATA_FILE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_edge_opacity() -> f32 {
    0.6
}

fn default_node_scale() -> f32 {
    1.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_source: default_data_source(),
            show_arrows: true,
            render_labels: false,
            edge_opacity: default_edge_opacity(),
            node_scale: default_node_scale(),
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("repost-graph");
            p.push("settings.json");
            p
        })
    }

    /// Load settings from disk, returning defaults if file doesn't exist or is invalid
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => {
                    tracing::info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    tracing::warn!("Failed to parse settings file: {}, using defaults", e);
                    Self::default()
                }
            },
            // First run
            Err(_) => Self::default(),
        }
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config directory, settings not saved");
            return;
        };
        self.save_to(&path);
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create config directory: {}", e);
                return;
            }
        }

        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    tracing::warn!("Failed to write settings file: {}", e);
                } else {
                    tracing::debug!("Saved settings to {:?}", path);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize settings: {}", e),
        }
    }
}
