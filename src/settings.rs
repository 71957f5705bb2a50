//! Persistent display and physics settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All persistable settings. Scheduler state is runtime-only and never
/// saved; these are the knobs the physics panel exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // Physics
    pub gravity: f32,
    pub scaling_ratio: f32,
    pub lin_log_mode: bool,
    pub barnes_hut: bool,
    #[serde(default = "default_iterations")]
    pub iterations_per_frame: usize,

    // Display
    pub hide_orphans: bool,
    #[serde(default = "default_label_zoom")]
    pub label_zoom_threshold: f32,
}

fn default_iterations() -> usize {
    20
}

fn default_label_zoom() -> f32 {
    3.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gravity: 0.06,
            scaling_ratio: 20.0,
            lin_log_mode: true,
            barnes_hut: true,
            iterations_per_frame: 20,
            hide_orphans: false,
            label_zoom_threshold: 3.0,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("mixgraph");
            p.push("settings.json");
            p
        })
    }

    /// Load from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            tracing::warn!("no config directory, using default settings");
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => {
                    tracing::info!(?path, "loaded settings");
                    settings
                }
                Err(e) => {
                    tracing::warn!(?path, error = %e, "unreadable settings file, using defaults");
                    Self::default()
                }
            },
            // file doesn't exist yet, that's fine
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            tracing::warn!("no config directory, settings not saved");
            return;
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(error = %e, "failed to create config directory");
                return;
            }
        }

        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    tracing::warn!(?path, error = %e, "failed to write settings");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize settings"),
        }
    }
}
