// FILE: src/cli/config.rs

use crate::context::FrameSettings;
use crate::error::{LayoutError, Result};
use crate::types::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub dpi: Option<f32>,
    pub pixel_scale: Option<f32>,
    pub viewport_width: Option<f32>,
    pub viewport_height: Option<f32>,
    pub max_width: Option<f32>,
    pub max_height: Option<f32>,
    pub worker_threads: Option<usize>,
}

impl ConfigFile {
    /// Overrides every field of `settings` that the file sets.
    pub fn apply(&self, settings: &mut FrameSettings) {
        if let Some(dpi) = self.dpi {
            settings.dpi = dpi;
        }
        if let Some(scale) = self.pixel_scale {
            settings.pixel_scale = scale;
        }
        settings.viewport_size = Vec2::new(
            self.viewport_width.unwrap_or(settings.viewport_size.x),
            self.viewport_height.unwrap_or(settings.viewport_size.y),
        );
        if let Some(width) = self.max_width {
            settings.root_constraints.max_width = width;
        }
        if let Some(height) = self.max_height {
            settings.root_constraints.max_height = height;
        }
        if let Some(threads) = self.worker_threads {
            settings.worker_threads = threads;
        }
    }
}

pub fn load(config_path: &str) -> Result<ConfigFile> {
    let config_content = fs::read_to_string(config_path).map_err(|e| LayoutError::FileNotFound {
        path: format!("Config file {}: {}", config_path, e),
    })?;
    log::info!("Loaded configuration from {}", config_path);

    if config_path.ends_with(".json") {
        serde_json::from_str(&config_content)
            .map_err(|e| LayoutError::invalid_format(format!("Invalid JSON config: {}", e)))
    } else if config_path.ends_with(".toml") {
        toml::from_str(&config_content)
            .map_err(|e| LayoutError::invalid_format(format!("Invalid TOML config: {}", e)))
    } else {
        Err(LayoutError::invalid_format(
            "Config file must be .json or .toml format",
        ))
    }
}
