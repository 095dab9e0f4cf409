//! Host configuration: environment variables (optionally from `.env`) and
//! command-line flags resolved into one typed [`AppConfig`].

use clap::Args;

use canvas::consts::{DEFAULT_EXPORT_FILE_NAME, DEFAULT_UNDO_KEY, MARKER_HIT_RADIUS_PX};
use canvas::engine::EngineSettings;

pub const DEFAULT_LOG_FILTER: &str = "trackedit=info,canvas=info";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Raw settings as given on the command line or in the environment.
///
/// Every field is optional; absent fields fall back to the built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Key that removes the last point during replay.
    #[arg(long, global = true, env = "TRACKEDIT_UNDO_KEY")]
    pub undo_key: Option<String>,

    /// File name for exported documents.
    #[arg(long, global = true, env = "TRACKEDIT_EXPORT_FILE")]
    pub export_file: Option<String>,

    /// Marker hit radius in device pixels.
    #[arg(long, global = true, env = "TRACKEDIT_HIT_RADIUS_PX")]
    pub hit_radius_px: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub undo_key: String,
    pub export_file_name: String,
    pub hit_radius_px: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            undo_key: DEFAULT_UNDO_KEY.to_owned(),
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_owned(),
            hit_radius_px: MARKER_HIT_RADIUS_PX,
        }
    }
}

impl AppConfig {
    /// Build typed config from raw overrides.
    ///
    /// - `TRACKEDIT_UNDO_KEY` / `--undo-key`: default `Backspace`
    /// - `TRACKEDIT_EXPORT_FILE` / `--export-file`: default `track-layout.json`;
    ///   a bare file name, no directories
    /// - `TRACKEDIT_HIT_RADIUS_PX` / `--hit-radius-px`: default 8, must be positive
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty or malformed value.
    pub fn resolve(raw: &ConfigOverrides) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let undo_key = match raw.undo_key.as_deref().map(str::trim) {
            None => defaults.undo_key,
            Some("") => return Err(ConfigError::Empty { var: "TRACKEDIT_UNDO_KEY" }),
            Some(key) => key.to_owned(),
        };

        let export_file_name = match raw.export_file.as_deref().map(str::trim) {
            None => defaults.export_file_name,
            Some(name) => parse_file_name(name)?,
        };

        let hit_radius_px = match raw.hit_radius_px {
            None => defaults.hit_radius_px,
            Some(px) if px.is_finite() && px > 0.0 => px,
            Some(px) => {
                return Err(ConfigError::Invalid {
                    var: "TRACKEDIT_HIT_RADIUS_PX",
                    reason: format!("expected a positive number of pixels, got {px}"),
                });
            }
        };

        Ok(Self { undo_key, export_file_name, hit_radius_px })
    }

    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            undo_key: self.undo_key.clone(),
            export_file_name: self.export_file_name.clone(),
            hit_radius_px: self.hit_radius_px,
        }
    }
}

fn parse_file_name(name: &str) -> Result<String, ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Empty { var: "TRACKEDIT_EXPORT_FILE" });
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ConfigError::Invalid {
            var: "TRACKEDIT_EXPORT_FILE",
            reason: format!("expected a bare file name, got {name:?}"),
        });
    }
    Ok(name.to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
