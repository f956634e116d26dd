use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::geometry::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigPathError {
    #[error("neither XDG_CONFIG_HOME nor HOME is set")]
    MissingHomeDirectory,
}

const APP_DIR: &str = "pagecraft";
const APP_CONFIG_FILE: &str = "config.json";

const DEFAULT_COLOR: Color = Color::new(0x4F, 0x46, 0xE5);

fn default_working_scale() -> f32 {
    1.5
}

fn default_max_canvas_width() -> u32 {
    800
}

fn default_max_canvas_height() -> u32 {
    600
}

fn default_color_hex() -> String {
    "#4F46E5".to_string()
}

fn default_brush_width() -> f32 {
    5.0
}

fn default_highlighter_width() -> f32 {
    20.0
}

fn default_history_limit() -> Option<usize> {
    Some(200)
}

/// Engine settings from `config.json`. Every field is optional on disk.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Multiplier applied to native page dimensions when rasterising.
    #[serde(default = "default_working_scale")]
    pub working_scale: f32,
    /// Loaded images are scaled down to fit within these bounds.
    #[serde(default = "default_max_canvas_width")]
    pub max_canvas_width: u32,
    #[serde(default = "default_max_canvas_height")]
    pub max_canvas_height: u32,
    #[serde(default = "default_color_hex")]
    pub default_color: String,
    #[serde(default = "default_brush_width")]
    pub brush_width: f32,
    #[serde(default = "default_highlighter_width")]
    pub highlighter_width: f32,
    /// `None` keeps every snapshot.
    #[serde(default = "default_history_limit")]
    pub history_limit: Option<usize>,
    #[serde(default)]
    pub ocr_language: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            working_scale: default_working_scale(),
            max_canvas_width: default_max_canvas_width(),
            max_canvas_height: default_max_canvas_height(),
            default_color: default_color_hex(),
            brush_width: default_brush_width(),
            highlighter_width: default_highlighter_width(),
            history_limit: default_history_limit(),
            ocr_language: None,
        }
    }
}

impl EngineConfig {
    pub fn default_color(&self) -> Color {
        Color::from_hex(&self.default_color).unwrap_or_else(|| {
            tracing::warn!(value = %self.default_color, "invalid default_color; using fallback");
            DEFAULT_COLOR
        })
    }

    /// Positive, finite working scale; falls back to the default otherwise.
    pub fn working_scale(&self) -> f32 {
        if self.working_scale.is_finite() && self.working_scale > 0.0 {
            self.working_scale
        } else {
            default_working_scale()
        }
    }
}

pub fn load_engine_config() -> EngineConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_engine_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_engine_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> EngineConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return EngineConfig::default(),
    };
    if !path.exists() {
        return EngineConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => parse_engine_config(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            EngineConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            EngineConfig::default()
        }
    }
}

pub fn parse_engine_config(contents: &str) -> serde_json::Result<EngineConfig> {
    serde_json::from_str(contents)
}

pub fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "pagecraft",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/pagecraft/config.json"));
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path("pagecraft", "config.json", None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/pagecraft/config.json"));
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("pagecraft", "config.json", None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = parse_engine_config(r#"{ "brush_width": 8.0 }"#).expect("valid json");
        assert_eq!(config.brush_width, 8.0);
        assert_eq!(config.working_scale, 1.5);
        assert_eq!(config.max_canvas_width, 800);
        assert_eq!(config.default_color(), Color::new(0x4F, 0x46, 0xE5));
    }

    #[test]
    fn invalid_values_resolve_to_fallbacks() {
        let config = parse_engine_config(r##"{ "working_scale": -2, "default_color": "blue" }"##)
            .expect("valid json");
        assert_eq!(config.working_scale(), 1.5);
        assert_eq!(config.default_color(), DEFAULT_COLOR);
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = load_engine_config_with(Some(Path::new("/nonexistent/pagecraft-test")), None);
        assert_eq!(config, EngineConfig::default());
    }
}
