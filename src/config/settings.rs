//! User-facing settings loaded from `config.toml`
//!
//! Every section is optional in the file; missing keys fall back to the
//! defaults below. When no file exists the defaults are written out so
//! the options are discoverable.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::core::Region;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub behavior: BehaviorConfig,
    pub sounds: SoundConfig,
    pub overlay: OverlayConfig,
    pub hotkeys: HotkeyConfig,
    pub headless: HeadlessConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// 0 = unlimited
    pub max_depth: u32,
    pub scroll_amount: u32,
    pub min_cell_size: u32,
    pub hide_after_commit: bool,
    pub move_on_show: bool,
    pub follow_selection: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            max_depth: 0,
            scroll_amount: 3,
            min_cell_size: 3,
            hide_after_commit: false,
            move_on_show: false,
            follow_selection: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SoundConfig {
    pub enabled: bool,
    pub show_grid: bool,
    pub refine_selection: bool,
    pub click: bool,
    pub scroll: bool,
    pub reject: bool,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            show_grid: true,
            refine_selection: true,
            click: true,
            scroll: false,
            reject: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub opacity: f32,
    pub line_width: f32,
    pub line_color: String,
    pub label_color: String,
    pub shade_color: String,
    pub font_size: f32,
    pub font_path: Option<PathBuf>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            opacity: 0.85,
            line_width: 2.0,
            line_color: "#00FF00".to_string(),
            label_color: "#FFFFFF".to_string(),
            shade_color: "#00000060".to_string(),
            font_size: 32.0,
            font_path: None,
        }
    }
}

/// Action name to key chord, e.g. `toggle = "ctrl+shift+/"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HotkeyConfig {
    pub toggle: String,
    pub cancel: String,
    pub back: String,
    pub reset: String,
    pub move_pointer: String,
    pub left_click: String,
    pub right_click: String,
    pub scroll_up: String,
    pub scroll_down: String,
    pub scroll_left: String,
    pub scroll_right: String,
    pub pause: String,
    pub reload: String,
    pub quit: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            toggle: "ctrl+shift+/".to_string(),
            cancel: "esc".to_string(),
            back: "backspace".to_string(),
            reset: "home".to_string(),
            move_pointer: "space".to_string(),
            left_click: "enter".to_string(),
            right_click: "shift+enter".to_string(),
            scroll_up: "up".to_string(),
            scroll_down: "down".to_string(),
            scroll_left: "left".to_string(),
            scroll_right: "right".to_string(),
            pause: "ctrl+shift+.".to_string(),
            reload: "ctrl+shift+f5".to_string(),
            quit: "ctrl+shift+q".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HeadlessConfig {
    /// left, top, right, bottom
    pub monitor: [i32; 4],
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            monitor: [0, 0, 1920, 1080],
        }
    }
}

impl HeadlessConfig {
    pub fn monitor_region(&self) -> Result<Region, ConfigError> {
        let [left, top, right, bottom] = self.monitor;
        Region::new(left, top, right, bottom).map_err(|e| ConfigError::Invalid {
            field: "headless.monitor",
            reason: e.to_string(),
        })
    }
}

impl AppConfig {
    /// Checks values serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.behavior.scroll_amount == 0 {
            return Err(ConfigError::Invalid {
                field: "behavior.scroll_amount",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.behavior.min_cell_size == 0 {
            return Err(ConfigError::Invalid {
                field: "behavior.min_cell_size",
                reason: "must be at least one pixel".to_string(),
            });
        }

        let opacity = self.overlay.opacity;
        if !(opacity > 0.0 && opacity <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "overlay.opacity",
                reason: format!("{opacity} is outside (0, 1]"),
            });
        }

        if !(self.overlay.line_width > 0.0) {
            return Err(ConfigError::Invalid {
                field: "overlay.line_width",
                reason: "must be positive".to_string(),
            });
        }

        if !(self.overlay.font_size > 0.0) {
            return Err(ConfigError::Invalid {
                field: "overlay.font_size",
                reason: "must be positive".to_string(),
            });
        }

        parse_hex_color("overlay.line_color", &self.overlay.line_color)?;
        parse_hex_color("overlay.label_color", &self.overlay.label_color)?;
        parse_hex_color("overlay.shade_color", &self.overlay.shade_color)?;
        self.headless.monitor_region()?;

        Ok(())
    }
}

/// Parses `#RRGGBB` or `#RRGGBBAA` into RGBA bytes
pub fn parse_hex_color(field: &'static str, value: &str) -> Result<[u8; 4], ConfigError> {
    let invalid = || ConfigError::Invalid {
        field,
        reason: format!("`{value}` is not a #RRGGBB or #RRGGBBAA color"),
    };

    let hex = value.strip_prefix('#').ok_or_else(invalid)?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return Err(invalid());
    }

    let mut rgba = [0, 0, 0, 255];
    for (slot, chunk) in rgba.iter_mut().zip(hex.as_bytes().chunks(2)) {
        let pair = std::str::from_utf8(chunk).map_err(|_| invalid())?;
        *slot = u8::from_str_radix(pair, 16).map_err(|_| invalid())?;
    }

    Ok(rgba)
}

/// Returns the path to `<config_dir>/numgrid/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("numgrid").join("config.toml"))
}

/// Loads and validates the config at `path`
///
/// A missing file is created with the defaults. A malformed file is an
/// error; the caller decides whether to fall back.
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        if let Err(e) = write_default(path) {
            warn!("Failed to write default config: {}", e);
        }
        return Ok(AppConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Loads from the default location, or the defaults when there is none
pub fn load_default_location() -> Result<AppConfig, ConfigError> {
    match config_path() {
        Some(path) => load_from(&path),
        None => {
            warn!("Could not determine config directory, using default config");
            Ok(AppConfig::default())
        }
    }
}

pub fn parse(contents: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

pub fn default_toml() -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(&AppConfig::default())?)
}

fn write_default(path: &Path) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, default_toml()?).map_err(io_err)
}
