//! Configuration management for the WebDesk daemon.
//!
//! Configuration is loaded from TOML files in the following locations (in order):
//! 1. The platform config directory (`~/.config/webdesk/config.toml` on Linux,
//!    `%APPDATA%/webdesk/config.toml` on Windows)
//! 2. `~/.config/webdesk/config.toml` (Unix-style, for platforms that differ)
//! 3. `./config.toml` (current directory, for development)

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use webdesk_core::desktop::DEFAULT_SESSION_KEY;
use webdesk_core::{ContentSettings, DesktopBounds, DesktopLayout, Size};

/// Main configuration structure for WebDesk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bands, snapping and resize limits.
    pub layout: LayoutConfig,
    /// Placement of newly added windows.
    pub window: WindowConfig,
    /// Session persistence.
    pub session: SessionConfig,
    /// Defaults for hosted content.
    pub content: ContentConfig,
    /// Initial desktop size.
    pub desktop: DesktopConfig,
    /// Behavior configuration.
    pub behavior: BehaviorConfig,
    /// IPC server configuration.
    pub server: ServerConfig,
}

/// Layout-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Height of the toolbar band at the top.
    #[serde(default = "default_band_height")]
    pub toolbar_height: i32,

    /// Height of the taskbar band at the bottom.
    #[serde(default = "default_band_height")]
    pub taskbar_height: i32,

    /// Distance under which a dragged window snaps to an edge.
    #[serde(default = "default_snap_threshold")]
    pub snap_threshold: i32,

    /// Whether dragging snaps to edges at all.
    #[serde(default = "default_true")]
    pub snapping: bool,

    /// Smallest width a resize may produce.
    #[serde(default = "default_min_width")]
    pub min_width: i32,

    /// Smallest height a resize may produce.
    #[serde(default = "default_min_height")]
    pub min_height: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            toolbar_height: default_band_height(),
            taskbar_height: default_band_height(),
            snap_threshold: default_snap_threshold(),
            snapping: true,
            min_width: default_min_width(),
            min_height: default_min_height(),
        }
    }
}

/// Placement of newly added windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Width of a new window.
    #[serde(default = "default_window_width")]
    pub default_width: i32,

    /// Height of a new window.
    #[serde(default = "default_window_height")]
    pub default_height: i32,

    /// Origin (both axes) of the first window.
    #[serde(default = "default_origin")]
    pub origin: i32,

    /// Cascade offset applied per existing window.
    #[serde(default = "default_offset_step")]
    pub offset_step: i32,

    /// Stacking baseline for new windows.
    #[serde(default = "default_base_z_index")]
    pub base_z_index: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            default_width: default_window_width(),
            default_height: default_window_height(),
            origin: default_origin(),
            offset_step: default_offset_step(),
            base_z_index: default_base_z_index(),
        }
    }
}

/// Session persistence configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Key of the session slot, also the file stem on disk.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Directory holding session files. Defaults to the platform data dir.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Restore the saved session when the daemon starts.
    #[serde(default = "default_true")]
    pub restore_on_start: bool,

    /// Save the session when the daemon shuts down.
    #[serde(default = "default_false")]
    pub save_on_exit: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            directory: None,
            restore_on_start: true,
            save_on_exit: false,
        }
    }
}

/// Defaults for hosted content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Page a new browser window opens.
    pub browser_url: String,
    /// Media a new video window plays.
    pub video_url: String,
    /// Hint shown in an empty notepad.
    pub notepad_placeholder: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        let settings = ContentSettings::default();
        Self {
            browser_url: settings.browser_url,
            video_url: settings.video_url,
            notepad_placeholder: settings.notepad_placeholder,
        }
    }
}

/// Initial desktop size, used until a host reports real bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// Behavior-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// IPC server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Loopback address the IPC server listens on.
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

// Default value functions for serde
fn default_band_height() -> i32 {
    40
}

fn default_snap_threshold() -> i32 {
    20
}

fn default_min_width() -> i32 {
    200
}

fn default_min_height() -> i32 {
    150
}

fn default_window_width() -> i32 {
    400
}

fn default_window_height() -> i32 {
    300
}

fn default_origin() -> i32 {
    50
}

fn default_offset_step() -> i32 {
    20
}

fn default_base_z_index() -> u32 {
    100
}

fn default_storage_key() -> String {
    DEFAULT_SESSION_KEY.to_string()
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_address() -> String {
    webdesk_ipc::DEFAULT_ADDR.to_string()
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Largest stacking baseline accepted, leaving headroom for raises.
const MAX_BASE_Z_INDEX: u32 = 1_000_000;

/// A config value that was out of range and has been corrected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    /// Dotted path of the offending field.
    pub field: String,
    /// What was wrong and what was used instead.
    pub message: String,
}

impl ConfigWarning {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl Config {
    /// Load configuration from standard locations.
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self> {
        let paths = config_paths();

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Clamp nonsensical values in place, returning one warning per fix.
    pub fn validate(&mut self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        for (field, value) in [
            ("layout.toolbar_height", &mut self.layout.toolbar_height),
            ("layout.taskbar_height", &mut self.layout.taskbar_height),
            ("layout.snap_threshold", &mut self.layout.snap_threshold),
            ("window.origin", &mut self.window.origin),
            ("window.offset_step", &mut self.window.offset_step),
        ] {
            if *value < 0 {
                warnings.push(ConfigWarning::new(
                    field,
                    format!("{} is negative, using 0", value),
                ));
                *value = 0;
            }
        }

        for (field, value) in [
            ("layout.min_width", &mut self.layout.min_width),
            ("layout.min_height", &mut self.layout.min_height),
        ] {
            if *value < 1 {
                warnings.push(ConfigWarning::new(
                    field,
                    format!("{} is below 1, using 1", value),
                ));
                *value = 1;
            }
        }

        if self.window.default_width < self.layout.min_width {
            warnings.push(ConfigWarning::new(
                "window.default_width",
                format!(
                    "{} is below layout.min_width, using {}",
                    self.window.default_width, self.layout.min_width
                ),
            ));
            self.window.default_width = self.layout.min_width;
        }
        if self.window.default_height < self.layout.min_height {
            warnings.push(ConfigWarning::new(
                "window.default_height",
                format!(
                    "{} is below layout.min_height, using {}",
                    self.window.default_height, self.layout.min_height
                ),
            ));
            self.window.default_height = self.layout.min_height;
        }

        if self.window.base_z_index > MAX_BASE_Z_INDEX {
            warnings.push(ConfigWarning::new(
                "window.base_z_index",
                format!(
                    "{} is above {}, using {}",
                    self.window.base_z_index,
                    MAX_BASE_Z_INDEX,
                    default_base_z_index()
                ),
            ));
            self.window.base_z_index = default_base_z_index();
        }

        let key = &self.session.storage_key;
        if key.is_empty() || key.contains(['/', '\\']) || key.contains("..") {
            warnings.push(ConfigWarning::new(
                "session.storage_key",
                format!("'{}' is not a valid key, using '{}'", key, DEFAULT_SESSION_KEY),
            ));
            self.session.storage_key = default_storage_key();
        }

        match (self.desktop.width, self.desktop.height) {
            (None, None) => {}
            (Some(width), Some(height)) => {
                let bands = self.layout.toolbar_height + self.layout.taskbar_height;
                if width <= 0 || height <= bands {
                    warnings.push(ConfigWarning::new(
                        "desktop",
                        format!("{}x{} leaves no usable area, ignoring", width, height),
                    ));
                    self.desktop = DesktopConfig::default();
                }
            }
            _ => {
                warnings.push(ConfigWarning::new(
                    "desktop",
                    "width and height must be set together, ignoring",
                ));
                self.desktop = DesktopConfig::default();
            }
        }

        let level = self.behavior.log_level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            warnings.push(ConfigWarning::new(
                "behavior.log_level",
                format!("'{}' is not a log level, using 'info'", self.behavior.log_level),
            ));
            self.behavior.log_level = default_log_level();
        }

        if self.server.address.parse::<SocketAddr>().is_err() {
            warnings.push(ConfigWarning::new(
                "server.address",
                format!(
                    "'{}' is not a socket address, using {}",
                    self.server.address,
                    webdesk_ipc::DEFAULT_ADDR
                ),
            ));
            self.server.address = default_address();
        }

        warnings
    }

    /// Engine layout constants described by this config.
    pub fn desktop_layout(&self) -> DesktopLayout {
        DesktopLayout {
            toolbar_height: self.layout.toolbar_height,
            taskbar_height: self.layout.taskbar_height,
            snap_threshold: self.layout.snap_threshold,
            snapping: self.layout.snapping,
            min_size: Size::new(self.layout.min_width, self.layout.min_height),
            default_size: Size::new(self.window.default_width, self.window.default_height),
            origin: self.window.origin,
            offset_step: self.window.offset_step,
            base_z_index: self.window.base_z_index,
        }
    }

    /// Content defaults described by this config.
    pub fn content_settings(&self) -> ContentSettings {
        ContentSettings {
            browser_url: self.content.browser_url.clone(),
            video_url: self.content.video_url.clone(),
            notepad_placeholder: self.content.notepad_placeholder.clone(),
        }
    }

    /// Desktop size to assume before a host reports one.
    pub fn initial_bounds(&self) -> Option<DesktopBounds> {
        match (self.desktop.width, self.desktop.height) {
            (Some(width), Some(height)) => Some(DesktopBounds::new(width, height)),
            _ => None,
        }
    }

    /// Directory holding session files.
    pub fn session_dir(&self) -> PathBuf {
        self.session.directory.clone().unwrap_or_else(default_session_dir)
    }
}

/// Get all possible config file paths in priority order.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. Platform config dir
    if let Some(proj_dirs) = ProjectDirs::from("", "", "webdesk") {
        paths.push(proj_dirs.config_dir().join("config.toml"));
    }

    // 2. Unix-style: ~/.config/webdesk/config.toml
    if let Some(home) = dirs_home() {
        let unix_path = home.join(".config").join("webdesk").join("config.toml");
        if !paths.contains(&unix_path) {
            paths.push(unix_path);
        }
    }

    // 3. Current directory: ./config.toml
    paths.push(PathBuf::from("config.toml"));

    paths
}

/// Platform data directory for session files.
pub fn default_session_dir() -> PathBuf {
    ProjectDirs::from("", "", "webdesk")
        .map(|dirs| dirs.data_dir().join("sessions"))
        .unwrap_or_else(|| PathBuf::from("sessions"))
}

/// Get the user's home directory.
fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}
