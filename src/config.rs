//! Configuration: JSON config under the XDG config dir
//! ($XDG_CONFIG_HOME/traymon/config.json, fallback ~/.config/traymon/config.json).
//! Every field is defaulted so a missing or partial file still runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{fs, io};
use tracing::warn;

use crate::sparkline::SparklineStyle;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Tick period for the display refresh loop, in milliseconds.
    #[serde(default = "default_refresh_interval_msec")]
    pub refresh_interval_msec: u64,
    /// Poll cadence for custom commands, decoupled from the tick.
    #[serde(default = "default_command_poll_msec")]
    pub command_poll_msec: u64,
    /// Template text; markup is passed through as opaque literal text.
    #[serde(default = "default_info_label")]
    pub info_label: String,
    /// Metric key name -> shell command text.
    #[serde(default)]
    pub custom_keys: BTreeMap<String, String>,
    /// Per-base-key sparkline style.
    #[serde(default)]
    pub sparklines: BTreeMap<String, SparklineStyle>,
}

fn default_refresh_interval_msec() -> u64 {
    1000
}

fn default_command_poll_msec() -> u64 {
    2000
}

fn default_info_label() -> String {
    "CPU: {cpu_percent:4.1f}%  RAM: {ram_percent:4.1f}%".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_msec: default_refresh_interval_msec(),
            command_poll_msec: default_command_poll_msec(),
            info_label: default_info_label(),
            custom_keys: BTreeMap::new(),
            sparklines: BTreeMap::new(),
        }
    }
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("traymon")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("traymon")
    }
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load from an explicit path, or the default location when `path` is `None`.
/// A missing file yields the defaults; an unparsable file is logged and also
/// yields the defaults rather than aborting.
pub fn load_config(path: Option<&Path>) -> Config {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    match fs::read_to_string(&path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            warn!("failed to parse {}: {e}", path.display());
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}

pub fn save_config(config: &Config, path: Option<&Path>) -> io::Result<()> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(config)?;
    fs::write(path, data)
}
