//! gpuq configuration.
//!
//! Config file: `$XDG_CONFIG_HOME/gpuq/config.toml` or
//! `~/.config/gpuq/config.toml`. Every field has a default, so an empty or
//! missing file is valid. Command-line flags override loaded values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Data directory; reports live in `<data_dir>/reports/<id>.json`
    pub data_dir: PathBuf,

    /// API registry used to resolve format and flag names
    pub vk_xml: PathBuf,

    /// Architecture taxonomy (`gpu_info.json`), if any
    pub gpu_info: Option<PathBuf>,

    /// Where `result-*.txt` files are written
    pub results_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            vk_xml: PathBuf::from("vk.xml"),
            gpu_info: None,
            results_dir: PathBuf::from("."),
        }
    }
}

/// Report download settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub report_list_url: String,

    /// Pause between report downloads, to go easy on the server
    pub delay_secs: f64,

    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            report_list_url: "https://vulkan.gpuinfo.org/api/v2/getreportlist.php".to_string(),
            delay_secs: 2.0,
            timeout_secs: 60,
        }
    }
}

/// Device inventory settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevicesConfig {
    /// List vendor 0, Apple and device 0 too
    pub show_all: bool,
}

/// Main gpuq configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub devices: DevicesConfig,
}

impl QueryConfig {
    /// Default user config path
    pub fn user_config_path() -> Result<PathBuf> {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(Path::new(&xdg).join("gpuq").join("config.toml"));
        }
        let home = std::env::var("HOME").context("Cannot determine home directory")?;
        Ok(Path::new(&home).join(".config").join("gpuq").join("config.toml"))
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. Explicit path (must exist)
    /// 2. User config, if present
    /// 3. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        if let Ok(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let config: QueryConfig =
            toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.fetch.delay_secs.is_finite() || self.fetch.delay_secs < 0.0 {
            anyhow::bail!("Invalid fetch.delay_secs: {}", self.fetch.delay_secs);
        }
        if self.fetch.timeout_secs == 0 {
            anyhow::bail!("fetch.timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn reports_dir(&self) -> PathBuf {
        crate::corpus::reports_dir(&self.paths.data_dir)
    }
}
