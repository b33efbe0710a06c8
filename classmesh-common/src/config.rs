//! Bootstrap configuration loading and root folder resolution
//!
//! Configuration is layered:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! Runtime tunables that survive restarts live in the database `settings`
//! table (see [`crate::db::settings`]); the TOML file only carries bootstrap
//! values and optional overrides.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable consulted for the root folder
pub const ROOT_FOLDER_ENV: &str = "CLASSMESH_ROOT_FOLDER";

/// SQLite database file name inside the root folder
pub const DATABASE_FILE: &str = "classmesh.db";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Grouping overrides (optional)
    #[serde(default)]
    pub grouping: GroupingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Grouping overrides
///
/// Every field is optional. A present denylist replaces the built-in list
/// wholesale; it is not merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Fuzzy match threshold in [0, 1]
    #[serde(default)]
    pub threshold: Option<f64>,

    /// Words dropped from class names and tags
    #[serde(default)]
    pub stopwords: Option<Vec<String>>,

    /// Institution abbreviations dropped from class names
    #[serde(default)]
    pub institution_noise: Option<Vec<String>>,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default location of the TOML config file for this platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("classmesh").join("config.toml"))
}

/// Load the TOML config
///
/// An explicitly requested file must exist. When no path is given the platform
/// default is tried and a missing file falls back to defaults.
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                info!("No config file found, using built-in defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Parse TOML config content
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Resolve the root folder
///
/// Priority: command-line argument, then `env_var_name`, then the TOML
/// `root_folder`, then the OS default.
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_config: &TomlConfig,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\classmesh
        dirs::data_local_dir()
            .map(|d| d.join("classmesh"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\classmesh"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/classmesh
        dirs::data_dir()
            .map(|d| d.join("classmesh"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/classmesh"))
    } else {
        // ~/.local/share/classmesh
        dirs::data_local_dir()
            .map(|d| d.join("classmesh"))
            .unwrap_or_else(|| PathBuf::from("./classmesh_data"))
    }
}

/// Database path inside a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE)
}
