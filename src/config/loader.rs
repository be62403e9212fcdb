//! Configuration loading and discovery for `langpack.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::{
    ModulesConfig, PackConfig, ProjectConfig, ReleaseConfig, ToolchainConfig, VerifyConfig,
    WatchConfig,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "langpack.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse langpack.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override output directory
    pub out: Option<PathBuf>,
    /// Override source directory
    pub src: Option<PathBuf>,
    /// Override the version record file
    pub version_file: Option<PathBuf>,
    /// Override the browsers handed to the test runner
    pub browsers: Option<Vec<String>>,
}

/// Find langpack.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for langpack.toml
/// 2. Check XDG_CONFIG_HOME/langpack/langpack.toml (or ~/.config/langpack/langpack.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find langpack.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("langpack").join(CONFIG_FILE_NAME);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find langpack.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a langpack.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns a default
/// configuration.
pub fn load_config(path: Option<&Path>) -> Result<PackConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

fn load_config_file(path: &Path) -> Result<PackConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: PackConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    tracing::debug!(path = %path.display(), project = %config.project.name, "loaded config");
    Ok(config)
}

/// Create a default configuration when no langpack.toml is found.
///
/// The product name is taken from the current directory name.
pub fn default_config() -> PackConfig {
    let project_name = env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unnamed".to_string());

    PackConfig {
        project: ProjectConfig {
            name: project_name,
            homepage: None,
            src: PathBuf::from("src"),
            out: PathBuf::from("dist"),
            entry: None,
            language_dir: PathBuf::from("language"),
            version_file: PathBuf::from("package.json"),
            global: None,
        },
        modules: ModulesConfig::default(),
        toolchain: ToolchainConfig::default(),
        verify: VerifyConfig::default(),
        watch: WatchConfig::default(),
        release: ReleaseConfig::default(),
    }
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut PackConfig, overrides: &CliOverrides) {
    if let Some(ref out) = overrides.out {
        config.project.out = out.clone();
    }

    if let Some(ref src) = overrides.src {
        config.project.src = src.clone();
    }

    if let Some(ref version_file) = overrides.version_file {
        config.project.version_file = version_file.clone();
    }

    if let Some(ref browsers) = overrides.browsers {
        if !browsers.is_empty() {
            config.verify.browsers = browsers.clone();
        }
    }
}
