//! Configuration schema types for `langpack.toml`
//!
//! Defines the structure and validation rules for a language-pack project.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Product name (required), e.g. "Rainbow"
    pub name: String,
    /// Homepage shown in the provenance header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Source directory containing the entry and the language directory
    #[serde(default = "default_src")]
    pub src: PathBuf,
    /// Artifact output directory
    #[serde(default = "default_out")]
    pub out: PathBuf,
    /// Primary entry source. Defaults to `{src}/{name}.js` (lowercased name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<PathBuf>,
    /// Module directory, relative to `src`
    #[serde(default = "default_language_dir")]
    pub language_dir: PathBuf,
    /// File holding the persisted version (`package.json` or a plain text file)
    #[serde(default = "default_version_file")]
    pub version_file: PathBuf,
    /// Global the primary entry is exported as. Defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<String>,
}

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

fn default_out() -> PathBuf {
    PathBuf::from("dist")
}

fn default_language_dir() -> PathBuf {
    PathBuf::from("language")
}

fn default_version_file() -> PathBuf {
    PathBuf::from("package.json")
}

impl ProjectConfig {
    /// Lowercase product name used for artifact file names.
    pub fn artifact_name(&self) -> String {
        self.name.to_lowercase()
    }

    /// Entry source path, relative to the project root.
    pub fn entry_path(&self) -> PathBuf {
        match &self.entry {
            Some(entry) => entry.clone(),
            None => self.src.join(format!("{}.js", self.artifact_name())),
        }
    }

    /// Module directory path, relative to the project root.
    pub fn language_path(&self) -> PathBuf {
        self.src.join(&self.language_dir)
    }

    /// Global binding the bundled entry exports, so appended modules can
    /// reach it.
    ///
    /// An explicit `global` wins. Otherwise the product name is used when it
    /// is a valid script identifier, and nothing is exported when it is not.
    pub fn global_name(&self) -> Option<&str> {
        match &self.global {
            Some(global) => Some(global.as_str()),
            None => is_identifier(&self.name).then_some(self.name.as_str()),
        }
    }
}

/// Whether `name` is a plain script identifier (`[A-Za-z_$][A-Za-z0-9_$]*`).
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Module selection policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModulesConfig {
    /// Id of the base module providing shared primitives
    #[serde(default = "default_base")]
    pub base: String,
    /// Modules that have no tokenizing primitives of their own and need the base
    #[serde(default = "default_needs_base")]
    pub needs_base: Vec<String>,
}

fn default_base() -> String {
    "generic".to_string()
}

fn default_needs_base() -> Vec<String> {
    ["php", "python", "javascript", "go", "c", "r", "coffeescript", "haskell"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self { base: default_base(), needs_base: default_needs_base() }
    }
}

/// Which transform toolchain compiles sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolchainKind {
    /// In-process bundler (import inlining, function wrapper, comment stripping)
    #[default]
    Builtin,
    /// External bundler command writing the bundle to stdout
    Command,
}

/// Transform toolchain settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolchainConfig {
    /// Toolchain kind
    #[serde(default)]
    pub kind: ToolchainKind,
    /// Program to run when `kind = "command"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Arguments passed before the entry path
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra arguments when minifying
    #[serde(default)]
    pub minify_args: Vec<String>,
    /// Extra arguments when an inline source map is requested
    #[serde(default)]
    pub sourcemap_args: Vec<String>,
}

/// Test runner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Test runner program
    #[serde(default = "default_verify_command")]
    pub command: String,
    /// Arguments passed before the runner configuration path
    #[serde(default = "default_verify_args")]
    pub args: Vec<String>,
    /// Runner configuration file
    #[serde(default = "default_verify_config")]
    pub config: PathBuf,
    /// Default browsers when `--browsers` is not given
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,
}

fn default_verify_command() -> String {
    "karma".to_string()
}

fn default_verify_args() -> Vec<String> {
    vec!["start".to_string()]
}

fn default_verify_config() -> PathBuf {
    PathBuf::from("karma.conf.js")
}

fn default_browsers() -> Vec<String> {
    vec!["PhantomJS".to_string()]
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            command: default_verify_command(),
            args: default_verify_args(),
            config: default_verify_config(),
            browsers: default_browsers(),
        }
    }
}

/// Watch mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    /// Clear terminal between rebuilds
    #[serde(default)]
    pub clear_screen: bool,
}

fn default_debounce_ms() -> u32 {
    100
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100, clear_screen: false }
    }
}

/// Release settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
    /// Commit message template; `{version}` expands to the new version
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
    /// Prefix prepended to the tag name
    #[serde(default)]
    pub tag_prefix: String,
}

fn default_commit_message() -> String {
    "Update version to {version}".to_string()
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self { commit_message: default_commit_message(), tag_prefix: String::new() }
    }
}

impl ReleaseConfig {
    /// Render the commit message for a version.
    pub fn message_for(&self, version: &str) -> String {
        self.commit_message.replace("{version}", version)
    }

    /// Tag name for a version.
    pub fn tag_for(&self, version: &str) -> String {
        format!("{}{}", self.tag_prefix, version)
    }
}

/// Complete langpack.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackConfig {
    /// Project metadata (required)
    pub project: ProjectConfig,
    /// Module policy
    #[serde(default)]
    pub modules: ModulesConfig,
    /// Transform toolchain
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    /// Test runner
    #[serde(default)]
    pub verify: VerifyConfig,
    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,
    /// Release settings
    #[serde(default)]
    pub release: ReleaseConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "modules.base")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "langpack.toml: '{}' {}", self.field, self.message)
    }
}

impl PackConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.project.name.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "project.name".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if let Some(global) = &self.project.global {
            if !is_identifier(global) {
                errors.push(ConfigValidationError {
                    field: "project.global".to_string(),
                    message: format!("'{}' is not a valid identifier", global),
                });
            }
        }

        if self.modules.base.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "modules.base".to_string(),
                message: "must name the base module".to_string(),
            });
        }

        if self.modules.needs_base.iter().any(|id| id.eq_ignore_ascii_case(&self.modules.base)) {
            errors.push(ConfigValidationError {
                field: "modules.needs_base".to_string(),
                message: "must not contain the base module itself".to_string(),
            });
        }

        if self.toolchain.kind == ToolchainKind::Command
            && self.toolchain.command.as_deref().map_or(true, |c| c.trim().is_empty())
        {
            errors.push(ConfigValidationError {
                field: "toolchain.command".to_string(),
                message: "is required when toolchain.kind = \"command\"".to_string(),
            });
        }

        if self.verify.command.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "verify.command".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.watch.debounce_ms == 0 {
            errors.push(ConfigValidationError {
                field: "watch.debounce_ms".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
