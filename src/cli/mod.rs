//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;
mod release;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::build::{BuildConfig, BuildContext, LanguageRequest, ResolveError};
use crate::config::loader::{
    default_config, find_config, load_config, merge_cli_overrides, CliOverrides,
};
use crate::config::ConfigError;
use crate::logging::{init_logging, VERBOSE_FILTER};
use crate::version::ReleaseType;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// langpack - Build and release language-pack bundles
#[derive(Parser)]
#[command(name = "langpack")]
#[command(about = "Build and release language-pack bundles of a modular script library")]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(flatten)]
    pub flags: GlobalFlags,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalFlags {
    /// Build the minified release artifact ({name}.min.js)
    #[arg(long, global = true)]
    pub release: bool,

    /// Build the custom module bundle ({name}-custom.min.js)
    #[arg(long, global = true)]
    pub custom: bool,

    /// Modules to bundle: "all" or a comma-separated list (e.g. "python,go")
    #[arg(long, global = true, value_name = "all|LIST")]
    pub languages: Option<String>,

    /// Embed an inline source map in development builds (0 or 1, default 1)
    #[arg(long, global = true, value_name = "0|1", value_parser = parse_switch)]
    pub sourcemaps: Option<bool>,

    /// Minify without producing a release build
    #[arg(long, global = true)]
    pub ugly: bool,

    /// Version stamped into the header instead of the recorded one
    #[arg(long, global = true, value_name = "SEMVER", value_parser = parse_semver)]
    pub version: Option<String>,

    /// Release type: breaking, feature or fix
    #[arg(long = "type", global = true, value_enum, default_value_t = ReleaseType::Fix)]
    pub release_type: ReleaseType,

    /// Keep the test runner watching instead of a single run
    #[arg(long, global = true)]
    pub watch: bool,

    /// Browsers for the test runner (comma-separated)
    #[arg(long, global = true, value_name = "LIST")]
    pub browsers: Option<String>,

    /// Path to langpack.toml (default: search upward from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the source directory
    #[arg(long, global = true)]
    pub src: Option<PathBuf>,

    /// Override the output directory
    #[arg(long, global = true)]
    pub out: Option<PathBuf>,

    /// Override the version record (package.json or a plain version file)
    #[arg(long, global = true, value_name = "FILE")]
    pub version_file: Option<PathBuf>,

    /// Show detailed progress
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile the primary entry into its artifact
    Pack {
        /// Show what would be built without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Build the custom bundle: minified entry plus the requested modules
    Build {
        /// Show what would be built without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Test, build the release artifact, bump the version, commit and tag
    Release {
        /// Compute the next version and stop before running anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Run the test suite
    Test,

    /// Rebuild whenever a source file changes
    Watch,

    /// Remove the output directory
    Clean,

    /// List available modules, or the resolved load order with --languages
    Modules,
}

/// Parse a 0/1 switch.
fn parse_switch(raw: &str) -> Result<bool, String> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected 0 or 1, got '{}'", other)),
    }
}

/// Validate a semantic version, accepting a leading `v`.
fn parse_semver(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    semver::Version::parse(trimmed).map(|v| v.to_string()).map_err(|e| e.to_string())
}

/// Split a comma-separated flag value.
fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

impl GlobalFlags {
    /// Build flags for this invocation.
    pub fn build_config(&self) -> Result<BuildConfig, ResolveError> {
        let languages = self.languages.as_deref().map(LanguageRequest::parse).transpose()?;
        Ok(BuildConfig::new()
            .with_version(self.version.clone())
            .with_languages(languages)
            .with_release(self.release)
            .with_custom(self.custom)
            .with_sourcemaps(self.sourcemaps.unwrap_or(true))
            .with_ugly(self.ugly))
    }

    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            out: self.out.clone(),
            src: self.src.clone(),
            version_file: self.version_file.clone(),
            browsers: self.browsers.as_deref().map(split_csv),
        }
    }
}

/// Load configuration and determine the project root.
///
/// With `--config`, the file's directory is the root. Otherwise the nearest
/// langpack.toml above the current directory is used, falling back to
/// defaults rooted at the current directory.
pub(crate) fn load_context(flags: &GlobalFlags) -> Result<BuildContext, ConfigError> {
    let cwd = std::env::current_dir()?;
    let config_path = flags.config.clone().or_else(find_config);

    let (mut config, root) = match config_path {
        Some(path) => {
            if flags.verbose {
                println!("Using config: {}", path.display());
            }
            let config = load_config(Some(path.as_path()))?;
            let root = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => absolute(&cwd, parent),
                _ => cwd,
            };
            (config, root)
        }
        None => {
            if flags.verbose {
                println!("No langpack.toml found, using defaults");
            }
            (default_config(), cwd)
        }
    };

    merge_cli_overrides(&mut config, &flags.overrides());
    Ok(BuildContext::new(config, root).with_verbose(flags.verbose))
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Load the context or report the failure.
fn context_or_exit(flags: &GlobalFlags) -> Result<BuildContext, ExitCode> {
    load_context(flags).map_err(|e| {
        eprintln!("Error: {}", e);
        ExitCode::from(EXIT_ERROR)
    })
}

/// Parse the build flags or report them as invalid arguments.
fn build_config_or_exit(flags: &GlobalFlags) -> Result<BuildConfig, ExitCode> {
    flags.build_config().map_err(|e| {
        eprintln!("Error: --languages: {}", e);
        ExitCode::from(EXIT_INVALID_ARGS)
    })
}

/// Run the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.flags.verbose.then_some(VERBOSE_FILTER));

    let flags = &cli.flags;
    let prepared = context_or_exit(flags)
        .and_then(|context| build_config_or_exit(flags).map(|config| (context, config)));
    let (context, config) = match prepared {
        Ok(prepared) => prepared,
        Err(code) => return code,
    };

    match cli.command {
        Commands::Pack { dry_run } => build::run_pack(context, &config, dry_run),
        Commands::Build { dry_run } => build::run_build(context, &config, dry_run),
        Commands::Release { dry_run } => {
            release::run_release(&context, &config, flags.release_type, dry_run)
        }
        Commands::Test => release::run_test(&context, flags.watch),
        Commands::Watch => build::run_watch(context, &config),
        Commands::Clean => build::run_clean(&context),
        Commands::Modules => build::run_modules(&context, config.languages()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_switch() {
        assert_eq!(parse_switch("0"), Ok(false));
        assert_eq!(parse_switch("1"), Ok(true));
        assert_eq!(parse_switch("true"), Ok(true));
        assert!(parse_switch("2").is_err());
    }

    #[test]
    fn test_parse_semver() {
        assert_eq!(parse_semver("v2.1.0"), Ok("2.1.0".to_string()));
        assert!(parse_semver("2.1").is_err());
    }

    #[test]
    fn test_split_csv() {
        assert_eq!(split_csv("Chrome, Firefox,,"), vec!["Chrome", "Firefox"]);
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "langpack",
            "build",
            "--languages=python,go",
            "--sourcemaps=0",
            "--version=2.1.0",
            "--type",
            "feature",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Build { dry_run: false }));
        assert_eq!(cli.flags.sourcemaps, Some(false));
        assert_eq!(cli.flags.version.as_deref(), Some("2.1.0"));
        assert_eq!(cli.flags.release_type, ReleaseType::Feature);

        let config = cli.flags.build_config().unwrap();
        assert_eq!(
            config.languages(),
            Some(&LanguageRequest::List(vec!["python".to_string(), "go".to_string()]))
        );
        assert!(!config.sourcemaps());
        assert_eq!(config.version(), Some("2.1.0"));
    }

    #[test]
    fn test_default_release_type_is_fix() {
        let cli = Cli::try_parse_from(["langpack", "release", "--dry-run"]).unwrap();
        assert_eq!(cli.flags.release_type, ReleaseType::Fix);
        assert!(matches!(cli.command, Commands::Release { dry_run: true }));
    }

    #[test]
    fn test_empty_languages_is_invalid() {
        let flags = GlobalFlags { languages: Some(" , ".to_string()), ..Default::default() };
        assert!(matches!(flags.build_config(), Err(ResolveError::EmptyRequest)));
    }

    #[test]
    fn test_version_file_override() {
        let cli = Cli::try_parse_from(["langpack", "build", "--version-file", "VERSION"]).unwrap();
        assert_eq!(cli.flags.overrides().version_file, Some(PathBuf::from("VERSION")));
    }

    #[test]
    fn test_browsers_override() {
        let flags = GlobalFlags { browsers: Some("Chrome,Firefox".to_string()), ..Default::default() };
        assert_eq!(
            flags.overrides().browsers,
            Some(vec!["Chrome".to_string(), "Firefox".to_string()])
        );
    }
}
