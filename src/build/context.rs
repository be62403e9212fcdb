//! Build context containing configuration and paths for a build.

use crate::build::{toolchain_for, DirectoryRegistry, Toolchain};
use crate::config::PackConfig;
use crate::version::{record_for_path, VersionRecord};
use std::path::{Path, PathBuf};

/// Build context containing configuration and paths for a build operation.
///
/// The context resolves every configured path against the project root and
/// hands out the collaborators (registry, toolchain, version record) the
/// configuration selects.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: PackConfig,
    /// Project root directory (where langpack.toml is located)
    project_root: PathBuf,
    /// Whether to run in verbose mode
    verbose: bool,
}

impl BuildContext {
    /// Create a new build context.
    pub fn new(config: PackConfig, project_root: PathBuf) -> Self {
        Self { config, project_root, verbose: false }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Whether verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Get the source directory (resolved to absolute path).
    pub fn src_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.src)
    }

    /// Get the output directory (resolved to absolute path).
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.out)
    }

    /// Primary entry source.
    pub fn entry_path(&self) -> PathBuf {
        self.resolve_path(&self.config.project.entry_path())
    }

    /// Directory holding one source file per module.
    pub fn language_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.language_path())
    }

    /// File holding the persisted version.
    pub fn version_file(&self) -> PathBuf {
        self.resolve_path(&self.config.project.version_file)
    }

    /// Test runner configuration file.
    pub fn verify_config_path(&self) -> PathBuf {
        self.resolve_path(&self.config.verify.config)
    }

    /// Lowercase product name used in artifact file names.
    pub fn artifact_name(&self) -> String {
        self.config.project.artifact_name()
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    /// If relative, joins it with the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// Registry over the configured module directory.
    pub fn registry(&self) -> DirectoryRegistry {
        DirectoryRegistry::new(self.language_dir(), &self.config.modules)
    }

    /// Toolchain selected by configuration.
    pub fn toolchain(&self) -> Box<dyn Toolchain> {
        toolchain_for(&self.config.toolchain)
    }

    /// Version record at the configured path.
    pub fn version_record(&self) -> Box<dyn VersionRecord> {
        record_for_path(self.version_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;

    fn context() -> BuildContext {
        let mut config = default_config();
        config.project.name = "Rainbow".to_string();
        BuildContext::new(config, PathBuf::from("/project"))
    }

    #[test]
    fn test_build_context_new() {
        let ctx = context();
        assert_eq!(ctx.project_root(), Path::new("/project"));
        assert!(!ctx.is_verbose());
        assert!(ctx.with_verbose(true).is_verbose());
    }

    #[test]
    fn test_build_context_resolve_path_absolute() {
        let ctx = context();
        let absolute = Path::new("/other/path");
        assert_eq!(ctx.resolve_path(absolute), PathBuf::from("/other/path"));
    }

    #[test]
    fn test_build_context_resolve_path_relative() {
        let ctx = context();
        let relative = Path::new("src/language");
        assert_eq!(ctx.resolve_path(relative), PathBuf::from("/project/src/language"));
    }

    #[test]
    fn test_build_context_paths() {
        let ctx = context();
        assert_eq!(ctx.src_dir(), PathBuf::from("/project/src"));
        assert_eq!(ctx.out_dir(), PathBuf::from("/project/dist"));
        assert_eq!(ctx.entry_path(), PathBuf::from("/project/src/rainbow.js"));
        assert_eq!(ctx.language_dir(), PathBuf::from("/project/src/language"));
        assert_eq!(ctx.version_file(), PathBuf::from("/project/package.json"));
        assert_eq!(ctx.verify_config_path(), PathBuf::from("/project/karma.conf.js"));
        assert_eq!(ctx.artifact_name(), "rainbow");
    }

    #[test]
    fn test_build_context_registry_uses_language_dir() {
        let ctx = context();
        assert_eq!(ctx.registry().dir(), Path::new("/project/src/language"));
    }

    #[test]
    fn test_build_context_default_toolchain() {
        assert_eq!(context().toolchain().name(), "builtin");
    }
}
