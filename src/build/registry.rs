//! Module registry.
//!
//! Enumerates the pluggable modules a bundle can include. Every `*.js` file in
//! the language directory is one module; its file stem is the module id. The
//! base module is tracked separately from the specific modules because other
//! modules depend on it implicitly.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use thiserror::Error;

use crate::config::ModulesConfig;

/// Identifier of a pluggable module (lowercase file stem).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        ModuleId(id.into().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(id: &str) -> Self {
        ModuleId::new(id)
    }
}

impl PartialEq<&str> for ModuleId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Metadata for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Module id
    pub id: ModuleId,
    /// Source file of the module
    pub path: PathBuf,
    /// Module has no tokenizing primitives of its own and needs the base loaded first
    pub requires_base: bool,
}

impl ModuleDescriptor {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { id: ModuleId::new(id), path: path.into(), requires_base: false }
    }

    /// Mark whether the module depends on the base module.
    pub fn with_requires_base(mut self, requires_base: bool) -> Self {
        self.requires_base = requires_base;
        self
    }

    /// File stem as spelled on disk, which may differ in case from the id.
    pub fn import_name(&self) -> &str {
        self.path.file_stem().and_then(|s| s.to_str()).unwrap_or(self.id.as_str())
    }
}

/// Error while enumerating modules.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The module directory could not be read
    #[error("module registry unavailable at {}: {source}", path.display())]
    RegistryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The directory path could not be turned into a glob pattern
    #[error("invalid module directory pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Source of module metadata.
///
/// Implementations must enumerate modules in a stable order so resolution is
/// deterministic for a fixed registry state.
pub trait ModuleRegistry {
    /// The distinguished base module.
    fn base(&self) -> &ModuleDescriptor;

    /// Whether the base module is actually present.
    fn has_base(&self) -> bool;

    /// Every specific module, excluding the base, in enumeration order.
    fn list_all(&self) -> Result<Vec<ModuleDescriptor>, RegistryError>;

    /// Look up a module by id, base included.
    fn get(&self, id: &ModuleId) -> Result<Option<ModuleDescriptor>, RegistryError> {
        if id == &self.base().id {
            return Ok(self.has_base().then(|| self.base().clone()));
        }
        Ok(self.list_all()?.into_iter().find(|m| &m.id == id))
    }
}

/// Registry backed by a directory of `*.js` modules.
#[derive(Debug, Clone)]
pub struct DirectoryRegistry {
    dir: PathBuf,
    base: ModuleDescriptor,
    needs_base: HashSet<String>,
}

impl DirectoryRegistry {
    /// Create a registry over `dir` using the module policy from config.
    pub fn new(dir: impl Into<PathBuf>, policy: &ModulesConfig) -> Self {
        let dir = dir.into();
        let base_id = ModuleId::new(policy.base.as_str());
        let base = ModuleDescriptor {
            path: locate_module(&dir, &base_id),
            id: base_id,
            requires_base: false,
        };
        let needs_base = policy.needs_base.iter().map(|id| id.trim().to_lowercase()).collect();
        Self { dir, base, needs_base }
    }

    /// Directory this registry scans.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn describe(&self, id: ModuleId, path: PathBuf) -> ModuleDescriptor {
        let requires_base = self.needs_base.contains(id.as_str());
        ModuleDescriptor { id, path, requires_base }
    }
}

impl ModuleRegistry for DirectoryRegistry {
    fn base(&self) -> &ModuleDescriptor {
        &self.base
    }

    fn has_base(&self) -> bool {
        self.base.path.is_file()
    }

    fn list_all(&self) -> Result<Vec<ModuleDescriptor>, RegistryError> {
        // glob silently yields nothing for a missing directory
        fs::read_dir(&self.dir).map_err(|source| RegistryError::RegistryUnavailable {
            path: self.dir.clone(),
            source,
        })?;

        let pattern = format!("{}/*.js", glob::Pattern::escape(&self.dir.to_string_lossy()));
        let paths = glob(&pattern)
            .map_err(|source| RegistryError::InvalidPattern { pattern: pattern.clone(), source })?;

        let mut modules = Vec::new();
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!("error reading module path: {}", e);
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // Hidden files are scratch output, never modules
            if stem.starts_with('.') {
                continue;
            }
            let id = ModuleId::new(stem);
            if id == self.base.id {
                continue;
            }
            modules.push(self.describe(id, path));
        }

        modules.sort_by(|a, b| a.id.cmp(&b.id));
        tracing::debug!(dir = %self.dir.display(), count = modules.len(), "enumerated modules");
        Ok(modules)
    }
}

/// Source file of `id` in `dir`, matching the file stem case-insensitively.
fn locate_module(dir: &Path, id: &ModuleId) -> PathBuf {
    let exact = dir.join(format!("{}.js", id));
    if exact.is_file() {
        return exact;
    }

    let Ok(entries) = fs::read_dir(dir) else {
        return exact;
    };
    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .find(|path| {
            path.extension().is_some_and(|ext| ext == "js")
                && path.file_stem().and_then(|s| s.to_str()).is_some_and(|s| ModuleId::new(s) == *id)
        })
        .unwrap_or(exact)
}

/// Registry held in memory, enumerated in insertion order.
#[derive(Debug, Clone)]
pub struct MemoryRegistry {
    base: ModuleDescriptor,
    has_base: bool,
    modules: Vec<ModuleDescriptor>,
}

impl MemoryRegistry {
    /// Create a registry with the given base module id.
    pub fn new(base: &str) -> Self {
        Self {
            base: ModuleDescriptor::new(base, format!("{}.js", base)),
            has_base: true,
            modules: Vec::new(),
        }
    }

    /// Add a specific module.
    pub fn with_module(mut self, id: &str, requires_base: bool) -> Self {
        self.modules.push(
            ModuleDescriptor::new(id, format!("{}.js", id)).with_requires_base(requires_base),
        );
        self
    }

    /// Simulate a registry whose base module file is missing.
    pub fn without_base(mut self) -> Self {
        self.has_base = false;
        self
    }
}

impl ModuleRegistry for MemoryRegistry {
    fn base(&self) -> &ModuleDescriptor {
        &self.base
    }

    fn has_base(&self) -> bool {
        self.has_base
    }

    fn list_all(&self) -> Result<Vec<ModuleDescriptor>, RegistryError> {
        Ok(self.modules.iter().filter(|m| m.id != self.base.id).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_module(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap().write_all(b"Rainbow.extend('x', []);").unwrap();
        path
    }

    fn policy() -> ModulesConfig {
        ModulesConfig::default()
    }

    #[test]
    fn test_module_id_is_normalized() {
        assert_eq!(ModuleId::new(" Python "), ModuleId::new("python"));
        assert_eq!(ModuleId::from("GO").as_str(), "go");
        assert!(ModuleId::new("css") == "css");
    }

    #[test]
    fn test_directory_registry_lists_js_modules_sorted() {
        let temp = TempDir::new().unwrap();
        create_module(temp.path(), "python.js");
        create_module(temp.path(), "css.js");
        create_module(temp.path(), "generic.js");
        create_module(temp.path(), "README.md");

        let registry = DirectoryRegistry::new(temp.path(), &policy());
        let modules = registry.list_all().unwrap();
        let ids: Vec<_> = modules.iter().map(|m| m.id.as_str()).collect();

        assert_eq!(ids, vec!["css", "python"]);
        assert!(registry.has_base());
    }

    #[test]
    fn test_directory_registry_skips_hidden_files() {
        let temp = TempDir::new().unwrap();
        create_module(temp.path(), "css.js");
        create_module(temp.path(), ".langpack-manifest-abc.js");

        let registry = DirectoryRegistry::new(temp.path(), &policy());
        let ids: Vec<_> =
            registry.list_all().unwrap().into_iter().map(|m| m.id.to_string()).collect();
        assert_eq!(ids, vec!["css"]);
    }

    #[test]
    fn test_directory_registry_marks_requires_base() {
        let temp = TempDir::new().unwrap();
        create_module(temp.path(), "python.js");
        create_module(temp.path(), "css.js");

        let registry = DirectoryRegistry::new(temp.path(), &policy());
        let modules = registry.list_all().unwrap();

        let python = modules.iter().find(|m| m.id == "python").unwrap();
        let css = modules.iter().find(|m| m.id == "css").unwrap();
        assert!(python.requires_base);
        assert!(!css.requires_base);
    }

    #[test]
    fn test_directory_registry_missing_dir() {
        let temp = TempDir::new().unwrap();
        let registry = DirectoryRegistry::new(temp.path().join("missing"), &policy());

        let result = registry.list_all();
        assert!(matches!(result, Err(RegistryError::RegistryUnavailable { .. })));
    }

    #[test]
    fn test_directory_registry_get() {
        let temp = TempDir::new().unwrap();
        create_module(temp.path(), "generic.js");
        create_module(temp.path(), "go.js");

        let registry = DirectoryRegistry::new(temp.path(), &policy());

        let go = registry.get(&ModuleId::new("go")).unwrap().unwrap();
        assert_eq!(go.path, temp.path().join("go.js"));
        assert!(registry.get(&ModuleId::new("generic")).unwrap().is_some());
        assert!(registry.get(&ModuleId::new("ruby")).unwrap().is_none());
    }

    #[test]
    fn test_directory_registry_keeps_file_case() {
        let temp = TempDir::new().unwrap();
        create_module(temp.path(), "Generic.js");
        create_module(temp.path(), "CSS.js");

        let registry = DirectoryRegistry::new(temp.path(), &policy());
        assert!(registry.has_base());
        assert_eq!(registry.base().import_name(), "Generic");

        let modules = registry.list_all().unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].id, "css");
        assert_eq!(modules[0].import_name(), "CSS");
    }

    #[test]
    fn test_directory_registry_without_base_file() {
        let temp = TempDir::new().unwrap();
        create_module(temp.path(), "go.js");

        let registry = DirectoryRegistry::new(temp.path(), &policy());
        assert!(!registry.has_base());
        assert!(registry.get(&ModuleId::new("generic")).unwrap().is_none());
    }

    #[test]
    fn test_memory_registry_insertion_order() {
        let registry = MemoryRegistry::new("generic")
            .with_module("shell", false)
            .with_module("python", true)
            .with_module("css", false);

        let ids: Vec<_> =
            registry.list_all().unwrap().into_iter().map(|m| m.id.to_string()).collect();
        assert_eq!(ids, vec!["shell", "python", "css"]);
    }

    #[test]
    fn test_memory_registry_excludes_base_from_listing() {
        let registry = MemoryRegistry::new("generic")
            .with_module("generic", false)
            .with_module("go", true);

        let modules = registry.list_all().unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(registry.base().id, "generic");
    }
}
