//! Dependency resolution for module requests.
//!
//! Turns a [`LanguageRequest`] into an ordered [`ModuleSet`]. The base module
//! is placed first whenever a requested module depends on it, so base code
//! always executes before the modules that use its primitives.

use std::fmt;

use thiserror::Error;

use crate::build::{LanguageRequest, ModuleId, ModuleRegistry, RegistryError};

/// Error during module resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Registry could not be enumerated
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A requested module does not exist in the registry
    #[error("unknown module requested: '{0}'")]
    UnknownModuleRequested(String),
    /// The base module is needed but its source is missing
    #[error("base module '{0}' is required but was not found")]
    MissingBaseModule(String),
    /// The request named no modules
    #[error("empty module request (use \"all\" to include every module)")]
    EmptyRequest,
}

/// Ordered, duplicate-free list of modules; order is load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSet {
    ids: Vec<ModuleId>,
}

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a module unless already present. Returns whether it was added.
    pub fn push(&mut self, id: ModuleId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Move a module to the front, inserting it if absent.
    fn move_to_front(&mut self, id: ModuleId) {
        self.ids.retain(|existing| existing != &id);
        self.ids.insert(0, id);
    }

    pub fn ids(&self) -> &[ModuleId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.ids.contains(id)
    }

    pub fn first(&self) -> Option<&ModuleId> {
        self.ids.first()
    }

    /// Module ids in alphabetical order, as listed in provenance headers.
    pub fn sorted_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.ids.iter().map(ModuleId::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl fmt::Display for ModuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.ids.iter().map(ModuleId::as_str).collect();
        write!(f, "[{}]", ids.join(", "))
    }
}

impl<'a> IntoIterator for &'a ModuleSet {
    type Item = &'a ModuleId;
    type IntoIter = std::slice::Iter<'a, ModuleId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

/// Resolve a module request against a registry.
///
/// - `All`: the base module followed by every registered module in
///   enumeration order.
/// - `List`: the requested modules in request order with duplicates
///   collapsed. Every id must exist in the registry. When any requested
///   module requires the base, the base is prepended (or moved to the front
///   if it was requested later in the list).
pub fn resolve(
    registry: &dyn ModuleRegistry,
    request: &LanguageRequest,
) -> Result<ModuleSet, ResolveError> {
    let base = registry.base().id.clone();
    let mut set = ModuleSet::new();

    match request {
        LanguageRequest::All => {
            if !registry.has_base() {
                return Err(ResolveError::MissingBaseModule(base.to_string()));
            }
            set.push(base);
            for module in registry.list_all()? {
                set.push(module.id);
            }
        }
        LanguageRequest::List(requested) => {
            if requested.is_empty() {
                return Err(ResolveError::EmptyRequest);
            }

            let mut needs_base = false;
            for raw in requested {
                let id = ModuleId::new(raw.as_str());
                let descriptor = registry
                    .get(&id)
                    .map_err(ResolveError::from)?
                    .ok_or_else(|| ResolveError::UnknownModuleRequested(id.to_string()))?;
                needs_base |= descriptor.requires_base;
                set.push(id);
            }

            if needs_base && set.first() != Some(&base) {
                if !set.contains(&base) && !registry.has_base() {
                    return Err(ResolveError::MissingBaseModule(base.to_string()));
                }
                set.move_to_front(base);
            }
        }
    }

    tracing::debug!(request = %request, modules = %set, "resolved module set");
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::MemoryRegistry;

    fn registry() -> MemoryRegistry {
        MemoryRegistry::new("generic")
            .with_module("c", true)
            .with_module("css", false)
            .with_module("go", true)
            .with_module("markup", false)
            .with_module("python", true)
    }

    fn list(raw: &str) -> LanguageRequest {
        LanguageRequest::parse(raw).unwrap()
    }

    fn ids(set: &ModuleSet) -> Vec<&str> {
        set.iter().map(ModuleId::as_str).collect()
    }

    #[test]
    fn test_resolve_all_puts_base_first() {
        let set = resolve(&registry(), &LanguageRequest::All).unwrap();
        assert_eq!(ids(&set), vec!["generic", "c", "css", "go", "markup", "python"]);
    }

    #[test]
    fn test_resolve_all_length_matches_registry() {
        let registry = registry();
        let set = resolve(&registry, &LanguageRequest::All).unwrap();
        assert_eq!(set.len(), registry.list_all().unwrap().len() + 1);
        assert_eq!(set.ids().iter().filter(|id| **id == "generic").count(), 1);
    }

    #[test]
    fn test_resolve_prepends_base_for_dependent_modules() {
        let set = resolve(&registry(), &list("python,go")).unwrap();
        assert_eq!(ids(&set), vec!["generic", "python", "go"]);
    }

    #[test]
    fn test_resolve_self_sufficient_module_has_no_base() {
        let set = resolve(&registry(), &list("markup")).unwrap();
        assert_eq!(ids(&set), vec!["markup"]);
    }

    #[test]
    fn test_resolve_mixed_request_base_first() {
        let set = resolve(&registry(), &list("css,python")).unwrap();
        assert_eq!(ids(&set), vec!["generic", "css", "python"]);
    }

    #[test]
    fn test_resolve_explicit_base_moves_to_front() {
        let set = resolve(&registry(), &list("python,generic")).unwrap();
        assert_eq!(ids(&set), vec!["generic", "python"]);
    }

    #[test]
    fn test_resolve_explicit_base_without_dependents_keeps_order() {
        let set = resolve(&registry(), &list("css,generic")).unwrap();
        assert_eq!(ids(&set), vec!["css", "generic"]);
    }

    #[test]
    fn test_resolve_collapses_duplicates() {
        let set = resolve(&registry(), &list("go,css,go")).unwrap();
        assert_eq!(ids(&set), vec!["generic", "go", "css"]);
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let set = resolve(&registry(), &list("PYTHON")).unwrap();
        assert_eq!(ids(&set), vec!["generic", "python"]);
    }

    #[test]
    fn test_resolve_unknown_module() {
        let result = resolve(&registry(), &list("css,cobol"));
        match result {
            Err(ResolveError::UnknownModuleRequested(id)) => assert_eq!(id, "cobol"),
            other => panic!("expected unknown module error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_missing_base() {
        let registry = registry().without_base();
        let result = resolve(&registry, &list("go"));
        assert!(matches!(result, Err(ResolveError::MissingBaseModule(_))));

        // A self-sufficient module does not need the base at all
        assert!(resolve(&registry, &list("css")).is_ok());
    }

    #[test]
    fn test_resolve_empty_list() {
        let result = resolve(&registry(), &LanguageRequest::List(vec![]));
        assert!(matches!(result, Err(ResolveError::EmptyRequest)));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let registry = registry();
        let request = list("go,markup,c");
        let first = resolve(&registry, &request).unwrap();
        let second = resolve(&registry, &request).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sorted_ids_and_display() {
        let set = resolve(&registry(), &list("python,css")).unwrap();
        assert_eq!(set.sorted_ids(), vec!["css", "generic", "python"]);
        assert_eq!(set.to_string(), "[generic, python, css]");
    }
}
