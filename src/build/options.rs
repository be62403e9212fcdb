//! Per-invocation build options.
//!
//! A [`BuildConfig`] is created once from command-line flags and threaded
//! through resolution, assembly and release. It is never edited in place:
//! derived configurations (a release build, a custom bundle) are new values.

use std::fmt;
use std::str::FromStr;

use crate::build::ResolveError;

/// Which modules a build asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageRequest {
    /// Every registered module, base first
    All,
    /// An explicit, normalized list of module ids in request order
    List(Vec<String>),
}

impl LanguageRequest {
    /// Parse a `--languages` value.
    ///
    /// `"all"` (any case) selects every module. Anything else is read as a
    /// comma-separated list; entries are trimmed and lowercased and empty
    /// entries are dropped. An empty request is an error.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(LanguageRequest::All);
        }

        let ids: Vec<String> = trimmed
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        if ids.is_empty() {
            return Err(ResolveError::EmptyRequest);
        }

        Ok(LanguageRequest::List(ids))
    }

    /// Whether this request selects every module.
    pub fn is_all(&self) -> bool {
        matches!(self, LanguageRequest::All)
    }
}

impl FromStr for LanguageRequest {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageRequest::parse(s)
    }
}

impl fmt::Display for LanguageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageRequest::All => write!(f, "all"),
            LanguageRequest::List(ids) => write!(f, "{}", ids.join(",")),
        }
    }
}

/// Immutable build flags for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    version: Option<String>,
    languages: Option<LanguageRequest>,
    release: bool,
    custom: bool,
    sourcemaps: bool,
    ugly: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            version: None,
            languages: None,
            release: false,
            custom: false,
            sourcemaps: true,
            ugly: false,
        }
    }
}

impl BuildConfig {
    /// Development defaults: unminified, inline source maps, no module request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the version stamped into the provenance header.
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Set the module request.
    pub fn with_languages(mut self, languages: Option<LanguageRequest>) -> Self {
        self.languages = languages;
        self
    }

    /// Set release mode.
    pub fn with_release(mut self, release: bool) -> Self {
        self.release = release;
        self
    }

    /// Set custom-bundle mode.
    pub fn with_custom(mut self, custom: bool) -> Self {
        self.custom = custom;
        self
    }

    /// Enable or disable inline source maps.
    pub fn with_sourcemaps(mut self, sourcemaps: bool) -> Self {
        self.sourcemaps = sourcemaps;
        self
    }

    /// Force minification.
    pub fn with_ugly(mut self, ugly: bool) -> Self {
        self.ugly = ugly;
        self
    }

    /// Derive the configuration used by a release: minified, stamped with `version`.
    pub fn for_release(&self, version: &str) -> Self {
        self.clone().with_release(true).with_version(Some(version.to_string()))
    }

    /// Derive the configuration used by a custom bundle build.
    ///
    /// Forces minification and the custom variant; an absent module request
    /// becomes [`LanguageRequest::All`].
    pub fn for_custom_build(&self) -> Self {
        let languages = self.languages.clone().or(Some(LanguageRequest::All));
        self.clone().with_ugly(true).with_custom(true).with_languages(languages)
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn languages(&self) -> Option<&LanguageRequest> {
        self.languages.as_ref()
    }

    pub fn is_release(&self) -> bool {
        self.release
    }

    pub fn is_custom(&self) -> bool {
        self.custom
    }

    pub fn sourcemaps(&self) -> bool {
        self.sourcemaps
    }

    pub fn is_ugly(&self) -> bool {
        self.ugly
    }

    /// Whether the primary entry is minified.
    pub fn minify(&self) -> bool {
        self.ugly || self.release
    }

    /// Whether an inline source map is embedded in the primary entry.
    pub fn embed_source_map(&self) -> bool {
        self.sourcemaps && !self.release && !self.custom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_is_case_insensitive() {
        assert_eq!(LanguageRequest::parse("all").unwrap(), LanguageRequest::All);
        assert_eq!(LanguageRequest::parse("ALL").unwrap(), LanguageRequest::All);
        assert_eq!(LanguageRequest::parse(" All ").unwrap(), LanguageRequest::All);
    }

    #[test]
    fn test_parse_list_normalizes_entries() {
        let request = LanguageRequest::parse("Python, GO,,javascript ").unwrap();
        assert_eq!(
            request,
            LanguageRequest::List(vec![
                "python".to_string(),
                "go".to_string(),
                "javascript".to_string()
            ])
        );
    }

    #[test]
    fn test_parse_list_keeps_duplicates_for_resolver() {
        let request = LanguageRequest::parse("go,go").unwrap();
        assert_eq!(request, LanguageRequest::List(vec!["go".to_string(), "go".to_string()]));
    }

    #[test]
    fn test_parse_empty_request_is_error() {
        assert!(matches!(LanguageRequest::parse(""), Err(ResolveError::EmptyRequest)));
        assert!(matches!(LanguageRequest::parse(" , ,"), Err(ResolveError::EmptyRequest)));
    }

    #[test]
    fn test_from_str_and_display() {
        let request: LanguageRequest = "css,html".parse().unwrap();
        assert_eq!(request.to_string(), "css,html");
        assert_eq!(LanguageRequest::All.to_string(), "all");
    }

    #[test]
    fn test_default_build_config() {
        let config = BuildConfig::new();
        assert!(config.sourcemaps());
        assert!(!config.is_release());
        assert!(!config.is_custom());
        assert!(!config.minify());
        assert!(config.embed_source_map());
        assert_eq!(config.version(), None);
        assert_eq!(config.languages(), None);
    }

    #[test]
    fn test_minify_when_ugly_or_release() {
        assert!(BuildConfig::new().with_ugly(true).minify());
        assert!(BuildConfig::new().with_release(true).minify());
    }

    #[test]
    fn test_source_map_suppressed() {
        assert!(!BuildConfig::new().with_sourcemaps(false).embed_source_map());
        assert!(!BuildConfig::new().with_release(true).embed_source_map());
        assert!(!BuildConfig::new().with_custom(true).embed_source_map());
        assert!(BuildConfig::new().with_ugly(true).embed_source_map());
    }

    #[test]
    fn test_for_release_derives_new_value() {
        let base = BuildConfig::new().with_sourcemaps(false);
        let release = base.for_release("1.3.0");

        assert!(release.is_release());
        assert_eq!(release.version(), Some("1.3.0"));
        assert!(!release.sourcemaps());
        // The original is untouched
        assert!(!base.is_release());
        assert_eq!(base.version(), None);
    }

    #[test]
    fn test_for_custom_build_defaults_to_all() {
        let custom = BuildConfig::new().for_custom_build();
        assert!(custom.is_custom());
        assert!(custom.is_ugly());
        assert_eq!(custom.languages(), Some(&LanguageRequest::All));
    }

    #[test]
    fn test_for_custom_build_keeps_explicit_request() {
        let request = LanguageRequest::parse("python").unwrap();
        let custom = BuildConfig::new().with_languages(Some(request.clone())).for_custom_build();
        assert_eq!(custom.languages(), Some(&request));
    }
}
