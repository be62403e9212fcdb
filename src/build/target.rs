//! Artifact variants and destination paths.
//!
//! Every build writes exactly one artifact. Which one is decided by the
//! build flags: a custom bundle wins over a release build, which wins over
//! the default development build.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::build::BuildConfig;

/// Shape of the artifact being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactVariant {
    /// Development build: `{name}.js`
    Standard,
    /// Release build: `{name}.min.js`
    Minified,
    /// Custom module selection: `{name}-custom.min.js`
    MinifiedCustom,
}

impl ArtifactVariant {
    /// Pick the variant for a build configuration.
    pub fn from_config(config: &BuildConfig) -> Self {
        if config.is_custom() {
            ArtifactVariant::MinifiedCustom
        } else if config.is_release() {
            ArtifactVariant::Minified
        } else {
            ArtifactVariant::Standard
        }
    }

    /// File name of this variant for an artifact name.
    pub fn file_name(&self, name: &str) -> String {
        match self {
            ArtifactVariant::Standard => format!("{}.js", name),
            ArtifactVariant::Minified => format!("{}.min.js", name),
            ArtifactVariant::MinifiedCustom => format!("{}-custom.min.js", name),
        }
    }

    /// All variants, in precedence-independent order.
    pub fn all() -> [ArtifactVariant; 3] {
        [ArtifactVariant::Standard, ArtifactVariant::Minified, ArtifactVariant::MinifiedCustom]
    }
}

impl fmt::Display for ArtifactVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactVariant::Standard => write!(f, "standard"),
            ArtifactVariant::Minified => write!(f, "minified"),
            ArtifactVariant::MinifiedCustom => write!(f, "minified-custom"),
        }
    }
}

/// Compute the destination path and variant for a build.
///
/// Pure and total: the same inputs always give the same answer.
pub fn resolve_path(out_dir: &Path, name: &str, config: &BuildConfig) -> (PathBuf, ArtifactVariant) {
    let variant = ArtifactVariant::from_config(config);
    (out_dir.join(variant.file_name(name)), variant)
}
