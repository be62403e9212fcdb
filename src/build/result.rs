//! Build result types.
//!
//! Contains types for representing the outcome of build operations.

use std::path::PathBuf;
use std::time::Duration;

use crate::build::{ArtifactVariant, ModuleSet};

/// An artifact written by the assembler.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Where the artifact was written
    pub path: PathBuf,
    /// Which variant it is
    pub variant: ArtifactVariant,
    /// Size of the written file
    pub bytes_written: usize,
    /// Bundled modules, in load order (`None` for a pack-only build)
    pub modules: Option<ModuleSet>,
    /// Build duration
    pub duration: Duration,
}

impl Artifact {
    /// Number of bundled modules.
    pub fn module_count(&self) -> usize {
        self.modules.as_ref().map_or(0, ModuleSet::len)
    }

    /// Format a one-line summary of the build.
    pub fn summary(&self) -> String {
        let name = self.path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let mut line =
            format!("Built {} ({}, {})", name, self.variant, format_size(self.bytes_written));
        if let Some(modules) = &self.modules {
            line.push_str(&format!(" with {} modules {}", modules.len(), modules));
        }
        line.push_str(&format!(" in {:?}", self.duration));
        line
    }
}

/// Planned outcome of a build, computed without writing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    /// Where the artifact would be written
    pub path: PathBuf,
    /// Which variant it would be
    pub variant: ArtifactVariant,
    /// Modules that would be bundled
    pub modules: Option<ModuleSet>,
}

impl BuildPlan {
    /// Format a summary of the plan.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Would build {} ({})", self.path.display(), self.variant)];
        if let Some(modules) = &self.modules {
            lines.push(format!("  modules: {}", modules));
        }
        lines.join("\n")
    }
}

fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}
