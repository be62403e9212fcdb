//! Provenance header stamped at the top of artifacts.

use std::fmt;

use crate::build::ModuleSet;

/// Comment naming the product, version and (optionally) bundled modules.
///
/// Rendered as `/* Rainbow v2.1.0 rainbowco.de | included languages: css, generic */`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceHeader {
    product: String,
    version: String,
    homepage: Option<String>,
    modules: Option<Vec<String>>,
}

impl ProvenanceHeader {
    pub fn new(product: impl Into<String>, version: impl Into<String>) -> Self {
        Self { product: product.into(), version: version.into(), homepage: None, modules: None }
    }

    pub fn with_homepage(mut self, homepage: Option<String>) -> Self {
        self.homepage = homepage;
        self
    }

    /// List the modules of an explicit request, sorted alphabetically.
    pub fn with_modules(mut self, modules: &ModuleSet) -> Self {
        self.modules = Some(modules.sorted_ids().into_iter().map(str::to_string).collect());
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Prepend this header to existing content.
    pub fn prepend_to(&self, content: &str) -> String {
        format!("{}\n{}", self, content)
    }
}

impl fmt::Display for ProvenanceHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/* {} v{}", self.product, self.version)?;
        if let Some(homepage) = &self.homepage {
            write!(f, " {}", homepage)?;
        }
        if let Some(modules) = &self.modules {
            write!(f, " | included languages: {}", modules.join(", "))?;
        }
        write!(f, " */")
    }
}
