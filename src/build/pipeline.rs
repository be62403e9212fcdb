//! Build pipeline orchestration.
//!
//! The pipeline resolves the requested modules against the registry and
//! hands the result to the assembler.

use thiserror::Error;

use crate::build::{
    resolve, Artifact, AssembleError, Assembler, BuildConfig, BuildContext, BuildPlan, ModuleSet,
    ResolveError,
};

/// Error during build execution.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Module resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// Compilation or output failed
    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

/// Build pipeline for executing builds.
pub struct BuildPipeline {
    /// Build context
    context: BuildContext,
    /// Whether to do a dry run (don't actually build)
    dry_run: bool,
}

impl BuildPipeline {
    /// Create a new build pipeline.
    pub fn new(context: BuildContext) -> Self {
        Self { context, dry_run: false }
    }

    /// Set dry-run mode (don't actually build).
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Whether this pipeline only plans.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// The context this pipeline builds.
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Resolve the modules a build would bundle, if it names any.
    pub fn resolve_modules(&self, config: &BuildConfig) -> Result<Option<ModuleSet>, BuildError> {
        let Some(request) = config.languages() else {
            return Ok(None);
        };
        let registry = self.context.registry();
        Ok(Some(resolve(&registry, request)?))
    }

    /// Compute what a build would produce without writing anything.
    pub fn plan(&self, config: &BuildConfig) -> Result<BuildPlan, BuildError> {
        let modules = self.resolve_modules(config)?;
        let toolchain = self.context.toolchain();
        let (path, variant) = Assembler::new(&self.context, toolchain.as_ref()).destination(config);
        Ok(BuildPlan { path, variant, modules })
    }

    /// Run the build: resolve modules, then pack or assemble.
    pub fn run(&self, config: &BuildConfig) -> Result<Artifact, BuildError> {
        let modules = self.resolve_modules(config)?;

        if self.context.is_verbose() {
            if let Some(modules) = &modules {
                println!("Modules: {}", modules);
            }
        }

        let toolchain = self.context.toolchain();
        let assembler = Assembler::new(&self.context, toolchain.as_ref());
        Ok(assembler.assemble(config, modules.as_ref())?)
    }
}
