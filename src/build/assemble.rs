//! Bundle assembly.
//!
//! The assembler compiles the primary entry, optionally appends a compiled
//! manifest of language modules under a provenance header, and writes the
//! result to the artifact path for the build variant.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

use crate::build::{
    resolve_path, Artifact, ArtifactVariant, BuildConfig, BuildContext, CompileOptions,
    ModuleRegistry, ModuleSet, ProvenanceHeader, RegistryError, Toolchain, ToolchainError,
};
use crate::output::{prepend_atomic, write_atomic};
use crate::version::VersionError;

/// Prefix of the scratch manifest written into the language directory.
pub const MANIFEST_PREFIX: &str = ".langpack-manifest-";

/// Error during bundle assembly.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// The toolchain rejected a source
    #[error("failed to compile {}: {source}", path.display())]
    CompileFailed {
        path: PathBuf,
        #[source]
        source: ToolchainError,
    },
    /// A file could not be read or written
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The header version could not be determined
    #[error(transparent)]
    Version(#[from] VersionError),
    /// Module files could not be listed
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Produces artifacts for one project.
pub struct Assembler<'a> {
    context: &'a BuildContext,
    toolchain: &'a dyn Toolchain,
}

impl<'a> Assembler<'a> {
    pub fn new(context: &'a BuildContext, toolchain: &'a dyn Toolchain) -> Self {
        Self { context, toolchain }
    }

    /// Destination path and variant for a build.
    pub fn destination(&self, config: &BuildConfig) -> (PathBuf, ArtifactVariant) {
        resolve_path(&self.context.out_dir(), &self.context.artifact_name(), config)
    }

    /// Write only the compiled primary entry.
    pub fn pack(&self, config: &BuildConfig) -> Result<Artifact, AssembleError> {
        self.assemble(config, None)
    }

    /// Build the artifact for `config`.
    ///
    /// Without a module set this is the pack phase: the compiled primary
    /// entry alone. With one, the compiled manifest is appended and the
    /// provenance header prepended. Nothing is written unless every
    /// compilation succeeded.
    pub fn assemble(
        &self,
        config: &BuildConfig,
        modules: Option<&ModuleSet>,
    ) -> Result<Artifact, AssembleError> {
        let start = Instant::now();
        let (path, variant) = self.destination(config);
        let modules = modules.filter(|set| !set.is_empty());

        let entry = self.context.entry_path();
        tracing::info!(
            entry = %entry.display(),
            variant = %variant,
            toolchain = self.toolchain.name(),
            "compiling primary entry"
        );
        let options = CompileOptions::primary(config)
            .with_export(self.context.config().project.global_name());
        let primary = self.compile(&entry, &options)?;

        let contents = match modules {
            None => primary,
            Some(set) => {
                let manifest = self.compile_manifest(set)?;
                let header = self.header(config, set)?;
                let mut contents = header.prepend_to(&primary);
                contents.push('\n');
                contents.push_str(&manifest);
                contents
            }
        };

        write_atomic(&path, contents.as_bytes())
            .map_err(|source| AssembleError::Io { path: path.clone(), source })?;

        let artifact = Artifact {
            path,
            variant,
            bytes_written: contents.len(),
            modules: modules.cloned(),
            duration: start.elapsed(),
        };
        tracing::info!(path = %artifact.path.display(), bytes = artifact.bytes_written, "wrote artifact");
        Ok(artifact)
    }

    /// Prepend a provenance header to an existing artifact.
    pub fn prepend_header(&self, path: &Path, header: &ProvenanceHeader) -> Result<(), AssembleError> {
        prepend_atomic(path, &format!("{}\n", header))
            .map_err(|source| AssembleError::Io { path: path.to_path_buf(), source })
    }

    /// Header for a build that bundles `modules`.
    pub fn header(
        &self,
        config: &BuildConfig,
        modules: &ModuleSet,
    ) -> Result<ProvenanceHeader, AssembleError> {
        let version = match config.version() {
            Some(version) => version.to_string(),
            None => self.context.version_record().read()?.to_string(),
        };
        let project = &self.context.config().project;
        let header = ProvenanceHeader::new(project.name.as_str(), version)
            .with_homepage(project.homepage.clone());

        Ok(match config.languages() {
            Some(_) => header.with_modules(modules),
            None => header,
        })
    }

    fn compile(&self, path: &Path, options: &CompileOptions) -> Result<String, AssembleError> {
        self.toolchain
            .compile(path, options)
            .map_err(|source| AssembleError::CompileFailed { path: path.to_path_buf(), source })
    }

    /// Write the manifest beside the modules and compile it.
    fn compile_manifest(&self, modules: &ModuleSet) -> Result<String, AssembleError> {
        let dir = self.context.language_dir();
        let io_error = |source| AssembleError::Io { path: dir.clone(), source };
        let source = manifest_source(&self.import_names(modules)?);

        let mut scratch = tempfile::Builder::new()
            .prefix(MANIFEST_PREFIX)
            .suffix(".js")
            .tempfile_in(&dir)
            .map_err(io_error)?;
        scratch.write_all(source.as_bytes()).map_err(io_error)?;
        scratch.flush().map_err(io_error)?;

        tracing::debug!(modules = %modules, "compiling module manifest");
        self.compile(scratch.path(), &CompileOptions::manifest())
    }

    /// Import names for `modules`, spelled as their files are on disk.
    ///
    /// Ids the registry does not know are kept as-is so the toolchain
    /// reports them as unresolved.
    fn import_names(&self, modules: &ModuleSet) -> Result<Vec<String>, AssembleError> {
        let registry = self.context.registry();
        let mut known = registry.list_all()?;
        if registry.has_base() {
            known.push(registry.base().clone());
        }

        Ok(modules
            .iter()
            .map(|id| match known.iter().find(|m| &m.id == id) {
                Some(module) => module.import_name().to_string(),
                None => id.to_string(),
            })
            .collect())
    }
}

/// One side-effect import per module, in load order.
pub fn manifest_source<S: AsRef<str>>(names: &[S]) -> String {
    names.iter().map(|name| format!("import './{}';\n", name.as_ref())).collect()
}
