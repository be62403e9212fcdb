//! Build pipeline module for langpack
//!
//! Turns a project's primary entry and its language modules into a single
//! deployable script.
//!
//! # Overview
//!
//! The build pipeline consists of:
//! - **Registry**: enumerate the language modules in the source tree
//! - **Resolution**: expand a module request into an ordered module set
//! - **Targeting**: pick the artifact variant and path from the build flags
//! - **Assembly**: compile through a toolchain and write the artifact
//!
//! # Example
//!
//! ```ignore
//! use langpack::build::{BuildConfig, BuildContext, BuildPipeline, LanguageRequest};
//! use langpack::config::load_config;
//!
//! let config = load_config(None)?;
//! let context = BuildContext::new(config, project_root);
//! let pipeline = BuildPipeline::new(context);
//!
//! let build = BuildConfig::new().with_languages(Some(LanguageRequest::parse("python,go")?));
//! let artifact = pipeline.run(&build.for_custom_build())?;
//! println!("{}", artifact.summary());
//! ```

pub mod assemble;
pub mod context;
pub mod options;
pub mod pipeline;
pub mod provenance;
pub mod registry;
pub mod resolve;
pub mod result;
pub mod target;
pub mod toolchain;

pub use assemble::*;
pub use context::*;
pub use options::*;
pub use pipeline::*;
pub use provenance::*;
pub use registry::*;
pub use resolve::*;
pub use result::*;
pub use target::*;
pub use toolchain::*;
