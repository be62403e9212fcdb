//! Versioned releases
//!
//! A release runs the test suite, builds the minified artifact, bumps the
//! persisted version, stamps the artifact with it, and commits and tags the
//! result. [`ReleaseOrchestrator`] sequences these steps; the external systems
//! it touches sit behind the traits in [`collaborators`].

pub mod collaborators;
pub mod orchestrator;

pub use collaborators::*;
pub use orchestrator::*;
pub use crate::version::{BumpKind, ReleaseType, VersionBump};
