//! langpack - Build and release pipeline for language-pack bundles
//!
//! This library provides functionality to:
//! - Enumerate the pluggable language modules of a project and resolve a
//!   module request into a load order, base module first
//! - Compile the primary entry and the selected modules into one artifact
//!   (development, minified or custom) stamped with a provenance header
//! - Drive a versioned release: test, build, bump, commit and tag

pub mod build;
pub mod cli;
pub mod config;
pub mod logging;
pub mod output;
pub mod release;
pub mod version;
pub mod watch;
