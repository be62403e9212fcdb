//! Release versions: bump rules and the persisted version record.
//!
//! The current version lives in a [`VersionRecord`], usually the `version`
//! field of `package.json`. A release computes a [`VersionBump`] from it and
//! writes the next version back.

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::ValueEnum;
use semver::Version;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use thiserror::Error;

use crate::output::write_atomic;

/// Kind of change a release ships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum ReleaseType {
    /// Incompatible change
    Breaking,
    /// Backwards-compatible feature
    Feature,
    /// Bug fix
    #[default]
    Fix,
}

impl ReleaseType {
    /// Semantic-version component this release type increments.
    pub fn bump_kind(&self) -> BumpKind {
        match self {
            ReleaseType::Breaking => BumpKind::Major,
            ReleaseType::Feature => BumpKind::Minor,
            ReleaseType::Fix => BumpKind::Patch,
        }
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseType::Breaking => write!(f, "breaking"),
            ReleaseType::Feature => write!(f, "feature"),
            ReleaseType::Fix => write!(f, "fix"),
        }
    }
}

impl FromStr for ReleaseType {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breaking" => Ok(ReleaseType::Breaking),
            "feature" => Ok(ReleaseType::Feature),
            "fix" => Ok(ReleaseType::Fix),
            other => Err(VersionError::UnknownReleaseType(other.to_string())),
        }
    }
}

/// Semantic-version component to increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
}

impl BumpKind {
    /// Apply this bump. Lower components reset to zero and any pre-release
    /// or build metadata is dropped.
    pub fn apply(&self, current: &Version) -> Version {
        match self {
            BumpKind::Major => Version::new(current.major + 1, 0, 0),
            BumpKind::Minor => Version::new(current.major, current.minor + 1, 0),
            BumpKind::Patch => Version::new(current.major, current.minor, current.patch + 1),
        }
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BumpKind::Major => write!(f, "major"),
            BumpKind::Minor => write!(f, "minor"),
            BumpKind::Patch => write!(f, "patch"),
        }
    }
}

/// A computed version change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBump {
    pub current: Version,
    pub kind: BumpKind,
    pub next: Version,
}

impl VersionBump {
    pub fn new(current: Version, release_type: ReleaseType) -> Self {
        let kind = release_type.bump_kind();
        let next = kind.apply(&current);
        Self { current, kind, next }
    }
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.current, self.next, self.kind)
    }
}

/// Error reading or writing a version record.
#[derive(Debug, Error)]
pub enum VersionError {
    #[error("failed to access version record {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} has no string \"version\" field", path.display())]
    MissingVersion { path: PathBuf },
    #[error("invalid version '{value}' in {}: {source}", path.display())]
    InvalidVersion {
        path: PathBuf,
        value: String,
        #[source]
        source: semver::Error,
    },
    #[error("unknown release type '{0}' (expected breaking, feature or fix)")]
    UnknownReleaseType(String),
}

/// Persistent home of the project's current version.
pub trait VersionRecord {
    /// Where the record lives, for commits and messages.
    fn location(&self) -> &Path;

    /// Read the current version.
    fn read(&self) -> Result<Version, VersionError>;

    /// Replace the current version.
    fn write(&self, version: &Version) -> Result<(), VersionError>;
}

/// Choose the record type from the file name: `*.json` files are treated as
/// `package.json`, anything else as a plain version file.
pub fn record_for_path(path: PathBuf) -> Box<dyn VersionRecord> {
    if path.extension().is_some_and(|ext| ext == "json") {
        Box::new(PackageJson::new(path))
    } else {
        Box::new(VersionFile::new(path))
    }
}

fn parse_version(path: &Path, value: &str) -> Result<Version, VersionError> {
    let trimmed = value.trim();
    Version::parse(trimmed.strip_prefix('v').unwrap_or(trimmed)).map_err(|source| {
        VersionError::InvalidVersion { path: path.to_path_buf(), value: value.to_string(), source }
    })
}

/// The `version` field of a `package.json`.
///
/// Other keys, their order, the file's indentation and its trailing newline
/// survive a write.
#[derive(Debug, Clone)]
pub struct PackageJson {
    path: PathBuf,
}

impl PackageJson {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<(String, Value), VersionError> {
        let text = fs::read_to_string(&self.path)
            .map_err(|source| VersionError::Io { path: self.path.clone(), source })?;
        let doc = serde_json::from_str(&text)
            .map_err(|source| VersionError::Json { path: self.path.clone(), source })?;
        Ok((text, doc))
    }
}

/// Indentation of the first indented line; two spaces when nothing is indented.
fn detect_indent(text: &str) -> &str {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .find(|indent| !indent.is_empty())
        .unwrap_or("  ")
}

impl VersionRecord for PackageJson {
    fn location(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Version, VersionError> {
        let (_, doc) = self.load()?;
        let value = doc
            .get("version")
            .and_then(Value::as_str)
            .ok_or_else(|| VersionError::MissingVersion { path: self.path.clone() })?;
        parse_version(&self.path, value)
    }

    fn write(&self, version: &Version) -> Result<(), VersionError> {
        let (original, mut doc) = self.load()?;
        let Some(object) = doc.as_object_mut() else {
            return Err(VersionError::MissingVersion { path: self.path.clone() });
        };
        object.insert("version".to_string(), Value::String(version.to_string()));

        let mut text = Vec::new();
        let formatter = PrettyFormatter::with_indent(detect_indent(&original).as_bytes());
        doc.serialize(&mut serde_json::Serializer::with_formatter(&mut text, formatter))
            .map_err(|source| VersionError::Json { path: self.path.clone(), source })?;
        if original.ends_with('\n') {
            text.push(b'\n');
        }
        write_atomic(&self.path, &text)
            .map_err(|source| VersionError::Io { path: self.path.clone(), source })
    }
}

/// A plain text file holding only the version, e.g. `VERSION`.
#[derive(Debug, Clone)]
pub struct VersionFile {
    path: PathBuf,
}

impl VersionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl VersionRecord for VersionFile {
    fn location(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Version, VersionError> {
        let text = fs::read_to_string(&self.path)
            .map_err(|source| VersionError::Io { path: self.path.clone(), source })?;
        parse_version(&self.path, &text)
    }

    fn write(&self, version: &Version) -> Result<(), VersionError> {
        write_atomic(&self.path, format!("{}\n", version).as_bytes())
            .map_err(|source| VersionError::Io { path: self.path.clone(), source })
    }
}

/// Version record held in memory.
#[derive(Debug)]
pub struct MemoryVersion {
    path: PathBuf,
    version: RefCell<Version>,
}

impl MemoryVersion {
    pub fn new(version: Version) -> Self {
        Self { path: PathBuf::from("package.json"), version: RefCell::new(version) }
    }

    /// Current value without going through the trait.
    pub fn get(&self) -> Version {
        self.version.borrow().clone()
    }
}

impl VersionRecord for MemoryVersion {
    fn location(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Version, VersionError> {
        Ok(self.get())
    }

    fn write(&self, version: &Version) -> Result<(), VersionError> {
        *self.version.borrow_mut() = version.clone();
        Ok(())
    }
}
