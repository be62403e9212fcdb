//! Atomic file output
//!
//! Artifacts and version records are written to a temporary file next to the
//! destination and renamed into place, so a failed write never leaves a
//! half-written file behind.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Write `contents` to `path` atomically.
///
/// Parent directories are created when missing.
///
/// # Arguments
///
/// * `path` - The destination file path
/// * `contents` - The bytes to write
///
/// # Returns
///
/// * `Ok(())` once the file has been renamed into place
/// * `Err(io::Error)` if any step failed; the destination is left untouched
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = tempfile::Builder::new().prefix(".langpack-").suffix(".tmp").tempfile_in(dir)?;
    temp.write_all(contents)?;
    if let Some(permissions) = destination_permissions(path)? {
        temp.as_file().set_permissions(permissions)?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Permissions the written file should end up with.
///
/// A replaced file keeps its mode. A new file gets the usual `0644` rather
/// than the owner-only mode temporary files are created with.
fn destination_permissions(path: &Path) -> io::Result<Option<fs::Permissions>> {
    match fs::metadata(path) {
        Ok(existing) => Ok(Some(existing.permissions())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(new_file_permissions()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

/// Prepend `prefix` to the file at `path`, atomically.
pub fn prepend_atomic(path: &Path, prefix: &str) -> io::Result<()> {
    let existing = fs::read(path)?;
    let mut contents = Vec::with_capacity(prefix.len() + existing.len());
    contents.extend_from_slice(prefix.as_bytes());
    contents.extend_from_slice(&existing);
    write_atomic(path, &contents)
}
