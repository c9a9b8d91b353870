//! Attribute-preserving filesystem copies
//!
//! Behaves like `rsync -a src dest/`: directories are merged into the
//! destination, symlinks are recreated rather than followed, and file modes and
//! modification times are carried over.

use filetime::FileTime;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{PkgError, Result};

/// Ensure a file's parent directory exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Set file permissions (Unix only).
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Recursively copy `src` to `dest`, merging into `dest` if it exists.
///
/// Directory modes and timestamps are applied after their contents are
/// written.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    let copy_err = |e: std::io::Error| PkgError::Copy {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        source: e,
    };

    let mut dirs = Vec::new();

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| copy_err(e.into()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| copy_err(std::io::Error::other(e)))?;
        let target = dest.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&target).map_err(copy_err)?;
            let meta = entry.metadata().map_err(|e| copy_err(e.into()))?;
            dirs.push((target, meta));
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }

    // Deepest first, so a read-only parent never blocks its children and a
    // parent's mtime is not bumped afterwards.
    for (dir, meta) in dirs.into_iter().rev() {
        std::fs::set_permissions(&dir, meta.permissions()).map_err(copy_err)?;
        filetime::set_file_mtime(&dir, FileTime::from_last_modification_time(&meta))
            .map_err(copy_err)?;
    }

    Ok(())
}

/// Copy a regular file, preserving its mode and modification time.
pub fn copy_file(src: &Path, dest: &Path) -> Result<u64> {
    let copy_err = |e: std::io::Error| PkgError::Copy {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        source: e,
    };

    ensure_parent_dir(dest)?;
    // Kegs are often read-only; replace instead of writing through.
    if dest.symlink_metadata().is_ok() {
        std::fs::remove_file(dest).map_err(copy_err)?;
    }
    let bytes = std::fs::copy(src, dest).map_err(copy_err)?;
    let meta = std::fs::metadata(src).map_err(copy_err)?;
    filetime::set_file_times(
        dest,
        FileTime::from_last_access_time(&meta),
        FileTime::from_last_modification_time(&meta),
    )
    .map_err(copy_err)?;
    Ok(bytes)
}

/// Recreate the symlink at `src` as `dest`, pointing at the same target.
#[cfg(unix)]
pub fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    let copy_err = |e: std::io::Error| PkgError::Copy {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        source: e,
    };

    let link_target = std::fs::read_link(src).map_err(copy_err)?;
    ensure_parent_dir(dest)?;
    if dest.symlink_metadata().is_ok() {
        if dest.is_dir() && !dest.is_symlink() {
            std::fs::remove_dir_all(dest).map_err(copy_err)?;
        } else {
            std::fs::remove_file(dest).map_err(copy_err)?;
        }
    }
    std::os::unix::fs::symlink(&link_target, dest).map_err(copy_err)?;
    Ok(())
}

#[cfg(not(unix))]
pub fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    Err(PkgError::Copy {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        source: std::io::Error::other("symlinks not supported on this platform"),
    })
}
