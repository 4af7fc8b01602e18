//! Safety predicates evaluated immediately before every mutating primitive.
//!
//! All checks are pure reads. They are re-run right before a primitive acts
//! rather than trusting a previously classified entity, which shrinks (but
//! cannot close) the window between check and action when the tree is
//! mutated externally.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

/// Canonicalises `path` without following its final component.
///
/// Parent components are resolved so that `/a/./x` and `/a/x` compare equal,
/// but a symlink at the final component stays itself instead of becoming its
/// pointee, and a destination that does not exist yet still canonicalises.
pub(crate) fn canonical_entry(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}

/// Returns `true` if `a` and `b` resolve to the identical canonical path.
///
/// Compares the no-follow forms first so that a symlink being moved compares
/// as the link itself; the follow-both fallback catches the case where the
/// destination is a symlink pointing back at the source.
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    if canonical_entry(a) == canonical_entry(b) {
        return true;
    }
    matches!((a.canonicalize(), b.canonicalize()), (Ok(x), Ok(y)) if x == y)
}

/// Fails with [`CoreError::SameFile`] when source and destination coincide.
pub fn ensure_not_same_file(src: &Path, dest: &Path) -> CoreResult<()> {
    if is_same_file(src, dest) {
        return Err(CoreError::SameFile {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
        });
    }
    Ok(())
}

/// Returns `true` if something (including a dangling symlink) occupies `path`.
pub fn destination_exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

/// Fails with [`CoreError::FileDoesExist`] when the destination name is taken.
pub fn ensure_file_missing(dest: &Path) -> CoreResult<()> {
    if destination_exists(dest) {
        return Err(CoreError::FileDoesExist(dest.to_path_buf()));
    }
    Ok(())
}

/// Fails with [`CoreError::DirDoesExist`] when the destination name is taken.
pub fn ensure_dir_missing(dest: &Path) -> CoreResult<()> {
    if destination_exists(dest) {
        return Err(CoreError::DirDoesExist(dest.to_path_buf()));
    }
    Ok(())
}

/// Returns `true` if `dest` is `src` or a descendant of `src`.
pub fn is_within(src: &Path, dest: &Path) -> bool {
    let src = src.canonicalize().unwrap_or_else(|_| src.to_path_buf());
    canonical_entry(dest).starts_with(&src)
}

/// Fails with [`CoreError::DestinationInSource`] when a recursive copy would
/// descend into its own output.
pub fn ensure_not_within(src: &Path, dest: &Path) -> CoreResult<()> {
    if is_within(src, dest) {
        return Err(CoreError::DestinationInSource {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
        });
    }
    Ok(())
}
