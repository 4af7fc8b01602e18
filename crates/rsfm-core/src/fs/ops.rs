//! Atomic file operation primitives.
//!
//! Every primitive takes already-classified [`Entity`] values plus a
//! destination anchor, and re-runs its safety predicates immediately before
//! acting instead of trusting the snapshot it was handed. The check-to-act
//! window is minimised, never eliminated; external mutation inside it
//! surfaces as an ordinary I/O error.
//!
//! Symlinks are opaque throughout: copied by recreating the raw target
//! string, moved and deleted as links, never followed into their pointee.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::fs::checks;
use crate::fs::entity::{classify, list_directory, Entity};
use crate::fs::operation::DirCopyMode;

/// Recursion bound for directory copies, against symlink-loop style cycles
/// introduced while the copy is running.
const MAX_COPY_DEPTH: usize = 64;

/// Permission bits for files created by [`create_file`]:
/// read+write for owner, group and other, no execute.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o666;

/// Computes the destination path for `name` under `dest_dir`, honouring a
/// `Rename` mode's retargeted name.
fn target_path(dest_dir: &Path, name: &str, mode: &DirCopyMode) -> PathBuf {
    match mode {
        DirCopyMode::Rename(new_name) => dest_dir.join(new_name),
        _ => dest_dir.join(name),
    }
}

/// Removes whatever occupies `path`: directories recursively, everything
/// else (symlinks included) as a single entry.
fn delete_path(path: &Path) -> CoreResult<()> {
    let meta = std::fs::symlink_metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CoreError::NotFound(path.to_path_buf())
        } else {
            CoreError::Io(e)
        }
    })?;
    if meta.is_dir() {
        std::fs::remove_dir_all(path)?;
    } else {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

#[cfg(unix)]
fn make_symlink(target: &Path, dest: &Path) -> CoreResult<()> {
    std::os::unix::fs::symlink(target, dest)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_symlink(target: &Path, dest: &Path) -> CoreResult<()> {
    let _ = target;
    Err(CoreError::InvalidOperation(format!(
        "cannot recreate symlink at {} on this platform",
        dest.display()
    )))
}

fn is_valid_filename(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    if name.contains('/') || name.contains('\0') {
        return false;
    }
    true
}

/// Copies a regular file into `dest_dir`, preserving permission bits.
///
/// Entities that are not regular files are a no-op; the dispatchers route
/// by variant ([`easy_copy`]), so reaching here with a directory or symlink
/// means the caller chose the wrong primitive on purpose.
///
/// # Errors
///
/// - [`CoreError::SameFile`] if source and destination resolve identically.
/// - [`CoreError::FileDoesExist`] under `Strict`/`Rename` when the
///   destination name is taken. `Merge` and `Replace` overwrite.
/// - [`CoreError::Io`] for the underlying copy failure.
pub fn copy_file(src: &Entity, dest_dir: &Path, mode: &DirCopyMode) -> CoreResult<()> {
    let Entity::File { path, name, .. } = src else {
        return Ok(());
    };
    let dest = target_path(dest_dir, name, mode);
    checks::ensure_not_same_file(path, &dest)?;
    match mode {
        DirCopyMode::Strict | DirCopyMode::Rename(_) => checks::ensure_file_missing(&dest)?,
        DirCopyMode::Merge | DirCopyMode::Replace => {}
    }
    // std::fs::copy carries permission bits over.
    std::fs::copy(path, &dest)?;
    Ok(())
}

/// Recursively copies a directory into `dest_dir`.
///
/// The destination directory itself is created according to `mode`:
/// `Strict` fails on an existing target, `Merge` creates-if-missing and
/// leaves existing children to the per-file conflict rules, `Replace`
/// deletes the existing target tree first, `Rename` copies under a new name.
/// Children recurse with the same mode, except that everything beneath a
/// renamed root is a fresh tree and recurses `Strict`.
///
/// # Errors
///
/// - [`CoreError::SameFile`] if source and destination coincide.
/// - [`CoreError::DestinationInSource`] if the destination is the source or
///   one of its descendants.
/// - [`CoreError::DirDoesExist`] under `Strict`/`Rename` on collision.
///
/// The first failing child aborts the remaining recursion; there is no
/// skip-and-continue mode. Children whose classification failed are the one
/// exception: they are skipped with a warning.
pub fn copy_directory(mode: &DirCopyMode, src: &Entity, dest_dir: &Path) -> CoreResult<()> {
    let Entity::Dir { path, name, .. } = src else {
        return Ok(());
    };
    let dest = target_path(dest_dir, name, mode);
    copy_dir_impl(mode, path, &dest, 0)
}

fn copy_dir_impl(mode: &DirCopyMode, src: &Path, dest: &Path, depth: usize) -> CoreResult<()> {
    if depth > MAX_COPY_DEPTH {
        return Err(CoreError::InvalidOperation(format!(
            "copy exceeded maximum depth of {MAX_COPY_DEPTH}"
        )));
    }

    checks::ensure_not_same_file(src, dest)?;
    checks::ensure_not_within(src, dest)?;

    match mode {
        DirCopyMode::Strict | DirCopyMode::Rename(_) => {
            checks::ensure_dir_missing(dest)?;
            std::fs::create_dir(dest)?;
        }
        DirCopyMode::Merge => {
            if !checks::destination_exists(dest) {
                std::fs::create_dir(dest)?;
            }
        }
        DirCopyMode::Replace => {
            if checks::destination_exists(dest) {
                delete_path(dest)?;
            }
            std::fs::create_dir(dest)?;
        }
    }

    let child_mode = mode.for_children();
    for child in list_directory(src)? {
        match &child {
            Entity::File { .. } => copy_file(&child, dest, &child_mode)?,
            Entity::Dir { path: child_path, .. } => {
                copy_dir_impl(&child_mode, child_path, &dest.join(child.name()), depth + 1)?;
            }
            Entity::SymlinkToFile { .. }
            | Entity::SymlinkToDir { .. }
            | Entity::BrokenSymlink { .. } => recreate_symlink(&child, dest, &child_mode)?,
            Entity::Failed { path, reason, .. } => {
                tracing::warn!(
                    path = %path.display(),
                    %reason,
                    "skipping unreadable entry during copy"
                );
            }
        }
    }

    Ok(())
}

/// Recreates a symlink inside `dest_dir` with the identical target string.
///
/// The target is deliberately not validated or re-pointed: dangling links
/// are preserved faithfully. Non-symlink entities are a no-op.
///
/// # Errors
///
/// - [`CoreError::SameFile`] if the new link would be the source link.
/// - [`CoreError::FileDoesExist`] under `Strict`/`Rename` on collision;
///   `Merge`/`Replace` remove the occupying entry first.
pub fn recreate_symlink(src: &Entity, dest_dir: &Path, mode: &DirCopyMode) -> CoreResult<()> {
    if !src.is_symlink() {
        return Ok(());
    }
    let dest = target_path(dest_dir, src.name(), mode);
    checks::ensure_not_same_file(src.path(), &dest)?;
    let target = std::fs::read_link(src.path())?;
    match mode {
        DirCopyMode::Strict | DirCopyMode::Rename(_) => checks::ensure_file_missing(&dest)?,
        DirCopyMode::Merge | DirCopyMode::Replace => {
            if checks::destination_exists(&dest) {
                delete_path(&dest)?;
            }
        }
    }
    make_symlink(&target, &dest)
}

/// Moves a non-directory entity (file or any symlink, opaquely) into
/// `dest_dir`.
///
/// Attempts an atomic rename; a cross-device rename failure degrades to
/// copy + delete. `Merge` makes no sense for a move and is rejected.
///
/// # Errors
///
/// - [`CoreError::SameFile`] if source and computed destination coincide.
/// - [`CoreError::FileDoesExist`] under `Strict`/`Rename` on collision.
/// - [`CoreError::InvalidOperation`] for `Merge`.
pub fn move_file(src: &Entity, dest_dir: &Path, mode: &DirCopyMode) -> CoreResult<()> {
    if matches!(src, Entity::Dir { .. } | Entity::Failed { .. }) {
        return Ok(());
    }
    let dest = target_path(dest_dir, src.name(), mode);
    move_entry(src.path(), &dest, mode, false)
}

/// Moves a directory into `dest_dir`. See [`move_file`] for mode semantics.
pub fn move_directory(src: &Entity, dest_dir: &Path, mode: &DirCopyMode) -> CoreResult<()> {
    let Entity::Dir { path, name, .. } = src else {
        return Ok(());
    };
    let dest = target_path(dest_dir, name, mode);
    checks::ensure_not_within(path, &dest)?;
    move_entry(path, &dest, mode, true)
}

fn move_entry(src: &Path, dest: &Path, mode: &DirCopyMode, is_dir: bool) -> CoreResult<()> {
    checks::ensure_not_same_file(src, dest)?;
    match mode {
        DirCopyMode::Strict | DirCopyMode::Rename(_) => {
            if is_dir {
                checks::ensure_dir_missing(dest)?;
            } else {
                checks::ensure_file_missing(dest)?;
            }
        }
        DirCopyMode::Merge => {
            return Err(CoreError::InvalidOperation(
                "merge is not supported for move".to_string(),
            ));
        }
        DirCopyMode::Replace => {
            if checks::destination_exists(dest) {
                delete_path(dest)?;
            }
        }
    }

    match std::fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::debug!(
                src = %src.display(),
                error = %e,
                "rename failed, falling back to copy + delete"
            );
            copy_any_path(src, dest)?;
            delete_path(src)
        }
    }
}

/// Cross-device fallback: re-classifies `src` and copies it to `dest` by
/// whatever shape it has right now.
fn copy_any_path(src: &Path, dest: &Path) -> CoreResult<()> {
    match classify(src) {
        Entity::File { path, .. } => {
            std::fs::copy(&path, dest)?;
            Ok(())
        }
        Entity::Dir { .. } => copy_dir_impl(&DirCopyMode::Strict, src, dest, 0),
        Entity::SymlinkToFile { .. } | Entity::SymlinkToDir { .. } | Entity::BrokenSymlink { .. } => {
            let target = std::fs::read_link(src)?;
            make_symlink(&target, dest)
        }
        Entity::Failed { reason, .. } => Err(CoreError::InvalidOperation(format!(
            "cannot move {}: {reason}",
            src.display()
        ))),
    }
}

/// Deletes a non-directory entity. A symlink is removed as a link; its
/// pointee is untouched. Directory and failed entities are a no-op.
pub fn delete_file(entity: &Entity) -> CoreResult<()> {
    if matches!(entity, Entity::Dir { .. } | Entity::Failed { .. }) {
        return Ok(());
    }
    std::fs::remove_file(entity.path())?;
    Ok(())
}

/// Deletes a directory and everything beneath it.
///
/// Deletion has no `Strict`/`Merge`/`Replace` distinction: it always removes
/// the whole tree. Symlinks inside the tree are removed as links.
pub fn delete_directory(entity: &Entity) -> CoreResult<()> {
    let Entity::Dir { path, .. } = entity else {
        return Ok(());
    };
    std::fs::remove_dir_all(path)?;
    Ok(())
}

/// Creates an empty file named `name` inside the directory entity.
///
/// The file is created with a fixed permission mask (read+write for
/// owner/group/other, no execute). The names `.` and `..` are silently
/// ignored.
///
/// # Errors
///
/// - [`CoreError::InvalidOperation`] if `dir` is not a directory entity.
/// - [`CoreError::InvalidName`] for names with separators or NUL bytes.
/// - [`CoreError::FileDoesExist`] if the name is already taken.
pub fn create_file(dir: &Entity, name: &str) -> CoreResult<()> {
    let Entity::Dir { path, .. } = dir else {
        return Err(CoreError::InvalidOperation(format!(
            "cannot create a file inside {}: not a directory",
            dir.path().display()
        )));
    };
    if name == "." || name == ".." {
        return Ok(());
    }
    if !is_valid_filename(name) {
        return Err(CoreError::InvalidName(name.to_string()));
    }

    let dest = path.join(name);
    checks::ensure_file_missing(&dest)?;

    // create_new re-checks existence atomically at open time.
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&dest)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&dest, std::fs::Permissions::from_mode(NEW_FILE_MODE))?;
    }

    Ok(())
}

/// Renames an entity within its own parent directory (atomic rename).
///
/// The names `.` and `..` are silently ignored.
///
/// # Errors
///
/// - [`CoreError::SameFile`] if old and new paths are identical.
/// - [`CoreError::FileDoesExist`] if the new name collides.
/// - [`CoreError::InvalidName`] for invalid names or an entity with no parent.
pub fn rename_entry(entity: &Entity, new_name: &str) -> CoreResult<()> {
    if new_name == "." || new_name == ".." {
        return Ok(());
    }
    if !is_valid_filename(new_name) {
        return Err(CoreError::InvalidName(new_name.to_string()));
    }

    let parent = entity
        .anchor()
        .ok_or_else(|| CoreError::InvalidName("no parent directory".to_string()))?;
    let dest = parent.join(new_name);

    if checks::is_same_file(entity.path(), &dest) {
        return Err(CoreError::SameFile {
            src: entity.path().to_path_buf(),
            dest,
        });
    }
    checks::ensure_file_missing(&dest)?;

    std::fs::rename(entity.path(), &dest)?;
    Ok(())
}

/// Copies any entity by dispatching on its variant: files byte-copy,
/// directories recurse, symlinks are recreated. Failed entities do nothing.
pub fn easy_copy(src: &Entity, dest_dir: &Path, mode: &DirCopyMode) -> CoreResult<()> {
    match src {
        Entity::File { .. } => copy_file(src, dest_dir, mode),
        Entity::Dir { .. } => copy_directory(mode, src, dest_dir),
        Entity::SymlinkToFile { .. }
        | Entity::SymlinkToDir { .. }
        | Entity::BrokenSymlink { .. } => recreate_symlink(src, dest_dir, mode),
        Entity::Failed { .. } => Ok(()),
    }
}

/// Moves any entity by dispatching on its variant. Symlinks (including those
/// resolving to directories) move as opaque file-like entries. Failed
/// entities do nothing.
pub fn easy_move(src: &Entity, dest_dir: &Path, mode: &DirCopyMode) -> CoreResult<()> {
    match src {
        Entity::Dir { .. } => move_directory(src, dest_dir, mode),
        Entity::File { .. }
        | Entity::SymlinkToFile { .. }
        | Entity::SymlinkToDir { .. }
        | Entity::BrokenSymlink { .. } => move_file(src, dest_dir, mode),
        Entity::Failed { .. } => Ok(()),
    }
}

/// Deletes any entity by dispatching on its variant. Directories are removed
/// recursively; there is no per-mode distinction for deletion. Failed
/// entities do nothing.
pub fn easy_delete(entity: &Entity) -> CoreResult<()> {
    match entity {
        Entity::Dir { .. } => delete_directory(entity),
        Entity::File { .. }
        | Entity::SymlinkToFile { .. }
        | Entity::SymlinkToDir { .. }
        | Entity::BrokenSymlink { .. } => delete_file(entity),
        Entity::Failed { .. } => Ok(()),
    }
}
