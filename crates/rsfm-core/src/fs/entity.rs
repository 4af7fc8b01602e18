//! Classified filesystem entities.
//!
//! [`classify`] reads one path into an [`Entity`] snapshot. The snapshot is
//! immutable: re-reading the same path later may produce a structurally
//! different value, and no entity is ever mutated in place.
//!
//! Symlinks are resolved exactly one level to decide file-vs-directory
//! target classification, but the entity keeps "this is a symlink" as a
//! distinct variant. Every primitive in [`crate::fs::ops`] dispatches on
//! that distinction; a symlink is never transparently followed.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use unicode_normalization::UnicodeNormalization;

use crate::error::{CoreError, CoreResult};

/// An immutable classified snapshot of one filesystem path.
///
/// The `name` is the final path component, NFC-normalised (macOS stores
/// names in NFD, which splits Hangul into individual Jamo). The absolute
/// parent the entity was read from is available via [`Entity::anchor`].
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// A regular file.
    File {
        name: String,
        path: PathBuf,
        size: u64,
        modified: Option<SystemTime>,
        /// Unix permission bits; `0` on platforms without a mode.
        mode: u32,
    },
    /// A directory.
    Dir {
        name: String,
        path: PathBuf,
        modified: Option<SystemTime>,
        mode: u32,
    },
    /// A symlink whose one-level resolution is a regular file.
    SymlinkToFile {
        name: String,
        path: PathBuf,
        /// Size of the pointee.
        target_size: u64,
        /// Modification time of the pointee.
        target_modified: Option<SystemTime>,
    },
    /// A symlink whose one-level resolution is a directory.
    SymlinkToDir { name: String, path: PathBuf },
    /// A symlink whose target cannot be resolved.
    BrokenSymlink { name: String, path: PathBuf },
    /// Classification itself failed (permission denied, vanished mid-listing).
    ///
    /// Listings routinely contain stale or unreadable entries; carrying the
    /// failure as a variant lets a caller render partial results instead of
    /// aborting the whole listing.
    Failed {
        name: String,
        path: PathBuf,
        reason: String,
    },
}

impl Entity {
    /// Returns the entity's name (final path component, NFC-normalised).
    pub fn name(&self) -> &str {
        match self {
            Entity::File { name, .. }
            | Entity::Dir { name, .. }
            | Entity::SymlinkToFile { name, .. }
            | Entity::SymlinkToDir { name, .. }
            | Entity::BrokenSymlink { name, .. }
            | Entity::Failed { name, .. } => name,
        }
    }

    /// Returns the full path this entity was classified from.
    pub fn path(&self) -> &Path {
        match self {
            Entity::File { path, .. }
            | Entity::Dir { path, .. }
            | Entity::SymlinkToFile { path, .. }
            | Entity::SymlinkToDir { path, .. }
            | Entity::BrokenSymlink { path, .. }
            | Entity::Failed { path, .. } => path,
        }
    }

    /// Returns the anchor: the parent directory the entity was read from.
    pub fn anchor(&self) -> Option<&Path> {
        self.path().parent()
    }

    /// Returns `true` if the name starts with `.`.
    pub fn is_hidden(&self) -> bool {
        self.name().starts_with('.')
    }

    /// Returns `true` for directories and symlinks resolving to directories.
    pub fn is_dir_like(&self) -> bool {
        matches!(self, Entity::Dir { .. } | Entity::SymlinkToDir { .. })
    }

    /// Returns `true` for regular files and symlinks resolving to files.
    pub fn is_file_like(&self) -> bool {
        matches!(self, Entity::File { .. } | Entity::SymlinkToFile { .. })
    }

    /// Returns `true` for any symlink variant, broken ones included.
    pub fn is_symlink(&self) -> bool {
        matches!(
            self,
            Entity::SymlinkToFile { .. }
                | Entity::SymlinkToDir { .. }
                | Entity::BrokenSymlink { .. }
        )
    }

    /// Returns `true` if classification failed for this path.
    pub fn is_failed(&self) -> bool {
        matches!(self, Entity::Failed { .. })
    }
}

/// Normalises the final path component to NFC.
fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().nfc().collect::<String>())
        .unwrap_or_default()
}

#[cfg(unix)]
fn unix_mode(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
fn unix_mode(_meta: &std::fs::Metadata) -> u32 {
    0
}

/// Classifies a path into exactly one [`Entity`] variant.
///
/// Never returns an error: a missing or inaccessible path becomes
/// [`Entity::Failed`] carrying the failure reason, so a directory listing
/// can keep going past stale or permission-denied entries.
pub fn classify(path: &Path) -> Entity {
    let name = entry_name(path);
    let path = path.to_path_buf();

    let meta = match std::fs::symlink_metadata(&path) {
        Ok(m) => m,
        Err(e) => {
            return Entity::Failed {
                name,
                path,
                reason: e.to_string(),
            }
        }
    };

    if meta.file_type().is_symlink() {
        // One level of resolution for target classification only.
        return match std::fs::metadata(&path) {
            Ok(target) if target.is_dir() => Entity::SymlinkToDir { name, path },
            Ok(target) => Entity::SymlinkToFile {
                name,
                path,
                target_size: target.len(),
                target_modified: target.modified().ok(),
            },
            Err(_) => Entity::BrokenSymlink { name, path },
        };
    }

    if meta.is_dir() {
        Entity::Dir {
            name,
            path,
            modified: meta.modified().ok(),
            mode: unix_mode(&meta),
        }
    } else {
        Entity::File {
            name,
            path,
            size: meta.len(),
            modified: meta.modified().ok(),
            mode: unix_mode(&meta),
        }
    }
}

/// Reads the immediate contents of a directory as [`Entity`] snapshots.
///
/// One level, finite, unsorted; use [`sort_entities`] afterwards. Children
/// that cannot be classified appear as [`Entity::Failed`] instead of being
/// dropped.
///
/// # Errors
///
/// - [`CoreError::NotFound`] — the path does not exist.
/// - [`CoreError::NotADirectory`] — the path is not a directory.
/// - [`CoreError::PermissionDenied`] — read access is denied.
/// - [`CoreError::Io`] — any other I/O error.
pub fn list_directory(path: &Path) -> CoreResult<Vec<Entity>> {
    let meta = std::fs::symlink_metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CoreError::NotFound(path.to_path_buf())
        } else {
            CoreError::Io(e)
        }
    })?;
    if !meta.is_dir() {
        return Err(CoreError::NotADirectory(path.to_path_buf()));
    }

    let read_dir = std::fs::read_dir(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            CoreError::PermissionDenied(path.to_path_buf())
        } else {
            CoreError::Io(e)
        }
    })?;

    let mut entities = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = match dir_entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        entities.push(classify(&dir_entry.path()));
    }

    Ok(entities)
}

/// Sorts entities directories-first, then by name (case-insensitive).
pub fn sort_entities(entities: &mut [Entity]) {
    entities.sort_by(|a, b| {
        b.is_dir_like()
            .cmp(&a.is_dir_like())
            .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn classify_regular_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("test.txt");
        fs::write(&file, "hello").unwrap();

        let entity = classify(&file);

        match entity {
            Entity::File { name, size, .. } => {
                assert_eq!(name, "test.txt");
                assert_eq!(size, 5);
            }
            other => panic!("expected File, got {other:?}"),
        }
    }

    #[test]
    fn classify_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("subdir");
        fs::create_dir(&dir).unwrap();

        let entity = classify(&dir);

        assert!(matches!(entity, Entity::Dir { .. }));
        assert!(entity.is_dir_like());
        assert!(!entity.is_symlink());
    }

    #[test]
    fn classify_missing_path_is_failed() {
        let tmp = TempDir::new().unwrap();
        let entity = classify(&tmp.path().join("nope"));

        assert!(entity.is_failed());
        match entity {
            Entity::Failed { reason, .. } => assert!(!reason.is_empty()),
            _ => unreachable!(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn classify_symlink_to_file() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("real.txt");
        fs::write(&target, "data").unwrap();
        let link = tmp.path().join("link.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let entity = classify(&link);

        match entity {
            Entity::SymlinkToFile { target_size, .. } => assert_eq!(target_size, 4),
            other => panic!("expected SymlinkToFile, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn classify_symlink_to_directory() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("realdir");
        fs::create_dir(&target).unwrap();
        let link = tmp.path().join("dirlink");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let entity = classify(&link);

        assert!(matches!(entity, Entity::SymlinkToDir { .. }));
        assert!(entity.is_dir_like());
        assert!(entity.is_symlink());
    }

    #[cfg(unix)]
    #[test]
    fn classify_broken_symlink() {
        let tmp = TempDir::new().unwrap();
        let link = tmp.path().join("dangling");
        std::os::unix::fs::symlink(tmp.path().join("gone"), &link).unwrap();

        let entity = classify(&link);

        assert!(matches!(entity, Entity::BrokenSymlink { .. }));
        assert!(entity.is_symlink());
        assert!(!entity.is_file_like());
    }

    #[test]
    fn anchor_is_parent_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "").unwrap();

        let entity = classify(&file);

        assert_eq!(entity.anchor().unwrap(), tmp.path());
        assert_eq!(entity.anchor().unwrap().join(entity.name()), file);
    }

    #[test]
    fn hidden_detection() {
        let tmp = TempDir::new().unwrap();
        let hidden = tmp.path().join(".env");
        fs::write(&hidden, "").unwrap();

        assert!(classify(&hidden).is_hidden());
    }

    #[test]
    fn list_directory_returns_all_entries() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("file1.txt"), "hello").unwrap();
        fs::write(tmp.path().join("file2.txt"), "world").unwrap();
        fs::create_dir(tmp.path().join("subdir")).unwrap();

        let entities = list_directory(tmp.path()).unwrap();

        assert_eq!(entities.len(), 3);
        let names: Vec<&str> = entities.iter().map(|e| e.name()).collect();
        assert!(names.contains(&"file1.txt"));
        assert!(names.contains(&"file2.txt"));
        assert!(names.contains(&"subdir"));
    }

    #[test]
    fn list_directory_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(list_directory(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn list_directory_nonexistent_returns_not_found() {
        let result = list_directory(Path::new("/nonexistent/path/that/does/not/exist"));
        assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
    }

    #[test]
    fn list_directory_on_file_returns_not_a_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("not_a_dir.txt");
        fs::write(&file, "content").unwrap();

        let result = list_directory(&file);
        assert!(matches!(result.unwrap_err(), CoreError::NotADirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn list_directory_keeps_broken_symlinks() {
        let tmp = TempDir::new().unwrap();
        std::os::unix::fs::symlink("/nowhere/at/all", tmp.path().join("dangling")).unwrap();
        fs::write(tmp.path().join("ok.txt"), "").unwrap();

        let entities = list_directory(tmp.path()).unwrap();

        assert_eq!(entities.len(), 2);
        assert!(entities
            .iter()
            .any(|e| matches!(e, Entity::BrokenSymlink { .. })));
    }

    #[test]
    fn list_directory_unicode_names() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("한글.txt"), "").unwrap();
        fs::create_dir(tmp.path().join("émojis_🎉")).unwrap();

        let entities = list_directory(tmp.path()).unwrap();

        let names: Vec<&str> = entities.iter().map(|e| e.name()).collect();
        assert!(names.contains(&"한글.txt"));
        assert!(names.contains(&"émojis_🎉"));
    }

    #[test]
    fn sort_entities_dirs_first_then_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.txt"), "").unwrap();
        fs::write(tmp.path().join("a.txt"), "").unwrap();
        fs::create_dir(tmp.path().join("zdir")).unwrap();

        let mut entities = list_directory(tmp.path()).unwrap();
        sort_entities(&mut entities);

        let names: Vec<&str> = entities.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["zdir", "a.txt", "b.txt"]);
    }

    #[test]
    fn snapshots_are_independent() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("grow.txt");
        fs::write(&file, "ab").unwrap();

        let before = classify(&file);
        fs::write(&file, "abcd").unwrap();
        let after = classify(&file);

        // A snapshot never changes; a fresh read sees the new state.
        assert!(matches!(before, Entity::File { size: 2, .. }));
        assert!(matches!(after, Entity::File { size: 4, .. }));
    }
}
