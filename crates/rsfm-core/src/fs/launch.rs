//! Handing entities off to external programs.
//!
//! The spawned process is detached: the core reports spawn failures but
//! never waits for or interprets the handler's exit status.

use std::process::{Command, Stdio};

use crate::error::{CoreError, CoreResult};
use crate::fs::entity::Entity;

#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(all(unix, not(target_os = "macos")))]
const OPENER: &str = "xdg-open";
#[cfg(windows)]
const OPENER: &str = "explorer";

/// Opens an entity with the platform's file-open association.
///
/// # Errors
///
/// - [`CoreError::InvalidOperation`] for entities whose classification
///   failed.
/// - [`CoreError::Io`] when the opener cannot be spawned.
pub fn open_externally(entity: &Entity) -> CoreResult<()> {
    if entity.is_failed() {
        return Err(CoreError::InvalidOperation(format!(
            "cannot open {}: classification failed",
            entity.path().display()
        )));
    }
    tracing::debug!(path = %entity.path().display(), opener = OPENER, "opening externally");
    Command::new(OPENER)
        .arg(entity.path())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

/// Spawns a file-like entity as an executable with the given arguments.
///
/// # Errors
///
/// - [`CoreError::InvalidOperation`] for anything that is not a regular
///   file or a symlink resolving to one.
/// - [`CoreError::Io`] when the process cannot be spawned (not executable,
///   missing interpreter, ...).
pub fn execute_externally(entity: &Entity, args: &[String]) -> CoreResult<()> {
    if !entity.is_file_like() {
        return Err(CoreError::InvalidOperation(format!(
            "{} is not an executable file",
            entity.path().display()
        )));
    }
    tracing::debug!(path = %entity.path().display(), ?args, "executing externally");
    Command::new(entity.path()).args(args).spawn()?;
    Ok(())
}
