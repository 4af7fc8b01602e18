//! Staged file operations and the conflict-resolution protocol.
//!
//! A [`FileOperation`] is a value collecting its inputs over several caller
//! interactions: a copy starts as sources only, gains a destination, and is
//! finally completed with a [`DirCopyMode`]. The caller (a UI clipboard, a
//! CLI) holds the staged value; the core never advances a stage itself.
//!
//! [`run_file_operation`] is the sole execution entry point. It consumes a
//! complete operation, and hands any earlier stage straight back so the
//! caller can detect "nothing happened, still waiting for more input".

use std::path::PathBuf;

use crate::error::{CoreError, CoreResult};
use crate::fs::entity::Entity;
use crate::fs::launch;
use crate::fs::ops;

/// Strategy applied when a destination collision occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirCopyMode {
    /// Fail if the destination already exists.
    Strict,
    /// Overwrite files, keep existing structure and unrelated children.
    Merge,
    /// Delete the existing destination tree first.
    Replace,
    /// Retarget the destination to a new name.
    Rename(String),
}

impl DirCopyMode {
    /// The mode children recurse with. A renamed root is a fresh tree, so
    /// everything beneath it proceeds `Strict`; other modes carry through.
    pub(crate) fn for_children(&self) -> DirCopyMode {
        match self {
            DirCopyMode::Rename(_) => DirCopyMode::Strict,
            other => other.clone(),
        }
    }
}

/// Stages of a copy operation.
#[derive(Debug, Clone, PartialEq)]
pub enum CopyOp {
    /// Sources selected, no destination yet.
    SourceOnly(Vec<Entity>),
    /// Sources and destination known, conflict mode still open.
    SourceAndDestination(Vec<Entity>, PathBuf),
    /// Ready to execute.
    Complete(Vec<Entity>, PathBuf, DirCopyMode),
}

/// Stages of a move operation.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOp {
    /// Sources selected, no destination yet.
    SourceOnly(Vec<Entity>),
    /// Ready to execute.
    Complete(Vec<Entity>, PathBuf),
}

/// A unit of work over classified entities.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOperation {
    Copy(CopyOp),
    Move(MoveOp),
    Delete(Vec<Entity>),
    Open(Entity),
    Execute(Entity, Vec<String>),
    NoOp,
}

impl FileOperation {
    /// Begins a staged copy of `sources`.
    pub fn copy_of(sources: Vec<Entity>) -> Self {
        FileOperation::Copy(CopyOp::SourceOnly(sources))
    }

    /// Begins a staged move of `sources`.
    pub fn move_of(sources: Vec<Entity>) -> Self {
        FileOperation::Move(MoveOp::SourceOnly(sources))
    }

    /// Supplies the destination directory for a staged copy or move.
    ///
    /// Copies advance to `SourceAndDestination` and still need
    /// [`completed`](Self::completed); moves advance straight to `Complete`.
    /// Any other value passes through unchanged.
    pub fn with_destination(self, dest: PathBuf) -> Self {
        match self {
            FileOperation::Copy(CopyOp::SourceOnly(sources)) => {
                FileOperation::Copy(CopyOp::SourceAndDestination(sources, dest))
            }
            FileOperation::Move(MoveOp::SourceOnly(sources)) => {
                FileOperation::Move(MoveOp::Complete(sources, dest))
            }
            other => other,
        }
    }

    /// Fixes the conflict-resolution mode, completing a staged copy.
    /// Re-completing an already complete copy substitutes the mode.
    pub fn completed(self, mode: DirCopyMode) -> Self {
        match self {
            FileOperation::Copy(CopyOp::SourceAndDestination(sources, dest))
            | FileOperation::Copy(CopyOp::Complete(sources, dest, _)) => {
                FileOperation::Copy(CopyOp::Complete(sources, dest, mode))
            }
            other => other,
        }
    }

    /// Returns `true` when [`run_file_operation`] would execute this value
    /// rather than hand it back.
    pub fn is_ready(&self) -> bool {
        !matches!(
            self,
            FileOperation::Copy(CopyOp::SourceOnly(_))
                | FileOperation::Copy(CopyOp::SourceAndDestination(..))
                | FileOperation::Move(MoveOp::SourceOnly(_))
        )
    }
}

/// Executes a complete operation, or returns a staged one unchanged.
///
/// `Ok(None)` means the operation ran and is consumed. `Ok(Some(op))` means
/// the value was not ready; nothing was touched and the identical staged
/// value comes back.
///
/// # Errors
///
/// - [`CoreError::InvalidOperation`] when a `Rename` mode is applied to more
///   than one source (unsupported arity).
/// - Whatever the dispatched primitive raises; the first failing entity
///   aborts the rest.
pub fn run_file_operation(op: FileOperation) -> CoreResult<Option<FileOperation>> {
    match op {
        FileOperation::Copy(CopyOp::Complete(sources, dest, mode)) => {
            ensure_rename_arity(&sources, &mode)?;
            for src in &sources {
                ops::easy_copy(src, &dest, &mode)?;
            }
            Ok(None)
        }
        FileOperation::Move(MoveOp::Complete(sources, dest)) => {
            for src in &sources {
                ops::easy_move(src, &dest, &DirCopyMode::Strict)?;
            }
            Ok(None)
        }
        FileOperation::Delete(entities) => {
            for entity in &entities {
                ops::easy_delete(entity)?;
            }
            Ok(None)
        }
        FileOperation::Open(entity) => {
            launch::open_externally(&entity)?;
            Ok(None)
        }
        FileOperation::Execute(entity, args) => {
            launch::execute_externally(&entity, &args)?;
            Ok(None)
        }
        FileOperation::NoOp => Ok(None),
        staged => Ok(Some(staged)),
    }
}

fn ensure_rename_arity(sources: &[Entity], mode: &DirCopyMode) -> CoreResult<()> {
    if sources.len() > 1 && matches!(mode, DirCopyMode::Rename(_)) {
        return Err(CoreError::InvalidOperation(
            "rename applies to a single source only".to_string(),
        ));
    }
    Ok(())
}

/// Runs an operation with one-shot conflict resolution.
///
/// The first attempt is forced to `Strict`. On `FileDoesExist` or
/// `DirDoesExist` the prompt may answer `Merge`, `Replace` or `Rename`; on
/// `SameFile` only `Rename` makes sense and anything else aborts. The chosen
/// mode is substituted and the operation retried exactly once — a second
/// conflict on the retry propagates as an error rather than re-prompting, so
/// the protocol always terminates. Answering `Strict` (or `None`) aborts
/// with [`CoreError::Cancelled`] before any mutation.
///
/// # Errors
///
/// - [`CoreError::Cancelled`] when the prompt aborts.
/// - [`CoreError::InvalidOperation`] when handed a staged operation that is
///   not ready to execute.
/// - Any unrecovered primitive error, including one from the single retry.
pub fn run_file_operation_with_conflict_handling<F>(
    op: FileOperation,
    mut prompt: F,
) -> CoreResult<()>
where
    F: FnMut(&CoreError) -> Option<DirCopyMode>,
{
    let first = match op {
        FileOperation::Copy(CopyOp::SourceAndDestination(sources, dest))
        | FileOperation::Copy(CopyOp::Complete(sources, dest, _)) => {
            FileOperation::Copy(CopyOp::Complete(sources, dest, DirCopyMode::Strict))
        }
        other => other,
    };

    match run_file_operation(first.clone()) {
        Ok(None) => Ok(()),
        Ok(Some(_)) => Err(CoreError::InvalidOperation(
            "operation is still waiting for input".to_string(),
        )),
        Err(err) if err.is_collision() || matches!(err, CoreError::SameFile { .. }) => {
            let same_file = matches!(err, CoreError::SameFile { .. });
            tracing::debug!(conflict = %err, "operation hit a resolvable conflict");
            let mode = match prompt(&err) {
                None | Some(DirCopyMode::Strict) => return Err(CoreError::Cancelled),
                Some(mode @ DirCopyMode::Rename(_)) => mode,
                // Merge/replace make no sense when source and destination
                // are the same path.
                Some(_) if same_file => return Err(CoreError::Cancelled),
                Some(mode) => mode,
            };
            retry_with_mode(first, mode)
        }
        Err(err) => Err(err),
    }
}

/// The single retry: the chosen mode replaces `Strict` in the attempted
/// operation. Moves carry no mode in their staged form, so the retry drives
/// the move primitives with the substituted mode directly.
fn retry_with_mode(op: FileOperation, mode: DirCopyMode) -> CoreResult<()> {
    match op {
        FileOperation::Copy(CopyOp::Complete(sources, dest, _)) => {
            consume(run_file_operation(FileOperation::Copy(CopyOp::Complete(
                sources, dest, mode,
            ))))
        }
        FileOperation::Move(MoveOp::Complete(sources, dest)) => {
            ensure_rename_arity(&sources, &mode)?;
            for src in &sources {
                ops::easy_move(src, &dest, &mode)?;
            }
            Ok(())
        }
        other => consume(run_file_operation(other)),
    }
}

fn consume(result: CoreResult<Option<FileOperation>>) -> CoreResult<()> {
    match result? {
        None => Ok(()),
        Some(_) => Err(CoreError::InvalidOperation(
            "operation is still waiting for input".to_string(),
        )),
    }
}
