//! Background execution of file operations.
//!
//! Recursive copies and deletes can run long, so they are pushed onto a
//! blocking task instead of the caller's thread. Progress flows back over an
//! unbounded mpsc channel; the conflict-resolution prompt becomes an
//! explicit suspension point — the worker parks on a [`oneshot`] reply
//! channel until the frontend answers.

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

use crate::error::CoreError;
use crate::fs::operation::{
    run_file_operation_with_conflict_handling, DirCopyMode, FileOperation,
};

/// Messages sent from a running operation to the frontend's event loop.
#[derive(Debug)]
pub enum OperationMessage {
    /// Execution has begun.
    Started {
        description: String,
    },
    /// The operation hit a resolvable conflict and is suspended.
    ///
    /// Send the chosen mode (or `None` to abort) through `reply`; dropping
    /// the sender counts as abort.
    ConflictPending {
        detail: String,
        reply: oneshot::Sender<Option<DirCopyMode>>,
    },
    /// The operation finished successfully.
    Complete {
        description: String,
    },
    /// The user aborted at the conflict prompt.
    Cancelled {
        description: String,
    },
    /// The operation was still missing inputs; nothing was touched.
    NotReady {
        description: String,
    },
    /// The operation failed.
    Failed {
        description: String,
        error: String,
    },
}

/// One-line summary of an operation for progress messages.
fn describe(op: &FileOperation) -> String {
    use crate::fs::operation::{CopyOp, MoveOp};
    match op {
        FileOperation::Copy(CopyOp::SourceOnly(s))
        | FileOperation::Copy(CopyOp::SourceAndDestination(s, _))
        | FileOperation::Copy(CopyOp::Complete(s, _, _)) => format!("copy {} entries", s.len()),
        FileOperation::Move(MoveOp::SourceOnly(s))
        | FileOperation::Move(MoveOp::Complete(s, _)) => format!("move {} entries", s.len()),
        FileOperation::Delete(s) => format!("delete {} entries", s.len()),
        FileOperation::Open(e) => format!("open {}", e.path().display()),
        FileOperation::Execute(e, _) => format!("execute {}", e.path().display()),
        FileOperation::NoOp => "no-op".to_string(),
    }
}

/// Runs `op` on a blocking task, reporting through `tx`.
///
/// Staged operations are reported as [`OperationMessage::NotReady`] without
/// touching the filesystem. Cancellation is only possible at the conflict
/// prompt; a running primitive is never interrupted.
pub fn spawn_operation(op: FileOperation, tx: UnboundedSender<OperationMessage>) {
    let description = describe(&op);

    if !op.is_ready() {
        let _ = tx.send(OperationMessage::NotReady { description });
        return;
    }

    tokio::task::spawn_blocking(move || {
        let _ = tx.send(OperationMessage::Started {
            description: description.clone(),
        });

        let prompt_tx = tx.clone();
        let result = run_file_operation_with_conflict_handling(op, |err| {
            let (reply, answer) = oneshot::channel();
            if prompt_tx
                .send(OperationMessage::ConflictPending {
                    detail: err.to_string(),
                    reply,
                })
                .is_err()
            {
                // Frontend is gone; abort.
                return None;
            }
            answer.blocking_recv().unwrap_or(None)
        });

        let message = match result {
            Ok(()) => OperationMessage::Complete { description },
            Err(CoreError::Cancelled) => OperationMessage::Cancelled { description },
            Err(e) => {
                tracing::warn!(error = %e, "background operation failed");
                OperationMessage::Failed {
                    description,
                    error: e.to_string(),
                }
            }
        };
        let _ = tx.send(message);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::entity::classify;
    use std::fs;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn operation_completes_in_background() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("x.txt");
        fs::write(&src, "data").unwrap();
        let dest = tmp.path().join("out");
        fs::create_dir(&dest).unwrap();

        let op = FileOperation::copy_of(vec![classify(&src)])
            .with_destination(dest.clone())
            .completed(DirCopyMode::Strict);

        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_operation(op, tx);

        assert!(matches!(
            rx.recv().await.unwrap(),
            OperationMessage::Started { .. }
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            OperationMessage::Complete { .. }
        ));
        assert_eq!(fs::read_to_string(dest.join("x.txt")).unwrap(), "data");
    }

    #[tokio::test]
    async fn conflict_suspends_until_reply() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("x.txt");
        fs::write(&src, "new").unwrap();
        let dest = tmp.path().join("out");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("x.txt"), "old").unwrap();

        let op = FileOperation::copy_of(vec![classify(&src)])
            .with_destination(dest.clone())
            .completed(DirCopyMode::Strict);

        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_operation(op, tx);

        assert!(matches!(
            rx.recv().await.unwrap(),
            OperationMessage::Started { .. }
        ));
        match rx.recv().await.unwrap() {
            OperationMessage::ConflictPending { detail, reply } => {
                assert!(detail.contains("exists"));
                reply
                    .send(Some(DirCopyMode::Rename("other.txt".to_string())))
                    .unwrap();
            }
            other => panic!("expected ConflictPending, got {other:?}"),
        }
        assert!(matches!(
            rx.recv().await.unwrap(),
            OperationMessage::Complete { .. }
        ));
        assert_eq!(fs::read_to_string(dest.join("other.txt")).unwrap(), "new");
    }

    #[tokio::test]
    async fn dropped_reply_counts_as_abort() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("x.txt");
        fs::write(&src, "new").unwrap();
        let dest = tmp.path().join("out");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("x.txt"), "old").unwrap();

        let op = FileOperation::copy_of(vec![classify(&src)])
            .with_destination(dest.clone())
            .completed(DirCopyMode::Strict);

        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_operation(op, tx);

        assert!(matches!(
            rx.recv().await.unwrap(),
            OperationMessage::Started { .. }
        ));
        match rx.recv().await.unwrap() {
            OperationMessage::ConflictPending { reply, .. } => drop(reply),
            other => panic!("expected ConflictPending, got {other:?}"),
        }
        assert!(matches!(
            rx.recv().await.unwrap(),
            OperationMessage::Cancelled { .. }
        ));
        assert_eq!(fs::read_to_string(dest.join("x.txt")).unwrap(), "old");
    }

    #[tokio::test]
    async fn staged_operation_reports_not_ready() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("x.txt");
        fs::write(&src, "").unwrap();

        let op = FileOperation::copy_of(vec![classify(&src)]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_operation(op, tx);

        assert!(matches!(
            rx.recv().await.unwrap(),
            OperationMessage::NotReady { .. }
        ));
    }
}
