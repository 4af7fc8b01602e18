//! rsfm core library — a UI-agnostic file-operation engine.
//!
//! `rsfm-core` provides atomic, symlink-aware filesystem primitives and the
//! staged operation machinery a file manager frontend needs: classify paths
//! into immutable [`Entity`] snapshots, guard every mutation with pure
//! safety predicates, and drive copy/move/delete through a
//! conflict-resolution protocol that can suspend mid-operation to ask the
//! user a question.
//!
//! The crate is intentionally decoupled from any UI framework; the bundled
//! CLI (`rsfm-cli`) is one caller, a graphical frontend would be another.
//!
//! # Modules
//!
//! - [`fs`] — classification ([`Entity`]), safety predicates, atomic
//!   primitives, staged operations and conflict resolution.
//! - [`worker`] — background execution with progress messages and an
//!   explicit conflict suspension point.
//! - [`config`] — TOML-based user configuration.
//! - [`error`] — unified error type ([`CoreError`]) and result alias
//!   ([`CoreResult`]).

pub mod config;
pub mod error;
pub mod fs;
pub mod worker;

pub use config::settings::{default_config_path, Config, ConflictAnswer};
pub use error::{CoreError, CoreResult};
pub use fs::entity::{classify, list_directory, sort_entities, Entity};
pub use fs::launch::{execute_externally, open_externally};
pub use fs::operation::{
    run_file_operation, run_file_operation_with_conflict_handling, CopyOp, DirCopyMode,
    FileOperation, MoveOp,
};
pub use fs::ops::{
    copy_directory, copy_file, create_file, delete_directory, delete_file, easy_copy, easy_delete,
    easy_move, move_directory, move_file, recreate_symlink, rename_entry,
};
pub use worker::{spawn_operation, OperationMessage};
