//! The filesystem engine.
//!
//! Leaves first: [`entity`] classifies paths into immutable snapshots,
//! [`checks`] holds the pure safety predicates, [`ops`] the atomic
//! primitives, [`operation`] the staged operation values and the
//! conflict-resolution protocol, and [`launch`] hands entities to external
//! handler processes.

pub mod checks;
pub mod entity;
pub mod launch;
pub mod operation;
pub mod ops;

pub use entity::{classify, list_directory, sort_entities, Entity};
pub use operation::{CopyOp, DirCopyMode, FileOperation, MoveOp};
