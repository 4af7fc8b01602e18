//! User-facing configuration, loaded from a TOML file.

pub mod settings;

pub use settings::{Config, ConflictAnswer, GeneralConfig, OperationsConfig};
