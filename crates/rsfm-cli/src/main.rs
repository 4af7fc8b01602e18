//! rsfm — command-line frontend for the rsfm-core file-operation engine.
//!
//! Copy and move run through the background worker, so the conflict prompt
//! arrives as a suspended message exactly the way a graphical frontend
//! would receive it; everything else calls the core directly.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use rsfm_core::{
    classify, create_file, execute_externally, list_directory, open_externally, rename_entry,
    run_file_operation, sort_entities, spawn_operation, Config, ConflictAnswer, DirCopyMode,
    Entity, FileOperation, OperationMessage,
};

#[derive(Parser)]
#[command(name = "rsfm", version, about = "Symlink-aware file operations")]
struct Cli {
    /// Path to a TOML config file (defaults to ~/.config/rsfm/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List a directory, one level deep.
    Ls {
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Include dot-prefixed entries.
        #[arg(long)]
        hidden: bool,
    },
    /// Copy files or directories into a destination directory.
    Cp {
        /// Sources followed by the destination directory.
        #[arg(required = true, num_args = 2..)]
        paths: Vec<PathBuf>,
        /// Non-interactive answer to a destination collision.
        #[arg(long, value_enum)]
        on_conflict: Option<ConflictArg>,
    },
    /// Move files or directories into a destination directory.
    Mv {
        /// Sources followed by the destination directory.
        #[arg(required = true, num_args = 2..)]
        paths: Vec<PathBuf>,
        #[arg(long, value_enum)]
        on_conflict: Option<ConflictArg>,
    },
    /// Delete files or directories (directories recursively).
    Rm {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        force: bool,
    },
    /// Create an empty file inside a directory.
    New { dir: PathBuf, name: String },
    /// Rename an entry within its own directory.
    Rename { path: PathBuf, new_name: String },
    /// Open an entry with the platform handler.
    Open { path: PathBuf },
    /// Run an entry as an executable.
    Exec {
        path: PathBuf,
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConflictArg {
    Abort,
    Merge,
    Replace,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::load_or_default(),
    };

    match cli.command {
        Cmd::Ls { path, hidden } => cmd_ls(&path, hidden || config.general.show_hidden),
        Cmd::Cp { paths, on_conflict } => {
            let (sources, dest) = split_dest(paths)?;
            let op = FileOperation::copy_of(sources)
                .with_destination(dest)
                .completed(DirCopyMode::Strict);
            run_through_worker(op, resolve_answer(on_conflict, &config)).await
        }
        Cmd::Mv { paths, on_conflict } => {
            let (sources, dest) = split_dest(paths)?;
            let op = FileOperation::move_of(sources).with_destination(dest);
            run_through_worker(op, resolve_answer(on_conflict, &config)).await
        }
        Cmd::Rm { paths, force } => cmd_rm(paths, force || !config.general.confirm_delete),
        Cmd::New { dir, name } => {
            create_file(&classify(&dir), &name)?;
            Ok(())
        }
        Cmd::Rename { path, new_name } => {
            rename_entry(&classify(&path), &new_name)?;
            Ok(())
        }
        Cmd::Open { path } => {
            open_externally(&classify(&path))?;
            Ok(())
        }
        Cmd::Exec { path, args } => {
            execute_externally(&classify(&path), &args)?;
            Ok(())
        }
    }
}

/// Splits trailing destination off a `sources... dest` argument list and
/// classifies the sources.
fn split_dest(mut paths: Vec<PathBuf>) -> Result<(Vec<Entity>, PathBuf)> {
    let dest = paths.pop().context("missing destination")?;
    let sources: Vec<Entity> = paths.iter().map(|p| classify(p)).collect();
    for src in &sources {
        if let Entity::Failed { path, reason, .. } = src {
            bail!("cannot read {}: {reason}", path.display());
        }
    }
    Ok((sources, dest))
}

fn resolve_answer(arg: Option<ConflictArg>, config: &Config) -> ConflictAnswer {
    match arg {
        Some(ConflictArg::Abort) => ConflictAnswer::Abort,
        Some(ConflictArg::Merge) => ConflictAnswer::Merge,
        Some(ConflictArg::Replace) => ConflictAnswer::Replace,
        None => config.operations.on_conflict,
    }
}

fn cmd_ls(path: &std::path::Path, show_hidden: bool) -> Result<()> {
    let mut entities = list_directory(path)?;
    if !show_hidden {
        entities.retain(|e| !e.is_hidden());
    }
    sort_entities(&mut entities);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for entity in &entities {
        let tag = match entity {
            Entity::File { .. } => ' ',
            Entity::Dir { .. } => '/',
            Entity::SymlinkToFile { .. } | Entity::SymlinkToDir { .. } => '@',
            Entity::BrokenSymlink { .. } => '!',
            Entity::Failed { .. } => '?',
        };
        writeln!(out, "{}{}", entity.name(), tag)?;
    }
    Ok(())
}

fn cmd_rm(paths: Vec<PathBuf>, force: bool) -> Result<()> {
    let entities: Vec<Entity> = paths.iter().map(|p| classify(p)).collect();
    if !force {
        eprint!("delete {} entries? [y/N] ", entities.len());
        io::stderr().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        if !matches!(line.trim(), "y" | "Y" | "yes") {
            eprintln!("aborted");
            return Ok(());
        }
    }
    run_file_operation(FileOperation::Delete(entities))?;
    Ok(())
}

/// Drives an operation through the background worker, answering the
/// conflict suspension from the terminal (or the configured answer).
async fn run_through_worker(op: FileOperation, answer: ConflictAnswer) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_operation(op, tx);

    while let Some(message) = rx.recv().await {
        match message {
            OperationMessage::Started { description } => {
                tracing::debug!(%description, "operation started");
            }
            OperationMessage::ConflictPending { detail, reply } => {
                let mode = match answer {
                    ConflictAnswer::Ask => prompt_for_mode(&detail)?,
                    ConflictAnswer::Abort => None,
                    ConflictAnswer::Merge => Some(DirCopyMode::Merge),
                    ConflictAnswer::Replace => Some(DirCopyMode::Replace),
                };
                // Worker treats a dropped reply as abort.
                let _ = reply.send(mode);
            }
            OperationMessage::Complete { description } => {
                eprintln!("{description}: done");
            }
            OperationMessage::Cancelled { description } => {
                eprintln!("{description}: aborted");
            }
            OperationMessage::NotReady { description } => {
                bail!("{description}: operation is missing inputs");
            }
            OperationMessage::Failed { description, error } => {
                bail!("{description}: {error}");
            }
        }
    }
    Ok(())
}

/// Interactive conflict prompt: abort, merge, replace, or a new name.
fn prompt_for_mode(detail: &str) -> Result<Option<DirCopyMode>> {
    eprintln!("{detail}");
    eprint!("[a]bort / [m]erge / [r]eplace / new [n]ame? ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    match line.trim() {
        "m" | "merge" => Ok(Some(DirCopyMode::Merge)),
        "r" | "replace" => Ok(Some(DirCopyMode::Replace)),
        "n" | "name" => {
            eprint!("new name: ");
            io::stderr().flush()?;
            let mut name = String::new();
            io::stdin().lock().read_line(&mut name)?;
            let name = name.trim();
            if name.is_empty() {
                Ok(None)
            } else {
                Ok(Some(DirCopyMode::Rename(name.to_string())))
            }
        }
        _ => Ok(None),
    }
}
