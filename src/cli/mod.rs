//! cli
//!
//! Command-line interface layer for meshlock.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and install logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI is a host for the lock engine. Each invocation locks the scene
//! document, opens an editor over the active object, runs one engine
//! operation through the [`crate::addon::Addon`] and writes the scene back.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::document::DocumentStore;
use crate::telemetry::{self, LogSettings, LOG_ENV};
use crate::ui::output::Verbosity;

/// Execution context shared by all command handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Scene document path.
    pub file: PathBuf,
    /// Merged configuration.
    pub config: Config,
    /// Output verbosity.
    pub verbosity: Verbosity,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let scene_dir = DocumentStore::new(&cli.file).dir().to_path_buf();
    let config = Config::load(Some(&scene_dir))
        .context("failed to load configuration")?
        .config;

    let settings = LogSettings::resolve(cli.debug, std::env::var(LOG_ENV).ok(), &config);
    telemetry::initialise(&settings)?;

    let ctx = Context {
        file: cli.file,
        config,
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    commands::dispatch(cli.command, &ctx)
}
