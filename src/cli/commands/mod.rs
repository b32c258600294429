//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Locks and loads the scene document
//! 2. Runs one add-on operation against the active object
//! 3. Writes the document back and reports the outcome
//!
//! Handlers never edit mesh data directly; every lock-relevant change goes
//! through the engine.

mod completion;
mod doctor;
mod edit;
mod init;
mod keymap;
mod operators;
mod select;
mod session;
mod status;

pub use completion::completion;
pub use doctor::doctor;
pub use edit::{edit, mode};
pub use init::{init, InitOptions};
pub use keymap::keymap;
pub use operators::{delete, invoke, key, lock, move_selection, unlock};
pub use select::{select, SelectOptions};
pub use session::{report, Session};
pub use status::{overlay, status};

use crate::cli::args::Command;
use crate::cli::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init {
            grid,
            name,
            layer,
            empty,
            force,
        } => init(
            ctx,
            InitOptions {
                grid,
                name,
                layer,
                empty,
                force,
            },
        ),
        Command::Edit { action } => edit(ctx, action),
        Command::Mode { mode: m } => mode(ctx, m),
        Command::Select {
            vert,
            edge,
            face,
            all,
            none,
            extend,
        } => select(
            ctx,
            SelectOptions {
                vert,
                edge,
                face,
                all,
                none,
                extend,
            },
        ),
        Command::Lock => lock(ctx),
        Command::Unlock { action } => unlock(ctx, action),
        Command::Delete { dialog } => delete(ctx, dialog),
        Command::Move { offset } => move_selection(ctx, offset),
        Command::Key { chord } => key(ctx, &chord),
        Command::Status => status(ctx),
        Command::Doctor { dry_run } => doctor(ctx, dry_run),
        Command::Keymap => keymap(ctx),
        Command::Overlay => overlay(ctx),
        Command::Completion { shell } => completion(shell),
    }
}
