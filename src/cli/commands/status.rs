//! status and overlay commands - Read-only views of the active object

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::ui::output;

use super::session::Session;

/// Show the lock panel for the active object.
///
/// Nothing is written back.
pub fn status(ctx: &Context) -> Result<()> {
    let mut session = Session::open(ctx)?;
    let name = session.active_name()?;
    let panel = session.run(ctx, |addon, mesh| addon.panel(mesh))?;

    output::print(format!("object:         {}", name), ctx.verbosity);
    output::print(output::format_panel(&panel), ctx.verbosity);
    Ok(())
}

/// Print the overlay batch as JSON.
///
/// Runs the draw-time reconcile, so corrections are saved.
pub fn overlay(ctx: &Context) -> Result<()> {
    let mut session = Session::open(ctx)?;
    let batch = session.run(ctx, |addon, mesh| addon.on_redraw(mesh))?;
    session.save()?;

    match batch {
        Some(batch) => {
            let json = serde_json::to_string_pretty(&batch).context("failed to encode overlay")?;
            output::print(json, ctx.verbosity);
        }
        None => output::print("nothing to draw", ctx.verbosity),
    }
    Ok(())
}
