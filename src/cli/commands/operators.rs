//! lock, unlock, delete, move and key commands - Run add-on operators

use anyhow::{anyhow, Result};

use crate::addon::keymap::{KeyChord, Operator};
use crate::cli::args::UnlockAction;
use crate::cli::Context;
use crate::host::Position;

use super::session::{report, Session};

/// Invoke one operator on the active object and report its outcome.
///
/// The document is saved even when the operator cancels, so corrections made
/// while reconciling are kept.
pub fn invoke(ctx: &Context, operator: Operator) -> Result<()> {
    let mut session = Session::open(ctx)?;
    let outcome = session.run(ctx, |addon, mesh| addon.invoke(operator, mesh))?;
    session.save()?;
    report(outcome, ctx)
}

/// Lock the selection.
pub fn lock(ctx: &Context) -> Result<()> {
    invoke(ctx, Operator::LockSelection)
}

/// Run one step of the unlock workflow.
pub fn unlock(ctx: &Context, action: UnlockAction) -> Result<()> {
    let operator = match action {
        UnlockAction::Begin => Operator::BeginUnlock,
        UnlockAction::Commit => Operator::CommitUnlock,
        UnlockAction::Cancel => Operator::CancelUnlock,
        UnlockAction::All => Operator::UnlockAll,
    };
    invoke(ctx, operator)
}

/// Guarded delete.
pub fn delete(ctx: &Context, dialog: bool) -> Result<()> {
    if dialog {
        invoke(ctx, Operator::GuardDeleteDialog)
    } else {
        invoke(ctx, Operator::GuardDeleteImmediate)
    }
}

/// Guarded move by a fixed offset.
pub fn move_selection(ctx: &Context, offset: Position) -> Result<()> {
    let mut session = Session::open(ctx)?;
    let outcome = session.run(ctx, |addon, mesh| {
        mesh.set_translate_offset(offset);
        addon.invoke(Operator::GuardTranslate, mesh)
    })?;
    session.save()?;
    report(outcome, ctx)
}

/// Press a chord and run whatever operator it is bound to.
pub fn key(ctx: &Context, chord: &str) -> Result<()> {
    let pressed: KeyChord = chord.parse()?;
    let mut session = Session::open(ctx)?;
    let outcome = session.run(ctx, |addon, mesh| {
        addon
            .keymap()
            .resolve(&pressed)
            .map(|operator| addon.invoke(operator, mesh))
    })?;
    let Some(outcome) = outcome else {
        return Err(anyhow!("no binding for '{}'", pressed));
    };
    session.save()?;
    report(outcome, ctx)
}
