//! edit and mode commands - Open or close an edit session, set selection mode

use anyhow::{bail, Result};

use crate::addon::keymap::Operator;
use crate::cli::args::EditAction;
use crate::cli::Context;
use crate::core::types::SelectMode;
use crate::document::{ObjectKind, ObjectMode};
use crate::host::MeshEditor;
use crate::ui::output;

use super::session::Session;

/// Enter or leave edit mode on the active object.
///
/// Entering reconciles right away, so the working layer is loaded from the
/// persisted attribute and locked vertices are sealed. Leaving while
/// revealed for unlock cancels the unlock first.
pub fn edit(ctx: &Context, action: EditAction) -> Result<()> {
    let mut session = Session::open(ctx)?;
    let name = session.active_name()?;

    match action {
        EditAction::Enter => {
            let object = session.doc.active_mut()?;
            if object.kind != ObjectKind::Mesh {
                bail!("'{}' is not a mesh", name);
            }
            if object.is_editing() {
                output::print(format!("'{}' is already in edit mode", name), ctx.verbosity);
                return Ok(());
            }
            object.mode = ObjectMode::Edit;
            object.working.clear();

            let report = session.run(ctx, |addon, mesh| addon.engine_mut().reconcile(mesh))??;
            for fixup in report.fixups() {
                output::debug(output::format_fixup(fixup), ctx.verbosity);
            }
            session.save()?;
            output::success(format!("editing '{}'", name), ctx.verbosity);
        }
        EditAction::Exit => {
            if !session.doc.active()?.is_editing() {
                output::print(format!("'{}' is not in edit mode", name), ctx.verbosity);
                return Ok(());
            }
            let cancelled = session.run(ctx, |addon, mesh| {
                if addon.engine().is_unlock_mode(&mesh.object_id()) {
                    Some(addon.invoke(Operator::CancelUnlock, mesh))
                } else {
                    None
                }
            })?;
            if let Some(outcome) = cancelled {
                output::debug(outcome, ctx.verbosity);
            }

            let object = session.doc.active_mut()?;
            object.mode = ObjectMode::Object;
            object.working.clear();
            session.save()?;
            output::success(format!("left edit mode on '{}'", name), ctx.verbosity);
        }
    }
    Ok(())
}

/// Set the element selection mode.
pub fn mode(ctx: &Context, mode: SelectMode) -> Result<()> {
    let mut session = Session::open(ctx)?;
    session.doc.select_mode = mode;
    session.save()?;
    output::success(format!("{} select mode", mode), ctx.verbosity);
    Ok(())
}
