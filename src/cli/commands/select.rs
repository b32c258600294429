//! select command - Change the selection on the active object

use anyhow::{bail, Result};

use crate::cli::Context;
use crate::core::types::ElemKind;
use crate::host::HostError;
use crate::ui::output;

use super::session::Session;

/// What to select.
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    pub vert: Vec<usize>,
    pub edge: Vec<usize>,
    pub face: Vec<usize>,
    pub all: bool,
    pub none: bool,
    pub extend: bool,
}

/// Select elements by index, as a user would click them.
///
/// Hidden elements cannot be picked and are skipped.
pub fn select(ctx: &Context, opts: SelectOptions) -> Result<()> {
    let mut session = Session::open(ctx)?;
    let name = session.active_name()?;
    if !session.doc.active()?.is_editing() {
        bail!("'{}' is not in edit mode; run `mlk edit enter`", name);
    }

    let selected = session.run(ctx, |_, mesh| -> Result<usize, HostError> {
        if opts.none {
            mesh.deselect_all();
        } else if opts.all {
            mesh.select_all();
        } else {
            let mut extend = opts.extend;
            for (kind, indices) in [
                (ElemKind::Vert, &opts.vert),
                (ElemKind::Edge, &opts.edge),
                (ElemKind::Face, &opts.face),
            ] {
                if indices.is_empty() {
                    continue;
                }
                mesh.select(kind, indices, extend)?;
                extend = true;
            }
        }
        Ok(mesh.selected(ElemKind::Vert).len())
    })??;

    session.save()?;
    output::success(format!("{} vertices selected", selected), ctx.verbosity);
    Ok(())
}
