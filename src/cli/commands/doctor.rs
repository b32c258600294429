//! doctor command - Check and repair lock state consistency

use anyhow::Result;

use crate::cli::Context;
use crate::engine::Fixup;
use crate::host::{HostError, MeshEditor};
use crate::ui::output;

use super::session::Session;

/// Reconcile the active object and list the corrections.
///
/// With `dry_run`, the corrections are computed but neither applied nor
/// saved.
pub fn doctor(ctx: &Context, dry_run: bool) -> Result<()> {
    let mut session = Session::open(ctx)?;
    let name = session.active_name()?;

    let fixups = session.run(ctx, |addon, mesh| -> Result<Option<Vec<Fixup>>, HostError> {
        if !mesh.is_editable() {
            return Ok(None);
        }
        if dry_run {
            Ok(Some(addon.engine().plan_reconcile(mesh)?.fixups))
        } else {
            let report = addon.engine_mut().reconcile(mesh)?;
            Ok(Some(report.fixups().to_vec()))
        }
    })??;

    let Some(fixups) = fixups else {
        output::print(
            format!("'{}' is not an editable mesh; nothing to check", name),
            ctx.verbosity,
        );
        return Ok(());
    };

    if !dry_run {
        session.save()?;
    }

    if fixups.is_empty() {
        output::success(format!("'{}': no issues found", name), ctx.verbosity);
        return Ok(());
    }

    let heading = if dry_run { "would apply" } else { "applied" };
    let lines: Vec<String> = fixups.iter().map(output::format_fixup).collect();
    output::print(format!("'{}': {}:", name, heading), ctx.verbosity);
    output::print(output::format_list(&lines, "  "), ctx.verbosity);
    Ok(())
}
