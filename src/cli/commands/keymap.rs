//! keymap command - List the bindings the add-on registers

use anyhow::Result;

use crate::addon::keymap::Keymap;
use crate::addon::Addon;
use crate::cli::Context;
use crate::engine::LockEngine;
use crate::ui::output;

/// Print every binding, derived overrides first.
pub fn keymap(ctx: &Context) -> Result<()> {
    let engine = LockEngine::new(ctx.config.layer());
    let addon = Addon::from_config(&ctx.config, engine, &Keymap::default_native())?;
    output::print(
        output::format_list(addon.keymap().bindings(), ""),
        ctx.verbosity,
    );
    Ok(())
}
