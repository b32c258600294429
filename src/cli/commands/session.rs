//! Shared read-modify-write plumbing for command handlers.

use anyhow::{anyhow, Context as _, Result};

use crate::addon::keymap::Keymap;
use crate::addon::Addon;
use crate::cli::Context;
use crate::document::{DocumentLock, DocumentStore, SceneDocument};
use crate::engine::{LockEngine, Outcome};
use crate::host::MemoryMesh;
use crate::ui::output;

/// A locked, loaded scene document.
///
/// The document lock is held until the session is dropped.
#[derive(Debug)]
pub struct Session {
    _lock: DocumentLock,
    store: DocumentStore,
    pub doc: SceneDocument,
}

impl Session {
    /// Lock and load the scene document.
    pub fn open(ctx: &Context) -> Result<Self> {
        let store = DocumentStore::new(&ctx.file);
        if !store.exists() {
            return Err(anyhow!(
                "no scene document at {}; run `mlk init` first",
                store.path().display()
            ));
        }
        let lock = DocumentLock::acquire(store.path()).context("failed to lock scene document")?;
        let doc = store
            .load()
            .with_context(|| format!("failed to load {}", store.path().display()))?;
        Ok(Self {
            _lock: lock,
            store,
            doc,
        })
    }

    /// Name of the active object.
    pub fn active_name(&self) -> Result<String> {
        Ok(self.doc.active()?.name.clone())
    }

    /// Run `op` with an add-on over the active object, then take the editor
    /// state and the workflow state back into the document.
    pub fn run<T>(
        &mut self,
        ctx: &Context,
        op: impl FnOnce(&mut Addon, &mut MemoryMesh) -> T,
    ) -> Result<T> {
        let mut editor = self.doc.active()?.editor(self.doc.select_mode);

        let workflow = std::mem::take(&mut self.doc.workflow);
        let engine = LockEngine::with_workflow(ctx.config.layer(), workflow);
        let mut addon = Addon::from_config(&ctx.config, engine, &Keymap::default_native())?;

        let out = op(&mut addon, &mut editor);

        self.doc.workflow = addon.into_engine().into_workflow();
        self.doc.active_mut()?.absorb(&editor);
        Ok(out)
    }

    /// Write the document back.
    pub fn save(mut self) -> Result<()> {
        self.store
            .save(&mut self.doc)
            .with_context(|| format!("failed to save {}", self.store.path().display()))
    }
}

/// Report an outcome; a cancelled outcome becomes an error.
pub fn report(outcome: Outcome, ctx: &Context) -> Result<()> {
    match outcome {
        Outcome::Finished { message, .. } => {
            output::success(message, ctx.verbosity);
            Ok(())
        }
        Outcome::Cancelled { reason, message } => {
            output::debug(format!("cancelled ({})", reason), ctx.verbosity);
            Err(anyhow!(message))
        }
    }
}
