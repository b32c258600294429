//! addon
//!
//! The add-on lifecycle: key bindings, overlay and panel around a
//! [`LockEngine`].
//!
//! # Modules
//!
//! - [`keymap`] - Operators, key chords and binding derivation
//! - [`overlay`] - Read-only overlay batches for revealed objects
//!
//! # Presentation faults
//!
//! Redraw-time work (reconcile before drawing, overlay collection) must never
//! break the host's draw loop. [`Addon::on_redraw`] is the only place where
//! host errors are swallowed; they are logged at `trace` and the overlay is
//! simply skipped for that frame. Operator invocations always report their
//! errors through an [`Outcome`].

pub mod keymap;
pub mod overlay;

use tracing::{debug, trace};

use crate::core::config::Config;
use crate::engine::{DeleteVariant, HealthReport, LockEngine, Outcome, PanelState};
use crate::host::MeshEditor;

use keymap::{BindingHandle, BindingRegistry, KeyChord, Keymap, KeymapError, Operator};
use overlay::{OverlayBatch, OverlayStyle};

/// The add-on: an engine plus the host registrations it owns.
#[derive(Debug)]
pub struct Addon {
    engine: LockEngine,
    keymap: Keymap,
    handles: Vec<BindingHandle>,
    show_locked: bool,
    style: OverlayStyle,
}

impl Addon {
    /// Create an add-on with the default overlay settings.
    pub fn new(engine: LockEngine, keymap: Keymap) -> Self {
        Self {
            engine,
            keymap,
            handles: Vec::new(),
            show_locked: true,
            style: OverlayStyle::default(),
        }
    }

    /// Build the add-on from configuration and the host's native bindings.
    pub fn from_config(
        config: &Config,
        engine: LockEngine,
        native: &[keymap::NativeBinding],
    ) -> Result<Self, KeymapError> {
        let lock: KeyChord = config.lock_chord().parse()?;
        let begin: KeyChord = config.begin_unlock_chord().parse()?;
        let mut addon = Self::new(engine, Keymap::derive(native, &lock, &begin));
        addon.show_locked = config.show_locked();
        addon.style = config.overlay_style();
        Ok(addon)
    }

    /// The engine.
    pub fn engine(&self) -> &LockEngine {
        &self.engine
    }

    /// Mutable access to the engine.
    pub fn engine_mut(&mut self) -> &mut LockEngine {
        &mut self.engine
    }

    /// Consume the add-on, returning its engine.
    pub fn into_engine(self) -> LockEngine {
        self.engine
    }

    /// The derived keymap.
    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// Whether bindings are currently registered.
    pub fn is_active(&self) -> bool {
        !self.handles.is_empty()
    }

    /// Register every binding and heal the active object.
    ///
    /// If any registration fails, the bindings registered so far are removed
    /// again and the error is returned.
    pub fn activate(
        &mut self,
        registry: &mut dyn BindingRegistry,
        active: Option<&mut dyn MeshEditor>,
    ) -> Result<Option<HealthReport>, KeymapError> {
        let mut handles = Vec::with_capacity(self.keymap.len());
        for binding in self.keymap.bindings() {
            match registry.register(binding) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    Self::release(registry, &mut handles);
                    return Err(e);
                }
            }
        }
        debug!(bindings = handles.len(), "bindings registered");
        self.handles = handles;

        let Some(mesh) = active else {
            return Ok(None);
        };
        if !mesh.is_editable() {
            return Ok(None);
        }
        match self.engine.startup_heal(mesh) {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                trace!(error = %e, "startup heal failed");
                Ok(None)
            }
        }
    }

    /// Remove every binding and drop all workflow state.
    pub fn deactivate(&mut self, registry: &mut dyn BindingRegistry) {
        Self::release(registry, &mut self.handles);
        self.engine.reset();
    }

    fn release(registry: &mut dyn BindingRegistry, handles: &mut Vec<BindingHandle>) {
        for handle in handles.drain(..) {
            if let Err(e) = registry.unregister(handle) {
                trace!(error = %e, "binding already gone");
            }
        }
    }

    /// Run the operator a binding points at.
    pub fn invoke(&mut self, operator: Operator, mesh: &mut dyn MeshEditor) -> Outcome {
        match operator {
            Operator::LockSelection => self.engine.lock_selection(mesh),
            Operator::BeginUnlock => self.engine.begin_unlock(mesh),
            Operator::CommitUnlock => self.engine.commit_unlock(mesh),
            Operator::CancelUnlock => self.engine.cancel_unlock(mesh),
            Operator::UnlockAll => self.engine.unlock_all(mesh),
            Operator::GuardDeleteImmediate => {
                self.engine.guard_delete(mesh, DeleteVariant::Immediate)
            }
            Operator::GuardDeleteDialog => self.engine.guard_delete(mesh, DeleteVariant::Dialog),
            Operator::GuardTranslate => self.engine.guard_translate(mesh),
        }
    }

    /// Panel state for the active object.
    pub fn panel(&self, mesh: &dyn MeshEditor) -> PanelState {
        self.engine.panel_state(mesh)
    }

    /// Draw-time hook: reconcile, then collect the overlay.
    ///
    /// Never fails; host errors are logged and yield `None`.
    pub fn on_redraw(&mut self, mesh: &mut dyn MeshEditor) -> Option<OverlayBatch> {
        if let Err(e) = self.engine.reconcile(mesh) {
            trace!(error = %e, "redraw reconcile failed");
            return None;
        }
        match OverlayBatch::collect(&self.engine, mesh, self.show_locked, self.style) {
            Ok(batch) => batch,
            Err(e) => {
                trace!(error = %e, "overlay collection failed");
                None
            }
        }
    }
}
