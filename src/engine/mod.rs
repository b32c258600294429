//! engine
//!
//! The lock-state consistency engine.
//!
//! # Architecture
//!
//! [`LockEngine`] owns the lock layer accessors and the per-object unlock
//! workflow state. It never owns a mesh: each operation borrows the host's
//! [`MeshEditor`] for one synchronous call.
//!
//! Every public operation follows the same lifecycle:
//!
//! ```text
//! Require editable -> Reconcile -> Project selection -> Decide -> Mutate working -> Persist
//! ```
//!
//! - Working tags are always written before the persisted attribute
//! - Guards decide before anything is mutated, and a veto never reaches the
//!   native operator
//! - Host errors cancel the operation with [`CancelReason::Host`], except
//!   stale references while clearing incident selection, which skip only the
//!   affected vertex
//!
//! # Example
//!
//! ```
//! use meshlock::core::types::{ElemKind, LayerName};
//! use meshlock::engine::LockEngine;
//! use meshlock::host::{MemoryMesh, MeshEditor};
//!
//! let mut engine = LockEngine::new(LayerName::default());
//! let mut mesh = MemoryMesh::points(10);
//!
//! mesh.select(ElemKind::Vert, &[0, 1, 2], false).unwrap();
//! let outcome = engine.lock_selection(&mut mesh);
//!
//! assert_eq!(outcome.count(), 3);
//! assert_eq!(engine.lock_count(&mesh), 3);
//! assert!(mesh.flags(ElemKind::Vert, 0).unwrap().is_sealed());
//! ```

pub mod guards;
pub mod health;
pub mod lock;
pub mod outcome;
pub mod projector;
pub mod reconcile;
pub mod status;
pub mod unlock;
pub mod workflow;

pub use guards::DeleteVariant;
pub use health::{Fixup, FixupKind, HealthReport};
pub use outcome::{CancelReason, Outcome};
pub use reconcile::{LockSnapshot, ReconcilePlan};
pub use status::PanelState;
pub use workflow::{UnlockState, WorkflowRegistry};

use std::collections::BTreeSet;

use tracing::{debug, info, info_span};

use crate::core::cache::WorkingCache;
use crate::core::store::LockStore;
use crate::core::types::{ElemKind, LayerName, ObjectId};
use crate::host::{HostError, MeshEditor};

use outcome::messages;

/// The lock engine.
#[derive(Debug, Clone, Default)]
pub struct LockEngine {
    store: LockStore,
    cache: WorkingCache,
    workflow: WorkflowRegistry,
}

impl LockEngine {
    /// Create an engine for the named lock layer.
    pub fn new(layer: LayerName) -> Self {
        Self::with_workflow(layer, WorkflowRegistry::new())
    }

    /// Create an engine with previously saved workflow state.
    pub fn with_workflow(layer: LayerName, workflow: WorkflowRegistry) -> Self {
        Self {
            store: LockStore::new(layer.clone()),
            cache: WorkingCache::new(layer),
            workflow,
        }
    }

    /// The persisted lock attribute accessor.
    pub fn store(&self) -> &LockStore {
        &self.store
    }

    /// The working lock layer accessor.
    pub fn cache(&self) -> &WorkingCache {
        &self.cache
    }

    /// Unlock workflow state.
    pub fn workflow(&self) -> &WorkflowRegistry {
        &self.workflow
    }

    /// Consume the engine, returning its workflow state.
    pub fn into_workflow(self) -> WorkflowRegistry {
        self.workflow
    }

    /// Drop workflow state for an object that no longer exists.
    pub fn forget_object(&mut self, object: &ObjectId) {
        self.workflow.forget(object);
    }

    /// Drop all workflow state.
    pub fn reset(&mut self) {
        self.workflow.clear();
    }

    // =========================================================================
    // Reconcile
    // =========================================================================

    /// Compute the reconcile plan without applying it.
    pub fn plan_reconcile(&self, mesh: &dyn MeshEditor) -> Result<ReconcilePlan, HostError> {
        let unlock_mode = self.workflow.is_revealed(&mesh.object_id());
        let snapshot = LockSnapshot::capture(mesh, &self.store, &self.cache, unlock_mode)?;
        Ok(reconcile::plan(&snapshot))
    }

    /// Bring the lock state back to consistency.
    ///
    /// Does nothing on an object that is not an editable mesh.
    pub fn reconcile(&mut self, mesh: &mut dyn MeshEditor) -> Result<HealthReport, HostError> {
        let object = mesh.object_id();
        let mut report = HealthReport::new(object);
        if !mesh.is_editable() {
            return Ok(report);
        }

        let plan = self.plan_reconcile(mesh)?;
        reconcile::apply(mesh, &self.store, &self.cache, &plan)?;
        if plan.clear_unlock_mode {
            self.workflow.set_normal(&object);
        }

        for fixup in &plan.fixups {
            debug!(id = %fixup.id, kind = %fixup.kind, "{}", fixup.message);
        }
        report.extend(plan.fixups);
        Ok(report)
    }

    /// Heal an object when the add-on starts up.
    ///
    /// Loads persisted tags, forces normal mode, hides every locked vertex and
    /// clears selection history.
    pub fn startup_heal(&mut self, mesh: &mut dyn MeshEditor) -> Result<HealthReport, HostError> {
        if !mesh.is_editable() {
            return Ok(HealthReport::new(mesh.object_id()));
        }
        self.workflow.set_normal(&mesh.object_id());
        let report = self.reconcile(mesh)?;
        self.seal_locked(mesh)?;
        mesh.clear_select_history();
        mesh.update(false);
        Ok(report)
    }

    // =========================================================================
    // Shared helpers
    // =========================================================================

    /// Run an operation with the common preamble and logging.
    fn run<F>(&mut self, name: &'static str, mesh: &mut dyn MeshEditor, op: F) -> Outcome
    where
        F: FnOnce(&mut Self, &mut dyn MeshEditor) -> Result<Outcome, HostError>,
    {
        let span = info_span!("meshlock", op = name, object = %mesh.object_id());
        let _guard = span.enter();

        if !mesh.is_editable() {
            debug!("{}", messages::NOT_EDITABLE);
            return Outcome::precondition(messages::NOT_EDITABLE);
        }

        let outcome = match op(self, mesh) {
            Ok(outcome) => outcome,
            Err(e) => Outcome::host(&e),
        };

        match &outcome {
            Outcome::Finished { message, count } => info!(count, "{}", message),
            Outcome::Cancelled { reason, message } => debug!(%reason, "{}", message),
        }
        outcome
    }

    /// Hide and deselect every tagged vertex.
    fn seal_locked(&self, mesh: &mut dyn MeshEditor) -> Result<(), HostError> {
        for v in self.cache.locked_verts(mesh) {
            mesh.set_hidden(ElemKind::Vert, v, true)?;
            mesh.set_selected(ElemKind::Vert, v, false)?;
        }
        Ok(())
    }

    /// Deselect every element of a kind.
    fn deselect_kind(mesh: &mut dyn MeshEditor, kind: ElemKind) -> Result<(), HostError> {
        for index in 0..mesh.len(kind) {
            if mesh.flags(kind, index)?.selected {
                mesh.set_selected(kind, index, false)?;
            }
        }
        Ok(())
    }

    /// Select exactly the visible members of `verts`, deselecting every other vertex.
    fn reselect_verts(mesh: &mut dyn MeshEditor, verts: &BTreeSet<usize>) -> Result<(), HostError> {
        Self::deselect_kind(mesh, ElemKind::Vert)?;
        for &v in verts {
            if !mesh.flags(ElemKind::Vert, v)?.hidden {
                mesh.set_selected(ElemKind::Vert, v, true)?;
            }
        }
        Ok(())
    }

    /// Tags of the working layer, empty if it does not exist.
    fn working_tags(&self, mesh: &dyn MeshEditor) -> Vec<i32> {
        self.cache.get(mesh).unwrap_or_default()
    }
}
