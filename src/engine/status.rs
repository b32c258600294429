//! engine::status
//!
//! Read-only queries for panels and status lines. None of these write to the
//! mesh or the workflow state.

use serde::Serialize;

use super::projector::{has_locked_member, project_to_vertices};
use super::LockEngine;
use crate::core::types::ObjectId;
use crate::host::MeshEditor;

/// What a lock panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PanelState {
    /// Object is a mesh with an open edit session
    pub editable: bool,
    /// Locked vertices in the persisted store
    pub lock_count: usize,
    /// Object is revealed for unlock
    pub unlock_mode: bool,
    /// Commit would find at least one locked vertex in the selection
    pub commit_enabled: bool,
}

impl LockEngine {
    /// Locked vertices according to the persisted store (0 for non-meshes).
    pub fn lock_count(&self, mesh: &dyn MeshEditor) -> usize {
        if !mesh.is_mesh() {
            return 0;
        }
        self.store.count(mesh)
    }

    /// Whether an object is revealed for unlock.
    pub fn is_unlock_mode(&self, object: &ObjectId) -> bool {
        self.workflow.is_revealed(object)
    }

    /// Compute the panel state.
    ///
    /// Commit availability is derived from the persisted tags, so the
    /// answer is available before any reconcile has run.
    pub fn panel_state(&self, mesh: &dyn MeshEditor) -> PanelState {
        let editable = mesh.is_editable();
        let unlock_mode = self.is_unlock_mode(&mesh.object_id());

        let commit_enabled = editable
            && unlock_mode
            && match (
                self.store.read(mesh),
                project_to_vertices(mesh, mesh.select_mode()),
            ) {
                (Some(tags), Ok(selection)) => has_locked_member(&selection, &tags),
                _ => false,
            };

        PanelState {
            editable,
            lock_count: self.lock_count(mesh),
            unlock_mode,
            commit_enabled,
        }
    }
}
