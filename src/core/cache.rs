//! core::cache
//!
//! The working lock layer on the live edit structure.
//!
//! The working cache only exists while an edit session is open and is lost
//! whenever the session closes. It never persists on its own: callers save it
//! through [`LockStore::save_from`](crate::core::store::LockStore::save_from).

use crate::core::types::{is_locked, lock_tag, ElemKind, LayerName};
use crate::host::{HostError, MeshEditor};

/// Accessor for the working lock layer of a mesh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingCache {
    layer: LayerName,
}

impl WorkingCache {
    /// Create a cache accessor for the named layer.
    pub fn new(layer: LayerName) -> Self {
        Self { layer }
    }

    /// The layer name.
    pub fn layer(&self) -> &LayerName {
        &self.layer
    }

    /// Create the working layer if absent.
    pub fn ensure(&self, mesh: &mut dyn MeshEditor) {
        mesh.ensure_vert_layer(self.layer.as_str());
    }

    /// Whether the working layer exists.
    pub fn exists(&self, mesh: &dyn MeshEditor) -> bool {
        mesh.has_vert_layer(self.layer.as_str())
    }

    /// Snapshot of the working tags, `None` if the layer was never created.
    pub fn get(&self, mesh: &dyn MeshEditor) -> Option<Vec<i32>> {
        if !self.exists(mesh) {
            return None;
        }
        let name = self.layer.as_str();
        Some(
            (0..mesh.len(ElemKind::Vert))
                .map(|v| mesh.vert_layer_value(name, v).unwrap_or(0))
                .collect(),
        )
    }

    /// Whether one vertex is tagged. Missing layer or vertex reads as unlocked.
    pub fn is_locked(&self, mesh: &dyn MeshEditor, vert: usize) -> bool {
        mesh.vert_layer_value(self.layer.as_str(), vert)
            .is_some_and(is_locked)
    }

    /// Indices of all tagged vertices, ascending.
    pub fn locked_verts(&self, mesh: &dyn MeshEditor) -> Vec<usize> {
        if !self.exists(mesh) {
            return Vec::new();
        }
        (0..mesh.len(ElemKind::Vert))
            .filter(|v| self.is_locked(mesh, *v))
            .collect()
    }

    /// Number of tagged vertices (0 if the layer is absent).
    pub fn count_tagged(&self, mesh: &dyn MeshEditor) -> usize {
        self.locked_verts(mesh).len()
    }

    /// Tag or untag one vertex.
    pub fn set(
        &self,
        mesh: &mut dyn MeshEditor,
        vert: usize,
        locked: bool,
    ) -> Result<(), HostError> {
        mesh.set_vert_layer_value(self.layer.as_str(), vert, lock_tag(locked))
    }
}
