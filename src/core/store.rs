//! core::store
//!
//! The persisted lock attribute.
//!
//! # Overview
//!
//! The lock store is the durable side of the lock bit: an integer point
//! attribute saved with the mesh, index-aligned to vertex order. It survives
//! session boundaries and undo, so it is the source of truth whenever a new
//! edit session opens.
//!
//! # Invariants
//!
//! - A save always writes exactly one entry per current vertex, so the stored
//!   array covers the vertex count after every save
//! - Every write is a single whole-array replacement
//! - Counts are recomputed on every call, never cached
//!
//! # Example
//!
//! ```
//! use meshlock::core::cache::WorkingCache;
//! use meshlock::core::store::LockStore;
//! use meshlock::core::types::LayerName;
//! use meshlock::host::MemoryMesh;
//!
//! let layer = LayerName::default();
//! let store = LockStore::new(layer.clone());
//! let cache = WorkingCache::new(layer);
//!
//! let mut mesh = MemoryMesh::points(4);
//! cache.ensure(&mut mesh);
//! cache.set(&mut mesh, 2, true).unwrap();
//! store.save_from(&mut mesh).unwrap();
//!
//! assert_eq!(store.count(&mesh), 1);
//! assert!(store.any(&mesh));
//! ```

use crate::core::types::{count_locked, is_locked, lock_tag, ElemKind, LayerName, UNLOCKED};
use crate::host::{HostError, MeshEditor};

/// Accessor for the persisted lock attribute of a mesh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockStore {
    layer: LayerName,
}

impl LockStore {
    /// Create a store for the named attribute.
    pub fn new(layer: LayerName) -> Self {
        Self { layer }
    }

    /// The attribute name.
    pub fn layer(&self) -> &LayerName {
        &self.layer
    }

    /// Whether the persisted attribute exists on the mesh.
    pub fn exists(&self, mesh: &dyn MeshEditor) -> bool {
        mesh.attribute(self.layer.as_str()).is_some()
    }

    /// Copy of the persisted array, if it exists.
    pub fn read(&self, mesh: &dyn MeshEditor) -> Option<Vec<i32>> {
        mesh.attribute(self.layer.as_str())
    }

    /// Create the persisted array (all unlocked) if it is absent.
    pub fn ensure_layer(&self, mesh: &mut dyn MeshEditor) -> Result<(), HostError> {
        if self.exists(mesh) {
            return Ok(());
        }
        let count = mesh.len(ElemKind::Vert);
        mesh.write_attribute(self.layer.as_str(), vec![UNLOCKED; count])
    }

    /// Copy persisted tags into the working layer.
    ///
    /// Does nothing and returns `Ok(false)` when the attribute is absent.
    /// Otherwise the working layer is created if needed and every vertex
    /// covered by the persisted array takes its persisted tag. Vertices past
    /// the end of the array keep their working value.
    pub fn load_into(&self, mesh: &mut dyn MeshEditor) -> Result<bool, HostError> {
        let Some(persisted) = self.read(mesh) else {
            return Ok(false);
        };

        let name = self.layer.as_str();
        mesh.ensure_vert_layer(name);

        let count = mesh.len(ElemKind::Vert);
        let mut working: Vec<i32> = (0..count)
            .map(|v| mesh.vert_layer_value(name, v).unwrap_or_default())
            .collect();
        overlay_persisted(&persisted, &mut working);

        for (vert, value) in working.into_iter().enumerate() {
            mesh.set_vert_layer_value(name, vert, value)?;
        }
        Ok(true)
    }

    /// Replace the persisted array with the working tags.
    ///
    /// Returns the number of locked vertices written.
    ///
    /// # Errors
    ///
    /// Returns `HostError::MissingLayer` if the working layer does not exist.
    pub fn save_from(&self, mesh: &mut dyn MeshEditor) -> Result<usize, HostError> {
        let name = self.layer.as_str();
        if !mesh.has_vert_layer(name) {
            return Err(HostError::MissingLayer(name.to_string()));
        }

        let count = mesh.len(ElemKind::Vert);
        let values: Vec<i32> = (0..count)
            .map(|v| lock_tag(mesh.vert_layer_value(name, v).is_some_and(is_locked)))
            .collect();
        let locked = count_locked(&values);

        mesh.write_attribute(name, values)?;
        Ok(locked)
    }

    /// Number of locked entries in the persisted array (0 if absent).
    pub fn count(&self, mesh: &dyn MeshEditor) -> usize {
        self.read(mesh).map(|v| count_locked(&v)).unwrap_or(0)
    }

    /// Locked entries that still map to a vertex.
    ///
    /// Entries past the current vertex count are ignored, since the next
    /// reconcile drops them.
    pub fn count_in_range(&self, mesh: &dyn MeshEditor) -> usize {
        let count = mesh.len(ElemKind::Vert);
        self.read(mesh)
            .map(|v| count_locked(&v[..v.len().min(count)]))
            .unwrap_or(0)
    }

    /// Whether any persisted entry is locked.
    pub fn any(&self, mesh: &dyn MeshEditor) -> bool {
        self.read(mesh)
            .map(|v| v.iter().any(|t| is_locked(*t)))
            .unwrap_or(false)
    }
}

/// Load rule shared by [`LockStore::load_into`] and the reconciler.
///
/// Each working slot covered by `persisted` takes the normalised persisted
/// tag; slots past its end are left alone, and persisted entries past the
/// end of `working` are ignored.
pub fn overlay_persisted(persisted: &[i32], working: &mut [i32]) {
    for (slot, value) in working.iter_mut().zip(persisted) {
        *slot = lock_tag(is_locked(*value));
    }
}
