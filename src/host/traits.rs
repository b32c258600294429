//! host::traits
//!
//! The mesh editor capability the lock engine consumes.
//!
//! # Design
//!
//! The engine never owns a mesh. Each public operation borrows the host's
//! live edit structure for the duration of one synchronous callback, reads and
//! writes the `hidden`/`selected` flags and the lock layer, and then returns.
//!
//! Host adapters:
//! - Report stale or out-of-range element references as [`HostError`]
//!   instead of panicking, so callers can decide how narrowly to absorb them
//! - Keep the working layer (live, per edit session) separate from the
//!   persisted attribute (saved with the asset)
//! - Perform native move/delete on whatever is currently selected
//!
//! # Example
//!
//! ```
//! use meshlock::core::types::{ElemKind, SelectMode};
//! use meshlock::host::{MemoryMesh, MeshEditor};
//!
//! let mut mesh = MemoryMesh::grid(2, 1);
//! assert_eq!(mesh.len(ElemKind::Vert), 6);
//! assert_eq!(mesh.select_mode(), SelectMode::Vertex);
//!
//! mesh.set_selected(ElemKind::Vert, 0, true).unwrap();
//! assert!(mesh.flags(ElemKind::Vert, 0).unwrap().selected);
//! assert!(mesh.flags(ElemKind::Vert, 99).is_err());
//! ```

use thiserror::Error;

use crate::core::types::{ElemFlags, ElemKind, ObjectId, SelectMode};

/// Errors reported by a host adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// An element reference no longer resolves (removed or re-indexed).
    #[error("stale {kind} reference: {index}")]
    StaleReference {
        /// Kind of the element
        kind: ElemKind,
        /// Index that failed to resolve
        index: usize,
    },

    /// The named layer does not exist on the working structure.
    #[error("missing layer: {0}")]
    MissingLayer(String),

    /// The active object is not a mesh in an open edit session.
    #[error("object is not an editable mesh")]
    NotEditable,

    /// A native operator refused or failed.
    #[error("native operator '{operator}' failed: {message}")]
    Operator {
        /// Operator identifier
        operator: String,
        /// Host-provided message
        message: String,
    },
}

impl HostError {
    /// Build a stale-reference error.
    pub fn stale(kind: ElemKind, index: usize) -> Self {
        HostError::StaleReference { kind, index }
    }

    /// Check if this is a stale reference (the only error absorbed per element).
    pub fn is_stale(&self) -> bool {
        matches!(self, HostError::StaleReference { .. })
    }
}

/// Position of a vertex in object space.
pub type Position = [f32; 3];

/// The mesh editor capability.
///
/// One value of this trait represents the active object together with its
/// live edit structure. Everything the engine needs from the host goes
/// through here.
///
/// # Indices
///
/// Elements are addressed by their current index in the host's ordered
/// collections. Indices are only valid within one callback; structural edits
/// (native delete) re-index.
pub trait MeshEditor {
    // -------------------------------------------------------------------------
    // Object
    // -------------------------------------------------------------------------

    /// Identity of the object being edited.
    fn object_id(&self) -> ObjectId;

    /// Whether the object carries mesh data.
    fn is_mesh(&self) -> bool;

    /// Whether an edit session is open on the object.
    fn is_editing(&self) -> bool;

    /// Current host-wide selection mode.
    fn select_mode(&self) -> SelectMode;

    /// Convenience: mesh type with an open edit session.
    fn is_editable(&self) -> bool {
        self.is_mesh() && self.is_editing()
    }

    // -------------------------------------------------------------------------
    // Elements and topology
    // -------------------------------------------------------------------------

    /// Number of elements of a kind.
    fn len(&self, kind: ElemKind) -> usize;

    /// Flags of one element.
    fn flags(&self, kind: ElemKind, index: usize) -> Result<ElemFlags, HostError>;

    /// Set the `hidden` flag of one element.
    fn set_hidden(&mut self, kind: ElemKind, index: usize, hidden: bool) -> Result<(), HostError>;

    /// Set the `selected` flag of one element.
    fn set_selected(
        &mut self,
        kind: ElemKind,
        index: usize,
        selected: bool,
    ) -> Result<(), HostError>;

    /// Vertex position (read-only for the core).
    fn position(&self, vert: usize) -> Result<Position, HostError>;

    /// Endpoints of an edge.
    fn edge_verts(&self, edge: usize) -> Result<[usize; 2], HostError>;

    /// Vertices of a face, in winding order.
    fn face_verts(&self, face: usize) -> Result<Vec<usize>, HostError>;

    /// Edges incident to a vertex.
    fn vert_edges(&self, vert: usize) -> Result<Vec<usize>, HostError>;

    /// Faces incident to a vertex.
    fn vert_faces(&self, vert: usize) -> Result<Vec<usize>, HostError>;

    // -------------------------------------------------------------------------
    // Working layer (live edit structure)
    // -------------------------------------------------------------------------

    /// Whether a per-vertex integer layer exists on the live structure.
    fn has_vert_layer(&self, name: &str) -> bool;

    /// Create a per-vertex integer layer (zeroed) if absent.
    fn ensure_vert_layer(&mut self, name: &str);

    /// Read one value of a per-vertex layer. `None` if the layer or vertex is absent.
    fn vert_layer_value(&self, name: &str, vert: usize) -> Option<i32>;

    /// Write one value of a per-vertex layer.
    fn set_vert_layer_value(&mut self, name: &str, vert: usize, value: i32)
        -> Result<(), HostError>;

    // -------------------------------------------------------------------------
    // Persisted attribute (saved with the asset)
    // -------------------------------------------------------------------------

    /// Copy of a persisted point attribute, if it exists.
    fn attribute(&self, name: &str) -> Option<Vec<i32>>;

    /// Replace a persisted point attribute, creating it if absent.
    fn write_attribute(&mut self, name: &str, values: Vec<i32>) -> Result<(), HostError>;

    // -------------------------------------------------------------------------
    // Session services
    // -------------------------------------------------------------------------

    /// Forget the "last active element" history.
    fn clear_select_history(&mut self);

    /// Ask the host to refresh its view of the edit structure.
    fn update(&mut self, destructive: bool);

    // -------------------------------------------------------------------------
    // Native operators
    // -------------------------------------------------------------------------

    /// Native delete of the selected vertices (and everything using them).
    fn delete_verts(&mut self) -> Result<(), HostError>;

    /// Native delete menu (the user chooses what to delete).
    fn delete_menu(&mut self) -> Result<(), HostError>;

    /// Native interactive move of the current selection.
    fn translate(&mut self) -> Result<(), HostError>;
}
