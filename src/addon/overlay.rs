//! addon::overlay
//!
//! What the viewport overlay draws while an object is revealed for unlock.
//!
//! The overlay is read-only. It produces positions in object space and leaves
//! drawing (and the world transform) to the host.

use serde::{Deserialize, Serialize};

use crate::core::types::{is_locked, ElemKind};
use crate::engine::LockEngine;
use crate::host::{HostError, MeshEditor, Position};

/// Colours and sizes for the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// RGBA for unselected locked elements
    pub base_color: [f32; 4],
    /// RGBA for selected locked elements
    pub highlight_color: [f32; 4],
    /// Point size for unselected locked vertices
    pub point_size: f32,
    /// Line width for unselected locked edges
    pub line_width: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            base_color: [1.0, 0.3, 0.3, 0.9],
            highlight_color: [1.0, 1.0, 0.0, 1.0],
            point_size: 8.0,
            line_width: 3.0,
        }
    }
}

impl OverlayStyle {
    /// Selected vertices draw a little larger.
    pub fn selected_point_size(&self) -> f32 {
        self.point_size + 2.0
    }

    /// Selected edges draw a little wider.
    pub fn selected_line_width(&self) -> f32 {
        self.line_width + 1.0
    }
}

/// Locked geometry to draw, split by selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayBatch {
    pub verts_selected: Vec<Position>,
    pub verts_unselected: Vec<Position>,
    /// Edges with both endpoints locked
    pub edges_selected: Vec<[Position; 2]>,
    pub edges_unselected: Vec<[Position; 2]>,
    pub style: OverlayStyle,
}

impl OverlayBatch {
    /// Collect the batch for one object.
    ///
    /// Returns `Ok(None)` when the object is not editable, not revealed for
    /// unlock, `show_locked` is off, or nothing is locked.
    pub fn collect(
        engine: &LockEngine,
        mesh: &dyn MeshEditor,
        show_locked: bool,
        style: OverlayStyle,
    ) -> Result<Option<Self>, HostError> {
        if !show_locked || !mesh.is_editable() || !engine.is_unlock_mode(&mesh.object_id()) {
            return Ok(None);
        }
        let Some(tags) = engine.cache().get(mesh) else {
            return Ok(None);
        };

        let mut batch = Self {
            verts_selected: Vec::new(),
            verts_unselected: Vec::new(),
            edges_selected: Vec::new(),
            edges_unselected: Vec::new(),
            style,
        };

        let locked = |v: usize| tags.get(v).copied().is_some_and(is_locked);

        for v in 0..mesh.len(ElemKind::Vert) {
            if !locked(v) {
                continue;
            }
            let co = mesh.position(v)?;
            if mesh.flags(ElemKind::Vert, v)?.selected {
                batch.verts_selected.push(co);
            } else {
                batch.verts_unselected.push(co);
            }
        }

        for e in 0..mesh.len(ElemKind::Edge) {
            let [a, b] = mesh.edge_verts(e)?;
            if !(locked(a) && locked(b)) {
                continue;
            }
            let segment = [mesh.position(a)?, mesh.position(b)?];
            if mesh.flags(ElemKind::Edge, e)?.selected {
                batch.edges_selected.push(segment);
            } else {
                batch.edges_unselected.push(segment);
            }
        }

        if batch.is_empty() {
            return Ok(None);
        }
        Ok(Some(batch))
    }

    /// Nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.verts_selected.is_empty()
            && self.verts_unselected.is_empty()
            && self.edges_selected.is_empty()
            && self.edges_unselected.is_empty()
    }

    /// Number of locked vertices in the batch.
    pub fn vert_count(&self) -> usize {
        self.verts_selected.len() + self.verts_unselected.len()
    }

    /// Number of locked edges in the batch.
    pub fn edge_count(&self) -> usize {
        self.edges_selected.len() + self.edges_unselected.len()
    }
}
