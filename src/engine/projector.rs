//! engine::projector
//!
//! Maps an element-level selection to the vertex set it implies.
//!
//! Hidden elements never contribute: a hidden vertex is excluded even when a
//! selected edge or face uses it. Sets are ordered so results are
//! deterministic.

use std::collections::BTreeSet;

use crate::core::types::{is_locked, ElemKind, SelectMode};
use crate::host::{HostError, MeshEditor};

/// Vertices implied by the current selection in `mode`.
///
/// - Vertex mode: selected, non-hidden vertices
/// - Edge mode: non-hidden endpoints of selected, non-hidden edges
/// - Face mode: non-hidden vertices of selected, non-hidden faces
pub fn project_to_vertices(
    mesh: &dyn MeshEditor,
    mode: SelectMode,
) -> Result<BTreeSet<usize>, HostError> {
    let kind = mode.kind();
    let mut verts = BTreeSet::new();

    for index in 0..mesh.len(kind) {
        if !mesh.flags(kind, index)?.is_active() {
            continue;
        }
        let members = match kind {
            ElemKind::Vert => vec![index],
            ElemKind::Edge => mesh.edge_verts(index)?.to_vec(),
            ElemKind::Face => mesh.face_verts(index)?,
        };
        for v in members {
            if !mesh.flags(ElemKind::Vert, v)?.hidden {
                verts.insert(v);
            }
        }
    }

    Ok(verts)
}

/// Members of `set` whose tag is locked. Vertices past the end of `tags`
/// read as unlocked.
pub fn locked_members(set: &BTreeSet<usize>, tags: &[i32]) -> BTreeSet<usize> {
    set.iter()
        .copied()
        .filter(|v| tags.get(*v).copied().is_some_and(is_locked))
        .collect()
}

/// Whether any member of `set` is locked.
pub fn has_locked_member(set: &BTreeSet<usize>, tags: &[i32]) -> bool {
    set.iter()
        .any(|v| tags.get(*v).copied().is_some_and(is_locked))
}

/// Every non-hidden element of the mode's kind is selected, and at least one
/// such element exists.
pub fn is_full_coverage(mesh: &dyn MeshEditor, mode: SelectMode) -> Result<bool, HostError> {
    let kind = mode.kind();
    let mut visible = 0;
    for index in 0..mesh.len(kind) {
        let flags = mesh.flags(kind, index)?;
        if flags.hidden {
            continue;
        }
        if !flags.selected {
            return Ok(false);
        }
        visible += 1;
    }
    Ok(visible > 0)
}

/// Every non-hidden vertex is in `set`, and at least one such vertex exists.
pub fn is_full_vertex_coverage(
    mesh: &dyn MeshEditor,
    set: &BTreeSet<usize>,
) -> Result<bool, HostError> {
    let mut visible = 0;
    for v in 0..mesh.len(ElemKind::Vert) {
        if mesh.flags(ElemKind::Vert, v)?.hidden {
            continue;
        }
        if !set.contains(&v) {
            return Ok(false);
        }
        visible += 1;
    }
    Ok(visible > 0)
}
