//! engine::guards
//!
//! Edit guards in front of the native delete and move commands.
//!
//! A guard decides before touching anything. When it vetoes, the mesh is left
//! exactly as it was and the native operator is never called.
//!
//! A guard vetoes when:
//!
//! - the projected selection contains a locked vertex, or
//! - something is locked and the selection covers everything visible
//!   (delete compares visible vertices, move compares elements of the
//!   current selection mode)

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::outcome::{messages, Outcome};
use super::projector::{
    has_locked_member, is_full_coverage, is_full_vertex_coverage, project_to_vertices,
};
use super::LockEngine;
use crate::core::types::ElemKind;
use crate::host::{HostError, MeshEditor};

/// Which native delete the guard stands in front of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteVariant {
    /// Delete the selected vertices right away.
    #[default]
    Immediate,
    /// Open the native delete menu.
    Dialog,
}

impl fmt::Display for DeleteVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteVariant::Immediate => write!(f, "immediate"),
            DeleteVariant::Dialog => write!(f, "dialog"),
        }
    }
}

impl LockEngine {
    /// Guarded delete.
    pub fn guard_delete(&mut self, mesh: &mut dyn MeshEditor, variant: DeleteVariant) -> Outcome {
        let name = match variant {
            DeleteVariant::Immediate => "guard_delete",
            DeleteVariant::Dialog => "guard_delete_dialog",
        };
        self.run(name, mesh, |engine, mesh| engine.delete_inner(mesh, variant))
    }

    /// Guarded interactive move.
    pub fn guard_translate(&mut self, mesh: &mut dyn MeshEditor) -> Outcome {
        self.run("guard_translate", mesh, |engine, mesh| {
            engine.translate_inner(mesh)
        })
    }

    fn delete_inner(
        &mut self,
        mesh: &mut dyn MeshEditor,
        variant: DeleteVariant,
    ) -> Result<Outcome, HostError> {
        self.reconcile(mesh)?;
        let any_lock = self.store.any(mesh);

        let selection = project_to_vertices(mesh, mesh.select_mode())?;
        if selection.is_empty() {
            return Ok(Outcome::precondition(messages::NOTHING_TO_DELETE));
        }
        if has_locked_member(&selection, &self.working_tags(mesh)) {
            debug!(selected = selection.len(), "delete touches locked vertices");
            return Ok(Outcome::veto(messages::LOCKED_IN_SELECTION));
        }
        if any_lock && is_full_vertex_coverage(mesh, &selection)? {
            debug!(selected = selection.len(), "delete covers every visible vertex");
            return Ok(Outcome::veto(messages::FULL_DELETE));
        }

        match variant {
            DeleteVariant::Immediate => {
                Self::deselect_kind(mesh, ElemKind::Edge)?;
                Self::deselect_kind(mesh, ElemKind::Face)?;
                Self::reselect_verts(mesh, &selection)?;
                mesh.clear_select_history();
                mesh.update(false);
                mesh.delete_verts()?;
            }
            DeleteVariant::Dialog => {
                Self::keep_enclosed(mesh, ElemKind::Face, &selection)?;
                Self::keep_enclosed(mesh, ElemKind::Edge, &selection)?;
                Self::reselect_verts(mesh, &selection)?;
                mesh.clear_select_history();
                mesh.update(false);
                mesh.delete_menu()?;
            }
        }

        Ok(Outcome::finished(
            format!("deleted {} vertices", selection.len()),
            selection.len(),
        ))
    }

    fn translate_inner(&mut self, mesh: &mut dyn MeshEditor) -> Result<Outcome, HostError> {
        self.reconcile(mesh)?;
        let any_lock = self.store.any(mesh);
        let mode = mesh.select_mode();

        let selection = project_to_vertices(mesh, mode)?;
        if selection.is_empty() {
            return Ok(Outcome::precondition(messages::NOTHING_TO_MOVE));
        }
        if has_locked_member(&selection, &self.working_tags(mesh)) {
            debug!(selected = selection.len(), "move touches locked vertices");
            return Ok(Outcome::veto(messages::LOCKED_IN_SELECTION));
        }
        if any_lock && is_full_coverage(mesh, mode)? {
            debug!(%mode, "move covers every visible element");
            return Ok(Outcome::veto(messages::FULL_MOVE));
        }

        mesh.translate()?;
        Ok(Outcome::finished(
            format!("moving {} vertices", selection.len()),
            selection.len(),
        ))
    }

    /// Deselect every element of `kind` that has a vertex outside `verts`.
    fn keep_enclosed(
        mesh: &mut dyn MeshEditor,
        kind: ElemKind,
        verts: &BTreeSet<usize>,
    ) -> Result<(), HostError> {
        for index in 0..mesh.len(kind) {
            if !mesh.flags(kind, index)?.selected {
                continue;
            }
            let members = match kind {
                ElemKind::Edge => mesh.edge_verts(index)?.to_vec(),
                ElemKind::Face => mesh.face_verts(index)?,
                ElemKind::Vert => vec![index],
            };
            if !members.iter().all(|v| verts.contains(v)) {
                mesh.set_selected(kind, index, false)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{LayerName, SelectMode};
    use crate::engine::outcome::CancelReason;
    use crate::host::{FailOn, HostOp, MemoryMesh};

    fn locked_points(verts: &[usize], total: usize) -> (LockEngine, MemoryMesh) {
        let mut engine = LockEngine::new(LayerName::default());
        let mut mesh = MemoryMesh::points(total);
        mesh.select(ElemKind::Vert, verts, false).unwrap();
        engine.lock_selection(&mut mesh);
        mesh.clear_operations();
        (engine, mesh)
    }

    fn native_calls(mesh: &MemoryMesh) -> usize {
        mesh.operations()
            .iter()
            .filter(|op| {
                matches!(
                    op,
                    HostOp::DeleteVerts { .. } | HostOp::DeleteMenu | HostOp::Translate { .. }
                )
            })
            .count()
    }

    mod delete {
        use super::*;

        #[test]
        fn deletes_unlocked_selection() {
            let (mut engine, mut mesh) = locked_points(&[0, 1, 2], 10);
            mesh.select(ElemKind::Vert, &[5, 6], false).unwrap();

            let outcome = engine.guard_delete(&mut mesh, DeleteVariant::Immediate);

            assert_eq!(outcome.count(), 2);
            assert_eq!(mesh.len(ElemKind::Vert), 8);
            assert_eq!(engine.lock_count(&mesh), 3);
            assert!(mesh
                .operations()
                .contains(&HostOp::DeleteVerts { removed: 2 }));
        }

        #[test]
        fn nothing_selected() {
            let (mut engine, mut mesh) = locked_points(&[0], 3);
            let outcome = engine.guard_delete(&mut mesh, DeleteVariant::Immediate);
            assert_eq!(outcome.reason(), Some(CancelReason::Precondition));
            assert_eq!(outcome.message(), messages::NOTHING_TO_DELETE);
        }

        #[test]
        fn full_visible_coverage_is_vetoed() {
            let (mut engine, mut mesh) = locked_points(&[0], 3);
            mesh.select_all();
            let before = mesh.data().clone();

            let outcome = engine.guard_delete(&mut mesh, DeleteVariant::Immediate);

            assert!(outcome.is_veto());
            assert_eq!(outcome.message(), messages::FULL_DELETE);
            assert_eq!(mesh.data(), &before);
            assert_eq!(native_calls(&mesh), 0);
        }

        #[test]
        fn full_coverage_without_locks_is_allowed() {
            let mut engine = LockEngine::new(LayerName::default());
            let mut mesh = MemoryMesh::points(3);
            mesh.select_all();
            let outcome = engine.guard_delete(&mut mesh, DeleteVariant::Immediate);
            assert!(outcome.is_finished());
            assert_eq!(mesh.len(ElemKind::Vert), 0);
        }

        #[test]
        fn locked_member_vetoed_in_unlock_mode() {
            let (mut engine, mut mesh) = locked_points(&[0, 1], 4);
            engine.begin_unlock(&mut mesh);
            mesh.select(ElemKind::Vert, &[1, 3], false).unwrap();
            mesh.clear_operations();

            let outcome = engine.guard_delete(&mut mesh, DeleteVariant::Immediate);
            assert_eq!(outcome.message(), messages::LOCKED_IN_SELECTION);
            assert_eq!(native_calls(&mesh), 0);
        }

        #[test]
        fn dialog_keeps_enclosed_faces() {
            let mut engine = LockEngine::new(LayerName::default());
            let mut mesh = MemoryMesh::grid(2, 1).with_mode(SelectMode::Face);
            mesh.select(ElemKind::Face, &[0], false).unwrap();

            let outcome = engine.guard_delete(&mut mesh, DeleteVariant::Dialog);

            assert!(outcome.is_finished());
            assert!(mesh.operations().contains(&HostOp::DeleteMenu));
            assert_eq!(mesh.len(ElemKind::Vert), 2);
        }

        #[test]
        fn native_failure_is_host_error() {
            let mut engine = LockEngine::new(LayerName::default());
            let mut mesh = MemoryMesh::points(3);
            mesh.select(ElemKind::Vert, &[1], false).unwrap();
            mesh.fail_on(FailOn::DeleteMenu);

            let outcome = engine.guard_delete(&mut mesh, DeleteVariant::Dialog);
            assert_eq!(outcome.reason(), Some(CancelReason::Host));
            assert_eq!(mesh.len(ElemKind::Vert), 3);
        }
    }

    mod translate {
        use super::*;

        #[test]
        fn moves_unlocked_selection() {
            let (mut engine, mesh) = locked_points(&[0], 3);
            let mut mesh = mesh.with_translate_offset([0.0, 1.0, 0.0]);
            mesh.select(ElemKind::Vert, &[2], false).unwrap();

            let outcome = engine.guard_translate(&mut mesh);

            assert_eq!(outcome.count(), 1);
            assert_eq!(mesh.position(2).unwrap(), [2.0, 1.0, 0.0]);
            assert_eq!(mesh.position(0).unwrap(), [0.0, 0.0, 0.0]);
        }

        #[test]
        fn nothing_to_move() {
            let (mut engine, mut mesh) = locked_points(&[0], 3);
            let outcome = engine.guard_translate(&mut mesh);
            assert_eq!(outcome.message(), messages::NOTHING_TO_MOVE);
        }

        #[test]
        fn full_element_coverage_is_vetoed() {
            let mut engine = LockEngine::new(LayerName::default());
            let mut mesh = MemoryMesh::grid(2, 0);
            mesh.select(ElemKind::Vert, &[0], false).unwrap();
            engine.lock_selection(&mut mesh);
            mesh.set_select_mode(SelectMode::Edge);
            mesh.select_all();
            mesh.clear_operations();

            // both edges are selected; the locked endpoint drops out of the projection
            let outcome = engine.guard_translate(&mut mesh);
            assert_eq!(outcome.message(), messages::FULL_MOVE);
            assert_eq!(native_calls(&mesh), 0);
        }
    }
}
