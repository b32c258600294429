//! engine::unlock
//!
//! The unlock workflow: reveal, commit, cancel and unlock everything.
//!
//! Unlocking is a two-step flow. [`LockEngine::begin_unlock`] shows the
//! locked vertices so the user can pick some of them, and
//! [`LockEngine::commit_unlock`] clears the tags of exactly the picked ones.
//! [`LockEngine::cancel_unlock`] leaves without changing any tag, and
//! [`LockEngine::unlock_all`] skips the picking altogether.

use super::outcome::{messages, Outcome};
use super::projector::{locked_members, project_to_vertices};
use super::LockEngine;
use crate::core::types::ElemKind;
use crate::host::{HostError, MeshEditor};

impl LockEngine {
    /// Reveal every locked vertex so a subset can be selected for unlock.
    pub fn begin_unlock(&mut self, mesh: &mut dyn MeshEditor) -> Outcome {
        self.run("begin_unlock", mesh, |engine, mesh| engine.begin_inner(mesh))
    }

    /// Unlock the locked vertices in the current selection.
    pub fn commit_unlock(&mut self, mesh: &mut dyn MeshEditor) -> Outcome {
        self.run("commit_unlock", mesh, |engine, mesh| engine.commit_inner(mesh))
    }

    /// Leave unlock mode without unlocking anything.
    pub fn cancel_unlock(&mut self, mesh: &mut dyn MeshEditor) -> Outcome {
        self.run("cancel_unlock", mesh, |engine, mesh| engine.cancel_inner(mesh))
    }

    /// Clear every lock tag and show the whole mesh.
    pub fn unlock_all(&mut self, mesh: &mut dyn MeshEditor) -> Outcome {
        self.run("unlock_all", mesh, |engine, mesh| engine.unlock_all_inner(mesh))
    }

    fn begin_inner(&mut self, mesh: &mut dyn MeshEditor) -> Result<Outcome, HostError> {
        // checked before reconcile so a mesh with nothing locked is left untouched
        if self.store.count_in_range(mesh) == 0 && self.cache.count_tagged(mesh) == 0 {
            return Ok(Outcome::precondition(messages::NO_LOCKED));
        }
        self.reconcile(mesh)?;

        // loading may still clear every working tag
        let locked = self.cache.locked_verts(mesh);
        if locked.is_empty() {
            return Ok(Outcome::precondition(messages::NO_LOCKED));
        }

        let mut shown = 0;
        for v in locked {
            if mesh.flags(ElemKind::Vert, v)?.hidden {
                mesh.set_hidden(ElemKind::Vert, v, false)?;
                shown += 1;
            }
        }

        Self::deselect_kind(mesh, ElemKind::Edge)?;
        Self::deselect_kind(mesh, ElemKind::Face)?;
        mesh.clear_select_history();
        mesh.update(false);
        self.workflow.reveal(mesh.object_id());

        let message = if shown == 0 {
            messages::SELECT_TO_UNLOCK.to_string()
        } else {
            format!("revealed {} locked vertices; select the ones to unlock", shown)
        };
        Ok(Outcome::finished(message, shown))
    }

    fn commit_inner(&mut self, mesh: &mut dyn MeshEditor) -> Result<Outcome, HostError> {
        if !self.workflow.is_revealed(&mesh.object_id()) {
            return Ok(Outcome::precondition(messages::NOT_REVEALED));
        }
        self.reconcile(mesh)?;

        // reconcile may have dropped the mode if nothing is locked anymore
        if !self.workflow.is_revealed(&mesh.object_id()) || !self.cache.exists(mesh) {
            self.workflow.set_normal(&mesh.object_id());
            return Ok(Outcome::precondition(messages::MISSING_LOCK_DATA));
        }

        let selection = project_to_vertices(mesh, mesh.select_mode())?;
        let targets = locked_members(&selection, &self.working_tags(mesh));
        if targets.is_empty() {
            return Ok(Outcome::precondition(messages::NO_LOCKED_IN_SELECTION));
        }

        for &v in &targets {
            self.cache.set(mesh, v, false)?;
        }
        self.seal_locked(mesh)?;
        mesh.clear_select_history();
        self.store.save_from(mesh)?;
        mesh.update(false);
        self.workflow.set_normal(&mesh.object_id());

        Ok(Outcome::finished(
            format!("unlocked {} vertices", targets.len()),
            targets.len(),
        ))
    }

    fn cancel_inner(&mut self, mesh: &mut dyn MeshEditor) -> Result<Outcome, HostError> {
        self.reconcile(mesh)?;
        self.seal_locked(mesh)?;
        mesh.clear_select_history();
        mesh.update(false);
        self.workflow.set_normal(&mesh.object_id());
        Ok(Outcome::finished(messages::UNLOCK_CANCELLED, 0))
    }

    fn unlock_all_inner(&mut self, mesh: &mut dyn MeshEditor) -> Result<Outcome, HostError> {
        self.reconcile(mesh)?;

        let locked = self.cache.locked_verts(mesh);
        if locked.is_empty() {
            return Ok(Outcome::precondition(messages::NO_LOCKED));
        }

        for &v in &locked {
            self.cache.set(mesh, v, false)?;
        }
        for v in 0..mesh.len(ElemKind::Vert) {
            mesh.set_hidden(ElemKind::Vert, v, false)?;
        }
        mesh.clear_select_history();
        self.store.save_from(mesh)?;
        mesh.update(false);
        self.workflow.set_normal(&mesh.object_id());

        Ok(Outcome::finished(
            format!("unlocked all {} vertices", locked.len()),
            locked.len(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::core::types::{ElemKind, LayerName, SelectMode, DEFAULT_LAYER_NAME};
    use crate::engine::outcome::{messages, CancelReason};
    use crate::engine::LockEngine;
    use crate::host::{MemoryMesh, MeshEditor};

    fn locked(verts: &[usize], total: usize) -> (LockEngine, MemoryMesh) {
        let mut engine = LockEngine::new(LayerName::default());
        let mut mesh = MemoryMesh::points(total);
        mesh.select(ElemKind::Vert, verts, false).unwrap();
        assert!(engine.lock_selection(&mut mesh).is_finished());
        (engine, mesh)
    }

    mod begin {
        use super::*;

        #[test]
        fn reveals_locked() {
            let (mut engine, mut mesh) = locked(&[0, 1, 2], 10);
            let outcome = engine.begin_unlock(&mut mesh);

            assert_eq!(outcome.count(), 3);
            assert!(engine.workflow().is_revealed(&mesh.object_id()));
            assert!(mesh.hidden(ElemKind::Vert).is_empty());
            assert!(mesh.history().is_empty());
        }

        #[test]
        fn nothing_locked_fails_without_change() {
            let mut engine = LockEngine::new(LayerName::default());
            let mut mesh = MemoryMesh::points(3);
            let outcome = engine.begin_unlock(&mut mesh);

            assert_eq!(outcome.message(), messages::NO_LOCKED);
            assert!(!engine.workflow().is_revealed(&mesh.object_id()));
            assert!(mesh.operations().is_empty());
        }

        #[test]
        fn already_shown_asks_for_selection() {
            let (mut engine, mut mesh) = locked(&[1], 3);
            engine.begin_unlock(&mut mesh);
            let outcome = engine.begin_unlock(&mut mesh);
            assert_eq!(outcome.message(), messages::SELECT_TO_UNLOCK);
            assert_eq!(outcome.count(), 0);
        }

        #[test]
        fn counts_persisted_only_locks() {
            let mut engine = LockEngine::new(LayerName::default());
            let mut mesh = MemoryMesh::points(3);
            mesh.write_attribute(DEFAULT_LAYER_NAME, vec![0, 0, 1]).unwrap();

            let outcome = engine.begin_unlock(&mut mesh);
            assert!(outcome.is_finished());
            assert!(engine.workflow().is_revealed(&mesh.object_id()));
        }

        #[test]
        fn locks_past_the_last_vertex_do_not_count() {
            let mut engine = LockEngine::new(LayerName::default());
            let mut mesh = MemoryMesh::points(2);
            mesh.write_attribute(DEFAULT_LAYER_NAME, vec![0, 0, 1]).unwrap();

            let outcome = engine.begin_unlock(&mut mesh);

            assert!(!outcome.is_finished());
            assert_eq!(outcome.message(), messages::NO_LOCKED);
            assert!(!engine.workflow().is_revealed(&mesh.object_id()));
            assert_eq!(mesh.attribute(DEFAULT_LAYER_NAME), Some(vec![0, 0, 1]));
        }

        #[test]
        fn working_tags_cleared_by_load_do_not_count() {
            let mut engine = LockEngine::new(LayerName::default());
            let mut mesh = MemoryMesh::points(2);
            mesh.write_attribute(DEFAULT_LAYER_NAME, vec![0, 0]).unwrap();
            mesh.restore_layer(DEFAULT_LAYER_NAME, vec![1, 0]);

            let outcome = engine.begin_unlock(&mut mesh);

            assert_eq!(outcome.message(), messages::NO_LOCKED);
            assert!(!engine.workflow().is_revealed(&mesh.object_id()));
        }
    }

    mod commit {
        use super::*;

        #[test]
        fn unlocks_exactly_the_selection() {
            let (mut engine, mut mesh) = locked(&[0, 1, 2], 10);
            engine.begin_unlock(&mut mesh);
            mesh.select(ElemKind::Vert, &[0], false).unwrap();

            let outcome = engine.commit_unlock(&mut mesh);

            assert_eq!(outcome.count(), 1);
            assert_eq!(engine.lock_count(&mesh), 2);
            assert!(!engine.workflow().is_revealed(&mesh.object_id()));
            assert_eq!(mesh.hidden(ElemKind::Vert), vec![1, 2]);
            assert!(!mesh.flags(ElemKind::Vert, 0).unwrap().hidden);
        }

        #[test]
        fn requires_revealed() {
            let (mut engine, mut mesh) = locked(&[0], 3);
            let outcome = engine.commit_unlock(&mut mesh);
            assert_eq!(outcome.message(), messages::NOT_REVEALED);
            assert_eq!(engine.lock_count(&mesh), 1);
        }

        #[test]
        fn no_locked_in_selection_stays_revealed() {
            let (mut engine, mut mesh) = locked(&[0], 3);
            engine.begin_unlock(&mut mesh);
            mesh.select(ElemKind::Vert, &[2], false).unwrap();

            let outcome = engine.commit_unlock(&mut mesh);

            assert_eq!(outcome.message(), messages::NO_LOCKED_IN_SELECTION);
            assert!(engine.workflow().is_revealed(&mesh.object_id()));
            assert_eq!(engine.lock_count(&mesh), 1);
        }

        #[test]
        fn missing_lock_data_resets_mode() {
            let (mut engine, mut mesh) = locked(&[0], 3);
            engine.begin_unlock(&mut mesh);
            mesh.data_mut().attributes.clear();
            mesh.open_session();

            let outcome = engine.commit_unlock(&mut mesh);
            assert_eq!(outcome.message(), messages::MISSING_LOCK_DATA);
            assert!(!engine.workflow().is_revealed(&mesh.object_id()));
        }

        #[test]
        fn edge_mode_projects_selection() {
            let mut engine = LockEngine::new(LayerName::default());
            let mut mesh = MemoryMesh::grid(2, 0);
            mesh.select(ElemKind::Vert, &[0, 1, 2], false).unwrap();
            engine.lock_selection(&mut mesh);
            engine.begin_unlock(&mut mesh);

            mesh.set_select_mode(SelectMode::Edge);
            mesh.select(ElemKind::Edge, &[1], false).unwrap();
            let outcome = engine.commit_unlock(&mut mesh);

            assert_eq!(outcome.count(), 2);
            assert_eq!(engine.lock_count(&mesh), 1);
            assert_eq!(mesh.hidden(ElemKind::Vert), vec![0]);
        }
    }

    mod cancel {
        use super::*;

        #[test]
        fn rehides_and_returns_to_normal() {
            let (mut engine, mut mesh) = locked(&[0, 1], 4);
            engine.begin_unlock(&mut mesh);
            let outcome = engine.cancel_unlock(&mut mesh);

            assert_eq!(outcome.message(), messages::UNLOCK_CANCELLED);
            assert_eq!(mesh.hidden(ElemKind::Vert), vec![0, 1]);
            assert!(!engine.workflow().is_revealed(&mesh.object_id()));
        }

        #[test]
        fn succeeds_in_normal_mode() {
            let mut engine = LockEngine::new(LayerName::default());
            let mut mesh = MemoryMesh::points(2);
            assert!(engine.cancel_unlock(&mut mesh).is_finished());
        }
    }

    mod all {
        use super::*;

        #[test]
        fn clears_everything() {
            let (mut engine, mut mesh) = locked(&[0, 2], 4);
            mesh.set_hidden(ElemKind::Vert, 3, true).unwrap();

            let outcome = engine.unlock_all(&mut mesh);

            assert_eq!(outcome.count(), 2);
            assert_eq!(engine.lock_count(&mesh), 0);
            assert!(mesh.hidden(ElemKind::Vert).is_empty());
            assert_eq!(mesh.attribute(DEFAULT_LAYER_NAME), Some(vec![0, 0, 0, 0]));
        }

        #[test]
        fn from_revealed_forces_normal() {
            let (mut engine, mut mesh) = locked(&[1], 2);
            engine.begin_unlock(&mut mesh);
            engine.unlock_all(&mut mesh);
            assert!(!engine.workflow().is_revealed(&mesh.object_id()));
        }

        #[test]
        fn nothing_locked_changes_nothing() {
            let mut engine = LockEngine::new(LayerName::default());
            let mut mesh = MemoryMesh::points(3);
            mesh.set_hidden(ElemKind::Vert, 1, true).unwrap();
            let before = mesh.data().clone();

            let outcome = engine.unlock_all(&mut mesh);

            assert_eq!(outcome.reason(), Some(CancelReason::Precondition));
            assert_eq!(outcome.message(), messages::NO_LOCKED);
            assert_eq!(mesh.data(), &before);
        }
    }
}
