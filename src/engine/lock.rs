//! engine::lock
//!
//! Lock the current selection.

use std::collections::BTreeSet;

use tracing::debug;

use super::outcome::{messages, Outcome};
use super::projector::project_to_vertices;
use super::LockEngine;
use crate::core::types::{ElemKind, SelectMode};
use crate::host::{HostError, MeshEditor};

impl LockEngine {
    /// Tag, hide and deselect every vertex implied by the selection.
    ///
    /// Locking while revealed for unlock returns the object to normal mode
    /// first, so every locked vertex (old and new) ends up hidden. The count
    /// reports newly locked vertices only: re-locking hides and deselects but
    /// does not count.
    pub fn lock_selection(&mut self, mesh: &mut dyn MeshEditor) -> Outcome {
        self.run("lock_selection", mesh, |engine, mesh| engine.lock_inner(mesh))
    }

    fn lock_inner(&mut self, mesh: &mut dyn MeshEditor) -> Result<Outcome, HostError> {
        self.reconcile(mesh)?;

        let mode = mesh.select_mode();
        let verts = project_to_vertices(mesh, mode)?;
        if verts.is_empty() {
            return Ok(Outcome::precondition(messages::NO_SELECTION));
        }

        let was_revealed = self.workflow.set_normal(&mesh.object_id());
        self.store.ensure_layer(mesh)?;
        self.cache.ensure(mesh);

        if mode != SelectMode::Vertex {
            Self::deselect_kind(mesh, ElemKind::Edge)?;
            Self::deselect_kind(mesh, ElemKind::Face)?;
        }

        let mut newly_locked = 0;
        for &v in &verts {
            if !self.cache.is_locked(mesh, v) {
                self.cache.set(mesh, v, true)?;
                newly_locked += 1;
            }
            mesh.set_hidden(ElemKind::Vert, v, true)?;
            mesh.set_selected(ElemKind::Vert, v, false)?;
        }

        Self::clear_incident_selection(mesh, &verts)?;
        if was_revealed {
            self.seal_locked(mesh)?;
        }

        mesh.clear_select_history();
        self.store.save_from(mesh)?;
        mesh.update(false);

        Ok(Outcome::finished(
            format!("locked {} vertices", newly_locked),
            newly_locked,
        ))
    }

    /// Deselect edges and faces touching the given vertices.
    ///
    /// A stale reference skips only the vertex it was found on.
    fn clear_incident_selection(
        mesh: &mut dyn MeshEditor,
        verts: &BTreeSet<usize>,
    ) -> Result<(), HostError> {
        for &v in verts {
            let incident = mesh
                .vert_edges(v)
                .and_then(|edges| mesh.vert_faces(v).map(|faces| (edges, faces)));
            let (edges, faces) = match incident {
                Ok(found) => found,
                Err(e) if e.is_stale() => {
                    debug!(vert = v, error = %e, "skipping stale vertex");
                    continue;
                }
                Err(e) => return Err(e),
            };

            for e in edges {
                mesh.set_selected(ElemKind::Edge, e, false)?;
            }
            for f in faces {
                mesh.set_selected(ElemKind::Face, f, false)?;
            }
        }
        Ok(())
    }
}
