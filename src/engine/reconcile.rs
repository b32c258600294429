//! engine::reconcile
//!
//! The consistency reconciler.
//!
//! # Architecture
//!
//! Reconciliation is split in two:
//!
//! - [`plan`] is a pure function from a [`LockSnapshot`] (persisted tags,
//!   working tags, vertex flags, unlock mode) to a [`ReconcilePlan`]
//! - [`apply`] writes a plan back through the host, working layer first,
//!   persisted attribute second
//!
//! The plan performs, in order:
//!
//! 1. Load persisted tags over the working tags (index-aligned; the working
//!    tail past the persisted array is kept)
//! 2. Rewrite the persisted array from the working tags when it is missing
//!    while something is locked, when its locked count disagrees, or when its
//!    length no longer matches the vertex count
//! 3. With unlock mode set and nothing locked: clear the mode
//! 4. Otherwise, in normal mode: if any locked vertex is visible or selected,
//!    hide and deselect every locked vertex
//!
//! Running [`plan`] on the state produced by [`apply`] yields a no-op plan.
//!
//! # Example
//!
//! ```
//! use meshlock::core::types::{ElemFlags, ObjectId};
//! use meshlock::engine::reconcile::{plan, LockSnapshot};
//!
//! let snapshot = LockSnapshot {
//!     object: ObjectId::new(),
//!     persisted: Some(vec![1, 0]),
//!     working: None,
//!     verts: vec![ElemFlags::VISIBLE; 2],
//!     unlock_mode: false,
//! };
//!
//! let plan = plan(&snapshot);
//! assert_eq!(plan.working, Some(vec![1, 0]));
//! assert_eq!(plan.reseal, vec![0]);
//! assert!(plan.persist.is_none());
//! ```

use crate::core::cache::WorkingCache;
use crate::core::store::{overlay_persisted, LockStore};
use crate::core::types::{count_locked, is_locked, lock_tag, ElemFlags, ElemKind, ObjectId};
use crate::host::{HostError, MeshEditor};

use super::health::{fixups, Fixup};

/// Everything the reconciler reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSnapshot {
    /// Object being reconciled
    pub object: ObjectId,
    /// Persisted tags, if the attribute exists
    pub persisted: Option<Vec<i32>>,
    /// Working tags, if the layer exists
    pub working: Option<Vec<i32>>,
    /// Flags of every vertex, in index order
    pub verts: Vec<ElemFlags>,
    /// Whether the object is revealed for unlock
    pub unlock_mode: bool,
}

impl LockSnapshot {
    /// Read the current state from the host.
    pub fn capture(
        mesh: &dyn MeshEditor,
        store: &LockStore,
        cache: &WorkingCache,
        unlock_mode: bool,
    ) -> Result<Self, HostError> {
        let verts = (0..mesh.len(ElemKind::Vert))
            .map(|v| mesh.flags(ElemKind::Vert, v))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            object: mesh.object_id(),
            persisted: store.read(mesh),
            working: cache.get(mesh),
            verts,
            unlock_mode,
        })
    }
}

/// Corrections the reconciler wants applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Working tags to write (set whenever persisted tags were loaded)
    pub working: Option<Vec<i32>>,
    /// Replacement persisted array
    pub persist: Option<Vec<i32>>,
    /// Locked vertices to hide and deselect
    pub reseal: Vec<usize>,
    /// Unlock mode must be cleared
    pub clear_unlock_mode: bool,
    /// Selection history must be cleared and the host refreshed
    pub refresh: bool,
    /// Corrections, for reporting
    pub fixups: Vec<Fixup>,
}

impl ReconcilePlan {
    /// Whether applying the plan changes anything beyond the load step.
    pub fn is_noop(&self) -> bool {
        self.persist.is_none() && self.reseal.is_empty() && !self.clear_unlock_mode
    }
}

/// Compute the corrections for a snapshot.
pub fn plan(snapshot: &LockSnapshot) -> ReconcilePlan {
    let mut out = ReconcilePlan::default();
    let vert_count = snapshot.verts.len();

    // 1. persisted -> working
    if let Some(persisted) = &snapshot.persisted {
        let mut working = snapshot
            .working
            .clone()
            .unwrap_or_else(|| vec![0; vert_count]);
        working.resize(vert_count, 0);
        overlay_persisted(persisted, &mut working);
        out.working = Some(working);
    }

    let working = out.working.as_deref().or(snapshot.working.as_deref());
    let working_count = working.map(count_locked).unwrap_or(0);

    // 2. working -> persisted on divergence
    if let Some(working) = working {
        let normalised = || -> Vec<i32> {
            working.iter().map(|v| lock_tag(is_locked(*v))).collect()
        };
        match &snapshot.persisted {
            None if working_count > 0 => {
                out.persist = Some(normalised());
                out.fixups
                    .push(fixups::persisted_created(&snapshot.object, working_count));
            }
            Some(persisted) if count_locked(persisted) != working_count => {
                out.persist = Some(normalised());
                out.fixups.push(fixups::persisted_resynced(
                    &snapshot.object,
                    count_locked(persisted),
                    working_count,
                ));
            }
            Some(persisted) if persisted.len() != vert_count => {
                out.persist = Some(normalised());
                out.fixups.push(fixups::persisted_realigned(
                    &snapshot.object,
                    persisted.len(),
                    vert_count,
                ));
            }
            _ => {}
        }
    }

    if snapshot.unlock_mode {
        // 3. stale unlock mode
        if working_count == 0 {
            out.clear_unlock_mode = true;
            out.refresh = true;
            out.fixups
                .push(fixups::stale_unlock_cleared(&snapshot.object));
        }
    } else if let Some(working) = working {
        // 4. locked => hidden and unselected
        let locked: Vec<usize> = working
            .iter()
            .enumerate()
            .filter(|(v, tag)| is_locked(**tag) && *v < vert_count)
            .map(|(v, _)| v)
            .collect();
        let exposed = locked
            .iter()
            .filter(|v| !snapshot.verts[**v].is_sealed())
            .count();
        if exposed > 0 {
            out.reseal = locked;
            out.refresh = true;
            out.fixups
                .push(fixups::locked_resealed(&snapshot.object, exposed));
        }
    }

    out
}

/// Write a plan back to the host.
///
/// Unlock mode is engine state and is left to the caller.
pub fn apply(
    mesh: &mut dyn MeshEditor,
    store: &LockStore,
    cache: &WorkingCache,
    plan: &ReconcilePlan,
) -> Result<(), HostError> {
    if let Some(working) = &plan.working {
        cache.ensure(mesh);
        let name = cache.layer().as_str();
        for (vert, value) in working.iter().enumerate() {
            mesh.set_vert_layer_value(name, vert, *value)?;
        }
    }

    if let Some(persist) = &plan.persist {
        mesh.write_attribute(store.layer().as_str(), persist.clone())?;
    }

    for &vert in &plan.reseal {
        mesh.set_hidden(ElemKind::Vert, vert, true)?;
        mesh.set_selected(ElemKind::Vert, vert, false)?;
    }

    if plan.refresh {
        mesh.clear_select_history();
        mesh.update(false);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::LayerName;
    use crate::host::MemoryMesh;

    fn snapshot(
        persisted: Option<Vec<i32>>,
        working: Option<Vec<i32>>,
        verts: Vec<ElemFlags>,
        unlock_mode: bool,
    ) -> LockSnapshot {
        LockSnapshot {
            object: ObjectId::new(),
            persisted,
            working,
            verts,
            unlock_mode,
        }
    }

    const SEALED: ElemFlags = ElemFlags {
        hidden: true,
        selected: false,
    };

    mod planning {
        use super::*;

        #[test]
        fn nothing_anywhere_is_noop() {
            let plan = plan(&snapshot(None, None, vec![ElemFlags::VISIBLE; 3], false));
            assert!(plan.is_noop());
            assert!(plan.working.is_none());
            assert!(plan.fixups.is_empty());
        }

        #[test]
        fn consistent_state_is_noop() {
            let plan = plan(&snapshot(
                Some(vec![1, 0]),
                Some(vec![1, 0]),
                vec![SEALED, ElemFlags::VISIBLE],
                false,
            ));
            assert!(plan.is_noop());
            assert!(!plan.refresh);
        }

        #[test]
        fn working_without_persisted_creates_it() {
            let plan = plan(&snapshot(
                None,
                Some(vec![0, 1, 0]),
                vec![ElemFlags::VISIBLE, SEALED, ElemFlags::VISIBLE],
                false,
            ));
            assert_eq!(plan.persist, Some(vec![0, 1, 0]));
            assert_eq!(plan.fixups.len(), 1);
        }

        #[test]
        fn short_persisted_keeps_working_tail() {
            let plan = plan(&snapshot(
                Some(vec![1]),
                Some(vec![0, 0, 1]),
                vec![SEALED, ElemFlags::VISIBLE, SEALED],
                false,
            ));
            assert_eq!(plan.working, Some(vec![1, 0, 1]));
            assert_eq!(plan.persist, Some(vec![1, 0, 1]));
        }

        #[test]
        fn long_persisted_is_realigned() {
            let plan = plan(&snapshot(
                Some(vec![1, 0, 0, 0]),
                None,
                vec![SEALED, ElemFlags::VISIBLE],
                false,
            ));
            assert_eq!(plan.persist, Some(vec![1, 0]));
        }

        #[test]
        fn exposed_lock_reseals_all_locked() {
            let plan = plan(&snapshot(
                Some(vec![1, 1, 0]),
                None,
                vec![
                    SEALED,
                    ElemFlags {
                        hidden: false,
                        selected: true,
                    },
                    ElemFlags::VISIBLE,
                ],
                false,
            ));
            assert_eq!(plan.reseal, vec![0, 1]);
            assert!(plan.refresh);
        }

        #[test]
        fn unlock_mode_leaves_locked_visible() {
            let plan = plan(&snapshot(
                Some(vec![1]),
                None,
                vec![ElemFlags::VISIBLE],
                true,
            ));
            assert!(plan.reseal.is_empty());
            assert!(!plan.clear_unlock_mode);
        }

        #[test]
        fn unlock_mode_without_locks_is_cleared() {
            let plan = plan(&snapshot(
                Some(vec![0, 0]),
                None,
                vec![ElemFlags::VISIBLE; 2],
                true,
            ));
            assert!(plan.clear_unlock_mode);
            assert!(plan.refresh);
        }

        #[test]
        fn garbage_tags_are_unlocked() {
            let plan = plan(&snapshot(
                Some(vec![3, -1]),
                None,
                vec![ElemFlags::VISIBLE; 2],
                false,
            ));
            assert_eq!(plan.working, Some(vec![0, 0]));
            assert!(plan.reseal.is_empty());
        }
    }

    mod applying {
        use super::*;
        use crate::host::HostOp;

        fn accessors() -> (LockStore, WorkingCache) {
            (
                LockStore::new(LayerName::default()),
                WorkingCache::new(LayerName::default()),
            )
        }

        #[test]
        fn apply_converges() {
            let (store, cache) = accessors();
            let mut mesh = MemoryMesh::points(4);
            mesh.write_attribute(store.layer().as_str(), vec![0, 1, 1])
                .unwrap();
            mesh.select(ElemKind::Vert, &[1], false).unwrap();

            let first = LockSnapshot::capture(&mesh, &store, &cache, false).unwrap();
            let first_plan = plan(&first);
            apply(&mut mesh, &store, &cache, &first_plan).unwrap();

            assert_eq!(store.read(&mesh), Some(vec![0, 1, 1, 0]));
            assert!(mesh.flags(ElemKind::Vert, 1).unwrap().is_sealed());
            assert!(mesh.flags(ElemKind::Vert, 2).unwrap().is_sealed());

            let second = LockSnapshot::capture(&mesh, &store, &cache, false).unwrap();
            assert!(plan(&second).is_noop());
        }

        #[test]
        fn refresh_clears_history() {
            let (store, cache) = accessors();
            let mut mesh = MemoryMesh::points(2);
            mesh.write_attribute(store.layer().as_str(), vec![1, 0])
                .unwrap();

            let snap = LockSnapshot::capture(&mesh, &store, &cache, false).unwrap();
            apply(&mut mesh, &store, &cache, &plan(&snap)).unwrap();

            assert!(mesh.operations().contains(&HostOp::ClearHistory));
            assert!(mesh
                .operations()
                .contains(&HostOp::Update { destructive: false }));
        }
    }
}
