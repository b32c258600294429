//! engine::health
//!
//! Fixups applied by the reconciler and the report that collects them.
//!
//! # Architecture
//!
//! Every public operation starts with a reconcile pass. When that pass has to
//! correct the lock state, each correction is recorded as a [`Fixup`] with a
//! stable, deterministic [`FixupId`] so the same correction on the same
//! object is recognisable across runs (for example in `mlk doctor` output).
//!
//! # Example
//!
//! ```
//! use meshlock::core::types::ObjectId;
//! use meshlock::engine::health::{fixups, FixupKind, HealthReport};
//!
//! let object = ObjectId::new();
//! let mut report = HealthReport::new(object);
//! report.add(fixups::persisted_resynced(&object, 2, 3));
//!
//! assert!(!report.is_clean());
//! assert_eq!(report.fixups()[0].kind, FixupKind::PersistedResynced);
//! ```

use std::fmt;

use serde::Serialize;

use crate::core::types::{FixupId, ObjectId};

/// What a reconcile correction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixupKind {
    /// The persisted array was rewritten from the working tags.
    PersistedResynced,
    /// Unlock mode was cleared because nothing is locked.
    StaleUnlockCleared,
    /// Locked vertices that were visible or selected were hidden again.
    LockedResealed,
}

impl FixupKind {
    /// Stable slug used in ids and output.
    pub fn slug(&self) -> &'static str {
        match self {
            FixupKind::PersistedResynced => "persisted-resynced",
            FixupKind::StaleUnlockCleared => "stale-unlock-cleared",
            FixupKind::LockedResealed => "locked-resealed",
        }
    }
}

impl fmt::Display for FixupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

/// One correction applied (or planned) by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fixup {
    /// Stable identifier (kind + object).
    pub id: FixupId,
    /// Kind of correction.
    pub kind: FixupKind,
    /// Human-readable description.
    pub message: String,
}

impl Fixup {
    /// Create a fixup for an object.
    pub fn new(kind: FixupKind, object: &ObjectId, message: impl Into<String>) -> Self {
        Self {
            id: FixupId::new(kind.slug(), &object.to_string()),
            kind,
            message: message.into(),
        }
    }
}

/// Fixups gathered for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    object: ObjectId,
    fixups: Vec<Fixup>,
}

impl HealthReport {
    /// Create an empty report.
    pub fn new(object: ObjectId) -> Self {
        Self {
            object,
            fixups: Vec::new(),
        }
    }

    /// The object the report is about.
    pub fn object(&self) -> ObjectId {
        self.object
    }

    /// Record a fixup.
    pub fn add(&mut self, fixup: Fixup) {
        self.fixups.push(fixup);
    }

    /// Record several fixups.
    pub fn extend(&mut self, fixups: impl IntoIterator<Item = Fixup>) {
        self.fixups.extend(fixups);
    }

    /// All fixups, in the order they were applied.
    pub fn fixups(&self) -> &[Fixup] {
        &self.fixups
    }

    /// Find a fixup by kind.
    pub fn find(&self, kind: FixupKind) -> Option<&Fixup> {
        self.fixups.iter().find(|f| f.kind == kind)
    }

    /// No corrections were needed.
    pub fn is_clean(&self) -> bool {
        self.fixups.is_empty()
    }
}

/// Constructors for the fixups the reconciler emits.
pub mod fixups {
    use super::*;

    /// Persisted array rewritten from working tags.
    pub fn persisted_resynced(object: &ObjectId, persisted: usize, working: usize) -> Fixup {
        Fixup::new(
            FixupKind::PersistedResynced,
            object,
            format!(
                "persisted lock count {} disagreed with working count {}; rewrote persisted",
                persisted, working
            ),
        )
    }

    /// Persisted array created because working tags had nowhere to persist.
    pub fn persisted_created(object: &ObjectId, working: usize) -> Fixup {
        Fixup::new(
            FixupKind::PersistedResynced,
            object,
            format!(
                "persisted lock attribute missing with {} locked working vertices; created it",
                working
            ),
        )
    }

    /// Persisted array rewritten because its length no longer matches the mesh.
    pub fn persisted_realigned(object: &ObjectId, len: usize, verts: usize) -> Fixup {
        Fixup::new(
            FixupKind::PersistedResynced,
            object,
            format!(
                "persisted lock attribute had {} entries for {} vertices; rewrote persisted",
                len, verts
            ),
        )
    }

    /// Unlock mode cleared with nothing locked.
    pub fn stale_unlock_cleared(object: &ObjectId) -> Fixup {
        Fixup::new(
            FixupKind::StaleUnlockCleared,
            object,
            "unlock mode was set but nothing is locked; cleared it",
        )
    }

    /// Locked vertices resealed.
    pub fn locked_resealed(object: &ObjectId, exposed: usize) -> Fixup {
        Fixup::new(
            FixupKind::LockedResealed,
            object,
            format!(
                "{} locked vertices were visible or selected; hid them again",
                exposed
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_per_object() {
        let object = ObjectId::new();
        let a = fixups::locked_resealed(&object, 1);
        let b = fixups::locked_resealed(&object, 5);
        assert_eq!(a.id, b.id);
        assert!(a.id.as_str().starts_with("locked-resealed:"));
    }

    #[test]
    fn ids_differ_between_objects() {
        let a = fixups::stale_unlock_cleared(&ObjectId::new());
        let b = fixups::stale_unlock_cleared(&ObjectId::new());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn created_and_resynced_share_kind() {
        let object = ObjectId::new();
        assert_eq!(
            fixups::persisted_created(&object, 2).kind,
            fixups::persisted_resynced(&object, 1, 2).kind
        );
    }

    #[test]
    fn report_find() {
        let object = ObjectId::new();
        let mut report = HealthReport::new(object);
        assert!(report.is_clean());
        report.extend([
            fixups::persisted_resynced(&object, 0, 1),
            fixups::locked_resealed(&object, 1),
        ]);
        assert_eq!(report.fixups().len(), 2);
        assert!(report.find(FixupKind::LockedResealed).is_some());
        assert!(report.find(FixupKind::StaleUnlockCleared).is_none());
        assert_eq!(report.object(), object);
    }

    #[test]
    fn serializes_kind_as_slug() {
        let fixup = fixups::stale_unlock_cleared(&ObjectId::new());
        let json = serde_json::to_value(&fixup).unwrap();
        assert_eq!(json["kind"], "stale-unlock-cleared");
    }
}
