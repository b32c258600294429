//! engine::workflow
//!
//! Per-object unlock workflow state.
//!
//! # States
//!
//! ```text
//!            begin_unlock (something locked)
//!   Normal ───────────────────────────────▶ RevealedForUnlock
//!     ▲                                          │
//!     └──────────────────────────────────────────┘
//!      commit (≥1 locked in selection), cancel,
//!      unlock_all, lock, reconcile with nothing locked
//! ```
//!
//! The registry stores only revealed objects. An object without an entry is
//! in [`UnlockState::Normal`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::types::ObjectId;

/// Unlock workflow state of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlockState {
    /// Locked vertices are hidden and guarded.
    #[default]
    Normal,
    /// Locked vertices are shown so a subset can be selected for unlock.
    RevealedForUnlock,
}

impl UnlockState {
    /// Whether locked vertices are currently revealed.
    pub fn is_revealed(&self) -> bool {
        matches!(self, UnlockState::RevealedForUnlock)
    }
}

/// Engine-owned map of unlock states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowRegistry {
    states: HashMap<ObjectId, UnlockState>,
}

impl WorkflowRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// State of an object.
    pub fn state(&self, object: &ObjectId) -> UnlockState {
        self.states.get(object).copied().unwrap_or_default()
    }

    /// Whether the object is revealed for unlock.
    pub fn is_revealed(&self, object: &ObjectId) -> bool {
        self.state(object).is_revealed()
    }

    /// Enter the revealed state.
    pub fn reveal(&mut self, object: ObjectId) {
        self.states.insert(object, UnlockState::RevealedForUnlock);
    }

    /// Return to normal. Returns `true` if the object was revealed.
    pub fn set_normal(&mut self, object: &ObjectId) -> bool {
        self.states.remove(object).is_some()
    }

    /// Drop any state for an object that no longer exists.
    pub fn forget(&mut self, object: &ObjectId) {
        self.states.remove(object);
    }

    /// Drop all state.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Objects currently revealed.
    pub fn revealed(&self) -> impl Iterator<Item = &ObjectId> {
        self.states
            .iter()
            .filter(|(_, s)| s.is_revealed())
            .map(|(id, _)| id)
    }

    /// Number of revealed objects.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// No object is revealed.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_normal() {
        let registry = WorkflowRegistry::new();
        let id = ObjectId::new();
        assert_eq!(registry.state(&id), UnlockState::Normal);
        assert!(!registry.is_revealed(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn reveal_and_return() {
        let mut registry = WorkflowRegistry::new();
        let id = ObjectId::new();
        registry.reveal(id);
        assert!(registry.is_revealed(&id));
        assert!(registry.set_normal(&id));
        assert!(!registry.set_normal(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn scoped_per_object() {
        let mut registry = WorkflowRegistry::new();
        let a = ObjectId::new();
        let b = ObjectId::new();
        registry.reveal(a);
        assert!(!registry.is_revealed(&b));
        assert_eq!(registry.revealed().collect::<Vec<_>>(), vec![&a]);
    }

    #[test]
    fn forget_and_clear() {
        let mut registry = WorkflowRegistry::new();
        let a = ObjectId::new();
        let b = ObjectId::new();
        registry.reveal(a);
        registry.reveal(b);
        registry.forget(&a);
        assert_eq!(registry.len(), 1);
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn serde_roundtrip() {
        let mut registry = WorkflowRegistry::new();
        let id = ObjectId::new();
        registry.reveal(id);

        let json = serde_json::to_string(&registry).unwrap();
        assert!(json.contains("revealed_for_unlock"));
        let parsed: WorkflowRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, registry);
    }
}
