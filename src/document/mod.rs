//! document
//!
//! The scene document used by the `mlk` command-line host.
//!
//! # Modules
//!
//! - [`schema`] - Versioned JSON schema, parsing and validation
//! - [`store`] - Atomic load/save
//! - [`lock`] - Exclusive per-document lock held for a whole invocation
//!
//! A scene holds objects (meshes and empties), the active object, the
//! host-wide selection mode and the unlock workflow state, so that each
//! invocation can rebuild a [`LockEngine`](crate::engine::LockEngine) exactly
//! where the previous one left off.

pub mod lock;
pub mod schema;
pub mod store;

pub use lock::{DocumentLock, DocumentLockError};
pub use schema::{
    parse_document, DocumentError, ObjectKind, ObjectMode, SceneDocument, SceneObject,
    DOCUMENT_KIND, SCHEMA_VERSION,
};
pub use store::DocumentStore;
