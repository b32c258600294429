//! host
//!
//! The boundary between the lock engine and the editor that owns the mesh.
//!
//! - [`traits`] - The [`MeshEditor`] trait and [`HostError`]
//! - [`memory`] - [`MemoryMesh`], an in-memory editor used by the CLI and tests
//!
//! The engine only ever sees `&dyn MeshEditor` / `&mut dyn MeshEditor`, borrowed
//! for the length of one operation.

pub mod memory;
pub mod traits;

pub use memory::{EdgeData, FaceData, FailOn, HostOp, MemoryMesh, MeshData, VertData};
pub use traits::{HostError, MeshEditor, Position};
