//! meshlock - Lock mesh vertices against accidental edits
//!
//! meshlock marks vertices of a mesh as locked, hides them, and refuses
//! deletes and moves that would touch them. Locked vertices can be revealed,
//! picked and unlocked through a small two-step workflow.
//!
//! # Architecture
//!
//! - [`core`] - Domain types, configuration, and the lock layer accessors
//! - [`host`] - The mesh editor abstraction and an in-memory implementation
//! - [`engine`] - Reconcile, project, lock, unlock and guard operations
//! - [`addon`] - Key bindings, overlay and panel around the engine
//! - [`document`] - Scene documents on disk for the `mlk` CLI
//! - [`cli`] - Command-line interface layer
//! - [`telemetry`] - Structured logging setup
//! - [`ui`] - Output formatting
//!
//! # Correctness Invariants
//!
//! 1. Every locked vertex is hidden and deselected outside unlock mode
//! 2. Working tags and the persisted attribute agree after every operation
//! 3. A guard that vetoes never reaches the native operator
//! 4. Commit unlocks exactly the locked vertices the selection touches

pub mod addon;
pub mod cli;
pub mod core;
pub mod document;
pub mod engine;
pub mod host;
pub mod telemetry;
pub mod ui;
