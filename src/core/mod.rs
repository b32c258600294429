//! core
//!
//! Core domain types and lock storage for meshlock.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ObjectId, LayerName, SelectMode, ElemFlags, etc.
//! - [`store`] - The persisted lock attribute
//! - [`cache`] - The working lock layer of an open edit session
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Lock counts are always recomputed, never cached

pub mod cache;
pub mod config;
pub mod store;
pub mod types;
