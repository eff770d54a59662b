//! Inventory domain model.
//!
//! # Responsibility
//! - Define quantities, tags, items and containers used by placement logic.
//! - Validate model invariants at construction time.
//!
//! # Invariants
//! - Every item and container is identified by a stable `ItemId`.
//! - Model types are storage-agnostic and free of I/O.

pub mod container;
pub mod item;
pub mod quantity;
pub mod tag;
