//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the inventory storage contract used by services.
//! - Isolate SQLite query details from placement and registry orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Item::validate()` before persistence.
//! - Placement commits are all-or-nothing per container.
//! - Repository APIs return semantic errors (`ItemNotFound`,
//!   `LocationOccupied`) in addition to DB transport errors.

pub mod inventory_repo;
