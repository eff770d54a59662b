//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into placement and registry use cases.
//! - Keep callers decoupled from storage details.
//!
//! # Invariants
//! - Services are generic over `InventoryStore` and hold no global state.

pub mod container_service;
pub mod error;
pub mod item_service;
pub mod placement_service;
