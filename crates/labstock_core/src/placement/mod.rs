//! Placement strategy resolution and validation.
//!
//! # Responsibility
//! - Map a set of items onto destination locations inside one container.
//! - Check every placement rule before anything is committed.
//!
//! # Invariants
//! - Resolution is pure: it reads a container snapshot and never mutates it.
//! - A resolved plan never targets an occupied or out-of-bounds location.

use crate::model::container::{ContainerKind, Location};
use crate::model::item::{ItemId, ItemKind};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod resolver;
pub mod strategy;
pub mod validation;

pub type PlacementResult<T> = Result<T, PlacementError>;

/// Placement rule violations detected before commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// More items than free cells between the start cell and the grid end.
    GridOverflow { requested: usize, available: usize },
    /// Explicit location count differs from item count.
    ArityMismatch { items: usize, locations: usize },
    /// Location lies outside the container's addressable range.
    OutOfBounds(Location),
    /// Location is occupied or requested twice.
    LocationCollision(Location),
    /// Container storage flags reject this item kind.
    UnsupportedItemKind { item_id: ItemId, kind: ItemKind },
    /// Row/column totals were omitted and the target is not a grid.
    DimensionsRequired(ContainerKind),
    /// Row/column fill was requested against a non-grid container.
    NotAGrid(ContainerKind),
    /// Same item listed more than once in one request.
    DuplicateItem(ItemId),
    /// Item is already placed; it must be removed first.
    ItemAlreadyPlaced(ItemId),
    /// Request would exceed the container's capacity.
    CapacityExceeded {
        capacity: u64,
        occupied: u64,
        requested: u64,
    },
    /// A container would end up inside itself.
    CycleDetected { item_id: ItemId, container_id: ItemId },
    /// Free-form containers need caller-supplied coordinates.
    ExplicitLocationsRequired(ContainerKind),
}

impl Display for PlacementError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GridOverflow {
                requested,
                available,
            } => write!(
                f,
                "grid overflow: {requested} items requested, {available} free cells available"
            ),
            Self::ArityMismatch { items, locations } => write!(
                f,
                "item/location count mismatch: {items} items, {locations} locations"
            ),
            Self::OutOfBounds(location) => write!(f, "location {location} is out of bounds"),
            Self::LocationCollision(location) => {
                write!(f, "location {location} is already taken")
            }
            Self::UnsupportedItemKind { item_id, kind } => {
                write!(f, "container does not accept {kind} item {item_id}")
            }
            Self::DimensionsRequired(kind) => write!(
                f,
                "row/column totals are required for {kind} containers"
            ),
            Self::NotAGrid(kind) => write!(f, "{kind} container has no grid to fill"),
            Self::DuplicateItem(item_id) => write!(f, "item listed twice: {item_id}"),
            Self::ItemAlreadyPlaced(item_id) => write!(
                f,
                "item {item_id} is already placed; remove it from its container first"
            ),
            Self::CapacityExceeded {
                capacity,
                occupied,
                requested,
            } => write!(
                f,
                "capacity {capacity} exceeded: {occupied} occupied, {requested} requested"
            ),
            Self::CycleDetected {
                item_id,
                container_id,
            } => write!(
                f,
                "placing container {item_id} into {container_id} would create a cycle"
            ),
            Self::ExplicitLocationsRequired(kind) => {
                write!(f, "{kind} containers need explicit locations")
            }
        }
    }
}

impl Error for PlacementError {}
