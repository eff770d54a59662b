//! Cross-cutting placement checks.
//!
//! # Responsibility
//! - Reject item sets the target container cannot take.
//! - Reject location sets that collide, leave the container, or overflow it.
//! - Infer fill dimensions from the target grid.
//!
//! # Invariants
//! - Every function here is a read-only check over snapshots.

use crate::model::container::{Container, GridDimensions, Location};
use crate::placement::resolver::PlacementCandidate;
use crate::placement::strategy::{GridFill, PlacementStrategy};
use crate::placement::{PlacementError, PlacementResult};
use std::collections::HashSet;

/// Checks that explicit locations pair up one-to-one with the items.
///
/// Runs before any per-item check so a short location list is always
/// reported as `ArityMismatch`.
pub fn check_arity(strategy: &PlacementStrategy, items: usize) -> PlacementResult<()> {
    match strategy {
        PlacementStrategy::ByLocation { locations } if locations.len() != items => {
            Err(PlacementError::ArityMismatch {
                items,
                locations: locations.len(),
            })
        }
        _ => Ok(()),
    }
}

/// Checks the requested items against container flags and each other.
///
/// # Errors
/// - `DuplicateItem` when one item appears twice.
/// - `CycleDetected` when the target is one of the items.
/// - `UnsupportedItemKind` when storage flags reject an item.
/// - `ItemAlreadyPlaced` when an item still sits in a container.
pub fn check_candidates(
    container: &Container,
    candidates: &[PlacementCandidate],
) -> PlacementResult<()> {
    let mut seen = HashSet::with_capacity(candidates.len());
    for candidate in candidates {
        if !seen.insert(candidate.item_id) {
            return Err(PlacementError::DuplicateItem(candidate.item_id));
        }
        if candidate.item_id == container.id {
            return Err(PlacementError::CycleDetected {
                item_id: candidate.item_id,
                container_id: container.id,
            });
        }
        if !container.accepts(candidate.kind) {
            return Err(PlacementError::UnsupportedItemKind {
                item_id: candidate.item_id,
                kind: candidate.kind,
            });
        }
        if candidate.placement.is_some() {
            return Err(PlacementError::ItemAlreadyPlaced(candidate.item_id));
        }
    }
    Ok(())
}

/// Checks target locations against bounds, occupancy and capacity.
///
/// # Errors
/// - `OutOfBounds` for locations outside the layout.
/// - `LocationCollision` for occupied or repeated locations.
/// - `CapacityExceeded` when occupancy would pass the container capacity.
pub fn check_locations(container: &Container, locations: &[Location]) -> PlacementResult<()> {
    let mut requested = HashSet::with_capacity(locations.len());
    for location in locations {
        if !container.location_in_bounds(*location) {
            return Err(PlacementError::OutOfBounds(*location));
        }
        if container.is_occupied(*location) || !requested.insert(*location) {
            return Err(PlacementError::LocationCollision(*location));
        }
    }
    check_capacity(container, locations.len())
}

/// Checks that `additional` more occupants fit.
pub fn check_capacity(container: &Container, additional: usize) -> PlacementResult<()> {
    let Some(capacity) = container.capacity() else {
        return Ok(());
    };
    let occupied = container.occupied_slots() as u64;
    let requested = additional as u64;
    if occupied.saturating_add(requested) > capacity {
        return Err(PlacementError::CapacityExceeded {
            capacity,
            occupied,
            requested,
        });
    }
    Ok(())
}

/// Resolves the grid a row/column fill walks over.
///
/// Supplied totals win; omitted totals come from the container's grid.
///
/// # Errors
/// - `DimensionsRequired` when totals are omitted and the target is no grid.
/// - `NotAGrid` when totals are supplied for a non-grid target.
/// - `OutOfBounds` when the start cell lies outside the resolved grid.
pub fn resolve_fill_dimensions(
    container: &Container,
    fill: &GridFill,
) -> PlacementResult<GridDimensions> {
    let dimensions = match (fill.total_columns, fill.total_rows) {
        (Some(columns), Some(rows)) => {
            if container.dimensions_of().is_err() {
                return Err(PlacementError::NotAGrid(container.kind()));
            }
            GridDimensions::new(rows, columns)
        }
        (columns, rows) => {
            let inferred = container
                .dimensions_of()
                .map_err(|_| PlacementError::DimensionsRequired(container.kind()))?;
            GridDimensions::new(
                rows.unwrap_or(inferred.rows),
                columns.unwrap_or(inferred.columns),
            )
        }
    };

    if !dimensions.contains(fill.start()) {
        return Err(PlacementError::OutOfBounds(fill.start()));
    }
    Ok(dimensions)
}
