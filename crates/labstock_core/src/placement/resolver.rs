//! Placement strategy resolver.
//!
//! # Responsibility
//! - Generate target locations for each strategy.
//! - Run all validation checks and emit a commit-ready plan.
//!
//! # Invariants
//! - Assignments keep request order: the n-th item gets the n-th location.
//! - Occupied cells are skipped by fills and rejected for explicit locations.

use crate::model::container::{Container, ContainerLayout, Location};
use crate::model::item::{Item, ItemId, ItemKind, Placement};
use crate::placement::strategy::{FillOrder, GridCursor, GridFill, PlacementStrategy};
use crate::placement::validation::{
    check_arity, check_candidates, check_capacity, check_locations, resolve_fill_dimensions,
};
use crate::placement::{PlacementError, PlacementResult};
use serde::{Deserialize, Serialize};

/// Placement-relevant view of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementCandidate {
    pub item_id: ItemId,
    pub kind: ItemKind,
    pub placement: Option<Placement>,
}

impl From<&Item> for PlacementCandidate {
    fn from(item: &Item) -> Self {
        Self {
            item_id: item.id,
            kind: item.kind,
            placement: item.placement,
        }
    }
}

/// One resolved item destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemPlacement {
    pub item_id: ItemId,
    pub location: Location,
}

/// Validated assignment of items into one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementPlan {
    pub container_id: ItemId,
    pub assignments: Vec<ItemPlacement>,
}

impl PlacementPlan {
    pub fn locations(&self) -> Vec<Location> {
        self.assignments
            .iter()
            .map(|assignment| assignment.location)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Computes destinations for `candidates` inside `container`.
///
/// Checks location arity first, then validates items, then generates
/// locations and re-checks them against the snapshot's occupancy, bounds and
/// capacity.
pub fn resolve_placement(
    container: &Container,
    candidates: &[PlacementCandidate],
    strategy: &PlacementStrategy,
) -> PlacementResult<PlacementPlan> {
    check_arity(strategy, candidates.len())?;
    check_candidates(container, candidates)?;

    let locations = match strategy {
        PlacementStrategy::ByRow(fill) => {
            fill_grid(container, fill, FillOrder::RowMajor, candidates.len())?
        }
        PlacementStrategy::ByColumn(fill) => {
            fill_grid(container, fill, FillOrder::ColumnMajor, candidates.len())?
        }
        PlacementStrategy::ByLocation { locations } => locations.clone(),
        PlacementStrategy::NextAvailable => next_available(container, candidates.len())?,
    };

    check_locations(container, &locations)?;

    Ok(PlacementPlan {
        container_id: container.id,
        assignments: candidates
            .iter()
            .zip(locations)
            .map(|(candidate, location)| ItemPlacement {
                item_id: candidate.item_id,
                location,
            })
            .collect(),
    })
}

fn fill_grid(
    container: &Container,
    fill: &GridFill,
    order: FillOrder,
    count: usize,
) -> PlacementResult<Vec<Location>> {
    let dimensions = resolve_fill_dimensions(container, fill)?;
    let free: Vec<Location> = GridCursor::new(order, fill.start(), dimensions)
        .filter(|location| !container.is_occupied(*location))
        .take(count)
        .collect();
    if free.len() < count {
        return Err(PlacementError::GridOverflow {
            requested: count,
            available: free.len(),
        });
    }
    Ok(free)
}

fn next_available(container: &Container, count: usize) -> PlacementResult<Vec<Location>> {
    let capacity = match container.layout {
        ContainerLayout::Grid { .. } => {
            return fill_grid(container, &GridFill::from_origin(), FillOrder::RowMajor, count);
        }
        ContainerLayout::Image { .. } => {
            return Err(PlacementError::ExplicitLocationsRequired(container.kind()));
        }
        ContainerLayout::List { capacity } | ContainerLayout::Workbench { capacity } => capacity,
    };

    check_capacity(container, count)?;
    Ok((1..=capacity.unwrap_or(u32::MAX))
        .map(Location::slot)
        .filter(|location| !container.is_occupied(*location))
        .take(count)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{resolve_placement, PlacementCandidate};
    use crate::model::container::{Container, Location, NewContainer};
    use crate::model::item::{ItemKind, Placement};
    use crate::placement::strategy::{GridFill, PlacementStrategy};
    use crate::placement::PlacementError;
    use uuid::Uuid;

    fn candidates(count: usize, kind: ItemKind) -> Vec<PlacementCandidate> {
        (0..count)
            .map(|_| PlacementCandidate {
                item_id: Uuid::new_v4(),
                kind,
                placement: None,
            })
            .collect()
    }

    fn xy(plan_locations: Vec<Location>) -> Vec<(u32, u32)> {
        plan_locations
            .into_iter()
            .map(|location| (location.x, location.y))
            .collect()
    }

    #[test]
    fn by_row_fills_row_major() {
        let grid = Container::create(NewContainer::grid("box", 2, 3)).unwrap();
        let strategy = PlacementStrategy::ByRow(GridFill::from_origin().with_totals(3, 2));
        let plan = resolve_placement(&grid, &candidates(5, ItemKind::Subsample), &strategy).unwrap();
        assert_eq!(
            xy(plan.locations()),
            vec![(1, 1), (2, 1), (3, 1), (1, 2), (2, 2)]
        );
    }

    #[test]
    fn by_column_fills_column_major() {
        let grid = Container::create(NewContainer::grid("box", 2, 3)).unwrap();
        let strategy = PlacementStrategy::ByColumn(GridFill::from_origin().with_totals(3, 2));
        let plan = resolve_placement(&grid, &candidates(5, ItemKind::Subsample), &strategy).unwrap();
        assert_eq!(
            xy(plan.locations()),
            vec![(1, 1), (1, 2), (2, 1), (2, 2), (3, 1)]
        );
    }

    #[test]
    fn by_row_skips_occupied_cells() {
        let mut grid = Container::create(NewContainer::grid("box", 2, 2)).unwrap();
        grid.contents.insert(Location::new(2, 1), Uuid::new_v4());
        let plan = resolve_placement(
            &grid,
            &candidates(2, ItemKind::Subsample),
            &PlacementStrategy::ByRow(GridFill::from_origin()),
        )
        .unwrap();
        assert_eq!(xy(plan.locations()), vec![(1, 1), (1, 2)]);
    }

    #[test]
    fn by_row_overflow_reports_free_cells() {
        let grid = Container::create(NewContainer::grid("box", 2, 2)).unwrap();
        let err = resolve_placement(
            &grid,
            &candidates(3, ItemKind::Subsample),
            &PlacementStrategy::ByRow(GridFill::starting_at(1, 2)),
        )
        .unwrap_err();
        assert_eq!(
            err,
            PlacementError::GridOverflow {
                requested: 3,
                available: 2,
            }
        );
    }

    #[test]
    fn oversized_totals_surface_out_of_bounds() {
        let grid = Container::create(NewContainer::grid("box", 1, 2)).unwrap();
        let err = resolve_placement(
            &grid,
            &candidates(3, ItemKind::Subsample),
            &PlacementStrategy::ByRow(GridFill::from_origin().with_totals(3, 1)),
        )
        .unwrap_err();
        assert_eq!(err, PlacementError::OutOfBounds(Location::new(3, 1)));
    }

    #[test]
    fn by_location_checks_arity_first() {
        let grid = Container::create(NewContainer::grid("box", 2, 2)).unwrap();
        let err = resolve_placement(
            &grid,
            &candidates(3, ItemKind::Subsample),
            &PlacementStrategy::ByLocation {
                locations: vec![Location::new(1, 1), Location::new(2, 1)],
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            PlacementError::ArityMismatch {
                items: 3,
                locations: 2,
            }
        );
    }

    #[test]
    fn arity_mismatch_wins_over_item_failures() {
        let rack = Container::create(NewContainer::grid("rack", 2, 2).storing(true, false)).unwrap();
        let mut items = candidates(3, ItemKind::Subsample);
        items[0].placement = Some(Placement {
            container_id: Uuid::new_v4(),
            location: Location::new(1, 1),
        });
        items[2].item_id = items[1].item_id;

        let err = resolve_placement(
            &rack,
            &items,
            &PlacementStrategy::ByLocation {
                locations: vec![Location::new(1, 1), Location::new(2, 1)],
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            PlacementError::ArityMismatch {
                items: 3,
                locations: 2,
            }
        );
    }

    #[test]
    fn by_location_rejects_occupied_target() {
        let mut grid = Container::create(NewContainer::grid("box", 2, 2)).unwrap();
        grid.contents.insert(Location::new(2, 2), Uuid::new_v4());
        let err = resolve_placement(
            &grid,
            &candidates(1, ItemKind::Subsample),
            &PlacementStrategy::ByLocation {
                locations: vec![Location::new(2, 2)],
            },
        )
        .unwrap_err();
        assert_eq!(err, PlacementError::LocationCollision(Location::new(2, 2)));
    }

    #[test]
    fn storage_flags_reject_item_kind() {
        let rack = Container::create(NewContainer::grid("rack", 2, 2).storing(false, true)).unwrap();
        let items = candidates(1, ItemKind::Container);
        let err = resolve_placement(&rack, &items, &PlacementStrategy::NextAvailable).unwrap_err();
        assert_eq!(
            err,
            PlacementError::UnsupportedItemKind {
                item_id: items[0].item_id,
                kind: ItemKind::Container,
            }
        );
    }

    #[test]
    fn placed_item_must_be_removed_first() {
        let grid = Container::create(NewContainer::grid("box", 2, 2)).unwrap();
        let mut items = candidates(1, ItemKind::Subsample);
        items[0].placement = Some(Placement {
            container_id: Uuid::new_v4(),
            location: Location::new(1, 1),
        });
        let err = resolve_placement(&grid, &items, &PlacementStrategy::NextAvailable).unwrap_err();
        assert_eq!(err, PlacementError::ItemAlreadyPlaced(items[0].item_id));
    }

    #[test]
    fn next_available_on_list_uses_free_ordinals() {
        let mut list = Container::create(NewContainer::list("shelf").with_capacity(4)).unwrap();
        list.contents.insert(Location::slot(1), Uuid::new_v4());
        list.contents.insert(Location::slot(3), Uuid::new_v4());
        let plan = resolve_placement(
            &list,
            &candidates(2, ItemKind::Sample),
            &PlacementStrategy::NextAvailable,
        )
        .unwrap();
        assert_eq!(xy(plan.locations()), vec![(2, 1), (4, 1)]);

        let err = resolve_placement(
            &list,
            &candidates(3, ItemKind::Sample),
            &PlacementStrategy::NextAvailable,
        )
        .unwrap_err();
        assert!(matches!(err, PlacementError::CapacityExceeded { .. }));
    }

    #[test]
    fn next_available_on_image_needs_coordinates() {
        let image = Container::create(NewContainer::image("photo")).unwrap();
        let err = resolve_placement(
            &image,
            &candidates(1, ItemKind::Subsample),
            &PlacementStrategy::NextAvailable,
        )
        .unwrap_err();
        assert!(matches!(err, PlacementError::ExplicitLocationsRequired(_)));
    }
}
