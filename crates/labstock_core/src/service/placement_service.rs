//! Placement use-case service.
//!
//! # Responsibility
//! - Load container and item snapshots, resolve a strategy, commit the plan.
//! - Provide explicit removal as the precondition for moving placed items.
//!
//! # Invariants
//! - Nothing is written unless the whole plan validated.
//! - A container is never placed inside itself or one of its descendants.

use crate::model::container::{Container, Location};
use crate::model::item::{Item, ItemId, ItemKind, Placement};
use crate::placement::resolver::{
    resolve_placement, ItemPlacement, PlacementCandidate, PlacementPlan,
};
use crate::placement::strategy::PlacementStrategy;
use crate::placement::validation::check_arity;
use crate::placement::PlacementError;
use crate::repo::inventory_repo::InventoryStore;
use crate::service::error::{ServiceError, ServiceResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

/// Items to place into one container with one strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRequest {
    pub container_id: ItemId,
    /// Items in request order; the n-th item gets the n-th resolved location.
    pub item_ids: Vec<ItemId>,
    pub strategy: PlacementStrategy,
}

/// Result of a committed placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementOutcome {
    pub success: bool,
    pub container_id: ItemId,
    pub placements: Vec<ItemPlacement>,
}

/// Placement service facade.
pub struct PlacementService<S: InventoryStore> {
    store: S,
}

impl<S: InventoryStore> PlacementService<S> {
    /// Creates service from store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolves and validates a request without writing anything.
    pub fn preview_placement(&self, request: &PlacementRequest) -> ServiceResult<PlacementPlan> {
        check_arity(&request.strategy, request.item_ids.len())?;

        let container = self
            .store
            .fetch_container(request.container_id)?
            .ok_or(ServiceError::ContainerNotFound(request.container_id))?;

        let mut items = Vec::with_capacity(request.item_ids.len());
        for item_id in &request.item_ids {
            let item = self
                .store
                .fetch_item(*item_id)?
                .ok_or(ServiceError::ItemNotFound(*item_id))?;
            items.push(item);
        }

        self.ensure_no_cycles(&container, &items)?;

        let candidates: Vec<PlacementCandidate> =
            items.iter().map(PlacementCandidate::from).collect();
        resolve_placement(&container, &candidates, &request.strategy).map_err(Into::into)
    }

    /// Resolves a request and commits all resulting placements atomically.
    ///
    /// # Errors
    /// - Any `PlacementError` found during resolution; nothing is written.
    /// - `LocationCollision` when a concurrent commit took a target first.
    pub fn resolve_placement(
        &self,
        request: &PlacementRequest,
    ) -> ServiceResult<PlacementOutcome> {
        let started_at = Instant::now();
        let strategy = request.strategy.name();

        let committed = self.preview_placement(request).and_then(|plan| {
            if !plan.is_empty() {
                self.store
                    .persist_placement(plan.container_id, &plan.assignments)?;
            }
            Ok(plan)
        });

        match committed {
            Ok(plan) => {
                info!(
                    "event=placement_commit module=placement status=ok container={} strategy={} count={} duration_ms={}",
                    plan.container_id,
                    strategy,
                    plan.assignments.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(PlacementOutcome {
                    success: true,
                    container_id: plan.container_id,
                    placements: plan.assignments,
                })
            }
            Err(err) => {
                warn!(
                    "event=placement_commit module=placement status=error container={} strategy={} count={} duration_ms={} error={}",
                    request.container_id,
                    strategy,
                    request.item_ids.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Places `item_ids` at `locations`, pairing them in order.
    pub fn move_items(
        &self,
        item_ids: &[ItemId],
        container_id: ItemId,
        locations: &[Location],
    ) -> ServiceResult<PlacementOutcome> {
        self.resolve_placement(&PlacementRequest {
            container_id,
            item_ids: item_ids.to_vec(),
            strategy: PlacementStrategy::ByLocation {
                locations: locations.to_vec(),
            },
        })
    }

    /// Takes an item out of its container.
    ///
    /// Returns the vacated placement, or `None` when the item was not placed.
    pub fn remove_from_container(&self, item_id: ItemId) -> ServiceResult<Option<Placement>> {
        let removed = self.store.remove_placement(item_id)?;
        if let Some(placement) = removed {
            info!(
                "event=placement_remove module=placement status=ok container={} item={}",
                placement.container_id, item_id
            );
        }
        Ok(removed)
    }

    fn ensure_no_cycles(&self, container: &Container, items: &[Item]) -> ServiceResult<()> {
        for item in items.iter().filter(|item| item.kind == ItemKind::Container) {
            if self.would_create_cycle(item.id, container.id)? {
                return Err(PlacementError::CycleDetected {
                    item_id: item.id,
                    container_id: container.id,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Walks up from `target` through enclosing containers looking for `item_id`.
    fn would_create_cycle(&self, item_id: ItemId, target: ItemId) -> ServiceResult<bool> {
        let mut visited = HashSet::new();
        let mut cursor = Some(target);
        while let Some(current) = cursor {
            if current == item_id {
                return Ok(true);
            }
            if !visited.insert(current) {
                return Ok(true);
            }

            let enclosing = self.store.fetch_item(current)?.ok_or_else(|| {
                ServiceError::InconsistentState(format!(
                    "placement chain references missing container {current}"
                ))
            })?;
            cursor = enclosing.placement.map(|placement| placement.container_id);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::{PlacementRequest, PlacementService};
    use crate::db::open_db_in_memory;
    use crate::model::container::{Container, Location, NewContainer};
    use crate::model::item::Item;
    use crate::placement::strategy::{GridFill, PlacementStrategy};
    use crate::placement::PlacementError;
    use crate::repo::inventory_repo::{InventoryStore, RepoError, SqliteInventoryStore};
    use crate::service::error::ServiceError;

    #[test]
    fn nested_container_cannot_receive_its_parent() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteInventoryStore::try_new(&conn).unwrap();
        let outer = store
            .create_container(&Container::create(NewContainer::list("outer")).unwrap())
            .unwrap();
        let inner = store
            .create_container(&Container::create(NewContainer::list("inner")).unwrap())
            .unwrap();

        let service = PlacementService::new(SqliteInventoryStore::try_new(&conn).unwrap());
        service
            .move_items(&[inner.id], outer.id, &[Location::slot(1)])
            .unwrap();

        let err = service
            .move_items(&[outer.id], inner.id, &[Location::slot(1)])
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Placement(PlacementError::CycleDetected { .. })
        ));
    }

    #[test]
    fn stale_previews_cannot_commit_crossed_nesting() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteInventoryStore::try_new(&conn).unwrap();
        let left = store
            .create_container(&Container::create(NewContainer::list("left")).unwrap())
            .unwrap();
        let right = store
            .create_container(&Container::create(NewContainer::list("right")).unwrap())
            .unwrap();

        let service = PlacementService::new(SqliteInventoryStore::try_new(&conn).unwrap());
        let left_into_right = service
            .preview_placement(&PlacementRequest {
                container_id: right.id,
                item_ids: vec![left.id],
                strategy: PlacementStrategy::NextAvailable,
            })
            .unwrap();
        let right_into_left = service
            .preview_placement(&PlacementRequest {
                container_id: left.id,
                item_ids: vec![right.id],
                strategy: PlacementStrategy::NextAvailable,
            })
            .unwrap();

        store
            .persist_placement(left_into_right.container_id, &left_into_right.assignments)
            .unwrap();
        let err = store
            .persist_placement(right_into_left.container_id, &right_into_left.assignments)
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::PlacementCycle { item_id, container_id }
                if item_id == right.id && container_id == left.id
        ));
        assert!(matches!(
            ServiceError::from(err),
            ServiceError::Placement(PlacementError::CycleDetected { .. })
        ));

        assert!(store.fetch_item(right.id).unwrap().unwrap().placement.is_none());
        assert!(store
            .fetch_container(left.id)
            .unwrap()
            .unwrap()
            .contents
            .is_empty());
    }

    #[test]
    fn preview_does_not_commit() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteInventoryStore::try_new(&conn).unwrap();
        let grid = store
            .create_container(&Container::create(NewContainer::grid("box", 2, 2)).unwrap())
            .unwrap();
        let sample = store.persist_item(&Item::sample("buffer")).unwrap();

        let service = PlacementService::new(SqliteInventoryStore::try_new(&conn).unwrap());
        let plan = service
            .preview_placement(&PlacementRequest {
                container_id: grid.id,
                item_ids: vec![sample.id],
                strategy: PlacementStrategy::ByRow(GridFill::from_origin()),
            })
            .unwrap();

        assert_eq!(plan.locations(), vec![Location::new(1, 1)]);
        let stored = store.fetch_container(grid.id).unwrap().unwrap();
        assert!(stored.contents.is_empty());
    }
}
