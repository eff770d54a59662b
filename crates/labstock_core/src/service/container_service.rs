//! Container use-case service.
//!
//! # Responsibility
//! - Validate and persist new containers.
//! - Answer dimension and occupancy queries over stored snapshots.
//! - Delete containers with an explicit contents policy.

use crate::model::container::{Container, GridDimensions, NewContainer};
use crate::model::item::ItemId;
use crate::repo::inventory_repo::{ContainerDeleteMode, InventoryStore};
use crate::service::error::{ServiceError, ServiceResult};
use log::info;

/// Container service facade.
pub struct ContainerService<S: InventoryStore> {
    store: S,
}

impl<S: InventoryStore> ContainerService<S> {
    /// Creates service from store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validates `input` and stores an empty container.
    pub fn create_container(&self, input: NewContainer) -> ServiceResult<Container> {
        let container = Container::create(input)?;
        let stored = self.store.create_container(&container)?;
        info!(
            "event=container_create module=container status=ok container={} layout={}",
            stored.id,
            stored.kind()
        );
        Ok(stored)
    }

    pub fn get_container(&self, container_id: ItemId) -> ServiceResult<Container> {
        self.store
            .fetch_container(container_id)?
            .ok_or(ServiceError::ContainerNotFound(container_id))
    }

    /// Grid dimensions of a stored container; `NotAGrid` for other layouts.
    pub fn dimensions_of(&self, container_id: ItemId) -> ServiceResult<GridDimensions> {
        self.get_container(container_id)?
            .dimensions_of()
            .map_err(Into::into)
    }

    pub fn occupied_slots(&self, container_id: ItemId) -> ServiceResult<usize> {
        Ok(self.get_container(container_id)?.occupied_slots())
    }

    /// Deletes a container.
    ///
    /// # Errors
    /// - `ContainerNotEmpty` in `RequireEmpty` mode while items are placed.
    pub fn delete_container(
        &self,
        container_id: ItemId,
        mode: ContainerDeleteMode,
    ) -> ServiceResult<()> {
        self.store.delete_container(container_id, mode)?;
        info!(
            "event=container_delete module=container status=ok container={} mode={:?}",
            container_id, mode
        );
        Ok(())
    }
}
