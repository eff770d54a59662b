//! Core domain logic for labstock.
//! This crate owns quantity arithmetic, container layouts and placement rules.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod placement;
pub mod repo;
pub mod service;

pub use config::EngineConfig;
pub use db::{latest_version, open_db, open_db_in_memory, schema_version, DbError};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::container::{
    Container, ContainerError, ContainerKind, ContainerLayout, GridDimensions, Location,
    NewContainer,
};
pub use model::item::{GlobalId, Item, ItemId, ItemKind, ItemValidationError, Placement};
pub use model::quantity::{Amount, Quantity, QuantityError, UnitFamily, UnitKind};
pub use model::tag::{normalize_tags, Tag, TagSet};
pub use placement::resolver::{ItemPlacement, PlacementPlan};
pub use placement::strategy::{GridFill, PlacementStrategy};
pub use placement::PlacementError;
pub use repo::inventory_repo::{
    ContainerDeleteMode, InventoryStore, RepoError, RepoResult, SqliteInventoryStore,
};
pub use service::container_service::ContainerService;
pub use service::error::{ServiceError, ServiceResult};
pub use service::item_service::{CreatedSample, ItemService, NewSample};
pub use service::placement_service::{PlacementOutcome, PlacementRequest, PlacementService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
