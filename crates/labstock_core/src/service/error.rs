//! Use-case level error type shared by inventory services.

use crate::model::container::ContainerError;
use crate::model::item::{GlobalId, ItemId, ItemValidationError};
use crate::model::quantity::{Quantity, QuantityError};
use crate::placement::PlacementError;
use crate::repo::inventory_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from inventory service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Name is blank after trim.
    InvalidName,
    /// Global id text does not parse.
    InvalidGlobalId(String),
    ItemNotFound(ItemId),
    GlobalIdNotFound(GlobalId),
    ContainerNotFound(ItemId),
    /// Operation needs a subsample.
    NotASubsample(ItemId),
    /// Operation needs a sample.
    NotASample(ItemId),
    ContainerNotEmpty(ItemId),
    /// Requested split exceeds the source quantity.
    InsufficientQuantity {
        available: Quantity,
        requested: Quantity,
    },
    /// Split source carries no quantity.
    MissingQuantity(ItemId),
    /// Stored state contradicts itself (for example a dangling placement).
    InconsistentState(String),
    Validation(ItemValidationError),
    Quantity(QuantityError),
    Container(ContainerError),
    Placement(PlacementError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "name must not be blank"),
            Self::InvalidGlobalId(value) => write!(f, "invalid global id `{value}`"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::GlobalIdNotFound(global_id) => write!(f, "item not found: {global_id}"),
            Self::ContainerNotFound(id) => write!(f, "container not found: {id}"),
            Self::NotASubsample(id) => write!(f, "item is not a subsample: {id}"),
            Self::NotASample(id) => write!(f, "item is not a sample: {id}"),
            Self::ContainerNotEmpty(id) => write!(f, "container is not empty: {id}"),
            Self::InsufficientQuantity {
                available,
                requested,
            } => write!(
                f,
                "insufficient quantity: {requested} requested, {available} available"
            ),
            Self::MissingQuantity(id) => write!(f, "item has no quantity: {id}"),
            Self::InconsistentState(message) => write!(f, "inconsistent inventory state: {message}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Quantity(err) => write!(f, "{err}"),
            Self::Container(err) => write!(f, "{err}"),
            Self::Placement(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Quantity(err) => Some(err),
            Self::Container(err) => Some(err),
            Self::Placement(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ItemNotFound(id) => Self::ItemNotFound(id),
            RepoError::ContainerNotFound(id) => Self::ContainerNotFound(id),
            RepoError::ContainerNotEmpty(id) => Self::ContainerNotEmpty(id),
            RepoError::LocationOccupied { location, .. } => {
                Self::Placement(PlacementError::LocationCollision(location))
            }
            RepoError::ItemAlreadyPlaced(id) => {
                Self::Placement(PlacementError::ItemAlreadyPlaced(id))
            }
            RepoError::PlacementCycle {
                item_id,
                container_id,
            } => Self::Placement(PlacementError::CycleDetected {
                item_id,
                container_id,
            }),
            RepoError::CapacityExceeded {
                capacity,
                occupied,
                requested,
                ..
            } => Self::Placement(PlacementError::CapacityExceeded {
                capacity,
                occupied,
                requested,
            }),
            RepoError::Validation(err) => err.into(),
            other => Self::Repo(other),
        }
    }
}

impl From<ItemValidationError> for ServiceError {
    fn from(value: ItemValidationError) -> Self {
        match value {
            ItemValidationError::BlankName => Self::InvalidName,
            ItemValidationError::InvalidGlobalId(text) => Self::InvalidGlobalId(text),
            other => Self::Validation(other),
        }
    }
}

impl From<QuantityError> for ServiceError {
    fn from(value: QuantityError) -> Self {
        Self::Quantity(value)
    }
}

impl From<ContainerError> for ServiceError {
    fn from(value: ContainerError) -> Self {
        match value {
            ContainerError::InvalidName => Self::InvalidName,
            other => Self::Container(other),
        }
    }
}

impl From<PlacementError> for ServiceError {
    fn from(value: PlacementError) -> Self {
        Self::Placement(value)
    }
}
