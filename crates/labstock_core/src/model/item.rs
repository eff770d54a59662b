//! Inventory item domain model.
//!
//! # Responsibility
//! - Define the shared record for samples, subsamples and containers.
//! - Provide lineage helpers for duplication and renaming.
//!
//! # Invariants
//! - `id` is stable and never reused for another item.
//! - Subsamples always reference their parent sample; other kinds never do.
//! - Container items carry no quantity.
//! - `placement` changes only through the placement commit path.

use crate::model::container::Location;
use crate::model::quantity::Quantity;
use crate::model::tag::{normalize_tags, TagSet};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for every inventory item, containers included.
pub type ItemId = Uuid;

/// Item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Logical sample owning one or more subsamples.
    Sample,
    /// Quantity-bearing, individually placeable part of a sample.
    Subsample,
    /// A container stored inside another container.
    Container,
}

impl ItemKind {
    /// Prefix used in human-facing global ids.
    pub fn global_id_prefix(self) -> &'static str {
        match self {
            Self::Sample => "SA",
            Self::Subsample => "SS",
            Self::Container => "IC",
        }
    }

    pub fn is_sample_material(self) -> bool {
        matches!(self, Self::Sample | Self::Subsample)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sample => "sample",
            Self::Subsample => "subsample",
            Self::Container => "container",
        }
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-facing identifier such as `SS42`, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GlobalId {
    kind: ItemKind,
    number: u64,
}

impl GlobalId {
    pub fn new(kind: ItemKind, number: u64) -> Self {
        Self { kind, number }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn number(&self) -> u64 {
        self.number
    }
}

impl Display for GlobalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.kind.global_id_prefix(), self.number)
    }
}

impl FromStr for GlobalId {
    type Err = ItemValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let invalid = || ItemValidationError::InvalidGlobalId(trimmed.to_string());
        if trimmed.len() < 3 || !trimmed.is_char_boundary(2) {
            return Err(invalid());
        }
        let (prefix, digits) = trimmed.split_at(2);
        let kind = match prefix.to_ascii_uppercase().as_str() {
            "SA" => ItemKind::Sample,
            "SS" => ItemKind::Subsample,
            "IC" => ItemKind::Container,
            _ => return Err(invalid()),
        };
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let number = digits.parse::<u64>().map_err(|_| invalid())?;
        Ok(Self::new(kind, number))
    }
}

impl TryFrom<String> for GlobalId {
    type Error = ItemValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GlobalId> for String {
    fn from(value: GlobalId) -> Self {
        value.to_string()
    }
}

/// Current container membership of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub container_id: ItemId,
    pub location: Location,
}

/// Item model validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    NilUuid,
    BlankName,
    MissingParentSample(ItemId),
    UnexpectedParentSample(ItemId),
    ContainerWithQuantity(ItemId),
    InvalidGlobalId(String),
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "item id must not be nil"),
            Self::BlankName => write!(f, "item name must not be blank"),
            Self::MissingParentSample(id) => {
                write!(f, "subsample {id} must reference a parent sample")
            }
            Self::UnexpectedParentSample(id) => {
                write!(f, "only subsamples may reference a parent sample: {id}")
            }
            Self::ContainerWithQuantity(id) => {
                write!(f, "container item {id} must not carry a quantity")
            }
            Self::InvalidGlobalId(value) => write!(f, "invalid global id `{value}`"),
        }
    }
}

impl Error for ItemValidationError {}

/// Canonical inventory record for samples, subsamples and containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// `None` until the store persists the item for the first time.
    pub global_id: Option<GlobalId>,
    pub kind: ItemKind,
    pub name: String,
    pub quantity: Option<Quantity>,
    pub tags: TagSet,
    /// Owning sample for subsamples.
    pub parent_sample: Option<ItemId>,
    /// Source item of a split or duplicate.
    pub derived_from: Option<ItemId>,
    pub placement: Option<Placement>,
}

impl Item {
    /// Creates an item with a generated stable id.
    pub fn new(kind: ItemKind, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            global_id: None,
            kind,
            name: name.into(),
            quantity: None,
            tags: TagSet::new(),
            parent_sample: None,
            derived_from: None,
            placement: None,
        }
    }

    /// Creates an item with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        id: ItemId,
        kind: ItemKind,
        name: impl Into<String>,
    ) -> Result<Self, ItemValidationError> {
        if id.is_nil() {
            return Err(ItemValidationError::NilUuid);
        }
        let mut item = Self::new(kind, name);
        item.id = id;
        Ok(item)
    }

    pub fn sample(name: impl Into<String>) -> Self {
        Self::new(ItemKind::Sample, name)
    }

    pub fn subsample(parent_sample: ItemId, name: impl Into<String>) -> Self {
        let mut item = Self::new(ItemKind::Subsample, name);
        item.parent_sample = Some(parent_sample);
        item
    }

    pub fn with_quantity(mut self, quantity: Quantity) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_tags<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        self.tags = normalize_tags(tags);
        self
    }

    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id.is_nil() {
            return Err(ItemValidationError::NilUuid);
        }
        if self.name.trim().is_empty() {
            return Err(ItemValidationError::BlankName);
        }
        match (self.kind, self.parent_sample) {
            (ItemKind::Subsample, None) => {
                return Err(ItemValidationError::MissingParentSample(self.id));
            }
            (ItemKind::Sample | ItemKind::Container, Some(_)) => {
                return Err(ItemValidationError::UnexpectedParentSample(self.id));
            }
            _ => {}
        }
        if self.kind == ItemKind::Container && self.quantity.is_some() {
            return Err(ItemValidationError::ContainerWithQuantity(self.id));
        }
        Ok(())
    }

    /// Copies quantity, tags and parent sample into a fresh identity.
    ///
    /// The copy has no global id and no placement; `self` is not touched.
    pub fn duplicate(&self, new_name: Option<&str>) -> Item {
        let name = new_name
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_COPY", self.name));
        Item {
            id: Uuid::new_v4(),
            global_id: None,
            kind: self.kind,
            name,
            quantity: self.quantity,
            tags: self.tags.clone(),
            parent_sample: self.parent_sample,
            derived_from: Some(self.id),
            placement: None,
        }
    }

    pub fn rename(&mut self, new_name: &str) -> Result<(), ItemValidationError> {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return Err(ItemValidationError::BlankName);
        }
        self.name = trimmed.to_string();
        Ok(())
    }

    pub fn is_placed(&self) -> bool {
        self.placement.is_some()
    }
}
