//! Storage container domain model.
//!
//! # Responsibility
//! - Represent list, grid, workbench and image containers as one tagged layout.
//! - Own dimension, bounds and capacity rules.
//!
//! # Invariants
//! - Layout fields are validated at construction, never at use time.
//! - Grid contents satisfy `1 <= x <= columns` and `1 <= y <= rows`.
//! - `contents` maps each location to exactly one item.

use crate::model::item::{GlobalId, ItemId, ItemKind};
use crate::model::tag::{normalize_tags, TagSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ContainerResult<T> = Result<T, ContainerError>;

/// Container model validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// Container name is blank after trim.
    InvalidName,
    /// Grid lacks usable rows/columns, or a non-grid was given some.
    InvalidDimensions {
        kind: ContainerKind,
        rows: Option<i64>,
        columns: Option<i64>,
    },
    /// Capacity is negative or contradicts the layout.
    InvalidCapacity { kind: ContainerKind, capacity: i64 },
    /// Operation needs grid dimensions but the container has none.
    NotAGrid(ContainerKind),
}

impl Display for ContainerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "container name must not be blank"),
            Self::InvalidDimensions {
                kind,
                rows,
                columns,
            } => write!(
                f,
                "invalid dimensions for {kind} container: rows={rows:?} columns={columns:?}"
            ),
            Self::InvalidCapacity { kind, capacity } => {
                write!(f, "invalid capacity {capacity} for {kind} container")
            }
            Self::NotAGrid(kind) => write!(f, "{kind} container has no grid dimensions"),
        }
    }
}

impl Error for ContainerError {}

/// Container category without layout payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    List,
    Grid,
    Workbench,
    Image,
}

impl ContainerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Grid => "grid",
            Self::Workbench => "workbench",
            Self::Image => "image",
        }
    }
}

impl Display for ContainerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position inside a container.
///
/// Grid locations are 1-based `(column, row)`. List and workbench containers
/// use ordinal slots `(n, 1)`. Image locations are pixel coordinates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Location {
    pub x: u32,
    pub y: u32,
}

impl Location {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Ordinal slot in a list-like container.
    pub fn slot(ordinal: u32) -> Self {
        Self { x: ordinal, y: 1 }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Grid shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    pub rows: u32,
    pub columns: u32,
}

impl GridDimensions {
    pub fn new(rows: u32, columns: u32) -> Self {
        Self { rows, columns }
    }

    pub fn cell_count(&self) -> u64 {
        u64::from(self.rows) * u64::from(self.columns)
    }

    pub fn contains(&self, location: Location) -> bool {
        (1..=self.columns).contains(&location.x) && (1..=self.rows).contains(&location.y)
    }
}

/// Kind-specific container shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContainerLayout {
    List { capacity: Option<u32> },
    Grid { rows: u32, columns: u32 },
    Workbench { capacity: Option<u32> },
    Image { capacity: Option<u32> },
}

impl ContainerLayout {
    pub fn kind(&self) -> ContainerKind {
        match self {
            Self::List { .. } => ContainerKind::List,
            Self::Grid { .. } => ContainerKind::Grid,
            Self::Workbench { .. } => ContainerKind::Workbench,
            Self::Image { .. } => ContainerKind::Image,
        }
    }

    /// Maximum number of occupants; `None` means unbounded.
    pub fn capacity(&self) -> Option<u64> {
        match self {
            Self::Grid { rows, columns } => Some(GridDimensions::new(*rows, *columns).cell_count()),
            Self::List { capacity } | Self::Workbench { capacity } | Self::Image { capacity } => {
                capacity.map(u64::from)
            }
        }
    }

    pub fn dimensions(&self) -> Option<GridDimensions> {
        match self {
            Self::Grid { rows, columns } => Some(GridDimensions::new(*rows, *columns)),
            _ => None,
        }
    }

    /// Builds a validated layout from loosely-typed creation input.
    ///
    /// # Errors
    /// - `InvalidDimensions` when a grid misses rows/columns or either is `< 1`,
    ///   or when a non-grid layout is given rows/columns.
    /// - `InvalidCapacity` when capacity is negative, too large, or differs
    ///   from `rows * columns` for a grid.
    pub fn validate(
        kind: ContainerKind,
        rows: Option<i64>,
        columns: Option<i64>,
        capacity: Option<i64>,
    ) -> ContainerResult<Self> {
        let invalid_dimensions = || ContainerError::InvalidDimensions {
            kind,
            rows,
            columns,
        };
        let checked_capacity = match capacity {
            Some(value) => Some(
                u32::try_from(value)
                    .map_err(|_| ContainerError::InvalidCapacity {
                        kind,
                        capacity: value,
                    })?,
            ),
            None => None,
        };

        if kind != ContainerKind::Grid {
            if rows.is_some() || columns.is_some() {
                return Err(invalid_dimensions());
            }
            return Ok(match kind {
                ContainerKind::List => Self::List {
                    capacity: checked_capacity,
                },
                ContainerKind::Workbench => Self::Workbench {
                    capacity: checked_capacity,
                },
                _ => Self::Image {
                    capacity: checked_capacity,
                },
            });
        }

        let (Some(raw_rows), Some(raw_columns)) = (rows, columns) else {
            return Err(invalid_dimensions());
        };
        let rows = u32::try_from(raw_rows)
            .ok()
            .filter(|value| *value >= 1)
            .ok_or_else(invalid_dimensions)?;
        let columns = u32::try_from(raw_columns)
            .ok()
            .filter(|value| *value >= 1)
            .ok_or_else(invalid_dimensions)?;

        if let Some(value) = capacity {
            if u64::try_from(value).ok() != Some(GridDimensions::new(rows, columns).cell_count()) {
                return Err(ContainerError::InvalidCapacity {
                    kind,
                    capacity: value,
                });
            }
        }
        Ok(Self::Grid { rows, columns })
    }
}

/// Creation input for a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContainer {
    pub name: String,
    pub kind: ContainerKind,
    pub rows: Option<i64>,
    pub columns: Option<i64>,
    pub capacity: Option<i64>,
    pub can_store_containers: bool,
    pub can_store_samples: bool,
    pub tags: Vec<String>,
}

impl NewContainer {
    pub fn new(kind: ContainerKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            rows: None,
            columns: None,
            capacity: None,
            can_store_containers: true,
            can_store_samples: true,
            tags: Vec::new(),
        }
    }

    pub fn list(name: impl Into<String>) -> Self {
        Self::new(ContainerKind::List, name)
    }

    pub fn workbench(name: impl Into<String>) -> Self {
        Self::new(ContainerKind::Workbench, name)
    }

    pub fn image(name: impl Into<String>) -> Self {
        Self::new(ContainerKind::Image, name)
    }

    pub fn grid(name: impl Into<String>, rows: i64, columns: i64) -> Self {
        let mut input = Self::new(ContainerKind::Grid, name);
        input.rows = Some(rows);
        input.columns = Some(columns);
        input
    }

    pub fn with_capacity(mut self, capacity: i64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn storing(mut self, containers: bool, samples: bool) -> Self {
        self.can_store_containers = containers;
        self.can_store_samples = samples;
        self
    }

    pub fn with_tags<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        self.tags = tags.iter().map(|tag| tag.as_ref().to_string()).collect();
        self
    }
}

/// Container snapshot including current contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: ItemId,
    pub global_id: Option<GlobalId>,
    pub name: String,
    pub layout: ContainerLayout,
    pub can_store_containers: bool,
    pub can_store_samples: bool,
    pub tags: TagSet,
    /// Container this one was duplicated from.
    pub derived_from: Option<ItemId>,
    pub contents: BTreeMap<Location, ItemId>,
}

impl Container {
    /// Validates creation input into an empty container with a fresh id.
    pub fn create(input: NewContainer) -> ContainerResult<Self> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ContainerError::InvalidName);
        }
        let layout = ContainerLayout::validate(input.kind, input.rows, input.columns, input.capacity)?;
        Ok(Self {
            id: Uuid::new_v4(),
            global_id: None,
            name: name.to_string(),
            layout,
            can_store_containers: input.can_store_containers,
            can_store_samples: input.can_store_samples,
            tags: normalize_tags(&input.tags),
            derived_from: None,
            contents: BTreeMap::new(),
        })
    }

    pub fn kind(&self) -> ContainerKind {
        self.layout.kind()
    }

    /// Returns grid dimensions.
    ///
    /// # Errors
    /// - `NotAGrid` for list, workbench and image containers.
    pub fn dimensions_of(&self) -> ContainerResult<GridDimensions> {
        self.layout
            .dimensions()
            .ok_or(ContainerError::NotAGrid(self.kind()))
    }

    pub fn occupied_slots(&self) -> usize {
        self.contents.len()
    }

    pub fn capacity(&self) -> Option<u64> {
        self.layout.capacity()
    }

    /// Remaining room; `None` when capacity is unbounded.
    pub fn free_slots(&self) -> Option<u64> {
        self.capacity()
            .map(|capacity| capacity.saturating_sub(self.occupied_slots() as u64))
    }

    pub fn is_occupied(&self, location: Location) -> bool {
        self.contents.contains_key(&location)
    }

    pub fn occupant(&self, location: Location) -> Option<ItemId> {
        self.contents.get(&location).copied()
    }

    pub fn location_of(&self, item_id: ItemId) -> Option<Location> {
        self.contents
            .iter()
            .find(|(_, occupant)| **occupant == item_id)
            .map(|(location, _)| *location)
    }

    /// Whether this container's storage flags allow an item of `kind`.
    pub fn accepts(&self, kind: ItemKind) -> bool {
        match kind {
            ItemKind::Sample | ItemKind::Subsample => self.can_store_samples,
            ItemKind::Container => self.can_store_containers,
        }
    }

    /// Whether `location` is addressable in this layout.
    pub fn location_in_bounds(&self, location: Location) -> bool {
        match self.layout {
            ContainerLayout::Grid { rows, columns } => {
                GridDimensions::new(rows, columns).contains(location)
            }
            ContainerLayout::List { capacity } | ContainerLayout::Workbench { capacity } => {
                location.y == 1
                    && location.x >= 1
                    && capacity.map_or(true, |capacity| location.x <= capacity)
            }
            ContainerLayout::Image { .. } => true,
        }
    }
}
