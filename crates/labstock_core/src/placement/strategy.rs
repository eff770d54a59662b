//! Placement strategies and grid traversal order.

use crate::model::container::{GridDimensions, Location};
use serde::{Deserialize, Serialize};

/// Start cell and optional totals for row/column fills.
///
/// Omitted totals are inferred from the target grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridFill {
    pub start_column: u32,
    pub start_row: u32,
    pub total_columns: Option<u32>,
    pub total_rows: Option<u32>,
}

impl GridFill {
    /// Fill from `(1, 1)` with inferred totals.
    pub fn from_origin() -> Self {
        Self::starting_at(1, 1)
    }

    pub fn starting_at(start_column: u32, start_row: u32) -> Self {
        Self {
            start_column,
            start_row,
            total_columns: None,
            total_rows: None,
        }
    }

    pub fn with_totals(mut self, total_columns: u32, total_rows: u32) -> Self {
        self.total_columns = Some(total_columns);
        self.total_rows = Some(total_rows);
        self
    }

    pub fn start(&self) -> Location {
        Location::new(self.start_column, self.start_row)
    }
}

/// How items are mapped onto locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Row-major fill: column advances first.
    ByRow(GridFill),
    /// Column-major fill: row advances first.
    ByColumn(GridFill),
    /// One explicit location per item, in request order.
    ByLocation { locations: Vec<Location> },
    /// Lowest free slots; row-major on grids.
    NextAvailable,
}

impl PlacementStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ByRow(_) => "by_row",
            Self::ByColumn(_) => "by_column",
            Self::ByLocation { .. } => "by_location",
            Self::NextAvailable => "next_available",
        }
    }
}

/// Grid traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOrder {
    RowMajor,
    ColumnMajor,
}

/// Iterator over grid cells from a start cell to the last cell.
///
/// Yields nothing when the start lies outside `dimensions`.
#[derive(Debug, Clone)]
pub struct GridCursor {
    order: FillOrder,
    dimensions: GridDimensions,
    next: Option<Location>,
}

impl GridCursor {
    pub fn new(order: FillOrder, start: Location, dimensions: GridDimensions) -> Self {
        let next = dimensions.contains(start).then_some(start);
        Self {
            order,
            dimensions,
            next,
        }
    }
}

impl Iterator for GridCursor {
    type Item = Location;

    fn next(&mut self) -> Option<Location> {
        let current = self.next?;
        let GridDimensions { rows, columns } = self.dimensions;
        self.next = match self.order {
            FillOrder::RowMajor if current.x < columns => Some(Location::new(current.x + 1, current.y)),
            FillOrder::RowMajor if current.y < rows => Some(Location::new(1, current.y + 1)),
            FillOrder::ColumnMajor if current.y < rows => Some(Location::new(current.x, current.y + 1)),
            FillOrder::ColumnMajor if current.x < columns => Some(Location::new(current.x + 1, 1)),
            _ => None,
        };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::{FillOrder, GridCursor, GridFill, PlacementStrategy};
    use crate::model::container::{GridDimensions, Location};

    fn cells(order: FillOrder, start: (u32, u32), dims: (u32, u32)) -> Vec<(u32, u32)> {
        GridCursor::new(
            order,
            Location::new(start.0, start.1),
            GridDimensions::new(dims.1, dims.0),
        )
        .map(|location| (location.x, location.y))
        .collect()
    }

    #[test]
    fn row_major_wraps_after_last_column() {
        assert_eq!(
            cells(FillOrder::RowMajor, (2, 1), (3, 2)),
            vec![(2, 1), (3, 1), (1, 2), (2, 2), (3, 2)]
        );
    }

    #[test]
    fn column_major_wraps_after_last_row() {
        assert_eq!(
            cells(FillOrder::ColumnMajor, (1, 2), (3, 2)),
            vec![(1, 2), (2, 1), (2, 2), (3, 1), (3, 2)]
        );
    }

    #[test]
    fn start_outside_grid_yields_nothing() {
        assert!(cells(FillOrder::RowMajor, (4, 1), (3, 2)).is_empty());
        assert!(cells(FillOrder::ColumnMajor, (0, 1), (3, 2)).is_empty());
    }

    #[test]
    fn strategy_serializes_with_tag() {
        let strategy = PlacementStrategy::ByRow(GridFill::from_origin().with_totals(3, 2));
        let json = serde_json::to_value(&strategy).unwrap();
        assert_eq!(json["strategy"], "by_row");
        assert_eq!(json["total_columns"], 3);
        assert_eq!(strategy.name(), "by_row");
    }
}
