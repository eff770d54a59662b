//! Inventory database: items, tags, containers and placements.
//!
//! # Responsibility
//! - Open connections with foreign keys on, then bring the schema to
//!   [`latest_version`].
//! - Own the tables behind `SqliteInventoryStore`: `items` (samples,
//!   subsamples and containers share one id space), `item_tags`,
//!   `containers` (layout plus storage flags) and `placements`.
//!
//! # Invariants
//! - An item has at most one placement row, and
//!   `(container_uuid, pos_x, pos_y)` is unique, so two items never share
//!   a location even when commits race.
//! - A file written by a newer build (`user_version` above
//!   [`latest_version`]) is refused with `UnsupportedSchemaVersion` and left
//!   untouched.
//! - `SqliteInventoryStore::try_new` only accepts connections sitting exactly
//!   at [`latest_version`], so raw connections cannot bypass migration.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use migrations::{latest_version, schema_version};
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "inventory schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
