//! Inventory store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist items, containers, tags and placements.
//! - Provide the atomic placement commit the item registry relies on.
//!
//! # Invariants
//! - Write paths call `Item::validate()` before SQL mutations.
//! - `persist_placement` re-checks occupancy and capacity under the write lock
//!   and commits all assignments or none.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{latest_version, schema_version, DbError};
use crate::model::container::{Container, ContainerKind, ContainerLayout, Location};
use crate::model::item::{GlobalId, Item, ItemId, ItemKind, ItemValidationError, Placement};
use crate::model::quantity::{Amount, Quantity, UnitKind};
use crate::model::tag::{normalize_tags, TagSet};
use crate::placement::resolver::ItemPlacement;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    i.seq AS seq,
    i.uuid AS uuid,
    i.kind AS kind,
    i.name AS name,
    i.quantity_value AS quantity_value,
    i.quantity_unit AS quantity_unit,
    i.parent_sample_uuid AS parent_sample_uuid,
    i.derived_from_uuid AS derived_from_uuid,
    p.container_uuid AS container_uuid,
    p.pos_x AS pos_x,
    p.pos_y AS pos_y
FROM items i
LEFT JOIN placements p ON p.item_uuid = i.uuid";

const REQUIRED_TABLES: [&str; 4] = ["items", "item_tags", "containers", "placements"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from inventory store operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ItemValidationError),
    Db(DbError),
    ItemNotFound(ItemId),
    ContainerNotFound(ItemId),
    /// Another item already holds the location.
    LocationOccupied {
        container_id: ItemId,
        location: Location,
    },
    /// Item is placed elsewhere and must be removed first.
    ItemAlreadyPlaced(ItemId),
    /// Container item would end up inside itself.
    PlacementCycle {
        item_id: ItemId,
        container_id: ItemId,
    },
    /// Commit would push occupancy past the container capacity.
    CapacityExceeded {
        container_id: ItemId,
        capacity: u64,
        occupied: u64,
        requested: u64,
    },
    ContainerNotEmpty(ItemId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    /// Persisted or submitted data violates the store contract.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::ContainerNotFound(id) => write!(f, "container not found: {id}"),
            Self::LocationOccupied {
                container_id,
                location,
            } => write!(f, "location {location} in container {container_id} is occupied"),
            Self::ItemAlreadyPlaced(id) => write!(f, "item already placed: {id}"),
            Self::PlacementCycle {
                item_id,
                container_id,
            } => write!(
                f,
                "placing {item_id} into {container_id} would nest it inside itself"
            ),
            Self::CapacityExceeded {
                container_id,
                capacity,
                occupied,
                requested,
            } => write!(
                f,
                "container {container_id} capacity {capacity} exceeded: {occupied} occupied, {requested} requested"
            ),
            Self::ContainerNotEmpty(id) => write!(f, "container is not empty: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "inventory store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "inventory store requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid inventory data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// What happens to the contents of a deleted container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerDeleteMode {
    /// Refuse deletion while anything is placed inside.
    RequireEmpty,
    /// Unplace all contents, then delete the container.
    Dissolve,
}

/// Storage contract consumed by the placement and item services.
pub trait InventoryStore {
    /// Inserts a new, empty container and returns the stored snapshot.
    fn create_container(&self, container: &Container) -> RepoResult<Container>;
    /// Loads a container snapshot including its contents.
    fn fetch_container(&self, id: ItemId) -> RepoResult<Option<Container>>;
    /// Loads one item with tags and placement.
    fn fetch_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    /// Loads one item by its human-facing global id.
    fn fetch_item_by_global_id(&self, global_id: &GlobalId) -> RepoResult<Option<Item>>;
    /// Inserts or updates item metadata (name, quantity, tags).
    ///
    /// Kind, parent sample, lineage and placement are never changed here.
    fn persist_item(&self, item: &Item) -> RepoResult<Item>;
    /// Persists several items in one transaction.
    fn persist_items(&self, items: &[Item]) -> RepoResult<Vec<Item>>;
    /// Lists subsamples of a sample in creation order.
    fn list_subsamples(&self, sample_id: ItemId) -> RepoResult<Vec<Item>>;
    /// Commits all assignments into one container atomically.
    fn persist_placement(&self, container_id: ItemId, assignments: &[ItemPlacement])
        -> RepoResult<()>;
    /// Clears an item's placement, returning the vacated one.
    fn remove_placement(&self, item_id: ItemId) -> RepoResult<Option<Placement>>;
    /// Deletes a container according to `mode`.
    fn delete_container(&self, container_id: ItemId, mode: ContainerDeleteMode) -> RepoResult<()>;
}

/// SQLite-backed inventory store.
///
/// Borrows a migrated connection; several stores may share one connection.
pub struct SqliteInventoryStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteInventoryStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl InventoryStore for SqliteInventoryStore<'_> {
    fn create_container(&self, container: &Container) -> RepoResult<Container> {
        if !container.contents.is_empty() {
            return Err(RepoError::InvalidData(
                "new containers must be created empty".to_string(),
            ));
        }
        let item = container_item(container);
        item.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        insert_item_row(&tx, &item)?;
        let (capacity, rows, columns) = layout_to_db(&container.layout);
        tx.execute(
            "INSERT INTO containers (
                uuid,
                layout,
                capacity,
                grid_rows,
                grid_columns,
                can_store_containers,
                can_store_samples
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                container.id.to_string(),
                container.kind().as_str(),
                capacity,
                rows,
                columns,
                bool_to_int(container.can_store_containers),
                bool_to_int(container.can_store_samples),
            ],
        )?;
        replace_tags(&tx, container.id, &container.tags)?;
        tx.commit()?;

        load_container(self.conn, container.id)?.ok_or(RepoError::ContainerNotFound(container.id))
    }

    fn fetch_container(&self, id: ItemId) -> RepoResult<Option<Container>> {
        load_container(self.conn, id)
    }

    fn fetch_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        load_item(self.conn, id)
    }

    fn fetch_item_by_global_id(&self, global_id: &GlobalId) -> RepoResult<Option<Item>> {
        let Ok(seq) = i64::try_from(global_id.number()) else {
            return Ok(None);
        };
        let uuid: Option<String> = self
            .conn
            .query_row(
                "SELECT uuid FROM items WHERE seq = ?1 AND kind = ?2;",
                params![seq, global_id.kind().as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match uuid {
            Some(value) => load_item(self.conn, parse_uuid(&value, "items.uuid")?),
            None => Ok(None),
        }
    }

    fn persist_item(&self, item: &Item) -> RepoResult<Item> {
        item.validate()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        write_item(&tx, item)?;
        tx.commit()?;
        load_item(self.conn, item.id)?.ok_or(RepoError::ItemNotFound(item.id))
    }

    fn persist_items(&self, items: &[Item]) -> RepoResult<Vec<Item>> {
        for item in items {
            item.validate()?;
        }
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for item in items {
            write_item(&tx, item)?;
        }
        tx.commit()?;

        items
            .iter()
            .map(|item| load_item(self.conn, item.id)?.ok_or(RepoError::ItemNotFound(item.id)))
            .collect()
    }

    fn list_subsamples(&self, sample_id: ItemId) -> RepoResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid
             FROM items
             WHERE parent_sample_uuid = ?1
               AND kind = 'subsample'
             ORDER BY seq ASC;",
        )?;
        let mut rows = stmt.query([sample_id.to_string()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.push(parse_uuid(&value, "items.uuid")?);
        }

        ids.into_iter()
            .map(|id| load_item(self.conn, id)?.ok_or(RepoError::ItemNotFound(id)))
            .collect()
    }

    fn persist_placement(
        &self,
        container_id: ItemId,
        assignments: &[ItemPlacement],
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let header = load_container_header(&tx, container_id)?
            .ok_or(RepoError::ContainerNotFound(container_id))?;

        if let Some(capacity) = header.layout.capacity() {
            let occupied = count_contents(&tx, container_id)?;
            let requested = assignments.len() as u64;
            if occupied + requested > capacity {
                return Err(RepoError::CapacityExceeded {
                    container_id,
                    capacity,
                    occupied,
                    requested,
                });
            }
        }

        for assignment in assignments {
            if !item_exists(&tx, assignment.item_id)? {
                return Err(RepoError::ItemNotFound(assignment.item_id));
            }
            if load_placement(&tx, assignment.item_id)?.is_some() {
                return Err(RepoError::ItemAlreadyPlaced(assignment.item_id));
            }
            if encloses(&tx, assignment.item_id, container_id)? {
                return Err(RepoError::PlacementCycle {
                    item_id: assignment.item_id,
                    container_id,
                });
            }
            if occupant_at(&tx, container_id, assignment.location)?.is_some() {
                return Err(RepoError::LocationOccupied {
                    container_id,
                    location: assignment.location,
                });
            }
            tx.execute(
                "INSERT INTO placements (item_uuid, container_uuid, pos_x, pos_y)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    assignment.item_id.to_string(),
                    container_id.to_string(),
                    i64::from(assignment.location.x),
                    i64::from(assignment.location.y),
                ],
            )?;
        }

        tx.execute(
            "UPDATE items
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [container_id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn remove_placement(&self, item_id: ItemId) -> RepoResult<Option<Placement>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !item_exists(&tx, item_id)? {
            return Err(RepoError::ItemNotFound(item_id));
        }
        let current = load_placement(&tx, item_id)?;
        if current.is_some() {
            tx.execute(
                "DELETE FROM placements WHERE item_uuid = ?1;",
                [item_id.to_string()],
            )?;
        }
        tx.commit()?;
        Ok(current)
    }

    fn delete_container(&self, container_id: ItemId, mode: ContainerDeleteMode) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if load_container_header(&tx, container_id)?.is_none() {
            return Err(RepoError::ContainerNotFound(container_id));
        }

        let occupied = count_contents(&tx, container_id)?;
        match mode {
            ContainerDeleteMode::RequireEmpty if occupied > 0 => {
                return Err(RepoError::ContainerNotEmpty(container_id));
            }
            ContainerDeleteMode::RequireEmpty => {}
            ContainerDeleteMode::Dissolve => {
                tx.execute(
                    "DELETE FROM placements WHERE container_uuid = ?1;",
                    [container_id.to_string()],
                )?;
            }
        }

        tx.execute(
            "DELETE FROM items WHERE uuid = ?1 AND kind = 'container';",
            [container_id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }
}

struct ContainerHeader {
    seq: u64,
    name: String,
    layout: ContainerLayout,
    can_store_containers: bool,
    can_store_samples: bool,
    derived_from: Option<ItemId>,
}

fn container_item(container: &Container) -> Item {
    Item {
        id: container.id,
        global_id: None,
        kind: ItemKind::Container,
        name: container.name.clone(),
        quantity: None,
        tags: container.tags.clone(),
        parent_sample: None,
        derived_from: container.derived_from,
        placement: None,
    }
}

fn write_item(conn: &Connection, item: &Item) -> RepoResult<()> {
    let existing_kind: Option<String> = conn
        .query_row(
            "SELECT kind FROM items WHERE uuid = ?1;",
            [item.id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    match existing_kind.as_deref() {
        None if item.kind == ItemKind::Container => {
            return Err(RepoError::InvalidData(format!(
                "container item {} must be created with its layout",
                item.id
            )));
        }
        None => insert_item_row(conn, item)?,
        Some(kind) if kind != item.kind.as_str() => {
            return Err(RepoError::InvalidData(format!(
                "item {} kind cannot change from `{kind}` to `{}`",
                item.id, item.kind
            )));
        }
        Some(_) => {
            let (value, unit) = quantity_to_db(item.quantity.as_ref())?;
            conn.execute(
                "UPDATE items
                 SET
                    name = ?2,
                    quantity_value = ?3,
                    quantity_unit = ?4,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                params![item.id.to_string(), item.name.as_str(), value, unit],
            )?;
        }
    }

    replace_tags(conn, item.id, &item.tags)
}

fn insert_item_row(conn: &Connection, item: &Item) -> RepoResult<()> {
    let (value, unit) = quantity_to_db(item.quantity.as_ref())?;
    conn.execute(
        "INSERT INTO items (
            uuid,
            kind,
            name,
            quantity_value,
            quantity_unit,
            parent_sample_uuid,
            derived_from_uuid
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            item.id.to_string(),
            item.kind.as_str(),
            item.name.as_str(),
            value,
            unit,
            item.parent_sample.map(|id| id.to_string()),
            item.derived_from.map(|id| id.to_string()),
        ],
    )?;
    Ok(())
}

fn replace_tags(conn: &Connection, item_id: ItemId, tags: &TagSet) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM item_tags WHERE item_uuid = ?1;",
        [item_id.to_string()],
    )?;
    for (position, tag) in tags.iter().enumerate() {
        conn.execute(
            "INSERT INTO item_tags (item_uuid, position, tag) VALUES (?1, ?2, ?3);",
            params![item_id.to_string(), position as i64, tag.as_str()],
        )?;
    }
    Ok(())
}

fn load_tags(conn: &Connection, item_id: ItemId) -> RepoResult<TagSet> {
    let mut stmt = conn.prepare(
        "SELECT tag
         FROM item_tags
         WHERE item_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([item_id.to_string()])?;
    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        values.push(value);
    }
    Ok(normalize_tags(&values))
}

fn load_item(conn: &Connection, id: ItemId) -> RepoResult<Option<Item>> {
    let mut stmt = conn.prepare(&format!("{ITEM_SELECT_SQL} WHERE i.uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    let mut item = parse_item_row(row)?;
    item.tags = load_tags(conn, item.id)?;
    item.validate()?;
    Ok(Some(item))
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "items.uuid")?;

    let kind_text: String = row.get("kind")?;
    let kind = parse_item_kind(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid item kind `{kind_text}` in items.kind"))
    })?;

    let seq = to_u64(row.get("seq")?, "items.seq")?;
    let quantity = quantity_from_db(row.get("quantity_value")?, row.get("quantity_unit")?)?;
    let parent_sample = row
        .get::<_, Option<String>>("parent_sample_uuid")?
        .map(|value| parse_uuid(&value, "items.parent_sample_uuid"))
        .transpose()?;
    let derived_from = row
        .get::<_, Option<String>>("derived_from_uuid")?
        .map(|value| parse_uuid(&value, "items.derived_from_uuid"))
        .transpose()?;

    let placement = match (
        row.get::<_, Option<String>>("container_uuid")?,
        row.get::<_, Option<i64>>("pos_x")?,
        row.get::<_, Option<i64>>("pos_y")?,
    ) {
        (Some(container), Some(x), Some(y)) => Some(Placement {
            container_id: parse_uuid(&container, "placements.container_uuid")?,
            location: Location::new(to_u32(x, "placements.pos_x")?, to_u32(y, "placements.pos_y")?),
        }),
        (None, None, None) => None,
        _ => {
            return Err(RepoError::InvalidData(format!(
                "incomplete placement row for item {id}"
            )));
        }
    };

    Ok(Item {
        id,
        global_id: Some(GlobalId::new(kind, seq)),
        kind,
        name: row.get("name")?,
        quantity,
        tags: TagSet::new(),
        parent_sample,
        derived_from,
        placement,
    })
}

fn load_container_header(
    conn: &Connection,
    id: ItemId,
) -> RepoResult<Option<ContainerHeader>> {
    let mut stmt = conn.prepare(
        "SELECT
            i.seq AS seq,
            i.name AS name,
            i.derived_from_uuid AS derived_from_uuid,
            c.layout AS layout,
            c.capacity AS capacity,
            c.grid_rows AS grid_rows,
            c.grid_columns AS grid_columns,
            c.can_store_containers AS can_store_containers,
            c.can_store_samples AS can_store_samples
         FROM containers c
         INNER JOIN items i ON i.uuid = c.uuid
         WHERE c.uuid = ?1;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let layout_text: String = row.get("layout")?;
    let kind = parse_container_kind(&layout_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid container layout `{layout_text}` in containers.layout"
        ))
    })?;
    let layout = ContainerLayout::validate(
        kind,
        row.get("grid_rows")?,
        row.get("grid_columns")?,
        row.get("capacity")?,
    )
    .map_err(|err| RepoError::InvalidData(format!("container {id}: {err}")))?;

    Ok(Some(ContainerHeader {
        seq: to_u64(row.get("seq")?, "items.seq")?,
        name: row.get("name")?,
        layout,
        can_store_containers: int_to_bool(
            row.get("can_store_containers")?,
            "containers.can_store_containers",
        )?,
        can_store_samples: int_to_bool(
            row.get("can_store_samples")?,
            "containers.can_store_samples",
        )?,
        derived_from: row
            .get::<_, Option<String>>("derived_from_uuid")?
            .map(|value| parse_uuid(&value, "items.derived_from_uuid"))
            .transpose()?,
    }))
}

fn load_container(conn: &Connection, id: ItemId) -> RepoResult<Option<Container>> {
    let Some(header) = load_container_header(conn, id)? else {
        return Ok(None);
    };
    Ok(Some(Container {
        id,
        global_id: Some(GlobalId::new(ItemKind::Container, header.seq)),
        name: header.name,
        layout: header.layout,
        can_store_containers: header.can_store_containers,
        can_store_samples: header.can_store_samples,
        tags: load_tags(conn, id)?,
        derived_from: header.derived_from,
        contents: load_contents(conn, id)?,
    }))
}

fn load_contents(conn: &Connection, container_id: ItemId) -> RepoResult<BTreeMap<Location, ItemId>> {
    let mut stmt = conn.prepare(
        "SELECT item_uuid, pos_x, pos_y
         FROM placements
         WHERE container_uuid = ?1;",
    )?;
    let mut rows = stmt.query([container_id.to_string()])?;
    let mut contents = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let item_text: String = row.get(0)?;
        let location = Location::new(
            to_u32(row.get(1)?, "placements.pos_x")?,
            to_u32(row.get(2)?, "placements.pos_y")?,
        );
        contents.insert(location, parse_uuid(&item_text, "placements.item_uuid")?);
    }
    Ok(contents)
}

fn count_contents(conn: &Connection, container_id: ItemId) -> RepoResult<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM placements WHERE container_uuid = ?1;",
        [container_id.to_string()],
        |row| row.get(0),
    )?;
    to_u64(count, "placements.count")
}

fn load_placement(conn: &Connection, item_id: ItemId) -> RepoResult<Option<Placement>> {
    let row: Option<(String, i64, i64)> = conn
        .query_row(
            "SELECT container_uuid, pos_x, pos_y FROM placements WHERE item_uuid = ?1;",
            [item_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    row.map(|(container, x, y)| {
        Ok(Placement {
            container_id: parse_uuid(&container, "placements.container_uuid")?,
            location: Location::new(to_u32(x, "placements.pos_x")?, to_u32(y, "placements.pos_y")?),
        })
    })
    .transpose()
}

/// Walks the committed placement chain up from `container_id`.
fn encloses(conn: &Connection, item_id: ItemId, container_id: ItemId) -> RepoResult<bool> {
    let mut visited = HashSet::new();
    let mut cursor = Some(container_id);
    while let Some(current) = cursor {
        if current == item_id || !visited.insert(current) {
            return Ok(true);
        }
        cursor = load_placement(conn, current)?.map(|placement| placement.container_id);
    }
    Ok(false)
}

fn occupant_at(
    conn: &Connection,
    container_id: ItemId,
    location: Location,
) -> RepoResult<Option<ItemId>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT item_uuid
             FROM placements
             WHERE container_uuid = ?1
               AND pos_x = ?2
               AND pos_y = ?3;",
            params![
                container_id.to_string(),
                i64::from(location.x),
                i64::from(location.y),
            ],
            |row| row.get(0),
        )
        .optional()?;
    value
        .map(|text| parse_uuid(&text, "placements.item_uuid"))
        .transpose()
}

fn item_exists(conn: &Connection, item_id: ItemId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM items WHERE uuid = ?1);",
        [item_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn quantity_to_db(quantity: Option<&Quantity>) -> RepoResult<(Option<i64>, Option<&'static str>)> {
    let Some(quantity) = quantity else {
        return Ok((None, None));
    };
    let value = i64::try_from(quantity.value.thousandths()).map_err(|_| {
        RepoError::InvalidData(format!("quantity {quantity} exceeds storable range"))
    })?;
    Ok((Some(value), Some(unit_to_db(quantity.unit))))
}

fn quantity_from_db(value: Option<i64>, unit: Option<String>) -> RepoResult<Option<Quantity>> {
    match (value, unit) {
        (None, None) => Ok(None),
        (Some(value), Some(unit)) => {
            let unit_kind = parse_unit_db(&unit).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid unit `{unit}` in items.quantity_unit"))
            })?;
            let raw = to_u64(value, "items.quantity_value")?;
            Ok(Some(Quantity::new(Amount::from_thousandths(raw), unit_kind)))
        }
        _ => Err(RepoError::InvalidData(
            "items.quantity_value and items.quantity_unit must be set together".to_string(),
        )),
    }
}

fn unit_to_db(unit: UnitKind) -> &'static str {
    match unit {
        UnitKind::Microliter => "microliter",
        UnitKind::Milliliter => "milliliter",
        UnitKind::Liter => "liter",
        UnitKind::Microgram => "microgram",
        UnitKind::Milligram => "milligram",
        UnitKind::Gram => "gram",
        UnitKind::Kilogram => "kilogram",
        UnitKind::Items => "items",
    }
}

fn parse_unit_db(value: &str) -> Option<UnitKind> {
    UnitKind::ALL
        .into_iter()
        .find(|unit| unit_to_db(*unit) == value)
}

fn parse_item_kind(value: &str) -> Option<ItemKind> {
    match value {
        "sample" => Some(ItemKind::Sample),
        "subsample" => Some(ItemKind::Subsample),
        "container" => Some(ItemKind::Container),
        _ => None,
    }
}

fn parse_container_kind(value: &str) -> Option<ContainerKind> {
    match value {
        "list" => Some(ContainerKind::List),
        "grid" => Some(ContainerKind::Grid),
        "workbench" => Some(ContainerKind::Workbench),
        "image" => Some(ContainerKind::Image),
        _ => None,
    }
}

fn layout_to_db(layout: &ContainerLayout) -> (Option<i64>, Option<i64>, Option<i64>) {
    match *layout {
        ContainerLayout::Grid { rows, columns } => (None, Some(i64::from(rows)), Some(i64::from(columns))),
        ContainerLayout::List { capacity }
        | ContainerLayout::Workbench { capacity }
        | ContainerLayout::Image { capacity } => (capacity.map(i64::from), None, None),
    }
}

fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn to_u32(value: i64, column: &'static str) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("value `{value}` out of range in {column}")))
}

fn to_u64(value: i64, column: &'static str) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("value `{value}` out of range in {column}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn int_to_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn ensure_store_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
