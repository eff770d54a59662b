use labstock_core::db::{open_db, open_db_in_memory};
use labstock_core::{
    Container, ContainerDeleteMode, ContainerService, GridFill, InventoryStore, Item, ItemPlacement,
    ItemService, Location, NewContainer, NewSample, PlacementError, PlacementRequest,
    PlacementService, PlacementStrategy, Quantity, RepoError, ServiceError, SqliteInventoryStore,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn placement_service(conn: &Connection) -> PlacementService<SqliteInventoryStore<'_>> {
    PlacementService::new(SqliteInventoryStore::try_new(conn).unwrap())
}

fn container_service(conn: &Connection) -> ContainerService<SqliteInventoryStore<'_>> {
    ContainerService::new(SqliteInventoryStore::try_new(conn).unwrap())
}

fn subsamples(conn: &Connection, count: usize) -> Vec<Uuid> {
    let service = ItemService::new(SqliteInventoryStore::try_new(conn).unwrap());
    service
        .create_sample(
            &NewSample::new("plasmid prep")
                .with_quantity(Quantity::parse("1 ml").unwrap(), count),
        )
        .unwrap()
        .subsamples
        .into_iter()
        .map(|item| item.id)
        .collect()
}

fn xy(locations: &[ItemPlacement]) -> Vec<(u32, u32)> {
    locations
        .iter()
        .map(|placement| (placement.location.x, placement.location.y))
        .collect()
}

#[test]
fn by_row_commits_row_major_locations() {
    let conn = setup();
    let grid = container_service(&conn)
        .create_container(NewContainer::grid("rack", 2, 3))
        .unwrap();
    let items = subsamples(&conn, 5);

    let outcome = placement_service(&conn)
        .resolve_placement(&PlacementRequest {
            container_id: grid.id,
            item_ids: items.clone(),
            strategy: PlacementStrategy::ByRow(GridFill::from_origin().with_totals(3, 2)),
        })
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.container_id, grid.id);
    assert_eq!(
        xy(&outcome.placements),
        vec![(1, 1), (2, 1), (3, 1), (1, 2), (2, 2)]
    );

    let stored = container_service(&conn).get_container(grid.id).unwrap();
    assert_eq!(stored.occupied_slots(), 5);
    assert_eq!(stored.occupant(Location::new(1, 2)), Some(items[3]));

    let moved = ItemService::new(SqliteInventoryStore::try_new(&conn).unwrap())
        .get_item(items[4])
        .unwrap();
    let placement = moved.placement.unwrap();
    assert_eq!(placement.container_id, grid.id);
    assert_eq!(placement.location, Location::new(2, 2));
}

#[test]
fn by_column_commits_column_major_locations() {
    let conn = setup();
    let grid = container_service(&conn)
        .create_container(NewContainer::grid("rack", 2, 3))
        .unwrap();
    let items = subsamples(&conn, 5);

    let outcome = placement_service(&conn)
        .resolve_placement(&PlacementRequest {
            container_id: grid.id,
            item_ids: items,
            strategy: PlacementStrategy::ByColumn(GridFill::from_origin()),
        })
        .unwrap();

    assert_eq!(
        xy(&outcome.placements),
        vec![(1, 1), (1, 2), (2, 1), (2, 2), (3, 1)]
    );
}

#[test]
fn filling_every_cell_then_one_more_overflows_before_commit() {
    let conn = setup();
    let grid = container_service(&conn)
        .create_container(NewContainer::grid("box", 3, 4))
        .unwrap();
    let service = placement_service(&conn);

    let first = subsamples(&conn, 12);
    service
        .resolve_placement(&PlacementRequest {
            container_id: grid.id,
            item_ids: first,
            strategy: PlacementStrategy::ByRow(GridFill::from_origin()),
        })
        .unwrap();
    assert_eq!(container_service(&conn).occupied_slots(grid.id).unwrap(), 12);

    let empty = container_service(&conn)
        .create_container(NewContainer::grid("spare", 3, 4))
        .unwrap();
    let too_many = subsamples(&conn, 13);
    let err = service
        .resolve_placement(&PlacementRequest {
            container_id: empty.id,
            item_ids: too_many.clone(),
            strategy: PlacementStrategy::ByRow(GridFill::from_origin()),
        })
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Placement(PlacementError::GridOverflow {
            requested: 13,
            available: 12,
        })
    ));
    assert_eq!(container_service(&conn).occupied_slots(empty.id).unwrap(), 0);
    let untouched = ItemService::new(SqliteInventoryStore::try_new(&conn).unwrap())
        .get_item(too_many[0])
        .unwrap();
    assert!(untouched.placement.is_none());
}

#[test]
fn by_location_arity_mismatch_is_rejected() {
    let conn = setup();
    let grid = container_service(&conn)
        .create_container(NewContainer::grid("rack", 2, 2))
        .unwrap();
    let items = subsamples(&conn, 3);

    let err = placement_service(&conn)
        .move_items(&items, grid.id, &[Location::new(1, 1), Location::new(2, 1)])
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Placement(PlacementError::ArityMismatch {
            items: 3,
            locations: 2,
        })
    ));
}

#[test]
fn arity_mismatch_is_reported_before_item_checks() {
    let conn = setup();
    let grid = container_service(&conn)
        .create_container(NewContainer::grid("rack", 2, 2))
        .unwrap();
    let items = subsamples(&conn, 3);
    let service = placement_service(&conn);
    service
        .move_items(&items[..1], grid.id, &[Location::new(2, 2)])
        .unwrap();

    let err = service
        .move_items(&items, grid.id, &[Location::new(1, 1), Location::new(2, 1)])
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Placement(PlacementError::ArityMismatch {
            items: 3,
            locations: 2,
        })
    ));

    let boxes_only = container_service(&conn)
        .create_container(NewContainer::grid("box shelf", 2, 2).storing(true, false))
        .unwrap();
    let err = service
        .move_items(&items[1..], boxes_only.id, &[Location::new(1, 1)])
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Placement(PlacementError::ArityMismatch {
            items: 2,
            locations: 1,
        })
    ));

    let err = service
        .move_items(&items[1..], Uuid::new_v4(), &[Location::new(1, 1)])
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Placement(PlacementError::ArityMismatch { .. })
    ));
    assert_eq!(
        container_service(&conn).occupied_slots(grid.id).unwrap(),
        1
    );
}

#[test]
fn occupied_location_collides_and_leaves_contents_unchanged() {
    let conn = setup();
    let grid = container_service(&conn)
        .create_container(NewContainer::grid("rack", 2, 2))
        .unwrap();
    let items = subsamples(&conn, 3);
    let service = placement_service(&conn);

    service
        .move_items(&items[..1], grid.id, &[Location::new(2, 2)])
        .unwrap();
    let before = container_service(&conn).get_container(grid.id).unwrap();

    let err = service
        .move_items(
            &items[1..],
            grid.id,
            &[Location::new(1, 1), Location::new(2, 2)],
        )
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Placement(PlacementError::LocationCollision(location))
            if location == Location::new(2, 2)
    ));
    let after = container_service(&conn).get_container(grid.id).unwrap();
    assert_eq!(after.contents, before.contents);
}

#[test]
fn explicit_location_outside_grid_is_out_of_bounds() {
    let conn = setup();
    let grid = container_service(&conn)
        .create_container(NewContainer::grid("rack", 2, 2))
        .unwrap();
    let items = subsamples(&conn, 1);

    let err = placement_service(&conn)
        .move_items(&items, grid.id, &[Location::new(3, 1)])
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Placement(PlacementError::OutOfBounds(_))
    ));
}

#[test]
fn row_fill_into_list_needs_dimensions() {
    let conn = setup();
    let shelf = container_service(&conn)
        .create_container(NewContainer::list("shelf"))
        .unwrap();
    let items = subsamples(&conn, 2);

    let err = placement_service(&conn)
        .resolve_placement(&PlacementRequest {
            container_id: shelf.id,
            item_ids: items,
            strategy: PlacementStrategy::ByRow(GridFill::from_origin()),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Placement(PlacementError::DimensionsRequired(_))
    ));
}

#[test]
fn storage_flags_block_samples() {
    let conn = setup();
    let rack = container_service(&conn)
        .create_container(NewContainer::grid("rack", 2, 2).storing(true, false))
        .unwrap();
    let items = subsamples(&conn, 1);

    let err = placement_service(&conn)
        .move_items(&items, rack.id, &[Location::new(1, 1)])
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Placement(PlacementError::UnsupportedItemKind { .. })
    ));
}

#[test]
fn placed_item_moves_only_after_removal() {
    let conn = setup();
    let containers = container_service(&conn);
    let first = containers
        .create_container(NewContainer::grid("first", 1, 2))
        .unwrap();
    let second = containers
        .create_container(NewContainer::list("second").with_capacity(3))
        .unwrap();
    let items = subsamples(&conn, 1);
    let service = placement_service(&conn);

    service
        .move_items(&items, first.id, &[Location::new(1, 1)])
        .unwrap();
    let err = service
        .move_items(&items, second.id, &[Location::slot(1)])
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Placement(PlacementError::ItemAlreadyPlaced(id)) if id == items[0]
    ));

    let vacated = service.remove_from_container(items[0]).unwrap().unwrap();
    assert_eq!(vacated.container_id, first.id);
    assert_eq!(vacated.location, Location::new(1, 1));
    assert!(service.remove_from_container(items[0]).unwrap().is_none());

    service
        .move_items(&items, second.id, &[Location::slot(1)])
        .unwrap();
    assert_eq!(containers.occupied_slots(first.id).unwrap(), 0);
    assert_eq!(containers.occupied_slots(second.id).unwrap(), 1);
}

#[test]
fn next_available_fills_lowest_free_list_slots() {
    let conn = setup();
    let shelf = container_service(&conn)
        .create_container(NewContainer::list("shelf").with_capacity(3))
        .unwrap();
    let items = subsamples(&conn, 4);
    let service = placement_service(&conn);

    service
        .move_items(&items[..1], shelf.id, &[Location::slot(2)])
        .unwrap();
    let outcome = service
        .resolve_placement(&PlacementRequest {
            container_id: shelf.id,
            item_ids: items[1..3].to_vec(),
            strategy: PlacementStrategy::NextAvailable,
        })
        .unwrap();
    assert_eq!(xy(&outcome.placements), vec![(1, 1), (3, 1)]);

    let err = service
        .resolve_placement(&PlacementRequest {
            container_id: shelf.id,
            item_ids: items[3..].to_vec(),
            strategy: PlacementStrategy::NextAvailable,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Placement(PlacementError::CapacityExceeded {
            capacity: 3,
            occupied: 3,
            requested: 1,
        })
    ));
}

#[test]
fn empty_request_succeeds_without_writes() {
    let conn = setup();
    let grid = container_service(&conn)
        .create_container(NewContainer::grid("rack", 2, 2))
        .unwrap();

    let outcome = placement_service(&conn)
        .resolve_placement(&PlacementRequest {
            container_id: grid.id,
            item_ids: Vec::new(),
            strategy: PlacementStrategy::ByRow(GridFill::from_origin()),
        })
        .unwrap();
    assert!(outcome.success);
    assert!(outcome.placements.is_empty());
}

#[test]
fn unknown_container_and_item_are_reported() {
    let conn = setup();
    let grid = container_service(&conn)
        .create_container(NewContainer::grid("rack", 2, 2))
        .unwrap();
    let service = placement_service(&conn);

    let missing_container = Uuid::new_v4();
    let err = service
        .move_items(&[], missing_container, &[])
        .unwrap_err();
    assert!(matches!(err, ServiceError::ContainerNotFound(id) if id == missing_container));

    let missing_item = Uuid::new_v4();
    let err = service
        .move_items(&[missing_item], grid.id, &[Location::new(1, 1)])
        .unwrap_err();
    assert!(matches!(err, ServiceError::ItemNotFound(id) if id == missing_item));
}

#[test]
fn racing_commit_on_second_connection_hits_occupied_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.sqlite3");
    let conn_a = open_db(&path).unwrap();
    let conn_b = open_db(&path).unwrap();

    let store_a = SqliteInventoryStore::try_new(&conn_a).unwrap();
    let grid = store_a
        .create_container(&Container::create(NewContainer::grid("rack", 1, 1)).unwrap())
        .unwrap();
    let first = store_a.persist_item(&Item::sample("first")).unwrap();
    let second = store_a.persist_item(&Item::sample("second")).unwrap();

    let store_b = SqliteInventoryStore::try_new(&conn_b).unwrap();
    let stale_snapshot = store_b.fetch_container(grid.id).unwrap().unwrap();
    assert!(stale_snapshot.contents.is_empty());

    store_a
        .persist_placement(
            grid.id,
            &[ItemPlacement {
                item_id: first.id,
                location: Location::new(1, 1),
            }],
        )
        .unwrap();

    let err = store_b
        .persist_placement(
            grid.id,
            &[ItemPlacement {
                item_id: second.id,
                location: Location::new(1, 1),
            }],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::CapacityExceeded { .. } | RepoError::LocationOccupied { .. }
    ));

    let service_error: ServiceError = RepoError::LocationOccupied {
        container_id: grid.id,
        location: Location::new(1, 1),
    }
    .into();
    assert!(matches!(
        service_error,
        ServiceError::Placement(PlacementError::LocationCollision(_))
    ));

    let stored = store_b.fetch_container(grid.id).unwrap().unwrap();
    assert_eq!(stored.occupant(Location::new(1, 1)), Some(first.id));
}

#[test]
fn racing_commit_on_larger_grid_reports_occupied_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race-grid.sqlite3");
    let conn_a = open_db(&path).unwrap();
    let conn_b = open_db(&path).unwrap();

    let store_a = SqliteInventoryStore::try_new(&conn_a).unwrap();
    let grid = store_a
        .create_container(&Container::create(NewContainer::grid("rack", 2, 2)).unwrap())
        .unwrap();
    let first = store_a.persist_item(&Item::sample("first")).unwrap();
    let second = store_a.persist_item(&Item::sample("second")).unwrap();

    store_a
        .persist_placement(
            grid.id,
            &[ItemPlacement {
                item_id: first.id,
                location: Location::new(2, 1),
            }],
        )
        .unwrap();

    let store_b = SqliteInventoryStore::try_new(&conn_b).unwrap();
    let err = store_b
        .persist_placement(
            grid.id,
            &[ItemPlacement {
                item_id: second.id,
                location: Location::new(2, 1),
            }],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::LocationOccupied { location, .. } if location == Location::new(2, 1)
    ));
    assert!(store_b.fetch_item(second.id).unwrap().unwrap().placement.is_none());
}

#[test]
fn delete_container_respects_mode() {
    let conn = setup();
    let containers = container_service(&conn);
    let grid = containers
        .create_container(NewContainer::grid("rack", 2, 2))
        .unwrap();
    let items = subsamples(&conn, 2);
    placement_service(&conn)
        .move_items(&items, grid.id, &[Location::new(1, 1), Location::new(2, 1)])
        .unwrap();

    let err = containers
        .delete_container(grid.id, ContainerDeleteMode::RequireEmpty)
        .unwrap_err();
    assert!(matches!(err, ServiceError::ContainerNotEmpty(id) if id == grid.id));

    containers
        .delete_container(grid.id, ContainerDeleteMode::Dissolve)
        .unwrap();
    assert!(matches!(
        containers.get_container(grid.id),
        Err(ServiceError::ContainerNotFound(_))
    ));

    let released = ItemService::new(SqliteInventoryStore::try_new(&conn).unwrap())
        .get_item(items[0])
        .unwrap();
    assert!(released.placement.is_none());
}

#[test]
fn dimensions_are_exposed_only_for_grids() {
    let conn = setup();
    let containers = container_service(&conn);
    let grid = containers
        .create_container(NewContainer::grid("rack", 8, 12))
        .unwrap();
    let bench = containers
        .create_container(NewContainer::workbench("bench"))
        .unwrap();

    let dims = containers.dimensions_of(grid.id).unwrap();
    assert_eq!((dims.rows, dims.columns), (8, 12));
    assert!(matches!(
        containers.dimensions_of(bench.id),
        Err(ServiceError::Container(_))
    ));
}
