use peopledb_core::db::open_db_in_memory;
use peopledb_core::{
    Address, AddressRepository, ConfigurationError, CrudOperation, CrudRepository, RepoError,
    Region,
};

fn sample() -> Address {
    Address::new("123 Beale St.", "Fulton", "WA", "90210", "United States", Region::West)
        .with_address2("Apt. 1A")
}

#[test]
fn save_then_find_round_trips_every_column() {
    let conn = open_db_in_memory().unwrap();
    let repo = AddressRepository::for_connection(&conn);

    let mut address = sample().with_county("Fulton County");
    let id = repo.save(&mut address).unwrap();
    assert!(id > 0);
    assert_eq!(address.id(), Some(id));

    let found = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(found, address);
    assert_eq!(found.region, Region::West);
    assert_eq!(found.county.as_deref(), Some("Fulton County"));
}

#[test]
fn optional_lines_stay_empty() {
    let conn = open_db_in_memory().unwrap();
    let repo = AddressRepository::for_connection(&conn);

    let mut address = Address::new("1 Way", "Nome", "AK", "99762", "United States", Region::North);
    let id = repo.save(&mut address).unwrap();

    let found = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(found.address2, None);
    assert_eq!(found.county, None);
    assert_eq!(found.region, Region::North);
}

#[test]
fn missing_address_is_absent() {
    let conn = open_db_in_memory().unwrap();
    let repo = AddressRepository::for_connection(&conn);

    assert!(repo.find_by_id(77).unwrap().is_none());
}

#[test]
fn undeclared_operations_fail_with_configuration_errors() {
    let conn = open_db_in_memory().unwrap();
    let repo = AddressRepository::for_connection(&conn);
    let mut address = sample();
    repo.save(&mut address).unwrap();

    assert!(matches!(
        repo.count().unwrap_err(),
        RepoError::Configuration(ConfigurationError::MissingStatement {
            operation: CrudOperation::Count,
            ..
        })
    ));
    assert!(matches!(
        repo.update(&address).unwrap_err(),
        RepoError::Configuration(ConfigurationError::MissingStatement {
            operation: CrudOperation::Update,
            ..
        })
    ));
    assert!(matches!(
        repo.find_all().unwrap_err(),
        RepoError::Configuration(_)
    ));
    assert!(matches!(
        repo.delete(&address).unwrap_err(),
        RepoError::Configuration(_)
    ));
    assert!(matches!(
        repo.alter_table().unwrap_err(),
        RepoError::Configuration(_)
    ));
    assert_eq!(repo.find_by_id(address.id().unwrap()).unwrap(), Some(address));
}

#[test]
fn unknown_region_text_is_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO ADDRESSES (STREET_ADDRESS, CITY, STATE, POSTCODE, REGION, COUNTRY)
         VALUES ('x', 'y', 'z', '1', 'ATLANTIS', 'Nowhere');",
        [],
    )
    .unwrap();
    let id = conn.last_insert_rowid();
    let repo = AddressRepository::for_connection(&conn);

    assert!(matches!(
        repo.find_by_id(id).unwrap_err(),
        RepoError::InvalidData(message) if message.contains("ATLANTIS")
    ));
}
