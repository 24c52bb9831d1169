use chrono::{DateTime, FixedOffset, TimeZone};
use peopledb_core::db::open_db_in_memory;
use peopledb_core::{Address, CrudRepository, Person, PersonRepository, Region};

fn zoned(year: i32, month: u32, day: u32) -> DateTime<FixedOffset> {
    FixedOffset::west_opt(6 * 3600)
        .unwrap()
        .with_ymd_and_hms(year, month, day, 15, 15, 0)
        .unwrap()
}

fn home() -> Address {
    Address::new("123 Beale St.", "Fulton", "WA", "90210", "United States", Region::West)
        .with_address2("Apt. 1A")
        .with_county("Fulton County")
}

fn office() -> Address {
    Address::new("9 Main St.", "Boston", "MA", "02101", "United States", Region::East)
}

fn child(first_name: &str, year: i32) -> Person {
    Person::new(first_name, "Smith", zoned(year, 3, 4))
}

#[test]
fn parent_with_children_and_home_address_is_rebuilt_from_join_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = PersonRepository::for_connection(&conn);

    let mut parent = Person::new("John", "Smith", zoned(1980, 11, 15));
    parent.home_address = Some(home());
    assert!(parent.add_child(child("Johnny", 2010)));
    assert!(parent.add_child(child("Sarah", 2012)));
    let id = repo.save(&mut parent).unwrap();

    let found = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(found, parent);
    assert_eq!(found.children().len(), 2);
    assert_eq!(found.children(), parent.children());
    assert_eq!(found.home_address, parent.home_address);
    assert_eq!(found.business_address, None);

    let stored_home = found.home_address.as_ref().unwrap();
    assert!(stored_home.id().is_some());
    assert_eq!(stored_home.region, Region::West);
    assert_eq!(stored_home.address2.as_deref(), Some("Apt. 1A"));
    assert_eq!(stored_home.county.as_deref(), Some("Fulton County"));
}

#[test]
fn both_addresses_and_many_children_fan_out_without_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let repo = PersonRepository::for_connection(&conn);

    let mut parent = Person::new("Jane", "Doe", zoned(1975, 6, 1));
    parent.home_address = Some(home());
    parent.business_address = Some(office());
    for (name, year) in [("Ann", 2001), ("Ben", 2003), ("Cal", 2005)] {
        parent.add_child(child(name, year));
    }
    let id = repo.save(&mut parent).unwrap();

    let found = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(found.children().len(), 3);
    assert_eq!(found.home_address.as_ref().unwrap().city, "Fulton");
    assert_eq!(found.business_address.as_ref().unwrap().city, "Boston");
    assert_eq!(
        found.business_address.as_ref().unwrap().region,
        Region::East
    );
    let names: Vec<&str> = found
        .children()
        .iter()
        .map(|kid| kid.first_name.as_str())
        .collect();
    assert_eq!(names, ["Ann", "Ben", "Cal"]);
}

#[test]
fn saved_children_point_back_to_their_parent() {
    let conn = open_db_in_memory().unwrap();
    let repo = PersonRepository::for_connection(&conn);

    let mut parent = Person::new("John", "Smith", zoned(1980, 11, 15));
    parent.add_child(child("Johnny", 2010));
    let parent_id = repo.save(&mut parent).unwrap();

    let saved_child = &parent.children()[0];
    let child_id = saved_child.id().unwrap();
    assert_eq!(saved_child.parent_id(), Some(parent_id));

    let loaded_child = repo.find_by_id(child_id).unwrap().unwrap();
    assert_eq!(loaded_child.parent_id(), Some(parent_id));
    assert!(loaded_child.children().is_empty());

    let loaded_parent = repo.find_by_id(parent_id).unwrap().unwrap();
    assert_eq!(loaded_parent.children()[0].parent_id(), Some(parent_id));
    assert_eq!(repo.count().unwrap(), 2);
}

#[test]
fn find_all_groups_join_rows_per_person() {
    let conn = open_db_in_memory().unwrap();
    let repo = PersonRepository::for_connection(&conn);

    let mut first = Person::new("Alpha", "Parent", zoned(1970, 1, 1));
    first.home_address = Some(home());
    first.add_child(child("A1", 2000));
    first.add_child(child("A2", 2002));
    let mut second = Person::new("Beta", "Parent", zoned(1972, 2, 2));
    second.add_child(child("B1", 2004));
    repo.save(&mut first).unwrap();
    repo.save(&mut second).unwrap();

    let all = repo.find_all().unwrap();
    assert_eq!(all.len(), 5);

    let find = |name: &str| {
        all.iter()
            .find(|person| person.first_name == name)
            .unwrap()
    };
    assert_eq!(find("Alpha").children().len(), 2);
    assert!(find("Alpha").home_address.is_some());
    assert_eq!(find("Beta").children().len(), 1);
    for leaf in ["A1", "A2", "B1"] {
        assert!(find(leaf).children().is_empty());
    }
    assert_eq!(find("A2").parent_id(), first.id());
    assert_eq!(find("B1").parent_id(), second.id());
}

#[test]
fn equal_children_are_kept_once() {
    let conn = open_db_in_memory().unwrap();
    let repo = PersonRepository::for_connection(&conn);

    let mut parent = Person::new("John", "Smith", zoned(1980, 11, 15));
    assert!(parent.add_child(child("Twin", 2010)));
    assert!(!parent.add_child(child("Twin", 2010)));
    let id = repo.save(&mut parent).unwrap();

    assert_eq!(repo.find_by_id(id).unwrap().unwrap().children().len(), 1);
    assert_eq!(repo.count().unwrap(), 2);
}

#[test]
fn shared_saved_address_is_not_inserted_twice() {
    let conn = open_db_in_memory().unwrap();
    let repo = PersonRepository::for_connection(&conn);

    let mut first = Person::new("Ann", "Lee", zoned(1990, 5, 5));
    first.home_address = Some(home());
    repo.save(&mut first).unwrap();

    let mut second = Person::new("Bo", "Lee", zoned(1991, 6, 6));
    second.home_address = first.home_address.clone();
    repo.save(&mut second).unwrap();

    let addresses: i64 = conn
        .query_row("SELECT COUNT(*) FROM ADDRESSES;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(addresses, 1);
    assert_eq!(second.home_address, first.home_address);
}

#[test]
fn deleting_a_parent_orphans_its_children() {
    let conn = open_db_in_memory().unwrap();
    let repo = PersonRepository::for_connection(&conn);

    let mut parent = Person::new("John", "Smith", zoned(1980, 11, 15));
    parent.add_child(child("Johnny", 2010));
    repo.save(&mut parent).unwrap();
    let child_id = parent.children()[0].id().unwrap();

    assert_eq!(repo.delete(&parent).unwrap(), 1);

    let orphan = repo.find_by_id(child_id).unwrap().unwrap();
    assert_eq!(orphan.parent_id(), None);
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn adopting_an_already_saved_child_stores_the_parent_link() {
    let conn = open_db_in_memory().unwrap();
    let repo = PersonRepository::for_connection(&conn);

    let mut kid = child("Johnny", 2010);
    let kid_id = repo.save(&mut kid).unwrap();

    let mut parent = Person::new("John", "Smith", zoned(1980, 11, 15));
    assert!(parent.add_child(kid));
    let parent_id = repo.save(&mut parent).unwrap();

    assert_eq!(parent.children()[0].parent_id(), Some(parent_id));
    assert_eq!(repo.count().unwrap(), 2);

    let loaded_parent = repo.find_by_id(parent_id).unwrap().unwrap();
    assert_eq!(loaded_parent.children().len(), 1);
    assert_eq!(loaded_parent.children()[0].id(), Some(kid_id));

    let loaded_kid = repo.find_by_id(kid_id).unwrap().unwrap();
    assert_eq!(loaded_kid.parent_id(), Some(parent_id));
}
