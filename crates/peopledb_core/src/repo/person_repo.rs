//! Person adapter: cascading saves and join-flattened graph reconstruction.
//!
//! # Responsibility
//! - Bind person columns, saving owned addresses first so their identities
//!   can be bound as foreign keys.
//! - Save children once the parent's identity is known; children that are
//!   already stored only get their PARENT_ID rewritten.
//! - Rebuild a person, both addresses and its children from one outer-join
//!   result that fans out one row per child/address combination.
//!
//! # Invariants
//! - Join rows of one parent are contiguous: graph queries order by `P.ID`.
//! - Date of birth is stored as UTC text; salary as exact decimal text.
//! - UPDATE binds columns in the order FIRST_NAME, LAST_NAME, DOB, SALARY,
//!   EMAIL; the engine appends the identity last.

use super::address_repo::{extract_address, AddressRepository};
use super::crud_repo::{
    CrudRepository, EntityMapper, RepoError, RepoResult, SqliteCrudRepository,
};
use super::identity::IdentityAccessor;
use super::operation::CrudOperation;
use super::rows::{RowCursor, RowRecord};
use super::sql_resolver::SqlTable;
use crate::model::address::Address;
use crate::model::person::Person;
use crate::model::EntityId;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::str::FromStr;

pub const PARENT_PREFIX: &str = "P_";
pub const CHILD_PREFIX: &str = "C_";
pub const HOME_ADDRESS_PREFIX: &str = "HA_";
pub const BUSINESS_ADDRESS_PREFIX: &str = "BA_";

const DOB_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const SAVE_PERSON_SQL: &str = "INSERT INTO PERSON (
    FIRST_NAME,
    LAST_NAME,
    DOB,
    SALARY,
    EMAIL,
    HOME_ADDRESS,
    BUSINESS_ADDRESS,
    PARENT_ID
) VALUES (?, ?, ?, ?, ?, ?, ?, ?);";

const UPDATE_PERSON_SQL: &str = "UPDATE PERSON
SET
    FIRST_NAME = ?,
    LAST_NAME = ?,
    DOB = ?,
    SALARY = ?,
    EMAIL = ?
WHERE ID = ?;";

const PERSON_GRAPH_SELECT_SQL: &str = "SELECT
    P.ID AS P_ID,
    P.FIRST_NAME AS P_FIRST_NAME,
    P.LAST_NAME AS P_LAST_NAME,
    P.DOB AS P_DOB,
    P.SALARY AS P_SALARY,
    P.EMAIL AS P_EMAIL,
    P.PARENT_ID AS P_PARENT_ID,
    HA.ID AS HA_ID,
    HA.STREET_ADDRESS AS HA_STREET_ADDRESS,
    HA.ADDRESS2 AS HA_ADDRESS2,
    HA.CITY AS HA_CITY,
    HA.STATE AS HA_STATE,
    HA.POSTCODE AS HA_POSTCODE,
    HA.COUNTY AS HA_COUNTY,
    HA.REGION AS HA_REGION,
    HA.COUNTRY AS HA_COUNTRY,
    BA.ID AS BA_ID,
    BA.STREET_ADDRESS AS BA_STREET_ADDRESS,
    BA.ADDRESS2 AS BA_ADDRESS2,
    BA.CITY AS BA_CITY,
    BA.STATE AS BA_STATE,
    BA.POSTCODE AS BA_POSTCODE,
    BA.COUNTY AS BA_COUNTY,
    BA.REGION AS BA_REGION,
    BA.COUNTRY AS BA_COUNTRY,
    C.ID AS C_ID,
    C.FIRST_NAME AS C_FIRST_NAME,
    C.LAST_NAME AS C_LAST_NAME,
    C.DOB AS C_DOB,
    C.SALARY AS C_SALARY,
    C.EMAIL AS C_EMAIL,
    C.PARENT_ID AS C_PARENT_ID
FROM PERSON AS P
LEFT OUTER JOIN ADDRESSES AS HA ON P.HOME_ADDRESS = HA.ID
LEFT OUTER JOIN ADDRESSES AS BA ON P.BUSINESS_ADDRESS = BA.ID
LEFT OUTER JOIN PERSON AS C ON C.PARENT_ID = P.ID";

const COUNT_PERSON_SQL: &str = "SELECT COUNT(*) FROM PERSON;";
const DELETE_PERSON_SQL: &str = "DELETE FROM PERSON WHERE ID = ?;";
const DELETE_MANY_PERSON_SQL: &str = "DELETE FROM PERSON WHERE ID IN (:ids);";
const ALTER_PERSON_SQL: &str = "ALTER TABLE PERSON ADD COLUMN EMAIL TEXT;";
const LINK_PARENT_SQL: &str = "UPDATE PERSON SET PARENT_ID = ? WHERE ID = ?;";

/// Generic repository specialized for people.
pub type PersonRepository<'conn> = SqliteCrudRepository<'conn, PersonMapper>;

impl<'conn> PersonRepository<'conn> {
    pub fn for_connection(conn: &'conn Connection) -> Self {
        SqliteCrudRepository::new(conn, PersonMapper)
    }
}

/// Mapping capability for [`Person`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonMapper;

impl EntityMapper for PersonMapper {
    type Entity = Person;

    fn statements(&self) -> SqlTable {
        SqlTable::new("people")
            .declare(CrudOperation::Save, SAVE_PERSON_SQL)
            .declare(CrudOperation::Update, UPDATE_PERSON_SQL)
            .declare(
                CrudOperation::FindById,
                format!("{PERSON_GRAPH_SELECT_SQL}\nWHERE P.ID = ?\nORDER BY P.ID, C.ID;"),
            )
            .declare(
                CrudOperation::FindAll,
                format!("{PERSON_GRAPH_SELECT_SQL}\nORDER BY P.ID, C.ID;"),
            )
            .declare(CrudOperation::Count, COUNT_PERSON_SQL)
            .declare(CrudOperation::DeleteOne, DELETE_PERSON_SQL)
    }

    fn default_sql(&self, operation: CrudOperation) -> Option<String> {
        match operation {
            CrudOperation::DeleteMany => Some(DELETE_MANY_PERSON_SQL.to_string()),
            CrudOperation::Alter => Some(ALTER_PERSON_SQL.to_string()),
            _ => None,
        }
    }

    fn identity(&self) -> IdentityAccessor<Person> {
        IdentityAccessor::new("person", Person::id, Person::assign_id)
    }

    fn bind_for_save(&self, conn: &Connection, person: &mut Person) -> RepoResult<Vec<Value>> {
        let home_address_id = save_owned_address(conn, person.home_address.as_mut())?;
        let business_address_id = save_owned_address(conn, person.business_address.as_mut())?;

        let mut values = scalar_values(person);
        values.push(Value::from(home_address_id));
        values.push(Value::from(business_address_id));
        values.push(Value::from(person.parent_id()));
        Ok(values)
    }

    fn bind_for_update(&self, person: &Person) -> RepoResult<Vec<Value>> {
        Ok(scalar_values(person))
    }

    fn extract(&self, cursor: &mut RowCursor<'_>) -> RepoResult<Option<Person>> {
        let Some(first) = cursor.next_record()? else {
            return Ok(None);
        };
        let Some(mut parent) = extract_person(&first, PARENT_PREFIX)? else {
            return Ok(None);
        };
        absorb_row(&mut parent, &first)?;

        while let Some(record) = cursor.next_record()? {
            let row_parent_id = record.get::<Option<EntityId>>(PARENT_PREFIX, "ID")?;
            if row_parent_id != parent.id() {
                cursor.push_back(record)?;
                break;
            }
            absorb_row(&mut parent, &record)?;
        }

        Ok(Some(parent))
    }

    fn after_save(&self, conn: &Connection, person: &mut Person) -> RepoResult<()> {
        let parent_id = person.id();
        if person.children().is_empty() {
            return Ok(());
        }

        let repo = PersonRepository::for_connection(conn);
        for child in person.children_mut() {
            child.link_parent(parent_id);
            match child.id() {
                None => {
                    repo.save(child)?;
                }
                Some(child_id) => {
                    conn.execute(LINK_PARENT_SQL, params![parent_id, child_id])?;
                }
            }
        }
        Ok(())
    }
}

fn save_owned_address(
    conn: &Connection,
    address: Option<&mut Address>,
) -> RepoResult<Option<EntityId>> {
    let Some(address) = address else {
        return Ok(None);
    };
    if let Some(id) = address.id() {
        return Ok(Some(id));
    }
    AddressRepository::for_connection(conn).save(address).map(Some)
}

fn scalar_values(person: &Person) -> Vec<Value> {
    vec![
        Value::Text(person.first_name.clone()),
        Value::Text(person.last_name.clone()),
        Value::Text(dob_to_db(&person.date_of_birth)),
        Value::Text(person.salary.to_string()),
        Value::from(person.email.clone()),
    ]
}

/// Merges the child and address columns of one join row into `parent`.
fn absorb_row(parent: &mut Person, record: &RowRecord) -> RepoResult<()> {
    if let Some(child) = extract_person(record, CHILD_PREFIX)? {
        parent.add_child(child);
    }
    if let Some(home) = extract_address(record, HOME_ADDRESS_PREFIX)? {
        parent.home_address = Some(home);
    }
    if let Some(business) = extract_address(record, BUSINESS_ADDRESS_PREFIX)? {
        parent.business_address = Some(business);
    }
    Ok(())
}

/// Reads the person columns stored under `prefix`; `None` when `<prefix>ID`
/// is NULL.
fn extract_person(record: &RowRecord, prefix: &str) -> RepoResult<Option<Person>> {
    let Some(id) = record.get::<Option<EntityId>>(prefix, "ID")? else {
        return Ok(None);
    };

    let dob_text: String = record.get(prefix, "DOB")?;
    let date_of_birth = parse_dob(&dob_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid DOB `{dob_text}` for person {id}"))
    })?;
    let salary = parse_salary(record.value(prefix, "SALARY")?).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid SALARY for person {id}"))
    })?;

    let mut person = Person::with_id(
        id,
        record.get::<String>(prefix, "FIRST_NAME")?,
        record.get::<String>(prefix, "LAST_NAME")?,
        date_of_birth,
    )
    .with_salary(salary);
    person.email = record.get(prefix, "EMAIL")?;
    person.link_parent(record.get(prefix, "PARENT_ID")?);
    Ok(Some(person))
}

fn dob_to_db(dob: &DateTime<FixedOffset>) -> String {
    dob.with_timezone(&Utc).format(DOB_FORMAT).to_string()
}

/// Parses stored UTC text; RFC 3339 text written by other tools is accepted too.
fn parse_dob(value: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, DOB_FORMAT) {
        return Some(naive.and_utc().fixed_offset());
    }
    DateTime::parse_from_rfc3339(value).ok()
}

fn parse_salary(value: &Value) -> Option<Decimal> {
    match value {
        Value::Null => Some(Decimal::ZERO),
        Value::Text(text) => Decimal::from_str(text.trim()).ok(),
        Value::Integer(number) => Some(Decimal::from(*number)),
        Value::Real(number) => Decimal::from_f64_retain(*number),
        Value::Blob(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{dob_to_db, parse_dob, parse_salary};
    use chrono::{FixedOffset, TimeZone, Timelike};
    use rusqlite::types::Value;
    use rust_decimal::Decimal;

    #[test]
    fn dob_is_stored_as_utc_text() {
        let dob = FixedOffset::west_opt(6 * 3600)
            .unwrap()
            .with_ymd_and_hms(1980, 11, 15, 15, 15, 0)
            .unwrap();
        assert_eq!(dob_to_db(&dob), "1980-11-15 21:15:00");
        assert_eq!(parse_dob("1980-11-15 21:15:00"), Some(dob));
    }

    #[test]
    fn dob_keeps_sub_second_precision() {
        let dob = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(1999, 1, 2, 3, 4, 5)
            .unwrap()
            .with_nanosecond(250_000_000)
            .unwrap();
        let stored = dob_to_db(&dob);
        assert_eq!(stored, "1999-01-02 03:04:05.250");
        assert_eq!(parse_dob(&stored), Some(dob));
    }

    #[test]
    fn dob_rejects_garbage() {
        assert_eq!(parse_dob("yesterday"), None);
    }

    #[test]
    fn salary_parses_exact_text_and_defaults_null_to_zero() {
        assert_eq!(
            parse_salary(&Value::Text("73000.28".to_string())),
            Some(Decimal::new(7_300_028, 2))
        );
        assert_eq!(parse_salary(&Value::Null), Some(Decimal::ZERO));
        assert_eq!(parse_salary(&Value::Integer(12)), Some(Decimal::from(12)));
        assert_eq!(parse_salary(&Value::Text("lots".to_string())), None);
    }
}
