//! Address adapter for the generic CRUD engine.
//!
//! # Invariants
//! - Address rows are append-only: only SAVE and FIND_BY_ID are declared,
//!   every other operation resolves to a configuration error.

use super::crud_repo::{EntityMapper, RepoError, RepoResult, SqliteCrudRepository};
use super::identity::IdentityAccessor;
use super::operation::CrudOperation;
use super::rows::{RowCursor, RowRecord};
use super::sql_resolver::SqlTable;
use crate::model::address::{Address, Region};
use crate::model::EntityId;
use rusqlite::types::Value;
use rusqlite::Connection;

const SAVE_ADDRESS_SQL: &str = "INSERT INTO ADDRESSES (
    STREET_ADDRESS,
    ADDRESS2,
    CITY,
    STATE,
    POSTCODE,
    COUNTY,
    REGION,
    COUNTRY
) VALUES (?, ?, ?, ?, ?, ?, ?, ?);";

const FIND_ADDRESS_SQL: &str = "SELECT
    ID,
    STREET_ADDRESS,
    ADDRESS2,
    CITY,
    STATE,
    POSTCODE,
    COUNTY,
    REGION,
    COUNTRY
FROM ADDRESSES
WHERE ID = ?;";

/// Generic repository specialized for addresses.
pub type AddressRepository<'conn> = SqliteCrudRepository<'conn, AddressMapper>;

impl<'conn> AddressRepository<'conn> {
    pub fn for_connection(conn: &'conn Connection) -> Self {
        SqliteCrudRepository::new(conn, AddressMapper)
    }
}

/// Mapping capability for [`Address`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressMapper;

impl EntityMapper for AddressMapper {
    type Entity = Address;

    fn statements(&self) -> SqlTable {
        SqlTable::new("addresses")
            .declare(CrudOperation::Save, SAVE_ADDRESS_SQL)
            .declare(CrudOperation::FindById, FIND_ADDRESS_SQL)
    }

    fn identity(&self) -> IdentityAccessor<Address> {
        IdentityAccessor::new("address", Address::id, Address::assign_id)
    }

    fn bind_for_save(&self, _conn: &Connection, address: &mut Address) -> RepoResult<Vec<Value>> {
        Ok(vec![
            Value::Text(address.street_address.clone()),
            Value::from(address.address2.clone()),
            Value::Text(address.city.clone()),
            Value::Text(address.state.clone()),
            Value::Text(address.postcode.clone()),
            Value::from(address.county.clone()),
            Value::Text(address.region.as_str().to_string()),
            Value::Text(address.country.clone()),
        ])
    }

    fn extract(&self, cursor: &mut RowCursor<'_>) -> RepoResult<Option<Address>> {
        match cursor.next_record()? {
            Some(record) => extract_address(&record, ""),
            None => Ok(None),
        }
    }
}

/// Reads an address stored under `prefix`; `None` when `<prefix>ID` is NULL.
pub(crate) fn extract_address(record: &RowRecord, prefix: &str) -> RepoResult<Option<Address>> {
    let Some(id) = record.get::<Option<EntityId>>(prefix, "ID")? else {
        return Ok(None);
    };

    let region_text: String = record.get(prefix, "REGION")?;
    let region = Region::parse(&region_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid region `{region_text}` in ADDRESSES.REGION for address {id}"
        ))
    })?;

    let mut address = Address::new(
        record.get::<String>(prefix, "STREET_ADDRESS")?,
        record.get::<String>(prefix, "CITY")?,
        record.get::<String>(prefix, "STATE")?,
        record.get::<String>(prefix, "POSTCODE")?,
        record.get::<String>(prefix, "COUNTRY")?,
        region,
    );
    address.address2 = record.get(prefix, "ADDRESS2")?;
    address.county = record.get(prefix, "COUNTY")?;
    address.assign_id(id);
    Ok(Some(address))
}
