//! Generic data-mapping layer for the people database.
//! Persists and reconstructs the person/address/children graph over SQLite
//! through per-entity mapping metadata instead of per-type CRUD code.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::address::{Address, Region};
pub use model::person::Person;
pub use model::EntityId;
pub use repo::address_repo::{AddressMapper, AddressRepository};
pub use repo::crud_repo::{
    CrudRepository, EntityMapper, RepoError, RepoResult, SqliteCrudRepository,
};
pub use repo::identity::{IdentityAccessor, IdentityError};
pub use repo::operation::CrudOperation;
pub use repo::person_repo::{PersonMapper, PersonRepository};
pub use repo::rows::{RowCursor, RowRecord};
pub use repo::sql_resolver::{ConfigurationError, SqlTable};
