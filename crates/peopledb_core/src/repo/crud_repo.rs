//! Generic CRUD engine parameterized over an entity mapper.
//!
//! # Responsibility
//! - Run save/find/count/delete/update/alter for any entity type whose
//!   adapter implements [`EntityMapper`].
//! - Resolve statements through the repository's [`SqlTable`] and move
//!   identities through the mapper's [`IdentityAccessor`].
//! - Log every operation outcome at the boundary.
//!
//! # Invariants
//! - Storage failures are returned as `RepoError::Storage`; they are never
//!   folded into "not found" or zero results.
//! - `save` never re-inserts an entity that already has an identity.
//! - `update` binds the identity as the final statement parameter.
//! - The engine never opens transactions; the session owner decides.

use super::identity::{IdentityAccessor, IdentityError};
use super::operation::CrudOperation;
use super::rows::RowCursor;
use super::sql_resolver::{ConfigurationError, SqlTable};
use crate::db::DbError;
use crate::model::EntityId;
use log::{debug, error};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Statement metadata does not cover the request.
    Configuration(ConfigurationError),
    /// Identity slot missing, read-only, unset, or already assigned.
    Identity(IdentityError),
    /// SQLite failed while executing a statement.
    Storage(DbError),
    /// Persisted data or a spliced literal cannot be decoded.
    InvalidData(String),
}

impl RepoError {
    /// Stable token used as `error_code` in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Identity(_) => "identity",
            Self::Storage(_) => "storage_failed",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(err) => write!(f, "{err}"),
            Self::Identity(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Configuration(err) => Some(err),
            Self::Identity(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ConfigurationError> for RepoError {
    fn from(value: ConfigurationError) -> Self {
        Self::Configuration(value)
    }
}

impl From<IdentityError> for RepoError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Storage(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(DbError::Sqlite(value))
    }
}

/// Entity-specific mapping capability consumed by the generic engine.
pub trait EntityMapper {
    type Entity;

    /// Declared statements, built once per repository.
    fn statements(&self) -> SqlTable;

    /// Fallback SQL for kinds the table does not declare.
    fn default_sql(&self, _operation: CrudOperation) -> Option<String> {
        None
    }

    fn identity(&self) -> IdentityAccessor<Self::Entity>;

    /// Parameters for the SAVE statement, identity excluded.
    ///
    /// May save owned sub-entities first so their identities can be bound as
    /// foreign keys.
    fn bind_for_save(&self, conn: &Connection, entity: &mut Self::Entity)
        -> RepoResult<Vec<Value>>;

    /// Parameters for the UPDATE statement, identity excluded.
    fn bind_for_update(&self, _entity: &Self::Entity) -> RepoResult<Vec<Value>> {
        Ok(Vec::new())
    }

    /// Builds one entity from the cursor.
    ///
    /// May consume several rows; must leave the cursor right after the last
    /// row it used. `Ok(None)` means the cursor holds no further entity.
    fn extract(&self, cursor: &mut RowCursor<'_>) -> RepoResult<Option<Self::Entity>>;

    /// Runs after the entity received its identity.
    fn after_save(&self, _conn: &Connection, _entity: &mut Self::Entity) -> RepoResult<()> {
        Ok(())
    }
}

/// CRUD contract shared by every repository.
pub trait CrudRepository {
    type Entity;

    /// Inserts `entity`, assigns its generated identity and returns it.
    fn save(&self, entity: &mut Self::Entity) -> RepoResult<EntityId>;
    /// Loads one entity; `Ok(None)` when no row matches.
    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<Self::Entity>>;
    /// Loads every entity in query order.
    fn find_all(&self) -> RepoResult<Vec<Self::Entity>>;
    fn count(&self) -> RepoResult<i64>;
    /// Deletes the row of a persisted entity; returns affected rows.
    fn delete(&self, entity: &Self::Entity) -> RepoResult<usize>;
    /// Deletes several persisted entities in one statement.
    fn delete_many(&self, entities: &[Self::Entity]) -> RepoResult<usize>;
    /// Rewrites mutable columns of a persisted entity; returns affected rows.
    fn update(&self, entity: &Self::Entity) -> RepoResult<usize>;
    /// Runs the repository's one-off schema statement.
    fn alter_table(&self) -> RepoResult<()>;
}

/// SQLite-backed generic repository.
pub struct SqliteCrudRepository<'conn, M: EntityMapper> {
    conn: &'conn Connection,
    mapper: M,
    sql: SqlTable,
    identity: IdentityAccessor<M::Entity>,
}

impl<'conn, M: EntityMapper> SqliteCrudRepository<'conn, M> {
    pub fn new(conn: &'conn Connection, mapper: M) -> Self {
        let sql = mapper.statements();
        let identity = mapper.identity();
        Self {
            conn,
            mapper,
            sql,
            identity,
        }
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    fn statement(&self, operation: CrudOperation) -> RepoResult<Cow<'_, str>> {
        Ok(self
            .sql
            .resolve(operation, |kind| self.mapper.default_sql(kind))?)
    }

    fn observe<T>(
        &self,
        operation: CrudOperation,
        run: impl FnOnce() -> RepoResult<T>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        let result = run();
        match &result {
            Ok(_) => debug!(
                "event=repo_op module=repo status=ok repository={} op={} duration_ms={}",
                self.sql.repository(),
                operation,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=repo_op module=repo status=error repository={} op={} duration_ms={} error_code={} error={}",
                self.sql.repository(),
                operation,
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }
        result
    }
}

impl<M: EntityMapper> CrudRepository for SqliteCrudRepository<'_, M> {
    type Entity = M::Entity;

    fn save(&self, entity: &mut M::Entity) -> RepoResult<EntityId> {
        self.observe(CrudOperation::Save, || {
            if let Some(id) = self.identity.get(entity)? {
                return Err(IdentityError::AlreadyAssigned {
                    entity: self.identity.entity(),
                    id,
                }
                .into());
            }

            let sql = self.statement(CrudOperation::Save)?;
            let values = self.mapper.bind_for_save(self.conn, entity)?;
            self.conn.execute(&sql, params_from_iter(values.iter()))?;

            let id = self.conn.last_insert_rowid();
            self.identity.set(entity, id)?;
            self.mapper.after_save(self.conn, entity)?;
            Ok(id)
        })
    }

    fn find_by_id(&self, id: EntityId) -> RepoResult<Option<M::Entity>> {
        self.observe(CrudOperation::FindById, || {
            let sql = self.statement(CrudOperation::FindById)?;
            let mut stmt = self.conn.prepare(&sql)?;
            let mut cursor = RowCursor::open(&mut stmt, [id])?;
            self.mapper.extract(&mut cursor)
        })
    }

    fn find_all(&self) -> RepoResult<Vec<M::Entity>> {
        self.observe(CrudOperation::FindAll, || {
            let sql = self.statement(CrudOperation::FindAll)?;
            let mut stmt = self.conn.prepare(&sql)?;
            let mut cursor = RowCursor::open(&mut stmt, [])?;

            let mut entities = Vec::new();
            while let Some(entity) = self.mapper.extract(&mut cursor)? {
                entities.push(entity);
            }
            Ok(entities)
        })
    }

    fn count(&self) -> RepoResult<i64> {
        self.observe(CrudOperation::Count, || {
            let sql = self.statement(CrudOperation::Count)?;
            let total = self
                .conn
                .query_row(&sql, [], |row| row.get::<_, i64>(0))
                .optional()?;
            Ok(total.unwrap_or(0))
        })
    }

    fn delete(&self, entity: &M::Entity) -> RepoResult<usize> {
        self.observe(CrudOperation::DeleteOne, || {
            let id = self.identity.require(entity)?;
            let sql = self.statement(CrudOperation::DeleteOne)?;
            Ok(self.conn.execute(&sql, [id])?)
        })
    }

    fn delete_many(&self, entities: &[M::Entity]) -> RepoResult<usize> {
        self.observe(CrudOperation::DeleteMany, || {
            if entities.is_empty() {
                return Ok(0);
            }
            let ids = entities
                .iter()
                .map(|entity| self.identity.require(entity))
                .collect::<Result<Vec<_>, _>>()?;

            let template = self.statement(CrudOperation::DeleteMany)?;
            let sql = self.sql.bind_id_list(&template, ids)?;
            Ok(self.conn.execute(&sql, [])?)
        })
    }

    fn update(&self, entity: &M::Entity) -> RepoResult<usize> {
        self.observe(CrudOperation::Update, || {
            let id = self.identity.require(entity)?;
            let sql = self.statement(CrudOperation::Update)?;
            let mut values = self.mapper.bind_for_update(entity)?;
            values.push(Value::Integer(id));
            Ok(self.conn.execute(&sql, params_from_iter(values.iter()))?)
        })
    }

    fn alter_table(&self) -> RepoResult<()> {
        self.observe(CrudOperation::Alter, || {
            let sql = self.statement(CrudOperation::Alter)?;
            self.conn.execute_batch(&sql)?;
            Ok(())
        })
    }
}
