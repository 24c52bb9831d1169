//! Row cursor with one-row push-back and alias-based column extraction.
//!
//! # Responsibility
//! - Materialize SQLite rows into owned records so an extractor can look at
//!   a row, decide it belongs to the next entity, and hand it back.
//! - Read columns by `<prefix><FIELD>` labels so several entities can share
//!   one flattened join row.
//!
//! # Invariants
//! - At most one record is buffered; `next_record` drains it before reading
//!   from SQLite again.
//! - Alias lookup returns the first matching label in column order.

use super::crud_repo::{RepoError, RepoResult};
use super::sql_resolver::ConfigurationError;
use rusqlite::types::{FromSql, Value, ValueRef};
use rusqlite::{Params, Rows, Statement};
use std::rc::Rc;

/// Forward-only cursor over a query result with a one-row lookahead buffer.
pub struct RowCursor<'stmt> {
    rows: Rows<'stmt>,
    columns: Rc<[String]>,
    pushed_back: Option<RowRecord>,
    exhausted: bool,
}

impl<'stmt> RowCursor<'stmt> {
    /// Executes `stmt` and captures its ordered column labels.
    pub fn open<P: Params>(stmt: &'stmt mut Statement<'_>, params: P) -> RepoResult<Self> {
        let columns: Rc<[String]> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let rows = stmt.query(params)?;
        Ok(Self {
            rows,
            columns,
            pushed_back: None,
            exhausted: false,
        })
    }

    /// Ordered column labels of the result.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the buffered record, or reads the next row.
    pub fn next_record(&mut self) -> RepoResult<Option<RowRecord>> {
        if let Some(record) = self.pushed_back.take() {
            return Ok(Some(record));
        }
        if self.exhausted {
            return Ok(None);
        }

        let Some(row) = self.rows.next()? else {
            self.exhausted = true;
            return Ok(None);
        };
        let values = (0..self.columns.len())
            .map(|index| row.get::<_, Value>(index))
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(RowRecord {
            columns: Rc::clone(&self.columns),
            values,
        }))
    }

    /// Un-reads `record`, so the next call to `next_record` returns it.
    ///
    /// Only the record returned by the latest `next_record` may be pushed
    /// back; a second push before the next read is rejected and leaves the
    /// buffered record in place.
    pub fn push_back(&mut self, record: RowRecord) -> RepoResult<()> {
        if self.pushed_back.is_some() {
            return Err(ConfigurationError::PushBackOccupied.into());
        }
        self.pushed_back = Some(record);
        Ok(())
    }

    /// Whether no further record can be produced.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.pushed_back.is_none()
    }
}

/// One owned result row.
#[derive(Debug, Clone)]
pub struct RowRecord {
    columns: Rc<[String]>,
    values: Vec<Value>,
}

impl RowRecord {
    /// Index of the first column labelled `alias` (ASCII case-insensitive).
    pub fn column_index(&self, alias: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|label| label.eq_ignore_ascii_case(alias))
    }

    /// Raw value of column `<prefix><field>`.
    pub fn value(&self, prefix: &str, field: &str) -> RepoResult<&Value> {
        let alias = format!("{prefix}{field}");
        match self.column_index(&alias) {
            Some(index) => Ok(&self.values[index]),
            None => Err(ConfigurationError::MissingColumn(alias).into()),
        }
    }

    /// Typed value of column `<prefix><field>`.
    pub fn get<T: FromSql>(&self, prefix: &str, field: &str) -> RepoResult<T> {
        let value = self.value(prefix, field)?;
        T::column_result(ValueRef::from(value)).map_err(|err| {
            RepoError::InvalidData(format!("column `{prefix}{field}`: {err}"))
        })
    }
}
