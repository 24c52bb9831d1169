//! Generic repository engine and its entity adapters.
//!
//! # Responsibility
//! - Resolve per-operation SQL, move identities, and rebuild entity graphs
//!   from flattened join rows without per-type CRUD code.
//! - Keep SQLite details inside the persistence boundary.
//!
//! # Invariants
//! - Repositories borrow one caller-owned session and never manage
//!   transactions.
//! - "Not found" (`Ok(None)`) and storage failure (`Err(Storage)`) stay
//!   distinguishable.

pub mod address_repo;
pub mod crud_repo;
pub mod identity;
pub mod operation;
pub mod person_repo;
pub mod rows;
pub mod sql_resolver;
