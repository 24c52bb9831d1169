//! Domain model persisted by the repository engine.
//!
//! # Responsibility
//! - Define the person/address graph and its equality rules.
//! - Keep identity as per-entity state, assigned once by storage.
//!
//! # Invariants
//! - An unset identity means "not yet persisted".
//! - Once assigned, an identity never changes for the entity's lifetime.

pub mod address;
pub mod person;

/// Storage-assigned identity shared by every persisted entity.
pub type EntityId = i64;
