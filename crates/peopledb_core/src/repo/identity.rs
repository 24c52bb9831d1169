//! Generic access to an entity's storage identity.
//!
//! # Responsibility
//! - Let the CRUD engine read and assign identities without knowing the
//!   entity type.
//!
//! # Invariants
//! - An identity is assigned at most once, right after a successful insert.

use crate::model::EntityId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure to read or write an entity's identity slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The entity type exposes no identity slot at all.
    NoSlot { entity: &'static str },
    /// The slot can be read but not written.
    ReadOnly { entity: &'static str },
    /// The slot already holds an identity.
    AlreadyAssigned { entity: &'static str, id: EntityId },
    /// The operation needs a persisted entity but the slot is unset.
    Unassigned { entity: &'static str },
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSlot { entity } => write!(f, "`{entity}` exposes no identity slot"),
            Self::ReadOnly { entity } => write!(f, "identity slot of `{entity}` is read-only"),
            Self::AlreadyAssigned { entity, id } => {
                write!(f, "`{entity}` already has identity {id}")
            }
            Self::Unassigned { entity } => write!(f, "`{entity}` has not been saved yet"),
        }
    }
}

impl Error for IdentityError {}

type Getter<T> = fn(&T) -> Option<EntityId>;
type Setter<T> = fn(&mut T, EntityId);

/// Getter/setter pair for one entity type's identity slot.
pub struct IdentityAccessor<T> {
    entity: &'static str,
    getter: Option<Getter<T>>,
    setter: Option<Setter<T>>,
}

impl<T> IdentityAccessor<T> {
    pub const fn new(entity: &'static str, getter: Getter<T>, setter: Setter<T>) -> Self {
        Self {
            entity,
            getter: Some(getter),
            setter: Some(setter),
        }
    }

    pub const fn read_only(entity: &'static str, getter: Getter<T>) -> Self {
        Self {
            entity,
            getter: Some(getter),
            setter: None,
        }
    }

    /// Accessor for entity types that carry no identity.
    pub const fn absent(entity: &'static str) -> Self {
        Self {
            entity,
            getter: None,
            setter: None,
        }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// Current identity, `None` when unset.
    pub fn get(&self, entity: &T) -> Result<Option<EntityId>, IdentityError> {
        let getter = self.getter.ok_or(IdentityError::NoSlot {
            entity: self.entity,
        })?;
        Ok(getter(entity))
    }

    /// Current identity of an entity that must already be persisted.
    pub fn require(&self, entity: &T) -> Result<EntityId, IdentityError> {
        self.get(entity)?.ok_or(IdentityError::Unassigned {
            entity: self.entity,
        })
    }

    /// Records the store-generated key.
    pub fn set(&self, entity: &mut T, id: EntityId) -> Result<(), IdentityError> {
        if let Some(existing) = self.get(entity)? {
            return Err(IdentityError::AlreadyAssigned {
                entity: self.entity,
                id: existing,
            });
        }
        let setter = self.setter.ok_or(IdentityError::ReadOnly {
            entity: self.entity,
        })?;
        setter(entity, id);
        Ok(())
    }
}

impl<T> Clone for IdentityAccessor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for IdentityAccessor<T> {}
