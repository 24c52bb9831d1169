//! Person aggregate: owned addresses plus self-referential children.
//!
//! # Responsibility
//! - Hold person attributes and the owned address/children graph.
//! - Define equality on identity, names and UTC-normalized date of birth.
//!
//! # Invariants
//! - `children` never holds two equal persons.
//! - `parent_id` is a weak back-reference: it is written as a foreign key and
//!   never used to cascade writes back to the parent.

use super::address::Address;
use super::EntityId;
use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::hash::{Hash, Hasher};

/// Person row with its owned sub-entities.
#[derive(Debug, Clone, Serialize)]
pub struct Person {
    id: Option<EntityId>,
    pub first_name: String,
    pub last_name: String,
    /// Zoned date of birth. Storage normalizes it to UTC.
    pub date_of_birth: DateTime<FixedOffset>,
    pub salary: Decimal,
    pub email: Option<String>,
    pub home_address: Option<Address>,
    pub business_address: Option<Address>,
    children: Vec<Person>,
    parent_id: Option<EntityId>,
}

impl Person {
    /// Creates an unsaved person with zero salary and no relations.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth,
            salary: Decimal::ZERO,
            email: None,
            home_address: None,
            business_address: None,
            children: Vec::new(),
            parent_id: None,
        }
    }

    /// Rebuilds a person that already exists in storage.
    pub fn with_id(
        id: EntityId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: DateTime<FixedOffset>,
    ) -> Self {
        let mut person = Self::new(first_name, last_name, date_of_birth);
        person.id = Some(id);
        person
    }

    pub fn with_salary(mut self, salary: Decimal) -> Self {
        self.salary = salary;
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Storage identity, `None` until the person is saved.
    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    /// Identity of the parent person, when this person is someone's child.
    pub fn parent_id(&self) -> Option<EntityId> {
        self.parent_id
    }

    pub(crate) fn link_parent(&mut self, parent_id: Option<EntityId>) {
        self.parent_id = parent_id;
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[Person] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut [Person] {
        &mut self.children
    }

    /// Adds a child and links it back to this person.
    ///
    /// Returns `false` when an equal child is already present; the set is left
    /// unchanged in that case.
    pub fn add_child(&mut self, mut child: Person) -> bool {
        child.link_parent(self.id);
        if self.children.contains(&child) {
            return false;
        }
        self.children.push(child);
        true
    }

    /// Date of birth in the reference zone used for storage and equality.
    pub fn date_of_birth_utc(&self) -> DateTime<Utc> {
        self.date_of_birth.with_timezone(&Utc)
    }
}

impl PartialEq for Person {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.first_name == other.first_name
            && self.last_name == other.last_name
            && self.date_of_birth_utc() == other.date_of_birth_utc()
    }
}

impl Eq for Person {}

impl Hash for Person {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.first_name.hash(state);
        self.last_name.hash(state);
        self.date_of_birth_utc().hash(state);
    }
}
