//! Address value owned by a person.
//!
//! # Invariants
//! - Addresses are append-only: once stored they are never updated or deleted
//!   through the repository engine.

use super::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Coarse geographic classification stored as upper-case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Region {
    North,
    South,
    East,
    West,
    Central,
}

impl Region {
    /// Storage spelling of the region.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::North => "NORTH",
            Self::South => "SOUTH",
            Self::East => "EAST",
            Self::West => "WEST",
            Self::Central => "CENTRAL",
        }
    }

    /// Parses a stored region, ignoring ASCII case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NORTH" => Some(Self::North),
            "SOUTH" => Some(Self::South),
            "EAST" => Some(Self::East),
            "WEST" => Some(Self::West),
            "CENTRAL" => Some(Self::Central),
            _ => None,
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Postal address row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    id: Option<EntityId>,
    pub street_address: String,
    /// Apartment, suite or other secondary line.
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub county: Option<String>,
    pub country: String,
    pub region: Region,
}

impl Address {
    /// Creates an unsaved address without secondary line or county.
    pub fn new(
        street_address: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        postcode: impl Into<String>,
        country: impl Into<String>,
        region: Region,
    ) -> Self {
        Self {
            id: None,
            street_address: street_address.into(),
            address2: None,
            city: city.into(),
            state: state.into(),
            postcode: postcode.into(),
            county: None,
            country: country.into(),
            region,
        }
    }

    pub fn with_address2(mut self, address2: impl Into<String>) -> Self {
        self.address2 = Some(address2.into());
        self
    }

    pub fn with_county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }

    /// Storage identity, `None` until the address is saved.
    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::{Address, Region};

    #[test]
    fn region_parse_ignores_case() {
        assert_eq!(Region::parse("north"), Some(Region::North));
        assert_eq!(Region::parse(" Central "), Some(Region::Central));
        assert_eq!(Region::parse("atlantis"), None);
    }

    #[test]
    fn region_serializes_with_storage_spelling() {
        let json = serde_json::to_string(&Region::West).unwrap();
        assert_eq!(json, "\"WEST\"");
        let parsed: Region = serde_json::from_str("\"SOUTH\"").unwrap();
        assert_eq!(parsed, Region::South);
    }

    #[test]
    fn builder_sets_optional_lines() {
        let address = Address::new(
            "12 Main St",
            "Atlanta",
            "GA",
            "30301",
            "United States",
            Region::South,
        )
        .with_address2("Apt 4")
        .with_county("Fulton County");
        assert_eq!(address.id(), None);
        assert_eq!(address.address2.as_deref(), Some("Apt 4"));
        assert_eq!(address.county.as_deref(), Some("Fulton County"));
    }
}
