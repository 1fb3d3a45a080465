use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Identifier shared by users and sales.
///
/// Rendered as a lowercase hyphenated UUID. Parsing accepts anything
/// [`is_valid_id`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identifier received from a client.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIdentifier`] for malformed input.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| ValidationError::InvalidIdentifier)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for EntityId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Whether `value` is a well-formed identifier.
///
/// ```
/// use marketplace_core::{is_valid_id, EntityId};
///
/// assert!(is_valid_id(&EntityId::generate().to_string()));
/// assert!(!is_valid_id("not-an-id"));
/// ```
pub fn is_valid_id(value: &str) -> bool {
    EntityId::parse(value).is_ok()
}
