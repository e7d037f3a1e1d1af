//! Identifier and quantity newtypes.
//!
//! Identifiers are opaque strings compared by exact match. No case folding,
//! trimming or email validation happens here; `"Chess Club"` and
//! `"chess club"` are different activities.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Activity Name
// ============================================================================

/// Unique name of an activity in the catalog (e.g., "Chess Club")
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityName(String);

impl ActivityName {
    /// Creates a new `ActivityName`
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ActivityName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// ============================================================================
// Participant Identifier
// ============================================================================

/// Identifier of a registered participant (an email address, stored verbatim)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Creates a `ParticipantId` from a non-empty identifier
    ///
    /// Returns `None` for the empty string; every other value is accepted
    /// as-is, including whitespace and URL-reserved characters.
    #[must_use]
    pub fn parse(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() { None } else { Some(Self(id)) }
    }

    /// Returns the identifier as a string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Capacity
// ============================================================================

/// Maximum number of simultaneous participants in an activity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Capacity(u32);

impl Capacity {
    /// Creates a new `Capacity`, rejecting zero
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    /// Returns the capacity value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Returns `true` when `count` participants fill every slot
    #[must_use]
    pub fn is_reached_by(&self, count: usize) -> bool {
        count >= self.as_usize()
    }

    /// Returns the capacity as a roster length
    #[must_use]
    pub fn as_usize(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
