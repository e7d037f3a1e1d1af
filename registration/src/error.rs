//! Error types for registration and catalog loading.

use crate::types::{ActivityName, Capacity, ParticipantId};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by register and withdraw operations
///
/// All variants are expected, caller-correctable conditions. The display text
/// is what a facade shows as the `detail` of an error response.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistrationError {
    /// The requested activity is not in the catalog
    #[error("Activity not found")]
    NotFound {
        /// Name as requested
        activity: ActivityName,
    },

    /// The participant is already on the activity's roster
    #[error("Student is already signed up for this activity")]
    AlreadyRegistered {
        /// Activity name
        activity: ActivityName,
        /// Participant that tried to register again
        participant: ParticipantId,
    },

    /// Every slot on the roster is taken
    #[error("Activity is full")]
    CapacityExceeded {
        /// Activity name
        activity: ActivityName,
        /// The activity's capacity
        capacity: Capacity,
    },

    /// The participant is not on the activity's roster
    #[error("Student is not registered for this activity")]
    NotRegistered {
        /// Activity name
        activity: ActivityName,
        /// Participant that tried to withdraw
        participant: ParticipantId,
    },

    /// The participant identifier was empty
    #[error("Participant identifier must not be empty")]
    InvalidParticipant {
        /// Activity name as requested
        activity: ActivityName,
    },
}

impl RegistrationError {
    /// Stable label for logs and metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AlreadyRegistered { .. } => "already_registered",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::NotRegistered { .. } => "not_registered",
            Self::InvalidParticipant { .. } => "invalid_participant",
        }
    }

    /// HTTP status a facade should answer with
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::AlreadyRegistered { .. }
            | Self::CapacityExceeded { .. }
            | Self::NotRegistered { .. }
            | Self::InvalidParticipant { .. } => 400,
        }
    }

    /// Activity the failed request targeted
    #[must_use]
    pub const fn activity(&self) -> &ActivityName {
        match self {
            Self::NotFound { activity }
            | Self::AlreadyRegistered { activity, .. }
            | Self::CapacityExceeded { activity, .. }
            | Self::NotRegistered { activity, .. }
            | Self::InvalidParticipant { activity } => activity,
        }
    }
}

/// Errors raised while loading an activity catalog definition
#[derive(Error, Debug)]
pub enum CatalogError {
    /// An activity was defined with an empty name
    #[error("Activity name must not be empty")]
    EmptyName,

    /// The same activity name appears twice
    #[error("Duplicate activity: {0}")]
    DuplicateActivity(String),

    /// Capacity must be at least one
    #[error("Activity {0} must have a positive capacity")]
    ZeroCapacity(String),

    /// More participants were seeded than the capacity allows
    #[error("Activity {activity} seeds {seeded} participants but holds {capacity}")]
    SeedExceedsCapacity {
        /// Activity name
        activity: String,
        /// Number of seeded participants
        seeded: usize,
        /// Declared capacity
        capacity: u32,
    },

    /// A seeded participant appears twice
    #[error("Activity {activity} seeds {participant} more than once")]
    DuplicateSeed {
        /// Activity name
        activity: String,
        /// Repeated participant
        participant: String,
    },

    /// A seeded participant identifier is empty
    #[error("Activity {0} seeds an empty participant identifier")]
    EmptySeed(String),

    /// The definition document is not valid JSON of the expected shape
    #[error("Invalid catalog definition: {0}")]
    Parse(#[from] serde_json::Error),

    /// The definition file could not be read
    #[error("Failed to read catalog definition: {0}")]
    Io(#[from] std::io::Error),
}

/// Error body for a facade response: `{"detail": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    /// Human-readable description of the failure
    pub detail: String,
}

impl From<&RegistrationError> for ErrorPayload {
    fn from(error: &RegistrationError) -> Self {
        Self {
            detail: error.to_string(),
        }
    }
}
