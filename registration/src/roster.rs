//! Roster aggregate: the participants registered to one activity.
//!
//! All mutation goes through [`RosterReducer`]. A command is validated against
//! the current roster; on success it becomes an event that is applied to state
//! and returned as an [`Effect::Publish`]. A rejected command is applied as
//! [`RosterAction::ValidationFailed`], leaving the typed error in
//! [`Roster::last_error`] for the caller that holds the roster lock.
//!
//! **Capacity rule**: the duplicate check runs before the capacity check, so a
//! participant re-registering on a full activity is told they are already
//! registered rather than that the activity is full.

use crate::catalog::ActivityMetadata;
use crate::error::RegistrationError;
use crate::types::{ActivityName, Capacity, ParticipantId};
use activity_registration_core::{
    DateTime, SmallVec, Utc, effect::Effect, environment::Clock, reducer::Reducer, smallvec,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

// ============================================================================
// State
// ============================================================================

/// One participant's place on a roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    /// Registered participant
    pub participant: ParticipantId,
    /// When the registration happened
    pub registered_at: DateTime<Utc>,
}

/// Live roster of one activity
///
/// Enrollments keep registration order so listings are deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    activity: ActivityName,
    capacity: Capacity,
    enrollments: Vec<Enrollment>,
    /// Error left by the last rejected command, cleared by every accepted one
    pub last_error: Option<RegistrationError>,
}

impl Roster {
    /// Creates an empty roster
    #[must_use]
    pub const fn new(activity: ActivityName, capacity: Capacity) -> Self {
        Self {
            activity,
            capacity,
            enrollments: Vec::new(),
            last_error: None,
        }
    }

    /// Creates a roster holding the activity's seeded participants
    #[must_use]
    pub fn seeded(metadata: &ActivityMetadata, registered_at: DateTime<Utc>) -> Self {
        let mut roster = Self::new(metadata.name.clone(), metadata.capacity);
        roster.enrollments = Self::enroll_all(&metadata.seed, registered_at);
        roster
    }

    /// Activity this roster belongs to
    #[must_use]
    pub const fn activity(&self) -> &ActivityName {
        &self.activity
    }

    /// Maximum roster size
    #[must_use]
    pub const fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Number of registered participants
    #[must_use]
    pub fn len(&self) -> usize {
        self.enrollments.len()
    }

    /// Returns `true` if nobody is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enrollments.is_empty()
    }

    /// Returns `true` if every slot is taken
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.capacity.is_reached_by(self.len())
    }

    /// Open slots left
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity.as_usize().saturating_sub(self.len())
    }

    /// Returns `true` if the participant is registered (exact match)
    #[must_use]
    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.enrollments.iter().any(|e| e.participant == *participant)
    }

    /// Enrollments in registration order
    #[must_use]
    pub fn enrollments(&self) -> &[Enrollment] {
        &self.enrollments
    }

    /// Participants in registration order
    pub fn participants(&self) -> impl Iterator<Item = &ParticipantId> {
        self.enrollments.iter().map(|e| &e.participant)
    }

    /// Takes the error left by the last rejected command
    pub fn take_error(&mut self) -> Option<RegistrationError> {
        self.last_error.take()
    }

    /// Checks capacity and uniqueness
    ///
    /// # Panics
    ///
    /// Panics if the roster holds more participants than its capacity or the
    /// same participant twice. Either means roster locking is broken.
    pub fn assert_invariants(&self) {
        assert!(
            self.len() <= self.capacity.as_usize(),
            "roster for {} holds {} participants, over capacity {}",
            self.activity,
            self.len(),
            self.capacity
        );

        let unique: HashSet<&ParticipantId> = self.participants().collect();
        assert_eq!(
            unique.len(),
            self.len(),
            "roster for {} holds a duplicate participant",
            self.activity
        );
    }

    fn enroll_all(participants: &[ParticipantId], registered_at: DateTime<Utc>) -> Vec<Enrollment> {
        participants
            .iter()
            .map(|participant| Enrollment {
                participant: participant.clone(),
                registered_at,
            })
            .collect()
    }
}

// ============================================================================
// Actions (Commands + Events)
// ============================================================================

/// Actions for the roster aggregate
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum RosterAction {
    // Commands
    /// Add a participant to the roster
    Register {
        /// Participant to add
        participant: ParticipantId,
    },

    /// Remove a participant from the roster
    Withdraw {
        /// Participant to remove
        participant: ParticipantId,
    },

    /// Replace the roster with the given participants
    Reset {
        /// Participants after the reset
        participants: Vec<ParticipantId>,
    },

    // Events
    /// A participant was added
    ParticipantRegistered {
        /// Activity name
        activity: ActivityName,
        /// Added participant
        participant: ParticipantId,
        /// Roster size after the registration
        participant_count: usize,
        /// When registered
        registered_at: DateTime<Utc>,
    },

    /// A participant was removed
    ParticipantWithdrawn {
        /// Activity name
        activity: ActivityName,
        /// Removed participant
        participant: ParticipantId,
        /// Roster size after the withdrawal
        participant_count: usize,
        /// When withdrawn
        withdrawn_at: DateTime<Utc>,
    },

    /// The roster was reset
    RosterReset {
        /// Activity name
        activity: ActivityName,
        /// Participants after the reset
        participants: Vec<ParticipantId>,
        /// When reset
        reset_at: DateTime<Utc>,
    },

    /// A command was rejected
    ValidationFailed {
        /// Why it was rejected
        error: RegistrationError,
    },
}

impl RosterAction {
    /// Returns `true` for commands (requests to change the roster)
    #[must_use]
    pub const fn is_command(&self) -> bool {
        matches!(
            self,
            Self::Register { .. } | Self::Withdraw { .. } | Self::Reset { .. }
        )
    }

    /// Returns `true` for events (facts about what happened)
    #[must_use]
    pub const fn is_event(&self) -> bool {
        !self.is_command()
    }

    /// Activity an event refers to
    #[must_use]
    pub const fn activity(&self) -> Option<&ActivityName> {
        match self {
            Self::ParticipantRegistered { activity, .. }
            | Self::ParticipantWithdrawn { activity, .. }
            | Self::RosterReset { activity, .. } => Some(activity),
            Self::ValidationFailed { error } => Some(error.activity()),
            Self::Register { .. } | Self::Withdraw { .. } | Self::Reset { .. } => None,
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Environment dependencies for the roster reducer
#[derive(Clone)]
pub struct RosterEnvironment {
    /// Clock for timestamps
    pub clock: Arc<dyn Clock>,
}

impl RosterEnvironment {
    /// Creates a new `RosterEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the roster aggregate
///
/// Check-and-insert happens inside one `reduce` call, so a caller holding the
/// roster exclusively can never overbook it.
#[derive(Clone, Debug, Default)]
pub struct RosterReducer;

impl RosterReducer {
    /// Creates a new `RosterReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a `Register` command
    fn validate_register(state: &Roster, participant: &ParticipantId) -> Result<(), RegistrationError> {
        if state.contains(participant) {
            return Err(RegistrationError::AlreadyRegistered {
                activity: state.activity.clone(),
                participant: participant.clone(),
            });
        }

        if state.is_full() {
            return Err(RegistrationError::CapacityExceeded {
                activity: state.activity.clone(),
                capacity: state.capacity,
            });
        }

        Ok(())
    }

    /// Validates a `Withdraw` command
    fn validate_withdraw(state: &Roster, participant: &ParticipantId) -> Result<(), RegistrationError> {
        if !state.contains(participant) {
            return Err(RegistrationError::NotRegistered {
                activity: state.activity.clone(),
                participant: participant.clone(),
            });
        }

        Ok(())
    }

    /// Validates a `Reset` command
    fn validate_reset(state: &Roster, participants: &[ParticipantId]) -> Result<(), RegistrationError> {
        if participants.len() > state.capacity.as_usize() {
            return Err(RegistrationError::CapacityExceeded {
                activity: state.activity.clone(),
                capacity: state.capacity,
            });
        }

        let mut seen = HashSet::with_capacity(participants.len());
        if let Some(duplicate) = participants.iter().find(|p| !seen.insert(*p)) {
            return Err(RegistrationError::AlreadyRegistered {
                activity: state.activity.clone(),
                participant: duplicate.clone(),
            });
        }

        Ok(())
    }

    /// Applies an event to state
    fn apply_event(state: &mut Roster, action: &RosterAction) {
        match action {
            RosterAction::ParticipantRegistered {
                participant,
                registered_at,
                ..
            } => {
                state.enrollments.push(Enrollment {
                    participant: participant.clone(),
                    registered_at: *registered_at,
                });
                state.last_error = None;
            }
            RosterAction::ParticipantWithdrawn { participant, .. } => {
                state.enrollments.retain(|e| e.participant != *participant);
                state.last_error = None;
            }
            RosterAction::RosterReset {
                participants,
                reset_at,
                ..
            } => {
                state.enrollments = Roster::enroll_all(participants, *reset_at);
                state.last_error = None;
            }
            RosterAction::ValidationFailed { error } => {
                state.last_error = Some(error.clone());
            }
            // Commands are not applied to state
            RosterAction::Register { .. }
            | RosterAction::Withdraw { .. }
            | RosterAction::Reset { .. } => {}
        }
    }

    /// Applies the event and describes publishing it
    fn commit(state: &mut Roster, event: RosterAction) -> SmallVec<[Effect<RosterAction>; 4]> {
        Self::apply_event(state, &event);
        smallvec![Effect::Publish(event)]
    }

    /// Records a rejection; nothing is published
    fn reject(state: &mut Roster, error: RegistrationError) -> SmallVec<[Effect<RosterAction>; 4]> {
        Self::apply_event(state, &RosterAction::ValidationFailed { error });
        SmallVec::new()
    }
}

impl Reducer for RosterReducer {
    type State = Roster;
    type Action = RosterAction;
    type Environment = RosterEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            RosterAction::Register { participant } => {
                if let Err(error) = Self::validate_register(state, &participant) {
                    return Self::reject(state, error);
                }

                let event = RosterAction::ParticipantRegistered {
                    activity: state.activity.clone(),
                    participant,
                    participant_count: state.len() + 1,
                    registered_at: env.clock.now(),
                };
                Self::commit(state, event)
            }

            RosterAction::Withdraw { participant } => {
                if let Err(error) = Self::validate_withdraw(state, &participant) {
                    return Self::reject(state, error);
                }

                let event = RosterAction::ParticipantWithdrawn {
                    activity: state.activity.clone(),
                    participant,
                    participant_count: state.len() - 1,
                    withdrawn_at: env.clock.now(),
                };
                Self::commit(state, event)
            }

            RosterAction::Reset { participants } => {
                if let Err(error) = Self::validate_reset(state, &participants) {
                    return Self::reject(state, error);
                }

                let event = RosterAction::RosterReset {
                    activity: state.activity.clone(),
                    participants,
                    reset_at: env.clock.now(),
                };
                Self::commit(state, event)
            }

            // ========== Events ==========
            // Replaying an event applies it without validation
            event @ (RosterAction::ParticipantRegistered { .. }
            | RosterAction::ParticipantWithdrawn { .. }
            | RosterAction::RosterReset { .. }
            | RosterAction::ValidationFailed { .. }) => {
                Self::apply_event(state, &event);
                SmallVec::new()
            }
        }
    }
}
