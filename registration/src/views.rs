//! Read-only views and operation receipts handed to callers.

use crate::catalog::ActivityMetadata;
use crate::roster::Roster;
use crate::types::{ActivityName, Capacity, ParticipantId};
use serde::Serialize;

/// Snapshot of one activity: metadata plus its roster at a single instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityView {
    /// Activity name
    pub name: ActivityName,
    /// Display description
    pub description: String,
    /// Display schedule
    pub schedule: String,
    /// Maximum roster size
    #[serde(rename = "max_participants")]
    pub capacity: Capacity,
    /// Current roster size
    pub participant_count: usize,
    /// Participants in registration order
    pub participants: Vec<ParticipantId>,
}

impl ActivityView {
    /// Builds a view from catalog metadata and the roster's current state
    #[must_use]
    pub fn new(metadata: &ActivityMetadata, roster: &Roster) -> Self {
        Self {
            name: metadata.name.clone(),
            description: metadata.description.clone(),
            schedule: metadata.schedule.clone(),
            capacity: metadata.capacity,
            participant_count: roster.len(),
            participants: roster.participants().cloned().collect(),
        }
    }

    /// Open slots at the time of the snapshot
    #[must_use]
    pub fn spots_left(&self) -> usize {
        self.capacity.as_usize().saturating_sub(self.participant_count)
    }

    /// Returns `true` if the participant was registered at snapshot time
    #[must_use]
    pub fn has_participant(&self, participant: &str) -> bool {
        self.participants.iter().any(|p| p.as_str() == participant)
    }
}

/// Result of a successful register or withdraw
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationReceipt {
    /// Confirmation text naming participant and activity
    pub message: String,
    /// Activity name
    pub activity: ActivityName,
    /// Participant the operation applied to
    pub participant: ParticipantId,
    /// Roster size right after the operation
    pub participant_count: usize,
}

impl RegistrationReceipt {
    /// Receipt for a registration
    #[must_use]
    pub fn signed_up(activity: ActivityName, participant: ParticipantId, participant_count: usize) -> Self {
        Self {
            message: format!("Signed up {participant} for {activity}"),
            activity,
            participant,
            participant_count,
        }
    }

    /// Receipt for a withdrawal
    #[must_use]
    pub fn unregistered(
        activity: ActivityName,
        participant: ParticipantId,
        participant_count: usize,
    ) -> Self {
        Self {
            message: format!("Unregistered {participant} from {activity}"),
            activity,
            participant,
            participant_count,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_message_names_both() {
        let receipt = RegistrationReceipt::signed_up(
            ActivityName::from("Art Workshop"),
            ParticipantId::parse("test+student@mergington.edu").unwrap(),
            3,
        );
        assert_eq!(
            receipt.message,
            "Signed up test+student@mergington.edu for Art Workshop"
        );
    }

    #[test]
    fn test_view_serializes_with_facade_field_names() {
        let metadata = ActivityMetadata {
            name: ActivityName::from("Chess Club"),
            description: "Learn strategies".to_string(),
            schedule: "Fridays".to_string(),
            capacity: Capacity::new(12).unwrap(),
            seed: vec![ParticipantId::parse("michael@mergington.edu").unwrap()],
        };
        let roster = Roster::seeded(&metadata, chrono::Utc::now());
        let view = ActivityView::new(&metadata, &roster);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["max_participants"], 12);
        assert_eq!(json["participants"], serde_json::json!(["michael@mergington.edu"]));
        assert_eq!(json["participant_count"], 1);
        assert_eq!(view.spots_left(), 11);
        assert!(view.has_participant("michael@mergington.edu"));
    }
}
