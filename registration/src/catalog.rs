//! Activity catalog: the fixed set of activities and their metadata.
//!
//! The catalog is validated once at load and never changes afterwards. It is
//! shared behind an `Arc` and read without synchronization.

use crate::error::CatalogError;
use crate::types::{ActivityName, Capacity, ParticipantId};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

// ============================================================================
// Definitions (unvalidated input)
// ============================================================================

/// One activity as written in a catalog definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDefinition {
    /// Activity name
    pub name: String,
    /// What the activity is about
    pub description: String,
    /// When it meets
    pub schedule: String,
    /// Capacity
    pub max_participants: u32,
    /// Participants registered at load time
    #[serde(default)]
    pub participants: Vec<String>,
}

impl ActivityDefinition {
    /// Creates a definition with an empty seed roster
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schedule: impl Into<String>,
        max_participants: u32,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schedule: schedule.into(),
            max_participants,
            participants: Vec::new(),
        }
    }

    /// Sets the participants registered at load time
    #[must_use]
    pub fn with_participants<I, S>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participants = participants.into_iter().map(Into::into).collect();
        self
    }
}

/// Body of an entry in the keyed JSON document
#[derive(Deserialize)]
struct DefinitionBody {
    description: String,
    schedule: String,
    max_participants: u32,
    #[serde(default)]
    participants: Vec<String>,
}

/// A JSON object keyed by activity name, read in document order
struct CatalogDocument(Vec<ActivityDefinition>);

impl<'de> Deserialize<'de> for CatalogDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = CatalogDocument;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping activity names to definitions")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut definitions = Vec::with_capacity(map.size_hint().unwrap_or(0));
                let mut seen = HashSet::new();
                while let Some((name, body)) = map.next_entry::<String, DefinitionBody>()? {
                    if !seen.insert(name.clone()) {
                        return Err(de::Error::custom(format!("duplicate activity: {name}")));
                    }
                    definitions.push(ActivityDefinition {
                        name,
                        description: body.description,
                        schedule: body.schedule,
                        max_participants: body.max_participants,
                        participants: body.participants,
                    });
                }
                Ok(CatalogDocument(definitions))
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

// ============================================================================
// Validated Metadata
// ============================================================================

/// Immutable metadata of one catalog activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityMetadata {
    /// Unique activity name
    pub name: ActivityName,
    /// Display description
    pub description: String,
    /// Display schedule
    pub schedule: String,
    /// Maximum roster size
    pub capacity: Capacity,
    /// Roster at load time, restored by reset
    pub seed: Vec<ParticipantId>,
}

impl TryFrom<ActivityDefinition> for ActivityMetadata {
    type Error = CatalogError;

    fn try_from(definition: ActivityDefinition) -> Result<Self, Self::Error> {
        if definition.name.is_empty() {
            return Err(CatalogError::EmptyName);
        }

        let Some(capacity) = Capacity::new(definition.max_participants) else {
            return Err(CatalogError::ZeroCapacity(definition.name));
        };

        if definition.participants.len() > capacity.as_usize() {
            return Err(CatalogError::SeedExceedsCapacity {
                activity: definition.name,
                seeded: definition.participants.len(),
                capacity: capacity.value(),
            });
        }

        let mut seen = HashSet::with_capacity(definition.participants.len());
        let mut seed = Vec::with_capacity(definition.participants.len());
        for participant in definition.participants {
            if !seen.insert(participant.clone()) {
                return Err(CatalogError::DuplicateSeed {
                    activity: definition.name,
                    participant,
                });
            }
            let Some(id) = ParticipantId::parse(participant) else {
                return Err(CatalogError::EmptySeed(definition.name));
            };
            seed.push(id);
        }

        Ok(Self {
            name: ActivityName::new(definition.name),
            description: definition.description,
            schedule: definition.schedule,
            capacity,
            seed,
        })
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// The fixed, ordered set of activities
#[derive(Debug, Clone)]
pub struct ActivityCatalog {
    activities: Vec<ActivityMetadata>,
    index: HashMap<String, usize>,
}

impl ActivityCatalog {
    /// Validates definitions into a catalog, keeping their order
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if any definition is invalid or a name repeats.
    pub fn from_definitions<I>(definitions: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = ActivityDefinition>,
    {
        let mut activities = Vec::new();
        let mut index = HashMap::new();

        for definition in definitions {
            let metadata = ActivityMetadata::try_from(definition)?;
            let name = metadata.name.as_str().to_string();
            if index.contains_key(&name) {
                return Err(CatalogError::DuplicateActivity(name));
            }
            index.insert(name, activities.len());
            activities.push(metadata);
        }

        Ok(Self { activities, index })
    }

    /// Parses a JSON document keyed by activity name
    ///
    /// ```
    /// use activity_registration::ActivityCatalog;
    ///
    /// let catalog = ActivityCatalog::from_json(r#"{
    ///     "Chess Club": {
    ///         "description": "Learn strategies",
    ///         "schedule": "Fridays",
    ///         "max_participants": 2,
    ///         "participants": ["michael@mergington.edu"]
    ///     }
    /// }"#).unwrap();
    /// assert_eq!(catalog.len(), 1);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON and the validation
    /// errors of [`ActivityCatalog::from_definitions`].
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let CatalogDocument(definitions) = serde_json::from_str(json)?;
        Self::from_definitions(definitions)
    }

    /// Reads and parses a JSON definition file
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, otherwise the
    /// errors of [`ActivityCatalog::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The built-in Mergington school catalog
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] only if the built-in definitions are invalid.
    pub fn school() -> Result<Self, CatalogError> {
        Self::from_definitions(school_definitions())
    }

    /// Position of an activity in catalog order (exact, case-sensitive match)
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Metadata of the activity at `position`
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&ActivityMetadata> {
        self.activities.get(position)
    }

    /// Metadata looked up by name
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&ActivityMetadata> {
        self.position(name).and_then(|position| self.get(position))
    }

    /// Activities in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &ActivityMetadata> {
        self.activities.iter()
    }

    /// Number of activities
    #[must_use]
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    /// Returns `true` if the catalog has no activities
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

/// Definitions of the built-in school catalog
#[must_use]
pub fn school_definitions() -> Vec<ActivityDefinition> {
    vec![
        ActivityDefinition::new(
            "Chess Club",
            "Learn strategies and compete in chess tournaments",
            "Fridays, 3:30 PM - 5:00 PM",
            12,
        )
        .with_participants(["michael@mergington.edu", "daniel@mergington.edu"]),
        ActivityDefinition::new(
            "Programming Class",
            "Learn programming fundamentals and build software projects",
            "Tuesdays and Thursdays, 3:30 PM - 4:30 PM",
            20,
        )
        .with_participants(["emma@mergington.edu", "sophia@mergington.edu"]),
        ActivityDefinition::new(
            "Gym Class",
            "Physical education and sports activities",
            "Mondays, Wednesdays, Fridays, 2:00 PM - 3:00 PM",
            30,
        )
        .with_participants(["john@mergington.edu", "olivia@mergington.edu"]),
        ActivityDefinition::new(
            "Soccer Team",
            "Join the school soccer team and compete in matches",
            "Wednesdays, 4:00 PM - 5:30 PM",
            18,
        )
        .with_participants(["lucas@mergington.edu", "mia@mergington.edu"]),
        ActivityDefinition::new(
            "Basketball Club",
            "Practice basketball skills and play friendly games",
            "Thursdays, 3:30 PM - 5:00 PM",
            15,
        )
        .with_participants(["liam@mergington.edu", "ava@mergington.edu"]),
        ActivityDefinition::new(
            "Art Workshop",
            "Explore painting, drawing, and sculpture techniques",
            "Mondays, 4:00 PM - 5:30 PM",
            16,
        )
        .with_participants(["ella@mergington.edu", "jack@mergington.edu"]),
        ActivityDefinition::new(
            "Drama Club",
            "Act in plays and learn stage performance skills",
            "Tuesdays, 3:30 PM - 5:00 PM",
            20,
        )
        .with_participants(["chloe@mergington.edu", "noah@mergington.edu"]),
        ActivityDefinition::new(
            "Math Olympiad",
            "Prepare for math competitions and solve challenging problems",
            "Fridays, 2:00 PM - 3:30 PM",
            10,
        )
        .with_participants(["oliver@mergington.edu", "grace@mergington.edu"]),
        ActivityDefinition::new(
            "Science Club",
            "Conduct experiments and explore scientific concepts",
            "Wednesdays, 3:30 PM - 5:00 PM",
            14,
        )
        .with_participants(["benjamin@mergington.edu", "zoe@mergington.edu"]),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_school_catalog_loads_in_order() {
        let catalog = ActivityCatalog::school().unwrap();
        assert_eq!(catalog.len(), 9);
        let names: Vec<_> = catalog.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names.first(), Some(&"Chess Club"));
        assert_eq!(names.last(), Some(&"Science Club"));
        assert_eq!(catalog.lookup("Math Olympiad").unwrap().capacity.value(), 10);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let catalog = ActivityCatalog::school().unwrap();
        assert!(catalog.position("Chess Club").is_some());
        assert!(catalog.position("chess club").is_none());
        assert!(catalog.position("CHESS CLUB").is_none());
        assert!(catalog.position("").is_none());
    }

    #[test]
    fn test_json_keeps_document_order() {
        let catalog = ActivityCatalog::from_json(
            r#"{
                "Zither": {"description": "z", "schedule": "s", "max_participants": 1},
                "Archery": {"description": "a", "schedule": "s", "max_participants": 3,
                            "participants": ["a@x.com"]}
            }"#,
        )
        .unwrap();
        let names: Vec<_> = catalog.iter().map(|a| a.name.to_string()).collect();
        assert_eq!(names, vec!["Zither", "Archery"]);
        assert_eq!(catalog.lookup("Archery").unwrap().seed.len(), 1);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let result = ActivityCatalog::from_definitions([ActivityDefinition::new("Empty", "", "", 0)]);
        assert!(matches!(result, Err(CatalogError::ZeroCapacity(name)) if name == "Empty"));
    }

    #[test]
    fn test_rejects_overfull_seed() {
        let result = ActivityCatalog::from_definitions([
            ActivityDefinition::new("Tiny", "", "", 1).with_participants(["a@x.com", "b@x.com"]),
        ]);
        assert!(matches!(
            result,
            Err(CatalogError::SeedExceedsCapacity { seeded: 2, capacity: 1, .. })
        ));
    }

    #[test]
    fn test_accepts_full_seed() {
        let catalog = ActivityCatalog::from_definitions([
            ActivityDefinition::new("Pair", "", "", 2).with_participants(["a@x.com", "b@x.com"]),
        ])
        .unwrap();
        assert_eq!(catalog.lookup("Pair").unwrap().seed.len(), 2);
    }

    #[test]
    fn test_rejects_duplicate_seed() {
        let result = ActivityCatalog::from_definitions([
            ActivityDefinition::new("Pair", "", "", 5).with_participants(["a@x.com", "a@x.com"]),
        ]);
        assert!(matches!(result, Err(CatalogError::DuplicateSeed { .. })));
    }

    #[test]
    fn test_rejects_empty_seed_and_name() {
        let empty_seed = ActivityCatalog::from_definitions([
            ActivityDefinition::new("Pair", "", "", 5).with_participants([""]),
        ]);
        assert!(matches!(empty_seed, Err(CatalogError::EmptySeed(_))));

        let empty_name = ActivityCatalog::from_definitions([ActivityDefinition::new("", "", "", 5)]);
        assert!(matches!(empty_name, Err(CatalogError::EmptyName)));
    }

    #[test]
    fn test_rejects_duplicate_activity() {
        let result = ActivityCatalog::from_definitions([
            ActivityDefinition::new("Chess Club", "", "", 5),
            ActivityDefinition::new("Chess Club", "", "", 7),
        ]);
        assert!(matches!(result, Err(CatalogError::DuplicateActivity(name)) if name == "Chess Club"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            ActivityCatalog::from_json(r#"{"Chess Club": {"description": "x"}}"#),
            Err(CatalogError::Parse(_))
        ));
        assert!(matches!(
            ActivityCatalog::from_json(r#"[1, 2]"#),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_json_key() {
        let result = ActivityCatalog::from_json(
            r#"{
                "Chess Club": {"description": "a", "schedule": "s", "max_participants": 1},
                "Chess Club": {"description": "b", "schedule": "s", "max_participants": 2}
            }"#,
        );
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ActivityCatalog::from_path("/nonexistent/catalog.json");
        assert!(matches!(result, Err(CatalogError::Io(_))));
    }

    #[test]
    fn test_empty_catalog_is_allowed() {
        let catalog = ActivityCatalog::from_json("{}").unwrap();
        assert!(catalog.is_empty());
    }
}
