//! # Activity Registration Testing
//!
//! Testing utilities and helpers for the activity registration engine.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A fluent Given-When-Then harness for reducers
//! - Property-based testing strategies for identifiers
//!
//! ## Example
//!
//! ```ignore
//! use activity_registration_testing::{test_clock, ReducerTest};
//!
//! ReducerTest::new(RosterReducer::new())
//!     .with_env(RosterEnvironment::new(Arc::new(test_clock())))
//!     .given_state(roster)
//!     .when_action(RosterAction::Register { participant })
//!     .then_state(|roster| assert_eq!(roster.len(), 1))
//!     .run();
//! ```

use activity_registration_core::environment::Clock;
use chrono::{DateTime, Utc};


/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use activity_registration_testing::mocks::FixedClock;
    /// use activity_registration_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Test data generators.
pub mod helpers {
    /// Generate `count` distinct participant emails sharing a prefix
    ///
    /// ```
    /// use activity_registration_testing::helpers::participant_emails;
    ///
    /// let emails = participant_emails("student", 2);
    /// assert_eq!(emails, vec!["student0@mergington.edu", "student1@mergington.edu"]);
    /// ```
    #[must_use]
    pub fn participant_emails(prefix: &str, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("{prefix}{i}@mergington.edu"))
            .collect()
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Strategy for email-like participant identifiers
    ///
    /// Includes characters that need URL encoding (`+`, `.`, `-`, `_`) since
    /// identifiers are accepted verbatim.
    pub fn participant_email() -> impl Strategy<Value = String> {
        ("[a-z][a-z0-9+._-]{0,15}", "[a-z]{1,10}")
            .prop_map(|(local, domain)| format!("{local}@{domain}.edu"))
    }

    /// Strategy for a small pool of distinct participant emails
    ///
    /// Useful when an operation sequence should revisit the same identifiers.
    pub fn participant_pool(max: usize) -> impl Strategy<Value = Vec<String>> {
        proptest::collection::hash_set(participant_email(), 1..=max)
            .prop_map(|set| set.into_iter().collect())
    }

    /// Strategy for a roster capacity
    pub fn capacity() -> impl Strategy<Value = u32> {
        1u32..=12
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::ReducerTest;
