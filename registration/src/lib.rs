//! Activity Registration - concurrency-safe rosters for a fixed activity catalog
//!
//! Participants register for and withdraw from activities. Each activity has a
//! fixed capacity and a roster of unique participants. The engine guarantees
//! that no interleaving of concurrent operations overfills a roster or lists a
//! participant twice.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ ActivityCatalog  │  immutable, validated at load
//! └──────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐   register / withdraw / list / reset
//! │RegistrationEngine│◀──────────────────────────────────────
//! └──────────────────┘
//!          │ one roster lock per activity
//!          ▼
//! ┌──────────────────┐      ┌──────────────────┐
//! │   RosterStore    │─────▶│  RosterReducer   │  check-and-insert
//! └──────────────────┘      └──────────────────┘
//!          │
//!          ▼
//!    roster events (broadcast)
//! ```
//!
//! # Key Features
//!
//! ## Atomic check-and-insert
//!
//! The duplicate check, the capacity check and the insert run inside one
//! reducer call while the caller holds that roster's lock:
//!
//! ```text
//! if roster.contains(participant) { AlreadyRegistered }
//! else if roster.len() >= capacity { CapacityExceeded }
//! else { insert }
//! ```
//!
//! ## Independent activities
//!
//! Operations on different activities never wait for each other. Listing holds
//! every roster lock together so it observes one point in time.
//!
//! # Usage
//!
//! ```
//! use activity_registration::{ActivityCatalog, RegistrationEngine, RosterEnvironment};
//! use activity_registration_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = RegistrationEngine::new(
//!     ActivityCatalog::school()?,
//!     RosterEnvironment::new(Arc::new(SystemClock)),
//! );
//!
//! engine.register("Chess Club", "newstudent@mergington.edu").await?;
//! let chess = engine.activity("Chess Club").await?;
//! assert!(chess.has_participant("newstudent@mergington.edu"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod roster;
pub mod store;
pub mod types;
pub mod views;

pub use catalog::{ActivityCatalog, ActivityDefinition, ActivityMetadata, school_definitions};
pub use config::{ConfigError, EngineConfig};
pub use engine::RegistrationEngine;
pub use error::{CatalogError, ErrorPayload, RegistrationError};
pub use roster::{Enrollment, Roster, RosterAction, RosterEnvironment, RosterReducer};
pub use types::{ActivityName, Capacity, ParticipantId};
pub use views::{ActivityView, RegistrationReceipt};
