//! Registration engine: the only entry point that mutates rosters.
//!
//! The engine is the imperative shell around [`RosterReducer`]. For each
//! operation it resolves the activity in the catalog, locks that one roster,
//! runs the reducer, checks the roster invariants, reads the outcome and
//! executes the returned effects before releasing the lock. Events of one
//! activity therefore reach subscribers in the order the roster changed.

use crate::catalog::{ActivityCatalog, ActivityMetadata};
use crate::config::{DEFAULT_EVENT_CAPACITY, EngineConfig};
use crate::error::{CatalogError, RegistrationError};
use crate::roster::{Roster, RosterAction, RosterEnvironment, RosterReducer};
use crate::store::RosterStore;
use crate::types::{ActivityName, ParticipantId};
use crate::views::{ActivityView, RegistrationReceipt};
use activity_registration_core::{SmallVec, effect::Effect, reducer::Reducer};
use std::sync::Arc;
use tokio::sync::broadcast;

struct EngineInner {
    catalog: Arc<ActivityCatalog>,
    store: RosterStore,
    reducer: RosterReducer,
    environment: RosterEnvironment,
    events: broadcast::Sender<RosterAction>,
}

/// Concurrency-safe registration engine
///
/// Cloning is cheap and every clone shares the same rosters.
///
/// # Example
///
/// ```
/// use activity_registration::{ActivityCatalog, ActivityDefinition, RegistrationEngine, RosterEnvironment};
/// use activity_registration_core::environment::SystemClock;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let catalog = ActivityCatalog::from_definitions([
///     ActivityDefinition::new("Chess Club", "Strategy", "Fridays", 2),
/// ])?;
/// let engine = RegistrationEngine::new(catalog, RosterEnvironment::new(Arc::new(SystemClock)));
///
/// let receipt = engine.register("Chess Club", "a@x.com").await?;
/// assert_eq!(receipt.participant_count, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RegistrationEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for RegistrationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationEngine")
            .field("activities", &self.inner.catalog.len())
            .field("subscribers", &self.inner.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl RegistrationEngine {
    /// Creates an engine whose rosters start from the catalog's seeds
    #[must_use]
    pub fn new(catalog: ActivityCatalog, environment: RosterEnvironment) -> Self {
        Self::with_event_capacity(catalog, environment, DEFAULT_EVENT_CAPACITY)
    }

    /// Creates an engine with a specific event channel buffer
    ///
    /// Subscribers that fall more than `event_capacity` events behind miss
    /// the oldest ones. A capacity of zero is raised to one.
    #[must_use]
    pub fn with_event_capacity(
        catalog: ActivityCatalog,
        environment: RosterEnvironment,
        event_capacity: usize,
    ) -> Self {
        let store = RosterStore::new(&catalog, environment.clock.now());
        let (events, _) = broadcast::channel(event_capacity.max(1));

        tracing::info!(activities = catalog.len(), "Registration engine loaded catalog");
        for metadata in catalog.iter() {
            crate::metrics::record_roster_size(metadata.name.as_str(), metadata.seed.len());
        }

        Self {
            inner: Arc::new(EngineInner {
                catalog: Arc::new(catalog),
                store,
                reducer: RosterReducer::new(),
                environment,
                events,
            }),
        }
    }

    /// Creates an engine from configuration
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the configured catalog cannot be loaded.
    pub fn from_config(
        config: &EngineConfig,
        environment: RosterEnvironment,
    ) -> Result<Self, CatalogError> {
        let catalog = config.load_catalog()?;
        Ok(Self::with_event_capacity(catalog, environment, config.event_capacity))
    }

    /// The immutable activity catalog
    #[must_use]
    pub fn catalog(&self) -> &ActivityCatalog {
        &self.inner.catalog
    }

    /// Subscribe to roster events published after this call
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RosterAction> {
        self.inner.events.subscribe()
    }

    /// Every activity with its roster, in catalog order, at one point in time
    #[tracing::instrument(skip(self), name = "engine_list_activities")]
    pub async fn list_activities(&self) -> Vec<ActivityView> {
        let rosters = self.inner.store.snapshot().await;
        self.inner
            .catalog
            .iter()
            .zip(rosters.iter())
            .map(|(metadata, roster)| ActivityView::new(metadata, roster))
            .collect()
    }

    /// One activity with its roster
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::NotFound`] for names outside the catalog.
    #[tracing::instrument(skip(self), name = "engine_activity")]
    pub async fn activity(&self, activity: &str) -> Result<ActivityView, RegistrationError> {
        let (position, metadata) = self.locate(activity)?;
        self.inner
            .store
            .with_roster(position, |roster| ActivityView::new(metadata, roster))
            .await
            .ok_or_else(|| not_found(activity))
    }

    /// Register a participant for an activity
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::NotFound`]: unknown activity
    /// - [`RegistrationError::InvalidParticipant`]: empty participant identifier
    /// - [`RegistrationError::AlreadyRegistered`]: participant already on the roster
    /// - [`RegistrationError::CapacityExceeded`]: roster is full
    ///
    /// # Panics
    ///
    /// Panics if the roster breaks its capacity or uniqueness invariant.
    #[tracing::instrument(skip(self), name = "engine_register")]
    pub async fn register(
        &self,
        activity: &str,
        participant: &str,
    ) -> Result<RegistrationReceipt, RegistrationError> {
        let result = self
            .run_command(activity, participant, |participant| RosterAction::Register {
                participant,
            })
            .await
            .map(|(name, participant, count)| RegistrationReceipt::signed_up(name, participant, count));

        crate::metrics::record_signup(activity, result.as_ref().map(|_| ()));
        match &result {
            Ok(receipt) => tracing::debug!(
                activity,
                participant,
                participant_count = receipt.participant_count,
                "Participant registered"
            ),
            Err(error) => tracing::warn!(
                activity,
                participant,
                reason = error.kind(),
                "Registration rejected"
            ),
        }
        result
    }

    /// Withdraw a participant from an activity
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::NotFound`]: unknown activity
    /// - [`RegistrationError::InvalidParticipant`]: empty participant identifier
    /// - [`RegistrationError::NotRegistered`]: participant not on the roster
    ///
    /// # Panics
    ///
    /// Panics if the roster breaks its capacity or uniqueness invariant.
    #[tracing::instrument(skip(self), name = "engine_withdraw")]
    pub async fn withdraw(
        &self,
        activity: &str,
        participant: &str,
    ) -> Result<RegistrationReceipt, RegistrationError> {
        let result = self
            .run_command(activity, participant, |participant| RosterAction::Withdraw {
                participant,
            })
            .await
            .map(|(name, participant, count)| {
                RegistrationReceipt::unregistered(name, participant, count)
            });

        crate::metrics::record_withdrawal(activity, result.as_ref().map(|_| ()));
        match &result {
            Ok(receipt) => tracing::debug!(
                activity,
                participant,
                participant_count = receipt.participant_count,
                "Participant withdrawn"
            ),
            Err(error) => tracing::warn!(
                activity,
                participant,
                reason = error.kind(),
                "Withdrawal rejected"
            ),
        }
        result
    }

    /// Restore every roster to its seeded state
    ///
    /// Waits for in-flight operations, then resets all rosters before any
    /// other operation can observe them. Intended for test support.
    ///
    /// # Panics
    ///
    /// Panics if a catalog seed is rejected by its roster, which the
    /// catalog's load-time validation rules out.
    #[tracing::instrument(skip(self), name = "engine_reset")]
    pub async fn reset(&self) {
        let inner = &self.inner;
        let reset = inner
            .store
            .exclusive(|rosters| {
                for (metadata, roster) in inner.catalog.iter().zip(rosters) {
                    let action = RosterAction::Reset {
                        participants: metadata.seed.clone(),
                    };
                    let effects = inner.reducer.reduce(roster, action, &inner.environment);
                    roster.assert_invariants();
                    let rejected = roster.take_error();
                    assert!(
                        rejected.is_none(),
                        "seed of {} rejected on reset: {rejected:?}",
                        metadata.name
                    );
                    self.execute_effects(effects);
                    crate::metrics::record_roster_size(metadata.name.as_str(), roster.len());
                }
                inner.catalog.len()
            })
            .await;

        crate::metrics::record_reset();
        tracing::info!(activities = reset, "Rosters reset to seeded state");
    }

    /// Resolves an activity name to its catalog position and metadata
    fn locate(&self, activity: &str) -> Result<(usize, &ActivityMetadata), RegistrationError> {
        let catalog = &self.inner.catalog;
        catalog
            .position(activity)
            .and_then(|position| catalog.get(position).map(|metadata| (position, metadata)))
            .ok_or_else(|| not_found(activity))
    }

    /// Runs one roster command under that roster's lock
    ///
    /// Returns the activity, participant and roster size after the command.
    async fn run_command<F>(
        &self,
        activity: &str,
        participant: &str,
        command: F,
    ) -> Result<(ActivityName, ParticipantId, usize), RegistrationError>
    where
        F: FnOnce(ParticipantId) -> RosterAction,
    {
        let (position, metadata) = self.locate(activity)?;
        let Some(participant) = ParticipantId::parse(participant) else {
            return Err(RegistrationError::InvalidParticipant {
                activity: metadata.name.clone(),
            });
        };

        let inner = &self.inner;
        inner
            .store
            .with_roster(position, |roster: &mut Roster| {
                let effects =
                    inner
                        .reducer
                        .reduce(roster, command(participant.clone()), &inner.environment);
                roster.assert_invariants();

                if let Some(error) = roster.take_error() {
                    return Err(error);
                }

                self.execute_effects(effects);
                crate::metrics::record_roster_size(metadata.name.as_str(), roster.len());
                Ok((metadata.name.clone(), participant, roster.len()))
            })
            .await
            .unwrap_or_else(|| Err(not_found(activity)))
    }

    /// Executes reducer effects
    fn execute_effects(&self, effects: SmallVec<[Effect<RosterAction>; 4]>) {
        for event in effects.into_iter().filter_map(Effect::into_published) {
            // An error only means nobody is subscribed
            let _ = self.inner.events.send(event);
        }
    }
}

fn not_found(activity: &str) -> RegistrationError {
    RegistrationError::NotFound {
        activity: ActivityName::new(activity),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog::ActivityDefinition;
    use activity_registration_testing::test_clock;

    fn engine_with(definitions: Vec<ActivityDefinition>) -> RegistrationEngine {
        RegistrationEngine::new(
            ActivityCatalog::from_definitions(definitions).unwrap(),
            RosterEnvironment::new(Arc::new(test_clock())),
        )
    }

    fn chess_club(capacity: u32) -> RegistrationEngine {
        engine_with(vec![ActivityDefinition::new(
            "Chess Club",
            "Learn strategies and compete in chess tournaments",
            "Fridays, 3:30 PM - 5:00 PM",
            capacity,
        )])
    }

    #[tokio::test]
    async fn test_register_returns_updated_count() {
        let engine = chess_club(2);
        let receipt = engine.register("Chess Club", "a@x.com").await.unwrap();
        assert_eq!(receipt.participant_count, 1);
        assert_eq!(receipt.message, "Signed up a@x.com for Chess Club");
    }

    #[tokio::test]
    async fn test_unknown_activity_checked_before_participant() {
        let engine = chess_club(2);
        let error = engine.register("Nonexistent", "").await.unwrap_err();
        assert!(matches!(error, RegistrationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_participant_rejected() {
        let engine = chess_club(2);
        let error = engine.register("Chess Club", "").await.unwrap_err();
        assert!(matches!(error, RegistrationError::InvalidParticipant { .. }));
        let error = engine.withdraw("Chess Club", "").await.unwrap_err();
        assert!(matches!(error, RegistrationError::InvalidParticipant { .. }));
        assert_eq!(engine.activity("Chess Club").await.unwrap().participant_count, 0);
    }

    #[tokio::test]
    async fn test_withdraw_receipt() {
        let engine = chess_club(2);
        engine.register("Chess Club", "a@x.com").await.unwrap();
        let receipt = engine.withdraw("Chess Club", "a@x.com").await.unwrap();
        assert_eq!(receipt.participant_count, 0);
        assert_eq!(receipt.message, "Unregistered a@x.com from Chess Club");
    }

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let engine = chess_club(2);
        let mut events = engine.subscribe();

        engine.register("Chess Club", "a@x.com").await.unwrap();
        engine.register("Chess Club", "a@x.com").await.unwrap_err();
        engine.withdraw("Chess Club", "a@x.com").await.unwrap();

        assert!(matches!(
            events.recv().await.unwrap(),
            RosterAction::ParticipantRegistered { participant_count: 1, .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            RosterAction::ParticipantWithdrawn { participant_count: 0, .. }
        ));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reset_publishes_one_event_per_activity() {
        let engine = RegistrationEngine::new(
            ActivityCatalog::school().unwrap(),
            RosterEnvironment::new(Arc::new(test_clock())),
        );
        let mut events = engine.subscribe();
        engine.reset().await;

        let mut resets = 0;
        while let Ok(event) = events.try_recv() {
            assert!(matches!(event, RosterAction::RosterReset { .. }));
            resets += 1;
        }
        assert_eq!(resets, 9);
    }

    #[tokio::test]
    async fn test_activity_view_not_found() {
        let engine = chess_club(1);
        assert!(matches!(
            engine.activity("chess club").await,
            Err(RegistrationError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_event_capacity_is_raised() {
        let engine = RegistrationEngine::with_event_capacity(
            ActivityCatalog::school().unwrap(),
            RosterEnvironment::new(Arc::new(test_clock())),
            0,
        );
        let mut events = engine.subscribe();
        engine.register("Chess Club", "new@mergington.edu").await.unwrap();
        assert!(events.try_recv().is_ok());
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RegistrationEngine>();
    }
}
