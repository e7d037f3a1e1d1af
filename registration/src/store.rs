//! Roster store: the mutable roster state and its locking discipline.
//!
//! Each roster sits behind its own mutex, so operations on different
//! activities never wait for each other. The outer `RwLock` is taken shared by
//! every per-activity operation and exclusive only by whole-store mutations
//! such as reset.
//!
//! Lock order is always outer lock first, then roster locks in catalog
//! position order. Single-activity callers hold at most one roster lock.

use crate::catalog::ActivityCatalog;
use crate::roster::Roster;
use activity_registration_core::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

/// Rosters of every catalog activity, indexed by catalog position
#[derive(Debug)]
pub struct RosterStore {
    rosters: RwLock<Vec<Mutex<Roster>>>,
}

impl RosterStore {
    /// Creates one seeded roster per catalog activity
    #[must_use]
    pub fn new(catalog: &ActivityCatalog, loaded_at: DateTime<Utc>) -> Self {
        let rosters = catalog
            .iter()
            .map(|metadata| Mutex::new(Roster::seeded(metadata, loaded_at)))
            .collect();

        Self {
            rosters: RwLock::new(rosters),
        }
    }

    /// Runs `f` with exclusive access to one roster
    ///
    /// Returns `None` if `position` is out of range.
    pub async fn with_roster<F, T>(&self, position: usize, f: F) -> Option<T>
    where
        F: FnOnce(&mut Roster) -> T,
    {
        let rosters = self.rosters.read().await;
        let slot = rosters.get(position)?;
        let mut roster = slot.lock().await;
        Some(f(&mut roster))
    }

    /// Copies every roster at a single point in time
    ///
    /// All roster locks are held together while copying, so no mutation can
    /// land between two rosters of the snapshot.
    pub async fn snapshot(&self) -> Vec<Roster> {
        let rosters = self.rosters.read().await;

        let mut guards = Vec::with_capacity(rosters.len());
        for slot in rosters.iter() {
            guards.push(slot.lock().await);
        }

        guards.iter().map(|roster| Roster::clone(roster)).collect()
    }

    /// Runs `f` with every roster while excluding all other operations
    ///
    /// Waits for in-flight operations to finish; none can start until `f`
    /// returns.
    pub async fn exclusive<F, T>(&self, f: F) -> T
    where
        F: FnOnce(Vec<&mut Roster>) -> T,
    {
        let mut rosters = self.rosters.write().await;
        f(rosters.iter_mut().map(Mutex::get_mut).collect())
    }

    /// Number of rosters
    pub async fn len(&self) -> usize {
        self.rosters.read().await.len()
    }

    /// Returns `true` if the store holds no rosters
    pub async fn is_empty(&self) -> bool {
        self.rosters.read().await.is_empty()
    }
}
