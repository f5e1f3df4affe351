//! Loading of feature flags and the announcement for the current session.
//!
//! A load cycle fetches both resources concurrently and commits them only if
//! both succeed. A failed cycle keeps the last-known-good data and records the
//! error next to it. At most one cycle is in flight per session token; callers
//! arriving while one is running await the same result instead of issuing
//! another round trip.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;

use crate::error::SyncError;
use crate::gateway::RemoteGateway;
use crate::models::{Announcement, FeatureFlag, Session};

/// Where the loader is in its `Idle → Loading → {Loaded, Failed}` cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl LoadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Failed => "failed",
        }
    }
}

/// Point-in-time copy of the loader's state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSnapshot {
    pub status: LoadStatus,
    /// Last successfully loaded flag set.
    pub flags: Vec<FeatureFlag>,
    /// Last successfully loaded announcement.
    pub announcement: Option<Announcement>,
    /// Message of the most recent failed cycle, cleared by the next success.
    pub error: Option<String>,
    /// A cycle is in flight on top of data from an earlier successful cycle.
    pub refreshing: bool,
}

impl SyncSnapshot {
    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }
}

/// What a call to [`SyncLoader::load`] or [`SyncLoader::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No session, so nothing was fetched.
    Skipped,
    /// The cycle succeeded and its data is now current.
    Loaded,
    /// The cycle finished after the loader was reset or superseded; its
    /// result was dropped.
    Discarded,
}

#[derive(Debug, Clone)]
struct CycleData {
    flags: Vec<FeatureFlag>,
    announcement: Option<Announcement>,
}

type CycleFuture = Shared<BoxFuture<'static, Result<CycleData, SyncError>>>;

struct Cycle {
    id: u64,
    token: String,
    result: CycleFuture,
    /// Callers currently awaiting `result`.
    waiters: usize,
    /// Status to restore if every waiter goes away before the cycle settles.
    prior_status: LoadStatus,
}

#[derive(Default)]
struct SyncState {
    snapshot: SyncSnapshot,
    next_cycle: u64,
    last_settled: Option<u64>,
    in_flight: Option<Cycle>,
    /// Some cycle has succeeded since the last reset.
    has_loaded: bool,
}

pub struct SyncLoader {
    gateway: Arc<dyn RemoteGateway>,
    state: Mutex<SyncState>,
}

impl SyncLoader {
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            gateway,
            state: Mutex::new(SyncState::default()),
        }
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.lock().snapshot.clone()
    }

    /// Initial load for a freshly started session.
    pub async fn load(&self, session: Option<&Session>) -> Result<LoadOutcome, SyncError> {
        self.run(session, "load").await
    }

    /// User-triggered reload. Keeps the current data visible while in flight
    /// and joins a cycle that is already running for the same session.
    pub async fn refresh(&self, session: Option<&Session>) -> Result<LoadOutcome, SyncError> {
        self.run(session, "refresh").await
    }

    /// Drop all loaded data and detach any in-flight cycle so that its result
    /// is never applied.
    pub fn reset(&self) {
        let mut state = self.lock();
        if let Some(cycle) = state.in_flight.take() {
            tracing::debug!(cycle = cycle.id, "Detaching in-flight load cycle");
        }
        state.last_settled = None;
        state.has_loaded = false;
        state.snapshot = SyncSnapshot::default();
    }

    async fn run(
        &self,
        session: Option<&Session>,
        trigger: &'static str,
    ) -> Result<LoadOutcome, SyncError> {
        let Some(session) = session else {
            tracing::debug!("No session, skipping {}", trigger);
            return Ok(LoadOutcome::Skipped);
        };

        let (id, result) = self.join_or_start(&session.token, trigger);
        let _waiter = Waiter { loader: self, id };
        let result = result.await;
        self.settle(id, result)
    }

    fn join_or_start(&self, token: &str, trigger: &'static str) -> (u64, CycleFuture) {
        let mut state = self.lock();

        if let Some(cycle) = state.in_flight.as_mut().filter(|c| c.token == token) {
            tracing::debug!(cycle = cycle.id, "Joining in-flight load cycle for {}", trigger);
            cycle.waiters += 1;
            return (cycle.id, cycle.result.clone());
        }

        state.next_cycle += 1;
        let id = state.next_cycle;
        tracing::debug!(cycle = id, "Starting load cycle for {}", trigger);

        let result = fetch_cycle(Arc::clone(&self.gateway), token.to_string())
            .boxed()
            .shared();

        // A superseded cycle never settled, so carry its starting status over.
        let prior_status = match &state.in_flight {
            Some(superseded) => superseded.prior_status,
            None => state.snapshot.status,
        };
        let refreshing = state.has_loaded;
        state.snapshot.refreshing = refreshing;
        state.snapshot.status = LoadStatus::Loading;

        state.in_flight = Some(Cycle {
            id,
            token: token.to_string(),
            result: result.clone(),
            waiters: 1,
            prior_status,
        });
        (id, result)
    }

    fn settle(
        &self,
        id: u64,
        result: Result<CycleData, SyncError>,
    ) -> Result<LoadOutcome, SyncError> {
        let mut state = self.lock();

        if state.in_flight.as_ref().is_some_and(|c| c.id == id) {
            state.in_flight = None;
            state.last_settled = Some(id);
            if result.is_ok() {
                state.has_loaded = true;
            }

            let snapshot = &mut state.snapshot;
            snapshot.refreshing = false;
            match &result {
                Ok(data) => {
                    tracing::info!(cycle = id, "Loaded {} feature flags", data.flags.len());
                    snapshot.flags = data.flags.clone();
                    snapshot.announcement = data.announcement.clone();
                    snapshot.error = None;
                    snapshot.status = LoadStatus::Loaded;
                }
                Err(e) => {
                    tracing::warn!(cycle = id, "Load cycle failed: {}", e);
                    snapshot.error = Some(e.message.clone());
                    snapshot.status = LoadStatus::Failed;
                }
            }
        } else if state.last_settled != Some(id) {
            tracing::debug!(cycle = id, "Discarding result of a detached load cycle");
            return Ok(LoadOutcome::Discarded);
        }

        result.map(|_| LoadOutcome::Loaded)
    }

    /// Called when a caller stops awaiting cycle `id`. The last one out
    /// drops an unsettled cycle so the loader does not report `Loading`
    /// for a cycle nobody drives.
    fn leave(&self, id: u64) {
        let mut state = self.lock();
        let Some(cycle) = state.in_flight.as_mut().filter(|c| c.id == id) else {
            return;
        };
        cycle.waiters -= 1;
        if cycle.waiters > 0 {
            return;
        }

        let prior_status = cycle.prior_status;
        state.in_flight = None;
        state.snapshot.status = prior_status;
        state.snapshot.refreshing = false;
        tracing::debug!(cycle = id, "Abandoned load cycle with no callers left");
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registered interest in one cycle, released when the caller finishes or
/// is dropped.
struct Waiter<'a> {
    loader: &'a SyncLoader,
    id: u64,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        self.loader.leave(self.id);
    }
}

/// Fetch both resources concurrently; either failure fails the cycle.
async fn fetch_cycle(
    gateway: Arc<dyn RemoteGateway>,
    token: String,
) -> Result<CycleData, SyncError> {
    let (flags, announcement) =
        tokio::try_join!(gateway.features(&token), gateway.announcement(&token))?;
    Ok(CycleData {
        flags,
        announcement,
    })
}
