//! Reminder lifecycle manager.
//!
//! Orchestrates create/update/delete of reminder definitions and the
//! fetch-recompute-render cycle behind the "upcoming" view. This is the
//! only component that touches the network; everything below it is pure
//! and recomputed on every read, which is why an edit needs no explicit
//! "regenerate occurrences" step.
//!
//! Concurrency policy is last-fetch-wins: every refresh takes a
//! monotonically increasing generation, and a refresh that finishes
//! after a newer one has already committed discards its own result
//! instead of overwriting newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::agenda::{build_agenda, merge_status};
use crate::cache::{AgendaCache, CacheError, CachedAgenda};
use crate::config;
use crate::models::{AgendaDay, IntakeLog, ReminderDefinition, ValidationError};
use crate::schedule::{generate_all, DateWindow};
use crate::store::{ReminderStore, StoreError};

/// Failure modes of the lifecycle manager, kept distinguishable so the
/// UI can tell "fix your form" from "retry later" from "edit rejected".
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Loading definitions or logs failed. The agenda is stale or
    /// unavailable, which is NOT the same state as "no reminders".
    #[error("Could not load agenda data: {0}")]
    TransientFetch(#[source] StoreError),

    /// The store refused a create/update/delete. Propagated verbatim,
    /// no automatic retry or merge.
    #[error("Store rejected the write: {0}")]
    ConflictOnWrite(#[source] StoreError),

    /// The store could not be reached for a write.
    #[error("Could not reach the store to write: {0}")]
    WriteUnavailable(#[source] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

fn write_error(e: StoreError) -> SchedulerError {
    if e.is_transient() {
        SchedulerError::WriteUnavailable(e)
    } else {
        SchedulerError::ConflictOnWrite(e)
    }
}

/// One committed fetch-recompute result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgendaSnapshot {
    pub days: Vec<AgendaDay>,
    pub window: DateWindow,
    pub fetched_at: DateTime<Utc>,
    /// Refresh counter used for last-fetch-wins resolution.
    pub generation: u64,
}

/// Create/update/delete plus the agenda refresh cycle, over any
/// `ReminderStore` implementation.
pub struct ReminderService<S: ReminderStore> {
    store: S,
    cache: Option<AgendaCache>,
    lookahead_days: u32,
    generation: AtomicU64,
    latest: Mutex<Option<AgendaSnapshot>>,
}

impl<S: ReminderStore> ReminderService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: None,
            lookahead_days: config::DEFAULT_LOOKAHEAD_DAYS,
            generation: AtomicU64::new(0),
            latest: Mutex::new(None),
        }
    }

    /// Persist last-good snapshots to an on-device cache.
    pub fn with_cache(mut self, cache: AgendaCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_lookahead_days(mut self, days: u32) -> Self {
        self.lookahead_days = days;
        self
    }

    /// Validate and persist a new definition; returns the assigned id.
    /// Invalid input fails with the FULL set of violated fields and
    /// never reaches the store.
    pub async fn create(&self, mut def: ReminderDefinition) -> Result<Uuid, SchedulerError> {
        def.normalize();
        def.validate()?;
        let id = self
            .store
            .create_reminder(&def)
            .await
            .map_err(write_error)?;
        tracing::info!(%id, medicine = %def.medicine_name, "Reminder created");
        Ok(id)
    }

    /// Validate and persist an edit. Future occurrences pick up the new
    /// rule on the next read; past intake logs are untouched. Logs the
    /// new rule no longer generates become history-only (accepted, not
    /// an error).
    pub async fn update(&self, id: Uuid, mut def: ReminderDefinition) -> Result<(), SchedulerError> {
        def.normalize();
        def.validate()?;
        def.id = Some(id);
        self.store
            .update_reminder(id, &def)
            .await
            .map_err(write_error)?;
        tracing::info!(%id, "Reminder updated");
        Ok(())
    }

    /// Mark a definition inactive. Occurrences stop generating after
    /// the deactivation date; recorded logs remain for history.
    pub async fn delete(&self, id: Uuid) -> Result<(), SchedulerError> {
        self.store.delete_reminder(id).await.map_err(write_error)?;
        tracing::info!(%id, "Reminder deactivated");
        Ok(())
    }

    /// Record that a dose was taken. Accepted even if the current
    /// definition no longer generates this slot, since it is still a
    /// historically valid event.
    pub async fn log_taken(
        &self,
        reminder_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<(), SchedulerError> {
        let log = IntakeLog::taken(reminder_id, date, time);
        self.store.log_taken(&log).await.map_err(write_error)?;
        Ok(())
    }

    /// Run one fetch-recompute cycle for the upcoming view.
    ///
    /// Fetches active definitions and logs inside the lookahead window,
    /// regenerates occurrences, merges status, and builds the grouped
    /// agenda. Commits under last-fetch-wins: if a newer refresh already
    /// finished, this result is discarded and the newer snapshot is
    /// returned instead.
    pub async fn refresh_agenda(
        &self,
        owner_id: Uuid,
        today: NaiveDate,
    ) -> Result<AgendaSnapshot, SchedulerError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let window = DateWindow::upcoming(today, self.lookahead_days);

        let defs = self
            .store
            .fetch_reminders(owner_id)
            .await
            .map_err(SchedulerError::TransientFetch)?;
        let logs = self
            .store
            .fetch_intake_logs(owner_id, window)
            .await
            .map_err(SchedulerError::TransientFetch)?;

        let occurrences = generate_all(&defs, &window);
        let items = merge_status(&occurrences, &defs, &logs);
        let days = build_agenda(items);
        tracing::debug!(
            reminders = defs.len(),
            logs = logs.len(),
            days = days.len(),
            generation,
            "Agenda recomputed"
        );

        let snapshot = AgendaSnapshot {
            days,
            window,
            fetched_at: Utc::now(),
            generation,
        };

        let committed = {
            let mut latest = self
                .latest
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match &*latest {
                Some(current) if current.generation > generation => {
                    tracing::debug!(
                        superseded = generation,
                        by = current.generation,
                        "Discarding stale refresh result"
                    );
                    current.clone()
                }
                _ => {
                    *latest = Some(snapshot.clone());
                    snapshot
                }
            }
        };

        if let Some(cache) = &self.cache {
            // Best effort: a cache write failure must not fail a
            // successful refresh.
            if let Err(err) = cache.put(owner_id, &committed) {
                tracing::warn!(%err, "Failed to cache agenda snapshot");
            }
        }

        Ok(committed)
    }

    /// Most recently committed snapshot from this process, if any.
    /// Stays available when a later refresh fails, as the "stale"
    /// state distinct from an empty agenda.
    pub fn last_known(&self) -> Option<AgendaSnapshot> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Last good snapshot persisted on device, surviving restarts.
    pub fn cached_agenda(&self, owner_id: Uuid) -> Result<Option<CachedAgenda>, SchedulerError> {
        match &self.cache {
            Some(cache) => Ok(cache.get(owner_id)?),
            None => Ok(None),
        }
    }
}
