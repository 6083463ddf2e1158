//! Occurrence generation, the pure heart of the reminder engine.
//!
//! `generate` turns a recurrence definition and an inclusive date window
//! into the concrete dated/timed occurrences due in that window. It is
//! deterministic and side-effect free: two calls with identical inputs
//! yield identical, identically ordered output, which is what lets the
//! agenda be recomputed on every read instead of stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Frequency, Occurrence, ReminderDefinition};

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// The "upcoming" view window: `lookahead_days` days starting at
    /// `today`, inclusive. A lookahead of 0 still covers today.
    pub fn upcoming(today: NaiveDate, lookahead_days: u32) -> Self {
        let span = i64::from(lookahead_days.max(1)) - 1;
        Self {
            from: today,
            to: today + chrono::Duration::days(span),
        }
    }

    /// True when `from > to`. Empty windows generate nothing.
    pub fn is_empty(&self) -> bool {
        self.from > self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Clip to the definition's schedulable range:
    /// `[max(from, start), min(to, end_date, deactivated_on)]`.
    fn clipped_to(&self, def: &ReminderDefinition) -> DateWindow {
        let from = self.from.max(def.start_date);
        let to = match def.effective_end() {
            Some(end) => self.to.min(end),
            None => self.to,
        };
        DateWindow { from, to }
    }

    fn iter_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let to = self.to;
        self.from.iter_days().take_while(move |d| *d <= to)
    }
}

/// A persisted definition that violates a write-time invariant reached
/// the generator. Should be unreachable; the generator fails closed
/// (no occurrences) instead of guessing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataIntegrityError {
    #[error("Weekly reminder {id} has no scheduled weekdays")]
    WeeklyWithoutDays { id: Uuid },

    #[error("Reminder {id} has no times of day")]
    NoTimesOfDay { id: Uuid },

    #[error("Reminder {id} has end date {end} before start date {start}")]
    InvertedDateRange {
        id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    },
}

fn integrity_check(def: &ReminderDefinition) -> Result<(), DataIntegrityError> {
    let id = def.id.unwrap_or_else(Uuid::nil);
    if def.times_of_day.is_empty() {
        return Err(DataIntegrityError::NoTimesOfDay { id });
    }
    if def.frequency == Frequency::Weekly && def.specific_days.is_empty() {
        return Err(DataIntegrityError::WeeklyWithoutDays { id });
    }
    if let Some(end) = def.end_date {
        if end < def.start_date {
            return Err(DataIntegrityError::InvertedDateRange {
                id,
                start: def.start_date,
                end,
            });
        }
    }
    Ok(())
}

/// Generate every occurrence of `def` inside `window`, date-ascending
/// then time-ascending. Pure and idempotent.
pub fn generate(
    def: &ReminderDefinition,
    window: &DateWindow,
) -> Result<Vec<Occurrence>, DataIntegrityError> {
    integrity_check(def)?;

    let clipped = window.clipped_to(def);
    if clipped.is_empty() {
        return Ok(Vec::new());
    }

    let reminder_id = def.id.unwrap_or_else(Uuid::nil);

    // Emission order must not depend on stored order.
    let mut times = def.times_of_day.clone();
    times.sort();
    times.dedup();

    let mut occurrences = Vec::new();
    for date in clipped.iter_dates() {
        if !def.scheduled_on(date) {
            continue;
        }
        for &time in &times {
            occurrences.push(Occurrence {
                reminder_id,
                date,
                time,
            });
        }
    }
    Ok(occurrences)
}

/// Generate over a whole set of definitions. Definitions that fail the
/// integrity check contribute nothing and are logged, so one corrupt
/// row cannot take down the agenda.
pub fn generate_all(defs: &[ReminderDefinition], window: &DateWindow) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();
    for def in defs {
        match generate(def, window) {
            Ok(mut occ) => occurrences.append(&mut occ),
            Err(err) => {
                tracing::warn!(%err, "Skipping reminder with corrupt definition");
            }
        }
    }
    occurrences
}
