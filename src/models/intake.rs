use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::IntakeStatus;

/// A recorded "taken" event for one scheduled slot.
///
/// Pending slots have no row at all; the absence of a log IS the
/// pending state. A log stays valid history even if a later edit means
/// the definition would no longer generate its slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeLog {
    pub reminder_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub status: IntakeStatus,
    pub logged_at: DateTime<Utc>,
}

impl IntakeLog {
    /// A "taken" event stamped now.
    pub fn taken(reminder_id: Uuid, scheduled_date: NaiveDate, scheduled_time: NaiveTime) -> Self {
        Self {
            reminder_id,
            scheduled_date,
            scheduled_time,
            status: IntakeStatus::Taken,
            logged_at: Utc::now(),
        }
    }

    /// Identity of the slot this log belongs to.
    pub fn slot_key(&self) -> (Uuid, NaiveDate, NaiveTime) {
        (self.reminder_id, self.scheduled_date, self.scheduled_time)
    }
}
