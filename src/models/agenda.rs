//! Derived display types: recomputed on every read, never persisted.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::SlotStatus;

/// One concrete (date, time) instance a reminder is due.
/// Identity is the `(reminder_id, date, time)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub reminder_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Occurrence {
    pub fn slot_key(&self) -> (Uuid, NaiveDate, NaiveTime) {
        (self.reminder_id, self.date, self.time)
    }
}

/// An occurrence merged with its intake status, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgendaItem {
    pub reminder_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub medicine_name: String,
    pub dosage: String,
    pub status: SlotStatus,
    /// When the matching intake log was recorded, for `Taken` slots.
    pub logged_at: Option<DateTime<Utc>>,
}

/// One calendar day of the agenda, items sorted by time then name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgendaDay {
    pub date: NaiveDate,
    pub items: Vec<AgendaItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occurrence_slot_key_matches_fields() {
        let occ = Occurrence {
            reminder_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        };
        assert_eq!(occ.slot_key(), (occ.reminder_id, occ.date, occ.time));
    }
}
