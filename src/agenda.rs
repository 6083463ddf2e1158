//! Status merge + agenda grouping.
//!
//! `merge_status` attaches taken/pending state to generated occurrences;
//! `build_agenda` groups the result by calendar date for rendering. The
//! builder re-sorts on its own and never trusts upstream order, because
//! it is the last line of defense for rendering stability.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::models::{
    AgendaDay, AgendaItem, IntakeLog, Occurrence, ReminderDefinition, SlotStatus,
};

/// Attach intake status to each occurrence.
///
/// Lookup is O(occurrences + logs): logs are indexed by slot key once,
/// never re-scanned. A slot with a matching log is `Taken` (the most
/// recent `logged_at` wins if duplicates exist); otherwise `Pending`.
/// Occurrences whose definition is missing from `defs` are dropped;
/// there is nothing to render without a medicine name.
pub fn merge_status(
    occurrences: &[Occurrence],
    defs: &[ReminderDefinition],
    logs: &[IntakeLog],
) -> Vec<AgendaItem> {
    let by_id: HashMap<Uuid, &ReminderDefinition> = defs
        .iter()
        .filter_map(|def| def.id.map(|id| (id, def)))
        .collect();

    let mut taken_at: HashMap<(Uuid, NaiveDate, NaiveTime), DateTime<Utc>> = HashMap::new();
    for log in logs {
        let entry = taken_at.entry(log.slot_key()).or_insert(log.logged_at);
        if log.logged_at > *entry {
            *entry = log.logged_at;
        }
    }

    let mut items = Vec::with_capacity(occurrences.len());
    for occ in occurrences {
        let Some(def) = by_id.get(&occ.reminder_id) else {
            tracing::warn!(
                reminder_id = %occ.reminder_id,
                "Occurrence references an unknown reminder; dropping"
            );
            continue;
        };
        let logged_at = taken_at.get(&occ.slot_key()).copied();
        items.push(AgendaItem {
            reminder_id: occ.reminder_id,
            date: occ.date,
            time: occ.time,
            medicine_name: def.medicine_name.clone(),
            dosage: def.dosage.clone(),
            status: if logged_at.is_some() {
                SlotStatus::Taken
            } else {
                SlotStatus::Pending
            },
            logged_at,
        });
    }
    items
}

/// Group agenda items by calendar date.
///
/// Days come out ascending; within a day, items sort by time and then
/// by medicine name so two reminders sharing a slot render in a stable
/// order regardless of input order.
pub fn build_agenda(items: Vec<AgendaItem>) -> Vec<AgendaDay> {
    let mut by_date: BTreeMap<NaiveDate, Vec<AgendaItem>> = BTreeMap::new();
    for item in items {
        by_date.entry(item.date).or_default().push(item);
    }

    by_date
        .into_iter()
        .map(|(date, mut items)| {
            items.sort_by(|a, b| {
                a.time
                    .cmp(&b.time)
                    .then_with(|| a.medicine_name.cmp(&b.medicine_name))
            });
            AgendaDay { date, items }
        })
        .collect()
}
