use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::enums::{Frequency, ReminderStatus};

/// A user-authored medication reminder recurrence rule.
///
/// Occurrences are never stored; they are derived from this definition
/// on every read, so edits are reflected without any regeneration step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderDefinition {
    /// Assigned by the store on creation; `None` before that.
    pub id: Option<Uuid>,
    pub owner_id: Uuid,
    pub medicine_name: String,
    pub dosage: String,
    pub frequency: Frequency,
    /// Weekday restriction. Required non-empty for `Weekly`;
    /// cleared on normalization for `Daily` (every day is implied).
    #[serde(default)]
    pub specific_days: Vec<Weekday>,
    /// Wall-clock dose times, kept deduplicated and ascending.
    pub times_of_day: Vec<NaiveTime>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(default = "default_status")]
    pub status: ReminderStatus,
    /// Local date on which the reminder was deleted. Occurrences still
    /// generate on this date, never after it.
    pub deactivated_on: Option<NaiveDate>,
}

fn default_status() -> ReminderStatus {
    ReminderStatus::Active
}

impl ReminderDefinition {
    /// New active definition with no id (assigned by the store).
    pub fn new(
        owner_id: Uuid,
        medicine_name: impl Into<String>,
        dosage: impl Into<String>,
        frequency: Frequency,
        times_of_day: Vec<NaiveTime>,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            owner_id,
            medicine_name: medicine_name.into(),
            dosage: dosage.into(),
            frequency,
            specific_days: Vec::new(),
            times_of_day,
            start_date,
            end_date: None,
            notes: None,
            status: ReminderStatus::Active,
            deactivated_on: None,
        }
    }

    /// Bring the definition into canonical form: times ascending and
    /// deduplicated, weekdays deduplicated in Mon..Sun order, and the
    /// weekday restriction cleared when the frequency is `Daily`.
    pub fn normalize(&mut self) {
        self.times_of_day.sort();
        self.times_of_day.dedup();
        match self.frequency {
            Frequency::Daily => self.specific_days.clear(),
            Frequency::Weekly => {
                self.specific_days
                    .sort_by_key(|d| d.num_days_from_monday());
                self.specific_days.dedup();
            }
        }
    }

    /// Check every invariant, reporting ALL violated fields at once so a
    /// form can mark each offending input, not just the first.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Vec::new();

        if self.medicine_name.trim().is_empty() {
            violations.push(FieldViolation::MedicineNameEmpty);
        }
        if self.dosage.trim().is_empty() {
            violations.push(FieldViolation::DosageEmpty);
        }
        if self.times_of_day.is_empty() {
            violations.push(FieldViolation::TimesOfDayEmpty);
        }
        if self.frequency == Frequency::Weekly && self.specific_days.is_empty() {
            violations.push(FieldViolation::SpecificDaysEmpty);
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                violations.push(FieldViolation::EndDateBeforeStart);
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ReminderStatus::Active
    }

    /// Last date on which occurrences may generate: the earlier of the
    /// authored end date and the deactivation date, if either is set.
    pub fn effective_end(&self) -> Option<NaiveDate> {
        match (self.end_date, self.deactivated_on) {
            (Some(end), Some(off)) => Some(end.min(off)),
            (Some(end), None) => Some(end),
            (None, Some(off)) => Some(off),
            (None, None) => None,
        }
    }

    /// Does the recurrence rule fire on this calendar date?
    /// Date-range clipping is the generator's job, not this predicate's.
    pub fn scheduled_on(&self, date: NaiveDate) -> bool {
        match self.frequency {
            Frequency::Daily => true,
            Frequency::Weekly => self.specific_days.contains(&date.weekday()),
        }
    }
}

/// A single invariant violation, tied to the field a form should flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldViolation {
    MedicineNameEmpty,
    DosageEmpty,
    TimesOfDayEmpty,
    SpecificDaysEmpty,
    EndDateBeforeStart,
}

impl FieldViolation {
    /// Field name as the store and the forms know it.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MedicineNameEmpty => "medicine_name",
            Self::DosageEmpty => "dosage",
            Self::TimesOfDayEmpty => "times_of_day",
            Self::SpecificDaysEmpty => "specific_days",
            Self::EndDateBeforeStart => "end_date",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::MedicineNameEmpty => "medicine name must not be empty",
            Self::DosageEmpty => "dosage must not be empty",
            Self::TimesOfDayEmpty => "at least one time of day is required",
            Self::SpecificDaysEmpty => "weekly reminders need at least one weekday",
            Self::EndDateBeforeStart => "end date must not precede start date",
        }
    }
}

/// A definition violating §3 invariants; carries every violated field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid reminder definition: {}", list_fields(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn violates(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field() == field)
    }
}

fn list_fields(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field(), v.message()))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday::{Mon, Wed};

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn base_def() -> ReminderDefinition {
        ReminderDefinition::new(
            Uuid::new_v4(),
            "Metformin",
            "500mg",
            Frequency::Daily,
            vec![time(8, 0), time(20, 0)],
            date(2024, 1, 10),
        )
    }

    #[test]
    fn valid_definition_passes() {
        assert!(base_def().validate().is_ok());
    }

    #[test]
    fn validation_reports_all_violations_at_once() {
        let mut def = base_def();
        def.frequency = Frequency::Weekly;
        def.specific_days.clear();
        def.dosage = "  ".to_string();

        let err = def.validate().unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(err.violates("specific_days"));
        assert!(err.violates("dosage"));
    }

    #[test]
    fn end_before_start_is_a_violation() {
        let mut def = base_def();
        def.end_date = Some(date(2024, 1, 9));
        let err = def.validate().unwrap_err();
        assert!(err.violates("end_date"));
    }

    #[test]
    fn end_equal_to_start_is_allowed() {
        let mut def = base_def();
        def.end_date = Some(def.start_date);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn empty_times_of_day_is_a_violation() {
        let mut def = base_def();
        def.times_of_day.clear();
        let err = def.validate().unwrap_err();
        assert!(err.violates("times_of_day"));
    }

    #[test]
    fn normalize_sorts_and_dedups_times() {
        let mut def = base_def();
        def.times_of_day = vec![time(20, 0), time(8, 0), time(20, 0)];
        def.normalize();
        assert_eq!(def.times_of_day, vec![time(8, 0), time(20, 0)]);
    }

    #[test]
    fn normalize_clears_days_for_daily() {
        let mut def = base_def();
        def.specific_days = vec![Mon, Wed];
        def.normalize();
        assert!(def.specific_days.is_empty());
    }

    #[test]
    fn normalize_orders_weekdays_mon_first() {
        let mut def = base_def();
        def.frequency = Frequency::Weekly;
        def.specific_days = vec![Wed, Mon, Wed];
        def.normalize();
        assert_eq!(def.specific_days, vec![Mon, Wed]);
    }

    #[test]
    fn effective_end_takes_earlier_of_end_and_deactivation() {
        let mut def = base_def();
        def.end_date = Some(date(2024, 2, 1));
        def.deactivated_on = Some(date(2024, 1, 20));
        assert_eq!(def.effective_end(), Some(date(2024, 1, 20)));

        def.deactivated_on = None;
        assert_eq!(def.effective_end(), Some(date(2024, 2, 1)));

        def.end_date = None;
        assert_eq!(def.effective_end(), None);
    }

    #[test]
    fn weekly_fires_only_on_listed_days() {
        let mut def = base_def();
        def.frequency = Frequency::Weekly;
        def.specific_days = vec![Mon, Wed];
        assert!(def.scheduled_on(date(2024, 1, 1))); // Monday
        assert!(!def.scheduled_on(date(2024, 1, 2))); // Tuesday
        assert!(def.scheduled_on(date(2024, 1, 3))); // Wednesday
    }

    #[test]
    fn definition_round_trips_through_json() {
        let mut def = base_def();
        def.frequency = Frequency::Weekly;
        def.specific_days = vec![Mon, Wed];
        let json = serde_json::to_string(&def).unwrap();
        let back: ReminderDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, def);
    }
}
