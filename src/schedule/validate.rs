//! Per-field validation of schedule inputs.

use std::collections::BTreeMap;

use serde::Serialize;

use super::cron::is_valid_cron;
use super::fields::{ScheduleField, ScheduleFields, ScheduleInterval};

pub const CLOCK_ERROR: &str = "Time must be in hh:mm format";
pub const MINUTE_ERROR: &str = "Minute must be between 0 and 59";
pub const DAY_OF_MONTH_ERROR: &str = "Day of the month must be between 1 and 31";
pub const DAY_OF_WEEK_ERROR: &str = "Day of the week must be between 0 (Sunday) and 6 (Saturday)";
pub const CRON_ERROR: &str = "You must provide a valid cron expression";
pub const SHORT_MONTH_HINT: &str = "Months with fewer days than this will not run";

/// Error messages keyed by field. An absent field, or an empty message, means no error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    messages: BTreeMap<ScheduleField, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// The message for a field, `""` if it has none.
    pub fn get(&self, field: ScheduleField) -> &str {
        self.messages.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: ScheduleField, message: impl Into<String>) {
        let message = message.into();
        if message.is_empty() {
            self.messages.remove(&field);
        } else {
            self.messages.insert(field, message);
        }
    }

    pub fn clear(&mut self, field: ScheduleField) {
        self.messages.remove(&field);
    }

    /// Whether submission must be blocked.
    pub fn has_errors(&self) -> bool {
        self.messages.values().any(|m| !m.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScheduleField, &str)> {
        self.messages.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

/// Validate the fields shown for `interval`. Hidden fields never carry an error.
pub fn validate(interval: ScheduleInterval, fields: &ScheduleFields, cron: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in ScheduleField::ALL {
        if !field.is_relevant(interval) {
            continue;
        }
        let ok = match field {
            ScheduleField::ClockTime => fields.clock().is_some(),
            ScheduleField::MinuteOfHour => fields.minute_of_hour().is_some(),
            ScheduleField::DayOfMonth => fields.day_of_month().is_some(),
            ScheduleField::DayOfWeek => fields.day_of_week().is_some(),
            ScheduleField::CronExpression => is_valid_cron(cron),
        };
        if !ok {
            errors.set(field, error_message(field));
        }
    }
    errors
}

pub fn error_message(field: ScheduleField) -> &'static str {
    match field {
        ScheduleField::ClockTime => CLOCK_ERROR,
        ScheduleField::MinuteOfHour => MINUTE_ERROR,
        ScheduleField::DayOfMonth => DAY_OF_MONTH_ERROR,
        ScheduleField::DayOfWeek => DAY_OF_WEEK_ERROR,
        ScheduleField::CronExpression => CRON_ERROR,
    }
}

/// Helper text for a monthly schedule on day 29-31. Not an error: what happens
/// in shorter months is up to the service.
pub fn day_of_month_hint(interval: ScheduleInterval, fields: &ScheduleFields) -> Option<&'static str> {
    if interval != ScheduleInterval::Month {
        return None;
    }
    match fields.day_of_month() {
        Some(29..=31) => Some(SHORT_MONTH_HINT),
        _ => None,
    }
}
