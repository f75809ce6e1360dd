//! Schedule state and the reducer that applies form edits to it.
//!
//! Exactly one side is authored at a time. In easy mode the fields are
//! authored and the cron expression is derived from them; in custom mode the
//! cron expression is authored and the fields are derived for display only.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cron::{CronPreview, derive_cron_from_fields, derive_fields_from_cron};
use super::describe::describe;
use super::fields::{EasyInterval, ScheduleField, ScheduleFields, ScheduleInterval};
use super::validate::{FieldErrors, day_of_month_hint, validate};

/// Timezone forced on environments that only schedule in UTC.
pub const UTC: &str = "UTC";

/// Cron expression of a freshly opened form: weekdays at midnight.
pub const DEFAULT_CRON: &str = "0 0 * * MON-FRI";

/// Which side of the schedule the user is editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleState {
    /// Fields authored; `cron` is the last expression derived from them.
    Easy {
        interval: EasyInterval,
        fields: ScheduleFields,
        cron: String,
    },
    /// Cron authored; `preview` is read positionally from it.
    Custom { cron: String, preview: CronPreview },
}

/// A single edit coming from the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleEdit {
    Interval(ScheduleInterval),
    ClockTime(String),
    MinuteOfHour(String),
    DayOfMonth(String),
    DayOfWeek(String),
    Cron(String),
    Timezone(String),
    Preset(Preset),
}

/// A one-click custom schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub label: &'static str,
    pub cron: &'static str,
}

pub const PRESETS: [Preset; 4] = [
    Preset {
        label: "Every day",
        cron: "0 7 * * *",
    },
    Preset {
        label: "Every 6 hours",
        cron: "* */6 * * *",
    },
    Preset {
        label: "Every weekday",
        cron: "0 6 * * MON-FRI",
    },
    Preset {
        label: "Every month",
        cron: "0 5 1 * *",
    },
];

/// Schedule of a job definition being created or edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    pub state: ScheduleState,
    pub timezone: String,
    /// UTC-only flag of the environment last applied, if any.
    #[serde(default)]
    utc_only: Option<bool>,
}

impl ScheduleSpec {
    /// Defaults for a new form: weekdays at 00:00 in the local timezone.
    pub fn new(local_timezone: impl Into<String>) -> Self {
        Self {
            state: ScheduleState::Easy {
                interval: EasyInterval::Weekday,
                fields: ScheduleFields::default(),
                cron: DEFAULT_CRON.to_string(),
            },
            timezone: local_timezone.into(),
            utc_only: None,
        }
    }

    /// Open an existing definition's schedule in custom mode.
    pub fn from_cron(cron: impl Into<String>, timezone: impl Into<String>) -> Self {
        let cron = cron.into();
        Self {
            state: ScheduleState::Custom {
                preview: derive_fields_from_cron(&cron),
                cron,
            },
            timezone: timezone.into(),
            utc_only: None,
        }
    }

    pub fn interval(&self) -> ScheduleInterval {
        match &self.state {
            ScheduleState::Easy { interval, .. } => (*interval).into(),
            ScheduleState::Custom { .. } => ScheduleInterval::Custom,
        }
    }

    pub fn cron_expression(&self) -> &str {
        match &self.state {
            ScheduleState::Easy { cron, .. } | ScheduleState::Custom { cron, .. } => cron,
        }
    }

    /// Field values to display: authored in easy mode, derived in custom mode.
    pub fn fields(&self) -> ScheduleFields {
        match &self.state {
            ScheduleState::Easy { fields, .. } => fields.clone(),
            ScheduleState::Custom { preview, .. } => preview.to_fields(),
        }
    }

    pub fn errors(&self) -> FieldErrors {
        match &self.state {
            ScheduleState::Easy { interval, fields, cron } => validate((*interval).into(), fields, cron),
            ScheduleState::Custom { cron, .. } => {
                validate(ScheduleInterval::Custom, &ScheduleFields::default(), cron)
            }
        }
    }

    /// Helper text shown under a field when it has no error.
    pub fn hint(&self, field: ScheduleField) -> Option<&'static str> {
        match (&self.state, field) {
            (ScheduleState::Easy { interval, fields, .. }, ScheduleField::DayOfMonth) => {
                day_of_month_hint((*interval).into(), fields)
            }
            _ => None,
        }
    }

    /// Plain-language description of the current cron; empty when invalid.
    pub fn description(&self) -> String {
        describe(self.cron_expression())
    }

    pub fn apply(&mut self, edit: ScheduleEdit) {
        *self = reduce(self, edit);
    }

    /// Apply the timezone policy of a newly selected environment. Only acts when
    /// the UTC-only flag differs from the previously applied environment.
    pub fn apply_environment(&mut self, utc_only: bool, local_timezone: &str) {
        if self.utc_only == Some(utc_only) {
            return;
        }
        self.utc_only = Some(utc_only);
        self.timezone = if utc_only {
            UTC.to_string()
        } else {
            local_timezone.to_string()
        };
    }

    pub fn is_utc_only(&self) -> bool {
        self.utc_only == Some(true)
    }
}

/// Apply one edit, performing the single derivation the resulting state implies.
pub fn reduce(spec: &ScheduleSpec, edit: ScheduleEdit) -> ScheduleSpec {
    let mut next = spec.clone();
    next.state = match (&spec.state, edit) {
        (_, ScheduleEdit::Timezone(timezone)) => {
            if !spec.is_utc_only() {
                next.timezone = timezone;
            }
            spec.state.clone()
        }
        (_, ScheduleEdit::Preset(preset)) => custom(preset.cron.to_string()),
        (state, ScheduleEdit::Interval(interval)) => switch_interval(state, interval),
        (ScheduleState::Custom { .. }, ScheduleEdit::Cron(cron)) => custom(cron),
        (ScheduleState::Easy { interval, fields, cron }, edit) => {
            let mut fields = fields.clone();
            match edit {
                ScheduleEdit::ClockTime(v) => fields.clock_time = v,
                ScheduleEdit::MinuteOfHour(v) => fields.minute_of_hour = v,
                ScheduleEdit::DayOfMonth(v) => fields.day_of_month = v,
                ScheduleEdit::DayOfWeek(v) => fields.day_of_week = v,
                other => debug!(edit = ?other, "Ignoring cron edit in easy mode"),
            }
            easy(*interval, fields, cron)
        }
        (state @ ScheduleState::Custom { .. }, edit) => {
            debug!(edit = ?edit, "Ignoring field edit in custom mode");
            state.clone()
        }
    };
    next
}

fn custom(cron: String) -> ScheduleState {
    ScheduleState::Custom {
        preview: derive_fields_from_cron(&cron),
        cron,
    }
}

/// Derive from `fields`, keeping `previous` when they do not parse.
fn easy(interval: EasyInterval, fields: ScheduleFields, previous: &str) -> ScheduleState {
    let cron = derive_cron_from_fields(interval, &fields).unwrap_or_else(|| previous.to_string());
    ScheduleState::Easy {
        interval,
        fields,
        cron,
    }
}

fn switch_interval(state: &ScheduleState, interval: ScheduleInterval) -> ScheduleState {
    match (state, interval.easy()) {
        // Custom text starts from whatever the easy fields produced.
        (ScheduleState::Easy { cron, .. }, None) => custom(cron.clone()),
        (ScheduleState::Custom { .. }, None) => state.clone(),
        (ScheduleState::Easy { fields, cron, .. }, Some(easy_interval)) => {
            easy(easy_interval, fields.clone(), cron)
        }
        (ScheduleState::Custom { cron, preview }, Some(easy_interval)) => {
            easy(easy_interval, preview.to_fields(), cron)
        }
    }
}
