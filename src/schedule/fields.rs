//! Easy-scheduling interval kinds and the raw field inputs behind them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Interval selected in the "Every" picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleInterval {
    Minute,
    Hour,
    Day,
    Week,
    Weekday,
    Month,
    /// The user types the cron expression directly.
    Custom,
}

/// Every interval except `Custom`: the kinds whose cron expression is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EasyInterval {
    Minute,
    Hour,
    Day,
    Week,
    Weekday,
    Month,
}

impl ScheduleInterval {
    pub const ALL: [ScheduleInterval; 7] = [
        ScheduleInterval::Minute,
        ScheduleInterval::Hour,
        ScheduleInterval::Day,
        ScheduleInterval::Week,
        ScheduleInterval::Weekday,
        ScheduleInterval::Month,
        ScheduleInterval::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleInterval::Minute => "minute",
            ScheduleInterval::Hour => "hour",
            ScheduleInterval::Day => "day",
            ScheduleInterval::Week => "week",
            ScheduleInterval::Weekday => "weekday",
            ScheduleInterval::Month => "month",
            ScheduleInterval::Custom => "custom",
        }
    }

    /// `None` for `Custom`.
    pub fn easy(self) -> Option<EasyInterval> {
        match self {
            ScheduleInterval::Minute => Some(EasyInterval::Minute),
            ScheduleInterval::Hour => Some(EasyInterval::Hour),
            ScheduleInterval::Day => Some(EasyInterval::Day),
            ScheduleInterval::Week => Some(EasyInterval::Week),
            ScheduleInterval::Weekday => Some(EasyInterval::Weekday),
            ScheduleInterval::Month => Some(EasyInterval::Month),
            ScheduleInterval::Custom => None,
        }
    }
}

impl From<EasyInterval> for ScheduleInterval {
    fn from(interval: EasyInterval) -> Self {
        match interval {
            EasyInterval::Minute => ScheduleInterval::Minute,
            EasyInterval::Hour => ScheduleInterval::Hour,
            EasyInterval::Day => ScheduleInterval::Day,
            EasyInterval::Week => ScheduleInterval::Week,
            EasyInterval::Weekday => ScheduleInterval::Weekday,
            EasyInterval::Month => ScheduleInterval::Month,
        }
    }
}

impl std::fmt::Display for ScheduleInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleInterval {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScheduleInterval::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| format!("unknown schedule interval: {s}"))
    }
}

/// A schedule input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleField {
    ClockTime,
    MinuteOfHour,
    DayOfMonth,
    DayOfWeek,
    CronExpression,
}

impl ScheduleField {
    pub const ALL: [ScheduleField; 5] = [
        ScheduleField::ClockTime,
        ScheduleField::MinuteOfHour,
        ScheduleField::DayOfMonth,
        ScheduleField::DayOfWeek,
        ScheduleField::CronExpression,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleField::ClockTime => "clock_time",
            ScheduleField::MinuteOfHour => "minute_of_hour",
            ScheduleField::DayOfMonth => "day_of_month",
            ScheduleField::DayOfWeek => "day_of_week",
            ScheduleField::CronExpression => "cron_expression",
        }
    }

    /// The intervals whose form shows this field.
    pub fn intervals(&self) -> &'static [ScheduleInterval] {
        match self {
            ScheduleField::ClockTime => &[
                ScheduleInterval::Day,
                ScheduleInterval::Week,
                ScheduleInterval::Weekday,
                ScheduleInterval::Month,
            ],
            ScheduleField::MinuteOfHour => &[ScheduleInterval::Hour],
            ScheduleField::DayOfMonth => &[ScheduleInterval::Month],
            ScheduleField::DayOfWeek => &[ScheduleInterval::Week],
            ScheduleField::CronExpression => &[ScheduleInterval::Custom],
        }
    }

    pub fn is_relevant(&self, interval: ScheduleInterval) -> bool {
        self.intervals().contains(&interval)
    }
}

impl std::fmt::Display for ScheduleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The easy-scheduling inputs as typed, so invalid text can be held and reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleFields {
    /// 24-hour `h:mm` or `hh:mm`.
    pub clock_time: String,
    /// 0-59.
    pub minute_of_hour: String,
    /// 1-31.
    pub day_of_month: String,
    /// `0` (Sunday) to `6` (Saturday).
    pub day_of_week: String,
}

impl Default for ScheduleFields {
    fn default() -> Self {
        Self {
            clock_time: "00:00".to_string(),
            minute_of_hour: "0".to_string(),
            day_of_month: "1".to_string(),
            day_of_week: "1".to_string(),
        }
    }
}

impl ScheduleFields {
    pub fn clock(&self) -> Option<ClockTime> {
        ClockTime::parse(&self.clock_time)
    }

    pub fn minute_of_hour(&self) -> Option<u32> {
        parse_in_range(&self.minute_of_hour, 0, 59)
    }

    pub fn day_of_month(&self) -> Option<u32> {
        parse_in_range(&self.day_of_month, 1, 31)
    }

    /// Exactly one character between `'0'` and `'6'`.
    pub fn day_of_week(&self) -> Option<u32> {
        let mut chars = self.day_of_week.chars();
        match (chars.next(), chars.next()) {
            (Some(c @ '0'..='6'), None) => c.to_digit(10),
            _ => None,
        }
    }
}

fn parse_in_range(raw: &str, min: i64, max: i64) -> Option<u32> {
    let value: i64 = raw.trim().parse().ok()?;
    if (min..=max).contains(&value) {
        u32::try_from(value).ok()
    } else {
        None
    }
}

/// A wall-clock time parsed from `h:mm` / `hh:mm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
}

impl ClockTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour <= 23 && minute <= 59).then_some(Self { hour, minute })
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let (h, m) = raw.split_once(':')?;
        let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !(1..=2).contains(&h.len()) || m.len() != 2 || !digits(h) || !digits(m) {
            return None;
        }
        Self::new(h.parse().ok()?, m.parse().ok()?)
    }

    /// Format for display; values outside the clock range are printed as-is.
    pub fn format(hour: u32, minute: u32) -> String {
        format!("{hour:02}:{minute:02}")
    }
}

impl std::fmt::Display for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}
