//! Conversion between easy-scheduling fields and five-field cron expressions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::fields::{ClockTime, EasyInterval, ScheduleFields};

/// Cron terms written for the weekday interval.
pub const WEEKDAYS: &str = "MON-FRI";

const DAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Build the cron expression for an easy interval.
///
/// Returns `None` when a field the interval needs does not parse; callers keep
/// their previous expression in that case.
pub fn derive_cron_from_fields(interval: EasyInterval, fields: &ScheduleFields) -> Option<String> {
    let cron = match interval {
        EasyInterval::Minute => "* * * * *".to_string(),
        EasyInterval::Hour => format!("{} * * * *", fields.minute_of_hour()?),
        EasyInterval::Day => {
            let ClockTime { hour, minute } = fields.clock()?;
            format!("{minute} {hour} * * *")
        }
        EasyInterval::Week => {
            let ClockTime { hour, minute } = fields.clock()?;
            format!("{minute} {hour} * * {}", fields.day_of_week()?)
        }
        EasyInterval::Weekday => {
            let ClockTime { hour, minute } = fields.clock()?;
            format!("{minute} {hour} * * {WEEKDAYS}")
        }
        EasyInterval::Month => {
            let ClockTime { hour, minute } = fields.clock()?;
            format!("{minute} {hour} {} * *", fields.day_of_month()?)
        }
    };
    Some(cron)
}

/// Positional reading of a cron expression, used to preview it as easy fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronPreview {
    pub minute: u32,
    pub hour: u32,
    pub day_of_month: u32,
    pub day_of_week: u32,
}

impl Default for CronPreview {
    fn default() -> Self {
        Self {
            minute: 0,
            hour: 0,
            day_of_month: 1,
            day_of_week: 1,
        }
    }
}

impl CronPreview {
    /// Field inputs showing this preview. `minute` feeds both the clock and the
    /// minute-past-the-hour input.
    pub fn to_fields(&self) -> ScheduleFields {
        ScheduleFields {
            clock_time: ClockTime::format(self.hour, self.minute),
            minute_of_hour: self.minute.to_string(),
            day_of_month: self.day_of_month.to_string(),
            day_of_week: self.day_of_week.to_string(),
        }
    }
}

/// Read minute, hour, day of month and day of week from their positions.
///
/// Each term becomes the integer formed by its leading digits (`"12-34"` is
/// 12); a term with no leading digits takes the default. Anything other than
/// five terms yields all defaults. Month is ignored.
pub fn derive_fields_from_cron(cron: &str) -> CronPreview {
    let defaults = CronPreview::default();
    let terms: Vec<&str> = cron.split_whitespace().collect();
    let [minute, hour, day_of_month, _month, day_of_week] = terms[..] else {
        return defaults;
    };
    CronPreview {
        minute: leading_int(minute).unwrap_or(defaults.minute),
        hour: leading_int(hour).unwrap_or(defaults.hour),
        day_of_month: leading_int(day_of_month).unwrap_or(defaults.day_of_month),
        day_of_week: leading_int(day_of_week).unwrap_or(defaults.day_of_week),
    }
}

fn leading_int(term: &str) -> Option<u32> {
    let end = term
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(term.len());
    term[..end].parse().ok()
}

/// A validated five-field cron expression.
#[derive(Debug, Clone)]
pub struct CronExpression {
    terms: [String; 5],
    schedule: cron::Schedule,
}

impl CronExpression {
    /// Parse standard `minute hour day-of-month month day-of-week` syntax.
    pub fn parse(expr: &str) -> Result<Self, String> {
        let terms: Vec<&str> = expr.split_whitespace().collect();
        let [minute, hour, dom, month, dow] = terms[..] else {
            return Err(format!("expected 5 fields, found {}", terms.len()));
        };

        // The cron crate wants a leading seconds field and counts weekdays from
        // 1 = Sunday, so weekday numbers are rewritten as names first.
        let normalized = format!(
            "0 {minute} {hour} {dom} {month} {}",
            normalize_day_of_week(dow)
        );
        let schedule = cron::Schedule::from_str(&normalized).map_err(|e| format!("invalid cron: {e}"))?;

        Ok(Self {
            terms: [minute, hour, dom, month, dow].map(str::to_string),
            schedule,
        })
    }

    pub fn minute(&self) -> &str {
        &self.terms[0]
    }

    pub fn hour(&self) -> &str {
        &self.terms[1]
    }

    pub fn day_of_month(&self) -> &str {
        &self.terms[2]
    }

    pub fn month(&self) -> &str {
        &self.terms[3]
    }

    pub fn day_of_week(&self) -> &str {
        &self.terms[4]
    }

    pub fn schedule(&self) -> &cron::Schedule {
        &self.schedule
    }
}

impl std::fmt::Display for CronExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.terms.join(" "))
    }
}

pub fn is_valid_cron(expr: &str) -> bool {
    CronExpression::parse(expr).is_ok()
}

/// Rewrite numeric weekdays (0-7, Sunday = 0 or 7) as names. Step values and
/// out-of-range numbers are left for the parser to judge.
fn normalize_day_of_week(term: &str) -> String {
    term.split(',')
        .map(|item| {
            let (range, step) = match item.split_once('/') {
                Some((range, step)) => (range, Some(step)),
                None => (item, None),
            };
            let mut out = match range.split_once('-') {
                // A range ending on Sunday-as-7 wraps: 5-7 is FRI-SAT plus SUN.
                Some((start, "7")) if step.is_none() => {
                    format!("{}-SAT,SUN", day_name(start))
                }
                Some((start, "7")) => {
                    if let Some(days) = stepped_days_to_sunday(start, step.unwrap_or("1")) {
                        return days;
                    }
                    format!("{}-{}", day_name(start), day_name("7"))
                }
                Some((start, end)) => format!("{}-{}", day_name(start), day_name(end)),
                None => day_name(range),
            };
            if let Some(step) = step {
                out.push('/');
                out.push_str(step);
            }
            out
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// `start-7/step` spelled out as a day list, since a range cannot wrap past
/// Saturday. `None` when either number is not usable.
fn stepped_days_to_sunday(start: &str, step: &str) -> Option<String> {
    let start = start.parse::<usize>().ok().filter(|n| *n <= 7)?;
    let step = step.parse::<usize>().ok().filter(|n| *n > 0)?;
    let mut days: Vec<String> = Vec::new();
    for day in (start..=7).step_by(step) {
        let name = day_name(&day.to_string());
        if !days.contains(&name) {
            days.push(name);
        }
    }
    Some(days.join(","))
}

fn day_name(token: &str) -> String {
    match token.parse::<usize>() {
        Ok(7) => DAY_NAMES[0].to_string(),
        Ok(n) if n < DAY_NAMES.len() => DAY_NAMES[n].to_string(),
        _ => token.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(clock: &str, minute: &str, dom: &str, dow: &str) -> ScheduleFields {
        ScheduleFields {
            clock_time: clock.into(),
            minute_of_hour: minute.into(),
            day_of_month: dom.into(),
            day_of_week: dow.into(),
        }
    }

    #[test]
    fn derive_each_interval() {
        let f = fields("9:05", "12", "31", "3");
        let cases = [
            (EasyInterval::Minute, "* * * * *"),
            (EasyInterval::Hour, "12 * * * *"),
            (EasyInterval::Day, "5 9 * * *"),
            (EasyInterval::Week, "5 9 * * 3"),
            (EasyInterval::Weekday, "5 9 * * MON-FRI"),
            (EasyInterval::Month, "5 9 31 * *"),
        ];
        for (interval, expected) in cases {
            assert_eq!(derive_cron_from_fields(interval, &f).as_deref(), Some(expected));
        }
    }

    #[test]
    fn derive_skips_on_bad_clock() {
        let f = fields("25:00", "0", "1", "1");
        assert!(derive_cron_from_fields(EasyInterval::Day, &f).is_none());
        // Minute and hour kinds do not read the clock.
        assert!(derive_cron_from_fields(EasyInterval::Minute, &f).is_some());
        assert!(derive_cron_from_fields(EasyInterval::Hour, &f).is_some());
    }

    #[test]
    fn positional_derivation() {
        let preview = derive_fields_from_cron("12-34 */6 15,20 * MON-FRI");
        assert_eq!(
            preview,
            CronPreview {
                minute: 12,
                hour: 0,
                day_of_month: 15,
                day_of_week: 1,
            }
        );
    }

    #[test]
    fn positional_derivation_malformed_is_defaults() {
        assert_eq!(derive_fields_from_cron("0 7 * *"), CronPreview::default());
        assert_eq!(derive_fields_from_cron(""), CronPreview::default());
        assert_eq!(derive_fields_from_cron("1 2 3 4 5 6"), CronPreview::default());
    }

    #[test]
    fn round_trip_recovers_used_fields() {
        let f = fields("07:45", "30", "29", "6");

        let hour = derive_fields_from_cron(&derive_cron_from_fields(EasyInterval::Hour, &f).unwrap());
        assert_eq!(hour.minute, 30);

        let day = derive_fields_from_cron(&derive_cron_from_fields(EasyInterval::Day, &f).unwrap());
        assert_eq!((day.hour, day.minute), (7, 45));

        let week = derive_fields_from_cron(&derive_cron_from_fields(EasyInterval::Week, &f).unwrap());
        assert_eq!((week.hour, week.minute, week.day_of_week), (7, 45, 6));

        let month = derive_fields_from_cron(&derive_cron_from_fields(EasyInterval::Month, &f).unwrap());
        assert_eq!((month.hour, month.minute, month.day_of_month), (7, 45, 29));
    }

    #[test]
    fn preview_to_fields() {
        let f = derive_fields_from_cron("5 9 * * 2").to_fields();
        assert_eq!(f.clock_time, "09:05");
        assert_eq!(f.minute_of_hour, "5");
        assert_eq!(f.day_of_week, "2");
    }

    #[test]
    fn validates_standard_syntax() {
        for expr in [
            "* * * * *",
            "0 7 * * *",
            "* */6 * * *",
            "0 6 * * MON-FRI",
            "0 5 1 * *",
            "30 9 * * 0",
            "30 9 * * 7",
            "0 0 * * 1-5",
            "0 0 * * 5-7",
            "0 0 * * 1-7/2",
            "0 0 * * 0-7/3",
            "15,45 8-18 * JAN-JUN 1,3",
        ] {
            assert!(is_valid_cron(expr), "{expr:?} should be valid");
        }
    }

    #[test]
    fn rejects_invalid_syntax() {
        for expr in ["", "not a cron", "* * * *", "0 0 0 * * *", "60 * * * *", "0 24 * * *", "0 0 32 * *", "0 0 * 13 *"] {
            assert!(!is_valid_cron(expr), "{expr:?} should be invalid");
        }
    }

    #[test]
    fn normalizes_weekday_numbers() {
        assert_eq!(normalize_day_of_week("0"), "SUN");
        assert_eq!(normalize_day_of_week("1-5"), "MON-FRI");
        assert_eq!(normalize_day_of_week("5-7"), "FRI-SAT,SUN");
        assert_eq!(normalize_day_of_week("*/2"), "*/2");
        assert_eq!(normalize_day_of_week("1-7/2"), "MON,WED,FRI,SUN");
        assert_eq!(normalize_day_of_week("0-7/1"), "SUN,MON,TUE,WED,THU,FRI,SAT");
        assert_eq!(normalize_day_of_week("0-6/2"), "SUN-SAT/2");
        assert_eq!(normalize_day_of_week("1,3"), "MON,WED");
        assert_eq!(normalize_day_of_week("MON-FRI"), "MON-FRI");
    }

    #[test]
    fn expression_accessors() {
        let expr = CronExpression::parse("  5 9   * * MON-FRI ").unwrap();
        assert_eq!(expr.minute(), "5");
        assert_eq!(expr.day_of_week(), "MON-FRI");
        assert_eq!(expr.to_string(), "5 9 * * MON-FRI");
    }
}
