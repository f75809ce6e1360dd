//! Plain-language rendering of cron expressions.

use super::cron::CronExpression;

const DAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Describe a cron expression, e.g. `"0 6 * * MON-FRI"` becomes
/// `"At 06:00, Monday through Friday"`. Empty when the expression is invalid.
pub fn describe(expr: &str) -> String {
    match CronExpression::parse(expr) {
        Ok(cron) => describe_parsed(&cron),
        Err(_) => String::new(),
    }
}

pub fn describe_parsed(cron: &CronExpression) -> String {
    let mut parts = vec![time_part(cron.minute(), cron.hour())];
    if let Some(dom) = day_of_month_part(cron.day_of_month()) {
        parts.push(dom);
    }
    if let Some(dow) = named_part(cron.day_of_week(), "days of the week", day_name) {
        parts.push(dow);
    }
    if let Some(month) = named_part(cron.month(), "months", month_name) {
        parts.push(month);
    }
    parts.join(", ")
}

fn number(term: &str) -> Option<u32> {
    term.parse().ok()
}

fn step(term: &str) -> Option<u32> {
    term.strip_prefix("*/").and_then(number)
}

fn time_part(minute: &str, hour: &str) -> String {
    match (number(minute), number(hour)) {
        (Some(m), Some(h)) => return format!("At {h:02}:{m:02}"),
        (Some(0), None) if hour == "*" => return "Every hour".to_string(),
        (Some(m), None) if hour == "*" => return format!("At {m} minutes past the hour"),
        _ => {}
    }

    let minutes = match (minute, step(minute), number(minute)) {
        ("*", _, _) => "Every minute".to_string(),
        (_, Some(n), _) => format!("Every {n} minutes"),
        (_, _, Some(m)) => format!("At {m} minutes past the hour"),
        _ => format!("At minutes {}", list_text(minute, |t| t.to_string())),
    };

    let hours = match (hour, step(hour), number(hour)) {
        ("*", _, _) => None,
        (_, Some(n), _) => Some(format!("every {n} hours")),
        (_, _, Some(h)) => Some(format!("between {h:02}:00 and {h:02}:59")),
        _ => Some(format!(
            "during hours {}",
            list_text(hour, |t| match number(t) {
                Some(h) => format!("{h:02}:00"),
                None => t.to_string(),
            })
        )),
    };

    match hours {
        Some(hours) => format!("{minutes}, {hours}"),
        None => minutes,
    }
}

fn day_of_month_part(term: &str) -> Option<String> {
    if term == "*" || term == "?" {
        return None;
    }
    if let Some(n) = step(term) {
        return Some(format!("every {n} days"));
    }
    if let Some(d) = number(term) {
        return Some(format!("on day {d} of the month"));
    }
    if let Some((start, end)) = term.split_once('-')
        && !term.contains(',')
        && !term.contains('/')
    {
        return Some(format!("between day {start} and {end} of the month"));
    }
    Some(format!("on days {} of the month", list_text(term, |t| t.to_string())))
}

/// Day-of-week and month terms: names or numbers, ranges and lists.
/// `unit` names what a step counts.
fn named_part(term: &str, unit: &str, name: fn(&str) -> String) -> Option<String> {
    if term == "*" || term == "?" {
        return None;
    }
    if let Some(n) = step(term) {
        return Some(format!("every {n} {unit}"));
    }
    if let Some((start, end)) = term.split_once('-')
        && !term.contains(',')
        && !term.contains('/')
    {
        return Some(format!("{} through {}", name(start), name(end)));
    }
    Some(format!("only on {}", list_text(term, name)))
}

fn list_text(term: &str, name: impl Fn(&str) -> String) -> String {
    let items: Vec<String> = term
        .split(',')
        .map(|item| match item.split_once('-') {
            Some((start, end)) if !item.contains('/') => {
                format!("{} through {}", name(start), name(end))
            }
            _ => name(item),
        })
        .collect();
    match items.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

fn day_name(token: &str) -> String {
    let index = match number(token) {
        Some(7) => Some(0),
        Some(n) => Some(n as usize),
        None => DAYS
            .iter()
            .position(|d| d[..3].eq_ignore_ascii_case(token) || d.eq_ignore_ascii_case(token)),
    };
    index
        .and_then(|i| DAYS.get(i))
        .map(|d| d.to_string())
        .unwrap_or_else(|| token.to_string())
}

fn month_name(token: &str) -> String {
    let index = match number(token) {
        Some(n) if n >= 1 => Some(n as usize - 1),
        Some(_) => None,
        None => MONTHS
            .iter()
            .position(|m| m[..3].eq_ignore_ascii_case(token) || m.eq_ignore_ascii_case(token)),
    };
    index
        .and_then(|i| MONTHS.get(i))
        .map(|m| m.to_string())
        .unwrap_or_else(|| token.to_string())
}
