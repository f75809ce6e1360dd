//! Notification and retry options for one-off jobs.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::EmailNotifications;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("email pattern compiles"));

pub const TIMEOUT_ERROR: &str = "Timeout must be a whole number of seconds";
pub const MAX_RETRIES_ERROR: &str = "Maximum retries must be a whole number";
pub const RETRY_INTERVAL_ERROR: &str = "Minimum retry interval must be a whole number of milliseconds";

/// A job lifecycle event that can trigger an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    Start,
    Success,
    Failure,
}

impl NotificationEvent {
    pub const ALL: [NotificationEvent; 3] = [
        NotificationEvent::Start,
        NotificationEvent::Success,
        NotificationEvent::Failure,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            NotificationEvent::Start => "Run start",
            NotificationEvent::Success => "Run success",
            NotificationEvent::Failure => "Run failure",
        }
    }
}

/// Email settings as edited in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
    /// When off, nothing is sent regardless of recipients and events.
    pub enabled: bool,
    send_to: Vec<String>,
    send_to_error: String,
    events: Vec<NotificationEvent>,
    pub no_alert_for_skipped_rows: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            send_to: Vec::new(),
            send_to_error: String::new(),
            events: Vec::new(),
            no_alert_for_skipped_rows: true,
        }
    }
}

impl NotificationSettings {
    /// Set recipients from comma-separated input. Blank entries are dropped.
    pub fn set_send_to(&mut self, input: &str) {
        self.send_to = input
            .split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(str::to_string)
            .collect();
        self.send_to_error = match self.send_to.iter().find(|addr| !EMAIL.is_match(addr)) {
            Some(bad) => format!("Invalid email address: {bad}"),
            None => String::new(),
        };
    }

    pub fn send_to(&self) -> &[String] {
        &self.send_to
    }

    /// Error for the recipient list; empty when valid.
    pub fn send_to_error(&self) -> &str {
        &self.send_to_error
    }

    pub fn events(&self) -> &[NotificationEvent] {
        &self.events
    }

    /// Events not yet selected, in display order.
    pub fn remaining_events(&self) -> Vec<NotificationEvent> {
        NotificationEvent::ALL
            .into_iter()
            .filter(|event| !self.events.contains(event))
            .collect()
    }

    pub fn add_event(&mut self, event: NotificationEvent) -> bool {
        if self.events.contains(&event) {
            return false;
        }
        self.events.push(event);
        true
    }

    pub fn remove_event(&mut self, event: NotificationEvent) -> bool {
        let before = self.events.len();
        self.events.retain(|e| *e != event);
        self.events.len() != before
    }

    /// The request value, or `None` when there is nothing to send.
    pub fn to_email_notifications(&self) -> Option<EmailNotifications> {
        if !self.enabled || self.send_to.is_empty() || self.events.is_empty() {
            return None;
        }
        let recipients = |event| {
            self.events
                .contains(&event)
                .then(|| self.send_to.clone())
        };
        Some(EmailNotifications {
            on_start: recipients(NotificationEvent::Start),
            on_success: recipients(NotificationEvent::Success),
            on_failure: recipients(NotificationEvent::Failure),
            no_alert_for_skipped_rows: self.no_alert_for_skipped_rows,
        })
    }
}

/// Advanced options of a one-off job. Numeric fields keep the raw input so a
/// half-typed value can be shown with its error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOptions {
    pub notifications: NotificationSettings,
    pub timeout_seconds: String,
    pub max_retries: String,
    pub min_retry_interval_millis: String,
    pub retry_on_timeout: bool,
    /// Empty leaves the service's own template in effect.
    pub output_filename_template: String,
}

fn parse_whole<T: std::str::FromStr>(raw: &str) -> Result<Option<T>, ()> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| ())
}

impl JobOptions {
    pub fn timeout_seconds(&self) -> Option<u64> {
        parse_whole(&self.timeout_seconds).ok().flatten()
    }

    pub fn max_retries(&self) -> Option<u32> {
        parse_whole(&self.max_retries).ok().flatten()
    }

    pub fn min_retry_interval_millis(&self) -> Option<u64> {
        parse_whole(&self.min_retry_interval_millis).ok().flatten()
    }

    /// Only sent when set, so the service default applies otherwise.
    pub fn retry_on_timeout(&self) -> Option<bool> {
        self.retry_on_timeout.then_some(true)
    }

    pub fn output_filename_template(&self) -> Option<String> {
        let template = self.output_filename_template.trim();
        (!template.is_empty()).then(|| template.to_string())
    }

    /// Every current error as `(field, message)`.
    pub fn errors(&self) -> Vec<(&'static str, String)> {
        let mut errors = Vec::new();
        if parse_whole::<u64>(&self.timeout_seconds).is_err() {
            errors.push(("timeout_seconds", TIMEOUT_ERROR.to_string()));
        }
        if parse_whole::<u32>(&self.max_retries).is_err() {
            errors.push(("max_retries", MAX_RETRIES_ERROR.to_string()));
        }
        if parse_whole::<u64>(&self.min_retry_interval_millis).is_err() {
            errors.push(("min_retry_interval_millis", RETRY_INTERVAL_ERROR.to_string()));
        }
        if !self.notifications.send_to_error.is_empty() {
            errors.push(("send_to", self.notifications.send_to_error.clone()));
        }
        errors
    }
}
