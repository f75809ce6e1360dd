//! Scheduler REST API: the HTTP client and its listing adapters.

pub mod client;
pub mod sources;

pub use client::SchedulerClient;
pub use sources::{JobDefinitionsSource, JobsSource};
