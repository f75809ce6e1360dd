//! Command-line interface.

use clap::{Parser, Subcommand};

use notebook_jobs::models::{SortDirection, SortField, Status};

/// Inspect and manage scheduled notebook jobs.
#[derive(Parser)]
#[command(name = "notebook-jobs")]
#[command(version)]
pub(crate) struct Cli {
    /// Notebook server base URL
    #[arg(long, env = "NOTEBOOK_JOBS_URL", global = true)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Validate a cron expression and describe it in plain language
    Describe {
        /// Five-field cron expression; may be given unquoted
        #[arg(required = true, num_args = 1..)]
        expression: Vec<String>,
    },

    /// List the built-in schedule presets
    Presets,

    /// List jobs
    Jobs {
        /// Sort column, optionally suffixed with :asc or :desc
        #[arg(long, value_parser = parse_sort)]
        sort: Option<SortField>,

        /// Only jobs in this status
        #[arg(long, value_parser = parse_status)]
        status: Option<Status>,

        /// Only jobs whose name starts with this
        #[arg(long)]
        name: Option<String>,

        /// Pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },

    /// List job definitions
    Definitions {
        /// Sort column, optionally suffixed with :asc or :desc
        #[arg(long, value_parser = parse_sort)]
        sort: Option<SortField>,

        /// Only definitions whose name starts with this
        #[arg(long)]
        name: Option<String>,

        /// Pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },

    /// Watch the job list and the number of running jobs
    Watch {
        /// Seconds between refreshes
        #[arg(long, default_value_t = 10)]
        interval: u64,
    },

    /// List runtime environments
    Environments,

    /// Stop a running job
    Stop { job_id: String },

    /// Pause a job definition
    Pause { job_definition_id: String },

    /// Resume a paused job definition
    Resume { job_definition_id: String },
}

/// `name`, `name:asc` or `name:desc`. A bare name sorts ascending.
pub(crate) fn parse_sort(raw: &str) -> Result<SortField, String> {
    let (name, direction) = match raw.split_once(':') {
        Some((name, "asc")) => (name, SortDirection::Asc),
        Some((name, "desc")) => (name, SortDirection::Desc),
        Some((_, other)) => return Err(format!("unknown sort direction '{other}'")),
        None => (raw, SortDirection::Asc),
    };
    if name.is_empty() {
        return Err("sort field name is empty".to_string());
    }
    Ok(SortField::new(name, direction))
}

fn parse_status(raw: &str) -> Result<Status, String> {
    raw.parse::<Status>().map_err(|e| e.to_string())
}
