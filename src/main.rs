mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::warn;

use notebook_jobs::api::{JobDefinitionsSource, JobsSource, SchedulerClient};
use notebook_jobs::config::ClientConfig;
use notebook_jobs::environments::{EnvironmentCatalog, default_compute_type};
use notebook_jobs::listing::{
    FetchOutcome, JobsListingModel, ListingEvent, PageSource, PagedList, RowsView, spawn_poll_task,
};
use notebook_jobs::models::{
    DescribeJob, DescribeJobDefinition, ListJobDefinitionsQuery, ListJobsQuery, Status,
    default_sort,
};
use notebook_jobs::schedule::{CronExpression, PRESETS, describe};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("Invalid NOTEBOOK_JOBS_* configuration")?;
    if let Some(url) = cli.url {
        config.base_url = url;
    }

    match cli.command {
        Commands::Describe { expression } => {
            let expression = expression.join(" ");
            let cron = CronExpression::parse(&expression)
                .map_err(|e| anyhow::anyhow!("Invalid cron expression '{expression}': {e}"))?;
            println!("{cron}");
            println!("{}", describe(&expression));
        }
        Commands::Presets => {
            for preset in PRESETS {
                println!("{:<16} {:<16} {}", preset.label, preset.cron, describe(preset.cron));
            }
        }
        Commands::Jobs {
            sort,
            status,
            name,
            pages,
        } => {
            let client = SchedulerClient::new(&config)?;
            let query = ListJobsQuery {
                status,
                name,
                sort_by: sort.map(|s| vec![s]).unwrap_or_else(default_sort),
                ..Default::default()
            };
            let list = PagedList::new(JobsSource::new(client), query.clone(), config.page_size);
            print_pages(&list, query, pages, print_job).await?;
        }
        Commands::Definitions { sort, name, pages } => {
            let client = SchedulerClient::new(&config)?;
            let query = ListJobDefinitionsQuery {
                name,
                sort_by: sort.map(|s| vec![s]).unwrap_or_else(default_sort),
                ..Default::default()
            };
            let list = PagedList::new(
                JobDefinitionsSource::new(client),
                query.clone(),
                config.page_size,
            );
            print_pages(&list, query, pages, print_job_definition).await?;
        }
        Commands::Watch { interval } => {
            let client = SchedulerClient::new(&config)?;
            let model = JobsListingModel::new(Vec::new());
            let mut events = model.subscribe();
            let query = ListJobsQuery {
                sort_by: default_sort(),
                ..Default::default()
            };
            let poller = spawn_poll_task(
                Arc::clone(&model),
                client,
                query,
                config.page_size,
                Duration::from_secs(interval.max(1)),
            );
            eprintln!("Watching {} (Ctrl-C to stop)", config.base_url);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    event = events.recv() => match event {
                        Ok(ListingEvent::JobsChanged { jobs }) => {
                            println!("-- {} jobs", jobs.len());
                            jobs.iter().for_each(print_job);
                        }
                        Ok(ListingEvent::InProgressCountChanged { count }) => {
                            println!("-- {count} in progress");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "Watcher fell behind");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            poller.abort();
        }
        Commands::Environments => {
            let client = SchedulerClient::new(&config)?;
            let catalog = EnvironmentCatalog::new(Arc::new(client));
            for env in catalog.environments().await? {
                let formats: Vec<&str> = env.output_formats.iter().map(|f| f.name.as_str()).collect();
                println!(
                    "{:<20} {:<24} compute={} formats={}{}",
                    env.name,
                    env.label,
                    default_compute_type(env).unwrap_or_else(|| "-".to_string()),
                    formats.join(","),
                    if env.utc_only { " (UTC only)" } else { "" }
                );
            }
        }
        Commands::Stop { job_id } => {
            let client = SchedulerClient::new(&config)?;
            client.set_job_status(&job_id, Status::Stopped).await?;
            eprintln!("Stop requested for job {job_id}");
        }
        Commands::Pause { job_definition_id } => {
            let client = SchedulerClient::new(&config)?;
            client.pause_job_definition(&job_definition_id).await?;
            eprintln!("Paused job definition {job_definition_id}");
        }
        Commands::Resume { job_definition_id } => {
            let client = SchedulerClient::new(&config)?;
            client.resume_job_definition(&job_definition_id).await?;
            eprintln!("Resumed job definition {job_definition_id}");
        }
    }

    Ok(())
}

/// Load and print up to `pages` pages, stopping early at the last one.
async fn print_pages<S: PageSource>(
    list: &PagedList<S>,
    query: S::Query,
    pages: usize,
    print_row: fn(&S::Row),
) -> anyhow::Result<()> {
    if let FetchOutcome::Failed(e) = list.reset_and_fetch(query).await {
        return Err(e.into());
    }

    for page in 0..pages.max(1) {
        if page > 0 {
            match list.go_to_page(page).await {
                FetchOutcome::Failed(e) => return Err(e.into()),
                FetchOutcome::NoMore | FetchOutcome::LastPageReached => break,
                _ => {}
            }
        }
        match list.visible_rows().await {
            RowsView::Loading => {}
            RowsView::Empty => println!("No results."),
            RowsView::Page(rows) => rows.iter().for_each(print_row),
        }
        if list.on_last_page().await {
            break;
        }
    }

    eprintln!("{}", list.range_label().await);
    Ok(())
}

fn print_job(job: &DescribeJob) {
    let created = job
        .created_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    println!(
        "{:<36} {:<28} {:<12} {}",
        job.job_id,
        job.name,
        job.status.as_str(),
        created
    );
}

fn print_job_definition(definition: &DescribeJobDefinition) {
    let schedule = definition.schedule.as_deref().unwrap_or("");
    println!(
        "{:<36} {:<28} {:<7} {:<16} {}",
        definition.job_definition_id,
        definition.name,
        if definition.active { "active" } else { "paused" },
        schedule,
        describe(schedule)
    );
}
