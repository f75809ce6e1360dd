//! Jobs listing model: the latest job list plus the in-progress count, with
//! change notifications for subscribers.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};

use crate::api::SchedulerClient;
use crate::models::{DescribeJob, ListJobsQuery, Status};

const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Change notifications sent to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListingEvent {
    JobsChanged { jobs: Vec<DescribeJob> },
    InProgressCountChanged { count: u64 },
}

pub struct JobsListingModel {
    jobs: RwLock<Vec<DescribeJob>>,
    in_progress_count: RwLock<u64>,
    tx: broadcast::Sender<ListingEvent>,
}

impl JobsListingModel {
    /// Seed the model; the in-progress count starts as the number of seeded
    /// jobs in `IN_PROGRESS`.
    pub fn new(jobs: Vec<DescribeJob>) -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        let in_progress = jobs
            .iter()
            .filter(|job| job.status == Status::InProgress)
            .count() as u64;
        Arc::new(Self {
            jobs: RwLock::new(jobs),
            in_progress_count: RwLock::new(in_progress),
            tx,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListingEvent> {
        self.tx.subscribe()
    }

    /// Replace the job list if it changed. Only a different length or a
    /// different status at some position counts as a change.
    pub async fn update_jobs(&self, jobs: Vec<DescribeJob>) -> bool {
        let mut current = self.jobs.write().await;
        let changed = jobs.len() != current.len()
            || jobs.iter().zip(current.iter()).any(|(new, old)| new.status != old.status);
        if !changed {
            return false;
        }

        debug!(count = jobs.len(), "Job list changed");
        *current = jobs.clone();
        // No receivers is fine.
        let _ = self.tx.send(ListingEvent::JobsChanged { jobs });
        true
    }

    pub async fn update_in_progress_count(&self, count: u64) -> bool {
        let mut current = self.in_progress_count.write().await;
        if *current == count {
            return false;
        }
        *current = count;
        let _ = self.tx.send(ListingEvent::InProgressCountChanged { count });
        true
    }

    pub async fn jobs(&self) -> Vec<DescribeJob> {
        self.jobs.read().await.clone()
    }

    pub async fn in_progress_count(&self) -> u64 {
        *self.in_progress_count.read().await
    }

    /// Fetch the first page of `query` and the in-progress count, updating
    /// the model. Errors are logged and leave the model unchanged.
    pub async fn poll(&self, client: &SchedulerClient, query: &ListJobsQuery, page_size: usize) {
        match client.list_jobs(query, page_size, None).await {
            Ok(response) => {
                self.update_jobs(response.jobs).await;
            }
            Err(e) => warn!(error = %e, "Failed to refresh job list"),
        }
        match client.count_jobs(Some(Status::InProgress)).await {
            Ok(count) => {
                self.update_in_progress_count(count).await;
            }
            Err(e) => warn!(error = %e, "Failed to refresh in-progress count"),
        }
    }
}

/// Spawn a background task that refreshes the model every `period`.
pub fn spawn_poll_task(
    model: Arc<JobsListingModel>,
    client: SchedulerClient,
    query: ListJobsQuery,
    page_size: usize,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            model.poll(&client, &query, page_size).await;
        }
    })
}
