//! [`PageSource`] adapters over the scheduler listing endpoints.

use async_trait::async_trait;

use super::client::SchedulerClient;
use crate::error::ApiError;
use crate::listing::{Page, PageRequest, PageSource};
use crate::models::{DescribeJob, DescribeJobDefinition, ListJobDefinitionsQuery, ListJobsQuery};

/// Pages of `GET jobs`.
#[derive(Debug, Clone)]
pub struct JobsSource {
    client: SchedulerClient,
}

impl JobsSource {
    pub fn new(client: SchedulerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for JobsSource {
    type Query = ListJobsQuery;
    type Row = DescribeJob;

    async fn fetch_page(
        &self,
        request: PageRequest<ListJobsQuery>,
    ) -> Result<Page<DescribeJob>, ApiError> {
        let response = self
            .client
            .list_jobs(&request.query, request.max_items, request.next_token.as_deref())
            .await?;
        Ok(Page {
            rows: response.jobs,
            next_token: response.next_token,
            total_count: Some(response.total_count),
        })
    }
}

/// Pages of `GET job_definitions`.
#[derive(Debug, Clone)]
pub struct JobDefinitionsSource {
    client: SchedulerClient,
}

impl JobDefinitionsSource {
    pub fn new(client: SchedulerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for JobDefinitionsSource {
    type Query = ListJobDefinitionsQuery;
    type Row = DescribeJobDefinition;

    async fn fetch_page(
        &self,
        request: PageRequest<ListJobDefinitionsQuery>,
    ) -> Result<Page<DescribeJobDefinition>, ApiError> {
        let response = self
            .client
            .list_job_definitions(&request.query, request.max_items, request.next_token.as_deref())
            .await?;
        Ok(Page {
            rows: response.job_definitions,
            next_token: response.next_token,
            total_count: Some(response.total_count),
        })
    }
}
