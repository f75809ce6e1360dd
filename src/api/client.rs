//! HTTP client for the scheduler REST API.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::models::{
    CreateJob, CreateJobDefinition, CreateJobDefinitionResponse, CreateJobFromDefinition,
    CreateJobResponse, DescribeJob, DescribeJobDefinition, ListJobDefinitionsQuery,
    ListJobDefinitionsResponse, ListJobsQuery, ListJobsResponse, RuntimeEnvironment, SortField,
    Status, UpdateJobDefinition,
};

/// Path segment all scheduler endpoints live under.
const API_NAMESPACE: &str = "scheduler";

/// Client for one notebook server's scheduler API.
#[derive(Clone)]
pub struct SchedulerClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
}

impl SchedulerClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        reqwest::Url::parse(&config.base_url).map_err(|e| ApiError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::RequestFailed {
                endpoint: config.base_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Convenience constructor for a server without authentication.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::new(&ClientConfig {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(30),
            ..ClientConfig::default()
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{API_NAMESPACE}/{endpoint}", self.base_url)
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(endpoint));
        match &self.token {
            Some(token) => builder.header(
                reqwest::header::AUTHORIZATION,
                format!("token {}", token.expose_secret()),
            ),
            None => builder,
        }
    }

    async fn send(&self, endpoint: &str, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| ApiError::RequestFailed {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message: error_message(&body, status.canonical_reason()),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .send(endpoint, self.request(Method::GET, endpoint).query(query))
            .await?;
        decode(endpoint, response).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .send(endpoint, self.request(method, endpoint).json(body))
            .await?;
        decode(endpoint, response).await
    }

    /// Send a request whose success response carries no body.
    async fn send_no_content<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let mut builder = self.request(method, endpoint);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(endpoint, builder).await?;
        Ok(())
    }

    // ── Jobs ────────────────────────────────────────────────────────

    pub async fn list_jobs(
        &self,
        query: &ListJobsQuery,
        max_items: usize,
        next_token: Option<&str>,
    ) -> Result<ListJobsResponse, ApiError> {
        let params = jobs_query_params(query, max_items, next_token);
        debug!(params = ?params, "Listing jobs");
        self.get_json("jobs", &params).await
    }

    pub async fn get_job(&self, job_id: &str) -> Result<DescribeJob, ApiError> {
        self.get_json(&format!("jobs/{job_id}"), &[]).await
    }

    /// Number of jobs in `status`; the service counts in-progress jobs when
    /// no status is given.
    pub async fn count_jobs(&self, status: Option<Status>) -> Result<u64, ApiError> {
        #[derive(serde::Deserialize)]
        struct CountResponse {
            count: u64,
        }

        let params: Vec<(&str, String)> = status
            .map(|s| ("status", s.as_str().to_string()))
            .into_iter()
            .collect();
        let response: CountResponse = self.get_json("jobs/count", &params).await?;
        Ok(response.count)
    }

    pub async fn create_job(&self, job: &CreateJob) -> Result<CreateJobResponse, ApiError> {
        let response: CreateJobResponse = self.send_json(Method::POST, "jobs", job).await?;
        info!(job_id = %response.job_id, name = %job.name, "Job created");
        Ok(response)
    }

    /// Request a status transition, e.g. `STOPPED` to stop a running job.
    pub async fn set_job_status(&self, job_id: &str, status: Status) -> Result<(), ApiError> {
        let body = serde_json::json!({ "status": status });
        self.send_no_content(Method::PATCH, &format!("jobs/{job_id}"), Some(&body))
            .await?;
        info!(job_id, status = %status, "Job status updated");
        Ok(())
    }

    pub async fn delete_job(&self, job_id: &str) -> Result<(), ApiError> {
        self.send_no_content::<()>(Method::DELETE, &format!("jobs/{job_id}"), None)
            .await?;
        info!(job_id, "Job deleted");
        Ok(())
    }

    /// Ask the server to copy a job's output files into the workspace.
    pub async fn download_files(&self, job_id: &str, redownload: bool) -> Result<(), ApiError> {
        let endpoint = format!("jobs/{job_id}/download_files");
        let builder = self
            .request(Method::GET, &endpoint)
            .query(&[("redownload", redownload.to_string())]);
        self.send(&endpoint, builder).await?;
        Ok(())
    }

    // ── Job definitions ─────────────────────────────────────────────

    pub async fn list_job_definitions(
        &self,
        query: &ListJobDefinitionsQuery,
        max_items: usize,
        next_token: Option<&str>,
    ) -> Result<ListJobDefinitionsResponse, ApiError> {
        let params = job_definitions_query_params(query, max_items, next_token);
        debug!(params = ?params, "Listing job definitions");
        self.get_json("job_definitions", &params).await
    }

    pub async fn get_job_definition(
        &self,
        job_definition_id: &str,
    ) -> Result<DescribeJobDefinition, ApiError> {
        self.get_json(&format!("job_definitions/{job_definition_id}"), &[])
            .await
    }

    pub async fn create_job_definition(
        &self,
        definition: &CreateJobDefinition,
    ) -> Result<CreateJobDefinitionResponse, ApiError> {
        let response: CreateJobDefinitionResponse = self
            .send_json(Method::POST, "job_definitions", definition)
            .await?;
        info!(
            job_definition_id = %response.job_definition_id,
            name = %definition.name,
            schedule = ?definition.schedule,
            "Job definition created"
        );
        Ok(response)
    }

    pub async fn update_job_definition(
        &self,
        job_definition_id: &str,
        update: &UpdateJobDefinition,
    ) -> Result<(), ApiError> {
        self.send_no_content(
            Method::PATCH,
            &format!("job_definitions/{job_definition_id}"),
            Some(update),
        )
        .await?;
        debug!(job_definition_id, "Job definition updated");
        Ok(())
    }

    pub async fn pause_job_definition(&self, job_definition_id: &str) -> Result<(), ApiError> {
        let update = UpdateJobDefinition {
            active: Some(false),
            ..Default::default()
        };
        self.update_job_definition(job_definition_id, &update).await?;
        info!(job_definition_id, "Job definition paused");
        Ok(())
    }

    pub async fn resume_job_definition(&self, job_definition_id: &str) -> Result<(), ApiError> {
        let update = UpdateJobDefinition {
            active: Some(true),
            ..Default::default()
        };
        self.update_job_definition(job_definition_id, &update).await?;
        info!(job_definition_id, "Job definition resumed");
        Ok(())
    }

    pub async fn delete_job_definition(&self, job_definition_id: &str) -> Result<(), ApiError> {
        self.send_no_content::<()>(
            Method::DELETE,
            &format!("job_definitions/{job_definition_id}"),
            None,
        )
        .await?;
        info!(job_definition_id, "Job definition deleted");
        Ok(())
    }

    /// Run a job definition once, outside its schedule.
    pub async fn create_job_from_definition(
        &self,
        job_definition_id: &str,
        request: &CreateJobFromDefinition,
    ) -> Result<CreateJobResponse, ApiError> {
        let response: CreateJobResponse = self
            .send_json(
                Method::POST,
                &format!("job_definitions/{job_definition_id}/jobs"),
                request,
            )
            .await?;
        info!(job_definition_id, job_id = %response.job_id, "Job created from definition");
        Ok(response)
    }

    // ── Environments ────────────────────────────────────────────────

    pub async fn runtime_environments(&self) -> Result<Vec<RuntimeEnvironment>, ApiError> {
        self.get_json("runtime_environments", &[]).await
    }
}

impl std::fmt::Debug for SchedulerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, ApiError> {
    let body = response.text().await.map_err(|e| ApiError::RequestFailed {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

/// Prefer the `message` field of a JSON error body, then the raw body.
fn error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(message) = value.get("message").and_then(|m| m.as_str())
    {
        return message.to_string();
    }
    let body = body.trim();
    if body.is_empty() {
        reason.unwrap_or("request failed").to_string()
    } else {
        body.to_string()
    }
}

/// Each sort entry becomes its own `sort_by=<direction>(<name>)` parameter.
fn push_sort(params: &mut Vec<(&'static str, String)>, sort_by: &[SortField]) {
    for field in sort_by {
        params.push((
            "sort_by",
            format!("{}({})", field.direction.as_str(), field.name),
        ));
    }
}

fn push_paging(params: &mut Vec<(&'static str, String)>, max_items: usize, next_token: Option<&str>) {
    params.push(("max_items", max_items.to_string()));
    if let Some(token) = next_token {
        params.push(("next_token", token.to_string()));
    }
}

pub(crate) fn jobs_query_params(
    query: &ListJobsQuery,
    max_items: usize,
    next_token: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(status) = query.status {
        params.push(("status", status.as_str().to_string()));
    }
    if let Some(id) = &query.job_definition_id {
        params.push(("job_definition_id", id.clone()));
    }
    if let Some(name) = &query.name {
        params.push(("name", name.clone()));
    }
    if let Some(start_time) = query.start_time {
        params.push(("start_time", start_time.to_string()));
    }
    push_sort(&mut params, &query.sort_by);
    push_paging(&mut params, max_items, next_token);
    params
}

pub(crate) fn job_definitions_query_params(
    query: &ListJobDefinitionsQuery,
    max_items: usize,
    next_token: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(name) = &query.name {
        params.push(("name", name.clone()));
    }
    if let Some(create_time) = query.create_time {
        params.push(("create_time", create_time.to_string()));
    }
    push_sort(&mut params, &query.sort_by);
    push_paging(&mut params, max_items, next_token);
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SortDirection, default_sort};

    #[test]
    fn jobs_params_serialize_sort_entries() {
        let query = ListJobsQuery {
            status: Some(Status::InProgress),
            name: Some("nightly".into()),
            sort_by: vec![
                SortField::new("name", SortDirection::Asc),
                SortField::new("create_time", SortDirection::Desc),
            ],
            ..Default::default()
        };
        let params = jobs_query_params(&query, 25, Some("tok"));
        assert_eq!(
            params,
            vec![
                ("status", "IN_PROGRESS".to_string()),
                ("name", "nightly".to_string()),
                ("sort_by", "asc(name)".to_string()),
                ("sort_by", "desc(create_time)".to_string()),
                ("max_items", "25".to_string()),
                ("next_token", "tok".to_string()),
            ]
        );
    }

    #[test]
    fn first_page_has_no_token() {
        let query = ListJobDefinitionsQuery {
            sort_by: default_sort(),
            ..Default::default()
        };
        let params = job_definitions_query_params(&query, 10, None);
        assert_eq!(
            params,
            vec![
                ("sort_by", "desc(create_time)".to_string()),
                ("max_items", "10".to_string()),
            ]
        );
    }

    #[test]
    fn error_message_prefers_json_message() {
        assert_eq!(
            error_message(r#"{"message": "Job not found"}"#, Some("Not Found")),
            "Job not found"
        );
        assert_eq!(error_message("boom", Some("Internal Server Error")), "boom");
        assert_eq!(error_message("", Some("Not Found")), "Not Found");
    }

    #[test]
    fn urls_join_namespace() {
        let client = SchedulerClient::with_base_url("http://localhost:8888/").unwrap();
        assert_eq!(client.url("jobs/count"), "http://localhost:8888/scheduler/jobs/count");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = SchedulerClient::with_base_url("not a url").unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl { .. }));
    }
}
