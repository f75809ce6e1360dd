//! Wire types of the scheduling service REST API.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notebook parameters, name to value. The service accepts strings, numbers
/// and booleans as values.
pub type Parameters = BTreeMap<String, serde_json::Value>;

/// Environment-specific settings passed through to the runtime.
pub type RuntimeEnvironmentParameters = BTreeMap<String, serde_json::Value>;

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Created,
    Queued,
    InProgress,
    Completed,
    Failed,
    Stopping,
    Stopped,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Created => "CREATED",
            Status::Queued => "QUEUED",
            Status::InProgress => "IN_PROGRESS",
            Status::Completed => "COMPLETED",
            Status::Failed => "FAILED",
            Status::Stopping => "STOPPING",
            Status::Stopped => "STOPPED",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATED" => Ok(Status::Created),
            "QUEUED" => Ok(Status::Queued),
            "IN_PROGRESS" => Ok(Status::InProgress),
            "COMPLETED" => Ok(Status::Completed),
            "FAILED" => Ok(Status::Failed),
            "STOPPING" => Ok(Status::Stopping),
            "STOPPED" => Ok(Status::Stopped),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One entry of a `sort_by` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub name: String,
    pub direction: SortDirection,
}

impl SortField {
    pub fn new(name: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            name: name.into(),
            direction,
        }
    }
}

/// The service's default ordering: newest first.
pub fn default_sort() -> Vec<SortField> {
    vec![SortField::new("create_time", SortDirection::Desc)]
}

fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// An output file produced by a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFile {
    pub display_name: String,
    pub file_format: String,
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Who is emailed when a job starts, succeeds or fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailNotifications {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_start: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<Vec<String>>,
    #[serde(default = "default_true", alias = "no_alert_for_skipped_runs")]
    pub no_alert_for_skipped_rows: bool,
}

impl Default for EmailNotifications {
    fn default() -> Self {
        Self {
            on_start: None,
            on_success: None,
            on_failure: None,
            no_alert_for_skipped_rows: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A job as reported by the service. Timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescribeJob {
    pub job_id: String,
    pub name: String,
    pub input_filename: String,
    pub runtime_environment_name: String,
    #[serde(default)]
    pub runtime_environment_parameters: Option<RuntimeEnvironmentParameters>,
    #[serde(default)]
    pub job_definition_id: Option<String>,
    #[serde(default)]
    pub parameters: Option<Parameters>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub output_formats: Option<Vec<String>>,
    #[serde(default)]
    pub compute_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<EmailNotifications>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_retry_interval_millis: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_on_timeout: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename_template: Option<String>,
    #[serde(default)]
    pub job_files: Vec<JobFile>,
    #[serde(default)]
    pub url: String,
    pub status: Status,
    #[serde(default)]
    pub status_message: Option<String>,
    pub create_time: i64,
    pub update_time: i64,
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub downloaded: bool,
}

impl DescribeJob {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.create_time)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.start_time.and_then(millis_to_datetime)
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.end_time.and_then(millis_to_datetime)
    }
}

/// A recurring job definition as reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescribeJobDefinition {
    pub job_definition_id: String,
    pub name: String,
    pub input_filename: String,
    pub runtime_environment_name: String,
    #[serde(default)]
    pub runtime_environment_parameters: Option<RuntimeEnvironmentParameters>,
    #[serde(default)]
    pub parameters: Option<Parameters>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub output_formats: Option<Vec<String>>,
    #[serde(default)]
    pub compute_type: Option<String>,
    #[serde(default)]
    pub output_filename_template: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    pub create_time: i64,
    pub update_time: i64,
    pub active: bool,
}

impl DescribeJobDefinition {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.create_time)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListJobsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_definition_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub sort_by: Vec<SortField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListJobsResponse {
    #[serde(default)]
    pub jobs: Vec<DescribeJob>,
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListJobDefinitionsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<i64>,
    #[serde(default)]
    pub sort_by: Vec<SortField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListJobDefinitionsResponse {
    #[serde(default)]
    pub job_definitions: Vec<DescribeJobDefinition>,
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub total_count: u64,
}

/// Request body for `POST jobs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateJob {
    pub name: String,
    pub input_uri: String,
    pub runtime_environment_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_environment_parameters: Option<RuntimeEnvironmentParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_definition_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_formats: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<EmailNotifications>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_retry_interval_millis: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_on_timeout: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_filename_template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub job_id: String,
}

/// Request body for `POST job_definitions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateJobDefinition {
    pub name: String,
    pub input_uri: String,
    pub runtime_environment_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_environment_parameters: Option<RuntimeEnvironmentParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_formats: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_filename_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateJobDefinitionResponse {
    pub job_definition_id: String,
}

/// Request body for `POST job_definitions/{id}/jobs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateJobFromDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
}

/// Request body for `PATCH job_definitions/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateJobDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFormat {
    pub name: String,
    pub label: String,
}

/// An execution environment offered by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeEnvironment {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub file_extensions: Vec<String>,
    #[serde(default)]
    pub output_formats: Vec<OutputFormat>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub compute_types: Option<Vec<String>>,
    #[serde(default)]
    pub default_compute_type: Option<String>,
    /// Whether schedules on this environment are interpreted in UTC only.
    #[serde(default)]
    pub utc_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_parse() {
        for status in [
            Status::Created,
            Status::Queued,
            Status::InProgress,
            Status::Completed,
            Status::Failed,
            Status::Stopping,
            Status::Stopped,
        ] {
            let parsed: Status = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert_eq!("in_progress".parse::<Status>().unwrap(), Status::InProgress);
        assert!("RUNNING".parse::<Status>().is_err());
    }

    #[test]
    fn status_wire_format() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }

    #[test]
    fn list_jobs_response_defaults() {
        let resp: ListJobsResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.jobs.is_empty());
        assert!(resp.next_token.is_none());
        assert_eq!(resp.total_count, 0);
    }

    #[test]
    fn describe_job_from_service_payload() {
        let payload = serde_json::json!({
            "job_id": "j-1",
            "name": "nightly",
            "input_filename": "report.ipynb",
            "runtime_environment_name": "python3",
            "status": "COMPLETED",
            "create_time": 1_700_000_000_000i64,
            "update_time": 1_700_000_100_000i64,
            "end_time": 1_700_000_100_000i64,
            "job_files": [{"display_name": "Notebook", "file_format": "ipynb"}]
        });
        let job: DescribeJob = serde_json::from_value(payload).unwrap();
        assert_eq!(job.status, Status::Completed);
        assert_eq!(job.job_files.len(), 1);
        assert!(job.started_at().is_none());
        assert_eq!(job.created_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn job_list_accepts_scalar_parameters() {
        let payload = serde_json::json!({
            "jobs": [{
                "job_id": "j-2",
                "name": "tuned",
                "input_filename": "train.ipynb",
                "runtime_environment_name": "python3",
                "parameters": { "n": 5, "flag": true, "label": "x" },
                "status": "QUEUED",
                "create_time": 1_700_000_000_000i64,
                "update_time": 1_700_000_000_000i64
            }],
            "total_count": 1
        });
        let resp: ListJobsResponse = serde_json::from_value(payload).unwrap();
        let params = resp.jobs[0].parameters.as_ref().unwrap();
        assert_eq!(params["n"], 5);
        assert_eq!(params["flag"], true);
        assert_eq!(params["label"], "x");
    }

    #[test]
    fn update_job_definition_skips_absent_fields() {
        let update = UpdateJobDefinition {
            active: Some(false),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "active": false }));
    }
}
