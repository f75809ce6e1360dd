//! State of the create-job form and the requests it submits.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::name::{name_error, name_from_input_file};
use super::options::JobOptions;
use super::params::ParameterList;
use crate::api::SchedulerClient;
use crate::environments::{EnvironmentCatalog, default_compute_type};
use crate::error::{Error, FormError};
use crate::models::{
    CreateJob, CreateJobDefinition, OutputFormat, RuntimeEnvironment, RuntimeEnvironmentParameters,
};
use crate::schedule::{ScheduleEdit, ScheduleSpec};

/// Whether the form runs the notebook once or creates a recurring definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CreateType {
    #[default]
    Job,
    JobDefinition,
}

/// What a successful submission created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Created {
    Job { job_id: String, name: String },
    JobDefinition { job_definition_id: String, name: String },
}

#[derive(Debug, Clone)]
pub struct CreateJobModel {
    job_name: String,
    name_error: String,
    pub input_file: String,
    environment: String,
    available_formats: Vec<OutputFormat>,
    pub compute_type: Option<String>,
    output_formats: Vec<String>,
    pub tags: Vec<String>,
    pub parameters: ParameterList,
    pub runtime_environment_parameters: Option<RuntimeEnvironmentParameters>,
    pub create_type: CreateType,
    pub schedule: ScheduleSpec,
    pub options: JobOptions,
    idempotency_token: String,
    local_timezone: String,
}

impl CreateJobModel {
    /// A form for `input_file`, named after the file. No environment is
    /// selected yet.
    pub fn new(input_file: impl Into<String>, local_timezone: impl Into<String>) -> Self {
        let input_file = input_file.into();
        let local_timezone = local_timezone.into();
        let job_name = name_from_input_file(&input_file);
        Self {
            name_error: name_error(&job_name),
            job_name,
            input_file,
            environment: String::new(),
            available_formats: Vec::new(),
            compute_type: None,
            output_formats: Vec::new(),
            tags: Vec::new(),
            parameters: ParameterList::new(),
            runtime_environment_parameters: None,
            create_type: CreateType::Job,
            schedule: ScheduleSpec::new(local_timezone.clone()),
            options: JobOptions::default(),
            idempotency_token: Uuid::new_v4().to_string(),
            local_timezone,
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn set_job_name(&mut self, name: impl Into<String>) {
        self.job_name = name.into();
        self.name_error = name_error(&self.job_name);
    }

    /// Error for the job name; empty when valid.
    pub fn job_name_error(&self) -> &str {
        &self.name_error
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn output_formats(&self) -> &[String] {
        &self.output_formats
    }

    pub fn available_output_formats(&self) -> &[OutputFormat] {
        &self.available_formats
    }

    pub fn idempotency_token(&self) -> &str {
        &self.idempotency_token
    }

    /// Select `env`: its default compute type, all of its output formats, and
    /// its timezone policy.
    pub fn select_environment(&mut self, env: &RuntimeEnvironment) {
        self.environment = env.name.clone();
        self.compute_type = default_compute_type(env);
        self.available_formats = env.output_formats.clone();
        self.output_formats = env.output_formats.iter().map(|f| f.name.clone()).collect();
        self.schedule.apply_environment(env.utc_only, &self.local_timezone);
        debug!(
            env = %env.name,
            compute_type = ?self.compute_type,
            utc_only = env.utc_only,
            "Environment selected"
        );
    }

    pub async fn select_environment_by_name(
        &mut self,
        catalog: &EnvironmentCatalog,
        name: &str,
    ) -> Result<(), Error> {
        let env = catalog
            .get(name)
            .await?
            .ok_or_else(|| FormError::UnknownEnvironment {
                name: name.to_string(),
            })?;
        self.select_environment(env);
        Ok(())
    }

    /// Select the catalog's first environment if none is selected yet.
    pub async fn ensure_environment(&mut self, catalog: &EnvironmentCatalog) -> Result<(), Error> {
        if !self.environment.is_empty() {
            return Ok(());
        }
        if let Some(env) = catalog.first().await? {
            self.select_environment(env);
        } else {
            warn!("No runtime environments available");
        }
        Ok(())
    }

    /// Check or uncheck an output format. Formats the environment does not
    /// offer cannot be checked. Returns whether the selection changed.
    pub fn set_output_format(&mut self, format: &str, checked: bool) -> bool {
        let selected = self.output_formats.iter().any(|f| f == format);
        match (checked, selected) {
            (true, false) => {
                if !self.available_formats.iter().any(|f| f.name == format) {
                    return false;
                }
                self.output_formats.push(format.to_string());
                true
            }
            (false, true) => {
                self.output_formats.retain(|f| f != format);
                true
            }
            _ => false,
        }
    }

    pub fn edit_schedule(&mut self, edit: ScheduleEdit) {
        self.schedule.apply(edit);
    }

    /// Every current error as `(field, message)`. Schedule errors only count
    /// for job definitions, notification and retry errors only for jobs.
    pub fn errors(&self) -> Vec<(String, String)> {
        let mut errors = Vec::new();
        if !self.name_error.is_empty() {
            errors.push(("job_name".to_string(), self.name_error.clone()));
        }
        for (id, message) in self.parameters.errors() {
            errors.push((id.to_string(), message.to_string()));
        }
        match self.create_type {
            CreateType::JobDefinition => {
                for (field, message) in self.schedule.errors().iter() {
                    errors.push((field.as_str().to_string(), message.to_string()));
                }
            }
            CreateType::Job => {
                for (field, message) in self.options.errors() {
                    errors.push((field.to_string(), message));
                }
            }
        }
        errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    fn check(&mut self) -> Result<(), FormError> {
        self.parameters.validate();
        let errors = self.errors();
        if errors.is_empty() {
            return Ok(());
        }
        Err(FormError::FieldErrors {
            fields: errors.into_iter().map(|(field, _)| field).collect(),
        })
    }

    fn parameters_for_request(&self) -> Option<crate::models::Parameters> {
        (!self.parameters.is_empty()).then(|| self.parameters.to_parameters())
    }

    fn tags_for_request(&self) -> Option<Vec<String>> {
        (!self.tags.is_empty()).then(|| self.tags.clone())
    }

    pub fn build_create_job(&mut self) -> Result<CreateJob, FormError> {
        self.check()?;
        Ok(CreateJob {
            name: self.job_name.clone(),
            input_uri: self.input_file.clone(),
            runtime_environment_name: self.environment.clone(),
            runtime_environment_parameters: self.runtime_environment_parameters.clone(),
            idempotency_token: Some(self.idempotency_token.clone()),
            job_definition_id: None,
            parameters: self.parameters_for_request(),
            tags: self.tags_for_request(),
            output_formats: Some(self.output_formats.clone()),
            compute_type: self.compute_type.clone(),
            email_notifications: self.options.notifications.to_email_notifications(),
            timeout_seconds: self.options.timeout_seconds(),
            max_retries: self.options.max_retries(),
            min_retry_interval_millis: self.options.min_retry_interval_millis(),
            retry_on_timeout: self.options.retry_on_timeout(),
            output_filename_template: self.options.output_filename_template(),
        })
    }

    pub fn build_create_job_definition(&mut self) -> Result<CreateJobDefinition, FormError> {
        self.check()?;
        Ok(CreateJobDefinition {
            name: self.job_name.clone(),
            input_uri: self.input_file.clone(),
            runtime_environment_name: self.environment.clone(),
            runtime_environment_parameters: self.runtime_environment_parameters.clone(),
            parameters: self.parameters_for_request(),
            tags: self.tags_for_request(),
            output_formats: Some(self.output_formats.clone()),
            compute_type: self.compute_type.clone(),
            output_filename_template: self.options.output_filename_template(),
            schedule: Some(self.schedule.cron_expression().to_string()),
            timezone: Some(self.schedule.timezone.clone()),
        })
    }

    /// Validate and send the request matching `create_type`.
    pub async fn submit(&mut self, client: &SchedulerClient) -> Result<Created, Error> {
        match self.create_type {
            CreateType::Job => {
                let request = self.build_create_job()?;
                let response = client.create_job(&request).await?;
                Ok(Created::Job {
                    job_id: response.job_id,
                    name: request.name,
                })
            }
            CreateType::JobDefinition => {
                let request = self.build_create_job_definition()?;
                let response = client.create_job_definition(&request).await?;
                info!(schedule = %self.schedule.description(), "Scheduled notebook");
                Ok(Created::JobDefinition {
                    job_definition_id: response.job_definition_id,
                    name: request.name,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::options::{NotificationEvent, TIMEOUT_ERROR};
    use crate::schedule::{PRESETS, ScheduleInterval};

    fn env(name: &str, utc_only: bool) -> RuntimeEnvironment {
        RuntimeEnvironment {
            name: name.into(),
            label: name.into(),
            description: String::new(),
            file_extensions: vec!["ipynb".into()],
            output_formats: vec![
                OutputFormat {
                    name: "ipynb".into(),
                    label: "Notebook".into(),
                },
                OutputFormat {
                    name: "html".into(),
                    label: "HTML".into(),
                },
            ],
            metadata: None,
            compute_types: Some(vec!["cpu".into(), "gpu".into()]),
            default_compute_type: Some("gpu".into()),
            utc_only,
        }
    }

    #[test]
    fn new_form_is_named_after_input() {
        let model = CreateJobModel::new("reports/weekly.ipynb", "Europe/Berlin");
        assert_eq!(model.job_name(), "weekly");
        assert_eq!(model.job_name_error(), "");
        assert_eq!(model.schedule.timezone, "Europe/Berlin");
        assert!(!model.idempotency_token().is_empty());
    }

    #[test]
    fn environment_selection_sets_defaults() {
        let mut model = CreateJobModel::new("a.ipynb", "America/New_York");
        model.select_environment(&env("python3", false));
        assert_eq!(model.environment(), "python3");
        assert_eq!(model.compute_type.as_deref(), Some("gpu"));
        assert_eq!(model.output_formats(), ["ipynb", "html"]);
        assert_eq!(model.schedule.timezone, "America/New_York");
    }

    #[test]
    fn utc_only_environment_forces_utc() {
        let mut model = CreateJobModel::new("a.ipynb", "Asia/Tokyo");
        model.select_environment(&env("python3", false));

        model.select_environment(&env("cloud", true));
        assert_eq!(model.schedule.timezone, "UTC");
        model.edit_schedule(ScheduleEdit::Timezone("Asia/Tokyo".into()));
        assert_eq!(model.schedule.timezone, "UTC");

        model.select_environment(&env("local", false));
        assert_eq!(model.schedule.timezone, "Asia/Tokyo");
    }

    #[test]
    fn output_format_toggling() {
        let mut model = CreateJobModel::new("a.ipynb", "UTC");
        model.select_environment(&env("python3", false));

        assert!(model.set_output_format("html", false));
        assert_eq!(model.output_formats(), ["ipynb"]);
        assert!(!model.set_output_format("html", false));
        assert!(model.set_output_format("html", true));
        assert!(!model.set_output_format("pdf", true));
        assert_eq!(model.output_formats(), ["ipynb", "html"]);
    }

    #[test]
    fn invalid_name_blocks_submission() {
        let mut model = CreateJobModel::new("a.ipynb", "UTC");
        model.select_environment(&env("python3", false));
        model.set_job_name("");
        assert_eq!(model.job_name_error(), "You must specify a name");

        let err = model.build_create_job().unwrap_err();
        assert!(matches!(err, FormError::FieldErrors { ref fields } if fields == &["job_name"]));

        model.set_job_name("nightly");
        let job = model.build_create_job().unwrap();
        assert_eq!(job.name, "nightly");
        assert_eq!(job.compute_type.as_deref(), Some("gpu"));
        assert_eq!(job.idempotency_token.as_deref(), Some(model.idempotency_token()));
        assert!(job.parameters.is_none());
    }

    #[test]
    fn blank_parameter_blocks_submission() {
        let mut model = CreateJobModel::new("a.ipynb", "UTC");
        let id = model.parameters.add();
        assert!(model.build_create_job().is_err());

        model.parameters.set_name(id, "alpha");
        model.parameters.set_value(id, "1");
        let job = model.build_create_job().unwrap();
        assert_eq!(job.parameters.unwrap()["alpha"], "1");
    }

    #[test]
    fn schedule_errors_only_count_for_definitions() {
        let mut model = CreateJobModel::new("a.ipynb", "UTC");
        model.edit_schedule(ScheduleEdit::Interval(ScheduleInterval::Custom));
        model.edit_schedule(ScheduleEdit::Cron("not cron".into()));
        assert!(!model.has_errors());

        model.create_type = CreateType::JobDefinition;
        assert!(model.has_errors());
        assert!(model.build_create_job_definition().is_err());

        model.edit_schedule(ScheduleEdit::Preset(PRESETS[1]));
        let definition = model.build_create_job_definition().unwrap();
        assert_eq!(definition.schedule.as_deref(), Some("* */6 * * *"));
        assert_eq!(definition.timezone.as_deref(), Some("UTC"));
    }

    #[test]
    fn job_options_reach_the_request() {
        let mut model = CreateJobModel::new("a.ipynb", "UTC");
        model.select_environment(&env("python3", false));
        model.options.timeout_seconds = "soon".into();
        let err = model.build_create_job().unwrap_err();
        assert!(matches!(err, FormError::FieldErrors { ref fields } if fields == &["timeout_seconds"]));
        assert!(model.errors().iter().any(|(_, message)| message == TIMEOUT_ERROR));

        model.options.timeout_seconds = "600".into();
        model.options.max_retries = "2".into();
        model.options.min_retry_interval_millis = "30000".into();
        model.options.retry_on_timeout = true;
        model.options.output_filename_template = "{{input_filename}}-{{create_time}}".into();
        model.options.notifications.set_send_to("ops@example.com");
        model.options.notifications.add_event(NotificationEvent::Failure);

        let job = model.build_create_job().unwrap();
        let body = serde_json::to_value(&job).unwrap();
        assert_eq!(body["timeout_seconds"], 600);
        assert_eq!(body["max_retries"], 2);
        assert_eq!(body["min_retry_interval_millis"], 30000);
        assert_eq!(body["retry_on_timeout"], true);
        assert_eq!(body["output_filename_template"], "{{input_filename}}-{{create_time}}");
        assert_eq!(
            body["email_notifications"],
            serde_json::json!({
                "on_failure": ["ops@example.com"],
                "no_alert_for_skipped_rows": true
            })
        );
    }

    #[test]
    fn definitions_ignore_job_only_options() {
        let mut model = CreateJobModel::new("a.ipynb", "UTC");
        model.create_type = CreateType::JobDefinition;
        model.options.max_retries = "many".into();
        model.options.output_filename_template = "{{name}}".into();
        assert!(!model.has_errors());

        let definition = model.build_create_job_definition().unwrap();
        assert_eq!(definition.output_filename_template.as_deref(), Some("{{name}}"));
        let body = serde_json::to_value(&definition).unwrap();
        assert!(body.get("max_retries").is_none());
    }

    #[tokio::test]
    async fn unknown_environment_is_rejected() {
        let catalog = EnvironmentCatalog::preloaded(vec![env("python3", false)]);
        let mut model = CreateJobModel::new("a.ipynb", "UTC");

        model.ensure_environment(&catalog).await.unwrap();
        assert_eq!(model.environment(), "python3");

        let err = model
            .select_environment_by_name(&catalog, "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Form(FormError::UnknownEnvironment { .. })));
    }
}
