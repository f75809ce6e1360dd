//! Runtime environment catalog, fetched once per catalog and shared by the
//! form model and the CLI.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::api::SchedulerClient;
use crate::error::ApiError;
use crate::models::{OutputFormat, RuntimeEnvironment};

/// Where the environment list comes from.
#[async_trait]
pub trait EnvironmentSource: Send + Sync {
    async fn list_environments(&self) -> Result<Vec<RuntimeEnvironment>, ApiError>;
}

#[async_trait]
impl EnvironmentSource for SchedulerClient {
    async fn list_environments(&self) -> Result<Vec<RuntimeEnvironment>, ApiError> {
        self.runtime_environments().await
    }
}

pub struct EnvironmentCatalog {
    source: Arc<dyn EnvironmentSource>,
    environments: OnceCell<Vec<RuntimeEnvironment>>,
}

impl EnvironmentCatalog {
    pub fn new(source: Arc<dyn EnvironmentSource>) -> Self {
        Self {
            source,
            environments: OnceCell::new(),
        }
    }

    /// A catalog that never fetches.
    pub fn preloaded(environments: Vec<RuntimeEnvironment>) -> Self {
        Self {
            source: Arc::new(NoSource),
            environments: OnceCell::new_with(Some(environments)),
        }
    }

    /// All environments. The first successful call fetches; a failed fetch is
    /// not cached, so the next call retries.
    pub async fn environments(&self) -> Result<&[RuntimeEnvironment], ApiError> {
        let list = self
            .environments
            .get_or_try_init(|| async {
                let list = self.source.list_environments().await?;
                info!(count = list.len(), "Loaded runtime environments");
                Ok::<_, ApiError>(list)
            })
            .await?;
        Ok(list)
    }

    pub async fn get(&self, name: &str) -> Result<Option<&RuntimeEnvironment>, ApiError> {
        Ok(self.environments().await?.iter().find(|env| env.name == name))
    }

    /// The environment a new form starts with.
    pub async fn first(&self) -> Result<Option<&RuntimeEnvironment>, ApiError> {
        Ok(self.environments().await?.first())
    }

    pub async fn output_formats(&self, name: &str) -> Result<Vec<OutputFormat>, ApiError> {
        Ok(self
            .get(name)
            .await?
            .map(|env| env.output_formats.clone())
            .unwrap_or_default())
    }

    pub async fn utc_only(&self, name: &str) -> Result<bool, ApiError> {
        Ok(self.get(name).await?.is_some_and(|env| env.utc_only))
    }

    pub async fn default_compute_type(&self, name: &str) -> Result<Option<String>, ApiError> {
        Ok(self.get(name).await?.and_then(default_compute_type))
    }
}

/// The environment's own default when it is one of its compute types,
/// otherwise the first listed compute type.
pub fn default_compute_type(env: &RuntimeEnvironment) -> Option<String> {
    let types = env.compute_types.as_deref()?;
    match &env.default_compute_type {
        Some(default) if types.contains(default) => Some(default.clone()),
        Some(default) => {
            debug!(env = %env.name, default = %default, "Default compute type not offered; using first");
            types.first().cloned()
        }
        None => types.first().cloned(),
    }
}

struct NoSource;

#[async_trait]
impl EnvironmentSource for NoSource {
    async fn list_environments(&self) -> Result<Vec<RuntimeEnvironment>, ApiError> {
        Ok(Vec::new())
    }
}
