use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use whispercart_agent::{AgentRuntime, RemoteModelError};
use whispercart_core::config::{AppConfig, ConfigError, LoadOptions};

pub struct Application {
    pub config: AppConfig,
    pub agent_runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("remote model client setup failed: {0}")]
    RemoteModel(#[from] RemoteModelError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let agent_runtime = Arc::new(AgentRuntime::from_config(&config)?);
    info!(
        event_name = "system.bootstrap.runtime_ready",
        correlation_id = "bootstrap",
        remote_model = agent_runtime.remote_model().unwrap_or("none"),
        offer_polish = agent_runtime.polisher().unwrap_or("none"),
        "agent runtime constructed"
    );

    Ok(Application { config, agent_runtime })
}
