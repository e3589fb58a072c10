use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::workflow::WorkflowPolicy;

/// Main configuration structure for the comment workflow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrereviewWorkflowConfig {
    /// Workflow rules
    pub workflow: WorkflowSettings,
    /// Where comment states are kept
    pub store: StoreConfig,
    /// External publication settings
    pub publishing: PublishingConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowSettings {
    /// Require a verified contact email before a comment can be finalized
    pub require_verified_email: bool,
}

impl From<&WorkflowSettings> for WorkflowPolicy {
    fn from(settings: &WorkflowSettings) -> Self {
        WorkflowPolicy {
            require_verified_email: settings.require_verified_email,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Filesystem,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Which store implementation to use
    pub backend: StoreBackend,
    /// Directory for the filesystem backend
    pub directory: String,
    /// Database URL for the sqlite backend
    pub database_url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Enable automatic migrations
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublishingConfig {
    /// Upper bound on a single call to the publication service
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level / filter directive
    pub log_level: String,
    /// Emit JSON log lines instead of compact text
    pub json_logs: bool,
}

impl Default for PrereviewWorkflowConfig {
    fn default() -> Self {
        Self {
            workflow: WorkflowSettings {
                require_verified_email: true,
            },
            store: StoreConfig {
                backend: StoreBackend::Filesystem,
                directory: ".prereview-workflow/comments".to_string(),
                database_url: "sqlite://.prereview-workflow/comments.db".to_string(),
                max_connections: 10,
                auto_migrate: true,
            },
            publishing: PublishingConfig {
                timeout_seconds: 60,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
        }
    }
}

impl PrereviewWorkflowConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (prereview-workflow.toml, .prereview-workflow-rc)
    /// 3. Environment variables (prefixed with PREREVIEW_WORKFLOW__)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if Path::new("prereview-workflow.toml").exists() {
            builder = builder.add_source(File::with_name("prereview-workflow"));
        }

        if Path::new(".prereview-workflow-rc").exists() {
            builder = builder.add_source(
                File::with_name(".prereview-workflow-rc").format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("PREREVIEW_WORKFLOW")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Policy handed to the workflow engine
    pub fn policy(&self) -> WorkflowPolicy {
        WorkflowPolicy::from(&self.workflow)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<PrereviewWorkflowConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = PrereviewWorkflowConfig::load_env_file();
        PrereviewWorkflowConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static PrereviewWorkflowConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let config = config()?;
    tracing::info!(
        store = ?config.store.backend,
        require_verified_email = config.workflow.require_verified_email,
        "Configuration loaded successfully"
    );
    Ok(())
}
