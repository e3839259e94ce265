use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::poll::PollPolicy;

/// Configuration file structure for the pipeline runner.
///
/// Every field has a default, so an absent or partial file is valid.
/// Command-line flags and environment variables take precedence over
/// anything loaded here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Azure DevOps organization settings
    #[serde(default)]
    pub azure: AzureConfig,

    /// Parameters used when creating missing resources
    #[serde(default)]
    pub provisioning: ProvisioningConfig,

    /// Run polling parameters
    #[serde(default)]
    pub poll: PollConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AzureConfig {
    /// Organization URL (e.g., 'https://dev.azure.com/myorg')
    pub organization: Option<String>,

    /// Agent pool the pipeline is authorized against
    #[serde(default = "default_agent_pool")]
    pub agent_pool: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProvisioningConfig {
    /// Visibility of newly created projects
    #[serde(default)]
    pub visibility: Visibility,

    /// Process template for newly created projects
    #[serde(default = "default_process_template_id")]
    pub process_template_id: String,

    /// Directory holding pipeline definitions, relative to the working directory
    #[serde(default = "default_pipeline_dir")]
    pub pipeline_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollConfig {
    /// Seconds between run status checks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Seconds before an unfinished run is cancelled
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            organization: None,
            agent_pool: default_agent_pool(),
        }
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            visibility: Visibility::Private,
            process_template_id: default_process_template_id(),
            pipeline_dir: default_pipeline_dir(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl PollConfig {
    /// Converts the configured seconds into a [`PollPolicy`].
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is zero.
    pub fn policy(&self) -> Result<PollPolicy> {
        ensure!(
            self.interval_secs > 0,
            "Poll interval must be at least one second"
        );

        Ok(PollPolicy::new(
            Duration::from_secs(self.interval_secs),
            Duration::from_secs(self.timeout_secs),
        ))
    }
}

fn default_agent_pool() -> String {
    "Default".to_string()
}

// Agile
fn default_process_template_id() -> String {
    "adcc42ab-9882-485e-a3ed-7678f01f66bc".to_string()
}

fn default_pipeline_dir() -> PathBuf {
    PathBuf::from("test/pipeline")
}

fn default_interval_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    900
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./pipeline-runner.toml
    /// 3. ./pipeline-runner.json
    /// 4. ./pipeline-runner.yaml
    /// 5. ./pipeline-runner.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "pipeline-runner.toml",
            "pipeline-runner.json",
            "pipeline-runner.yaml",
            "pipeline-runner.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}
