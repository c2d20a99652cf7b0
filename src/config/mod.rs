// ABOUTME: Configuration types and parsing for dirigent.yml.
// ABOUTME: Handles YAML parsing, director credentials, and plan definitions.

mod plan;

pub use plan::{ParamSpec, Plan, PlanConfig, PlanTemplates};

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "dirigent.yml";
pub const CONFIG_FILENAME_ALT: &str = "dirigent.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".dirigent/config.yml";

/// Broker configuration: identity, director endpoint, and plan catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Service identifier exposed in the catalog.
    pub broker_id: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    #[serde(default)]
    pub service_description: String,

    pub director: DirectorConfig,

    /// Root directory for per-instance deployment artifacts.
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,

    /// Directory holding manifest/bind/unbind template files.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    pub plans: HashMap<String, PlanConfig>,
}

/// Connection settings for the remote deployment director.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectorConfig {
    /// Director endpoint, e.g. `http://192.168.50.4:25555`.
    pub target: String,

    pub username: String,

    pub password: String,

    /// Per-request timeout for director calls.
    #[serde(default = "default_director_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_service_name() -> String {
    "dirigent".to_string()
}

fn default_workdir() -> PathBuf {
    PathBuf::from("deployments")
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_director_timeout() -> Duration {
    Duration::from_secs(30)
}

impl BrokerConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: BrokerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    fn validate(&self) -> Result<()> {
        if self.broker_id.is_empty() {
            return Err(Error::InvalidConfig("broker_id must not be empty".into()));
        }
        if self.plans.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one plan must be configured".into(),
            ));
        }
        for (id, plan) in &self.plans {
            if plan.manifest_template.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "plan {id} has an empty manifest_template"
                )));
            }
        }
        Ok(())
    }
}
