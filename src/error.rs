// ABOUTME: Application-wide error types for dirigent.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown plan: {0}")]
    UnknownPlan(String),

    #[error("invalid identifier: {0}")]
    Id(#[from] crate::types::IdError),

    #[error("template {path} could not be loaded: {source}")]
    TemplateLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("template error: {0}")]
    Template(#[from] crate::template::RenderError),

    #[error("director error: {0}")]
    Director(#[from] crate::director::DirectorError),

    #[error("broker error: {0}")]
    Broker(#[from] crate::broker::BrokerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON parameters: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
