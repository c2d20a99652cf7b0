// ABOUTME: Deployment director abstraction: uploads, deploys, task polling.
// ABOUTME: Exports the client trait, task states, and the HTTP implementation.

mod error;
mod http;

pub use error::{DirectorError, DirectorErrorKind};
pub use http::HttpDirector;

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

use crate::types::{DeploymentName, TaskId};

/// State of one asynchronous director task, as reported on the wire.
///
/// The wire enumeration is closed: `queued`, `processing`, `done`, `fail`.
/// Anything else is a protocol violation, not a fifth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Processing,
    Done,
    Failed,
}

impl TaskState {
    /// Parse a wire status string, rejecting anything outside the known set.
    pub fn parse(status: &str) -> Result<Self, DirectorError> {
        match status {
            "queued" => Ok(TaskState::Queued),
            "processing" => Ok(TaskState::Processing),
            "done" => Ok(TaskState::Done),
            "fail" => Ok(TaskState::Failed),
            other => Err(DirectorError::UnknownTaskStatus {
                status: other.to_string(),
            }),
        }
    }

    /// Map a task state to the caller-visible operation state.
    pub fn operation(self) -> OperationState {
        match self {
            TaskState::Queued | TaskState::Processing => OperationState::InProgress,
            TaskState::Done => OperationState::Succeeded,
            TaskState::Failed => OperationState::Failed,
        }
    }
}

/// Caller-visible status of an asynchronous provision/update/deprovision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    InProgress,
    Succeeded,
    Failed,
}

/// Identity advertised by the director, fetched once at startup.
#[derive(Debug, Clone)]
pub struct DirectorInfo {
    pub uuid: String,
}

/// Client for the remote deployment director.
///
/// All operations perform network I/O and may block for seconds. Uploads must
/// treat "already exists" responses as success so a retried workflow is
/// idempotent across partial progress.
#[async_trait]
pub trait DirectorClient: Send + Sync {
    /// Fetch the director's identity.
    async fn info(&self) -> Result<DirectorInfo, DirectorError>;

    /// Upload a stemcell descriptor. Re-uploading an existing stemcell is
    /// not an error.
    async fn upload_stemcell(&self, descriptor: &[u8]) -> Result<(), DirectorError>;

    /// Upload a release descriptor. Re-uploading an existing release is not
    /// an error.
    async fn upload_release(&self, descriptor: &[u8]) -> Result<(), DirectorError>;

    /// Submit the manifest at `manifest_path` for deployment, returning the
    /// handle of the director task driving it.
    async fn deploy(&self, manifest_path: &Path) -> Result<TaskId, DirectorError>;

    /// Request deletion of a deployment, returning the deletion task handle.
    async fn delete_deployment(&self, name: &DeploymentName) -> Result<TaskId, DirectorError>;

    /// Query the state of a previously returned task.
    async fn task_status(&self, task: &TaskId) -> Result<TaskState, DirectorError>;
}
