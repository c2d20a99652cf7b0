// ABOUTME: Error types for broker operations.
// ABOUTME: Covers resolution, rendering, director, registry, and script failures.

use crate::director::DirectorError;
use crate::exec::ExecError;
use crate::params::ResolveError;
use crate::registry::RegistryError;
use crate::template::RenderError;
use crate::types::{InstanceId, PlanId};

/// Errors surfaced by provision/update/deprovision/bind/unbind/status calls.
///
/// Nothing is retried inside the broker; every failure propagates to the
/// immediate caller and earlier side effects (uploads) stay in place.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// Caller omitted a required parameter. Request error, no retry.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Template rendering failed; the operation aborted before any remote call.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The director call itself failed.
    #[error(transparent)]
    Director(#[from] DirectorError),

    /// Operation referenced an id absent from the registry. Request error.
    #[error("instance not found: {0}")]
    InstanceNotFound(InstanceId),

    /// Provision referenced a plan id absent from the configuration.
    #[error("unknown plan: {0}")]
    UnknownPlan(PlanId),

    /// Bind was requested against a plan with no bind template.
    #[error("plan {0} has no bind template configured")]
    NotBindable(PlanId),

    /// Bind/unbind script failed to run or exited non-zero.
    #[error(transparent)]
    Execution(#[from] ExecError),

    /// The bind script's stdout was not a single JSON object.
    #[error("bind script output is not a JSON object: {message}")]
    Credentials { message: String },

    /// Local artifact cleanup failed; remote deletion was not attempted.
    #[error("failed to remove deployment artifacts at {path}: {source}")]
    Cleanup {
        path: String,
        source: std::io::Error,
    },
}

impl From<RegistryError> for BrokerError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => BrokerError::InstanceNotFound(id),
        }
    }
}
