// ABOUTME: Director error types with SNAFU pattern.
// ABOUTME: Distinguishes transport, HTTP, protocol, and task-status failures.

use snafu::Snafu;

/// Failure talking to the deployment director.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DirectorError {
    #[snafu(display("director request failed: {message}"))]
    Transport { message: String },

    #[snafu(display("director returned HTTP {status}: {message}"))]
    Http { status: u16, message: String },

    #[snafu(display("malformed director response: {message}"))]
    Response { message: String },

    /// The director reported a task status outside the known enumeration.
    /// Never mapped to success or failure; surfaced so operators can detect
    /// protocol drift.
    #[snafu(display("unknown task status: {status:?}"))]
    UnknownTaskStatus { status: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorErrorKind {
    /// Network-level failure reaching the director.
    Transport,
    /// The director answered with a non-success HTTP status.
    Http,
    /// The response body or headers could not be interpreted.
    Protocol,
    /// Task polling returned a status outside the known enumeration.
    UnknownTaskStatus,
}

impl DirectorError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DirectorErrorKind {
        match self {
            DirectorError::Transport { .. } => DirectorErrorKind::Transport,
            DirectorError::Http { .. } => DirectorErrorKind::Http,
            DirectorError::Response { .. } => DirectorErrorKind::Protocol,
            DirectorError::UnknownTaskStatus { .. } => DirectorErrorKind::UnknownTaskStatus,
        }
    }
}
