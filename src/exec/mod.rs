// ABOUTME: External process capability for bind/unbind credential scripts.
// ABOUTME: Trait seam so tests can fake script execution without a process table.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Captured result of one script run.
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub stdout: Vec<u8>,
    pub exit_code: i32,
}

/// Errors from running a bind/unbind script.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to execute {path}: {source}")]
    Spawn {
        path: String,
        source: std::io::Error,
    },

    #[error("script {path} exited with code {exit_code}: {stderr}")]
    Failed {
        path: String,
        exit_code: i32,
        stderr: String,
    },
}

/// Capability to run a persisted script and capture its output.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    /// Run the script at `path`. A non-zero exit is an error; partial output
    /// from a failed run is discarded.
    async fn run(&self, path: &Path) -> Result<ScriptOutput, ExecError>;
}

/// Executor backed by real child processes.
pub struct ProcessExecutor;

#[async_trait]
impl ScriptExecutor for ProcessExecutor {
    async fn run(&self, path: &Path) -> Result<ScriptOutput, ExecError> {
        let path_display = path.display().to_string();

        tracing::debug!("running script {}", path_display);

        let output = Command::new(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                path: path_display.clone(),
                source,
            })?;

        // A killed-by-signal child has no code; report it as a failure.
        let exit_code = output.status.code().unwrap_or(-1);
        if !output.status.success() {
            return Err(ExecError::Failed {
                path: path_display,
                exit_code,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(ScriptOutput {
            stdout: output.stdout,
            exit_code,
        })
    }
}
