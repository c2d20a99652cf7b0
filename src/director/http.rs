// ABOUTME: HTTP implementation of the director client using hyper.
// ABOUTME: One short-lived http1 connection per request with basic auth.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{AUTHORIZATION, CONTENT_TYPE, HOST, LOCATION};
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::DirectorConfig;
use crate::types::{DeploymentName, TaskId};

use super::error::DirectorError;
use super::{DirectorClient, DirectorInfo, TaskState};

const DEFAULT_PORT: u16 = 25555;

/// Director client over plain HTTP with basic auth.
///
/// Transport security is handled outside the broker (tunnel or trusted
/// network), so only `http` targets are accepted.
pub struct HttpDirector {
    host: String,
    port: u16,
    auth_header: String,
    timeout: Duration,
}

impl HttpDirector {
    pub fn new(config: &DirectorConfig) -> Result<Self, DirectorError> {
        let uri: hyper::Uri = config
            .target
            .parse()
            .map_err(|e| DirectorError::Transport {
                message: format!("invalid director target {:?}: {e}", config.target),
            })?;

        match uri.scheme_str() {
            Some("http") | None => {}
            Some(other) => {
                return Err(DirectorError::Transport {
                    message: format!("unsupported director scheme {other:?}, expected http"),
                });
            }
        }

        let host = uri
            .host()
            .ok_or_else(|| DirectorError::Transport {
                message: format!("director target {:?} has no host", config.target),
            })?
            .to_string();
        let port = uri.port_u16().unwrap_or(DEFAULT_PORT);

        let credentials = BASE64.encode(format!("{}:{}", config.username, config.password));

        Ok(Self {
            host,
            port,
            auth_header: format!("Basic {credentials}"),
            timeout: config.timeout,
        })
    }

    /// Issue one request on a fresh connection and collect the full response.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Bytes,
    ) -> Result<DirectorResponse, DirectorError> {
        tokio::time::timeout(self.timeout, self.request_inner(method, path, body))
            .await
            .map_err(|_| DirectorError::Transport {
                message: format!("director did not answer within {:?}", self.timeout),
            })?
    }

    async fn request_inner(
        &self,
        method: Method,
        path: &str,
        body: Bytes,
    ) -> Result<DirectorResponse, DirectorError> {
        let transport = |message: String| DirectorError::Transport { message };

        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| transport(format!("failed to connect to director: {e}")))?;
        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| transport(format!("HTTP handshake failed: {e}")))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::warn!("director connection error: {e}");
            }
        });

        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(HOST, &self.host)
            .header(AUTHORIZATION, &self.auth_header);
        if !body.is_empty() {
            builder = builder.header(CONTENT_TYPE, "text/yaml");
        }
        let request = builder
            .body(Full::new(body))
            .map_err(|e| transport(format!("failed to build request: {e}")))?;

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| transport(format!("request failed: {e}")))?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| transport(format!("failed to read response: {e}")))?
            .to_bytes();

        Ok(DirectorResponse {
            status,
            location,
            body,
        })
    }

    /// Upload an artifact descriptor, treating "already exists" as success.
    async fn upload(&self, path: &str, descriptor: &[u8]) -> Result<(), DirectorError> {
        let response = self
            .request(Method::POST, path, Bytes::copy_from_slice(descriptor))
            .await?;

        if response.status.is_success() || response.is_already_exists() {
            return Ok(());
        }
        Err(response.into_http_error())
    }
}

struct DirectorResponse {
    status: StatusCode,
    location: Option<String>,
    body: Bytes,
}

impl DirectorResponse {
    fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Re-uploading a present release/stemcell must not fail the workflow.
    fn is_already_exists(&self) -> bool {
        self.status == StatusCode::CONFLICT
            || self.body_text().to_lowercase().contains("already exists")
    }

    fn into_http_error(self) -> DirectorError {
        DirectorError::Http {
            status: self.status.as_u16(),
            message: self.body_text(),
        }
    }

    /// Extract the task handle for an accepted asynchronous operation.
    ///
    /// The director answers with a redirect to `/tasks/{id}` or a JSON body
    /// carrying the task `id`.
    fn task_id(&self) -> Result<TaskId, DirectorError> {
        if !self.status.is_success() && !self.status.is_redirection() {
            return Err(DirectorError::Http {
                status: self.status.as_u16(),
                message: self.body_text(),
            });
        }

        let parse = |raw: &str| {
            TaskId::new(raw).map_err(|e| DirectorError::Response {
                message: format!("invalid task id in response: {e}"),
            })
        };

        if let Some(location) = &self.location
            && let Some(id) = location.rsplit('/').next().filter(|s| !s.is_empty())
        {
            return parse(id);
        }

        let value: serde_json::Value =
            serde_json::from_slice(&self.body).map_err(|e| DirectorError::Response {
                message: format!("task response is not JSON: {e}"),
            })?;
        match value.get("id") {
            Some(serde_json::Value::String(id)) => parse(id),
            Some(serde_json::Value::Number(id)) => parse(&id.to_string()),
            _ => Err(DirectorError::Response {
                message: "task response has no id field".to_string(),
            }),
        }
    }
}

#[async_trait]
impl DirectorClient for HttpDirector {
    async fn info(&self) -> Result<DirectorInfo, DirectorError> {
        let response = self.request(Method::GET, "/info", Bytes::new()).await?;
        if !response.status.is_success() {
            return Err(response.into_http_error());
        }

        let value: serde_json::Value =
            serde_json::from_slice(&response.body).map_err(|e| DirectorError::Response {
                message: format!("info response is not JSON: {e}"),
            })?;
        let uuid = value
            .get("uuid")
            .and_then(|v| v.as_str())
            .ok_or_else(|| DirectorError::Response {
                message: "info response has no uuid field".to_string(),
            })?;

        Ok(DirectorInfo {
            uuid: uuid.to_string(),
        })
    }

    async fn upload_stemcell(&self, descriptor: &[u8]) -> Result<(), DirectorError> {
        self.upload("/stemcells", descriptor).await
    }

    async fn upload_release(&self, descriptor: &[u8]) -> Result<(), DirectorError> {
        self.upload("/releases", descriptor).await
    }

    async fn deploy(&self, manifest_path: &Path) -> Result<TaskId, DirectorError> {
        let manifest =
            tokio::fs::read(manifest_path)
                .await
                .map_err(|e| DirectorError::Transport {
                    message: format!(
                        "failed to read manifest {}: {e}",
                        manifest_path.display()
                    ),
                })?;

        let response = self
            .request(Method::POST, "/deployments", Bytes::from(manifest))
            .await?;
        response.task_id()
    }

    async fn delete_deployment(&self, name: &DeploymentName) -> Result<TaskId, DirectorError> {
        let path = format!("/deployments/{}", urlencoding::encode(name.as_str()));
        let response = self.request(Method::DELETE, &path, Bytes::new()).await?;
        response.task_id()
    }

    async fn task_status(&self, task: &TaskId) -> Result<TaskState, DirectorError> {
        let path = format!("/tasks/{}", urlencoding::encode(task.as_str()));
        let response = self.request(Method::GET, &path, Bytes::new()).await?;
        if !response.status.is_success() {
            return Err(response.into_http_error());
        }

        let value: serde_json::Value =
            serde_json::from_slice(&response.body).map_err(|e| DirectorError::Response {
                message: format!("task response is not JSON: {e}"),
            })?;
        let state = value
            .get("state")
            .and_then(|v| v.as_str())
            .ok_or_else(|| DirectorError::Response {
                message: "task response has no state field".to_string(),
            })?;

        TaskState::parse(state)
    }
}
