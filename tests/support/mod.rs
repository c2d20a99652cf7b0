// ABOUTME: Shared test support: recording mock director, fake executor, config builders.
// ABOUTME: Keeps broker tests free of real networks, processes, and directors.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use dirigent::config::{BrokerConfig, DirectorConfig, ParamSpec, PlanConfig};
use dirigent::director::{DirectorClient, DirectorError, DirectorInfo, TaskState};
use dirigent::exec::{ExecError, ScriptExecutor, ScriptOutput};
use dirigent::types::{DeploymentName, TaskId};

pub const DIRECTOR_UUID: &str = "11111111-2222-3333-4444-555555555555";

/// One recorded director call, in invocation order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    UploadStemcell,
    UploadRelease,
    Deploy(PathBuf),
    DeleteDeployment(String),
    TaskStatus(String),
}

#[derive(Default)]
struct MockDirectorInner {
    calls: Mutex<Vec<Call>>,
    /// Wire status string returned by task_status, parsed like the real client.
    status: Mutex<String>,
    fail_stemcell_upload: AtomicBool,
    fail_release_upload: AtomicBool,
    next_task: AtomicU64,
}

/// Recording director double. Clones share state, so a test can hand one
/// clone to the broker and keep another for assertions.
#[derive(Clone)]
pub struct MockDirector {
    inner: Arc<MockDirectorInner>,
}

impl MockDirector {
    pub fn new() -> Self {
        let inner = MockDirectorInner {
            status: Mutex::new("done".to_string()),
            ..Default::default()
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn set_status(&self, status: &str) {
        *self.inner.status.lock().unwrap() = status.to_string();
    }

    pub fn fail_release_upload(&self) {
        self.inner.fail_release_upload.store(true, Ordering::SeqCst);
    }

    pub fn fail_stemcell_upload(&self) {
        self.inner
            .fail_stemcell_upload
            .store(true, Ordering::SeqCst);
    }

    fn record(&self, call: Call) {
        self.inner.calls.lock().unwrap().push(call);
    }

    fn next_task(&self) -> TaskId {
        let n = self.inner.next_task.fetch_add(1, Ordering::SeqCst) + 1;
        TaskId::new(n.to_string()).unwrap()
    }
}

#[async_trait]
impl DirectorClient for MockDirector {
    async fn info(&self) -> Result<DirectorInfo, DirectorError> {
        Ok(DirectorInfo {
            uuid: DIRECTOR_UUID.to_string(),
        })
    }

    async fn upload_stemcell(&self, _descriptor: &[u8]) -> Result<(), DirectorError> {
        self.record(Call::UploadStemcell);
        if self.inner.fail_stemcell_upload.load(Ordering::SeqCst) {
            return Err(DirectorError::Http {
                status: 500,
                message: "stemcell upload rejected".to_string(),
            });
        }
        Ok(())
    }

    async fn upload_release(&self, _descriptor: &[u8]) -> Result<(), DirectorError> {
        self.record(Call::UploadRelease);
        if self.inner.fail_release_upload.load(Ordering::SeqCst) {
            return Err(DirectorError::Http {
                status: 500,
                message: "release upload rejected".to_string(),
            });
        }
        Ok(())
    }

    async fn deploy(&self, manifest_path: &Path) -> Result<TaskId, DirectorError> {
        self.record(Call::Deploy(manifest_path.to_path_buf()));
        Ok(self.next_task())
    }

    async fn delete_deployment(&self, name: &DeploymentName) -> Result<TaskId, DirectorError> {
        self.record(Call::DeleteDeployment(name.as_str().to_string()));
        Ok(self.next_task())
    }

    async fn task_status(&self, task: &TaskId) -> Result<TaskState, DirectorError> {
        self.record(Call::TaskStatus(task.as_str().to_string()));
        let status = self.inner.status.lock().unwrap().clone();
        TaskState::parse(&status)
    }
}

/// Script executor double returning canned output without spawning anything.
#[derive(Clone)]
pub struct FakeExecutor {
    stdout: Vec<u8>,
    fail: bool,
    runs: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeExecutor {
    pub fn succeeding(stdout: &[u8]) -> Self {
        Self {
            stdout: stdout.to_vec(),
            fail: false,
            runs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            stdout: Vec::new(),
            fail: true,
            runs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn runs(&self) -> Vec<PathBuf> {
        self.runs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScriptExecutor for FakeExecutor {
    async fn run(&self, path: &Path) -> Result<ScriptOutput, ExecError> {
        self.runs.lock().unwrap().push(path.to_path_buf());
        if self.fail {
            return Err(ExecError::Failed {
                path: path.display().to_string(),
                exit_code: 3,
                stderr: "boom".to_string(),
            });
        }
        Ok(ScriptOutput {
            stdout: self.stdout.clone(),
            exit_code: 0,
        })
    }
}

/// Write a template file under the templates directory and return its name.
pub fn write_template(templates_dir: &Path, name: &str, contents: &str) -> String {
    std::fs::create_dir_all(templates_dir).unwrap();
    std::fs::write(templates_dir.join(name), contents).unwrap();
    name.to_string()
}

pub fn required(name: &str) -> ParamSpec {
    ParamSpec {
        name: name.to_string(),
        default: None,
        random: false,
        optional: false,
    }
}

pub fn with_default(name: &str, value: serde_json::Value) -> ParamSpec {
    ParamSpec {
        name: name.to_string(),
        default: Some(value),
        random: false,
        optional: false,
    }
}

pub fn random(name: &str) -> ParamSpec {
    ParamSpec {
        name: name.to_string(),
        default: None,
        random: true,
        optional: false,
    }
}

pub fn optional(name: &str) -> ParamSpec {
    ParamSpec {
        name: name.to_string(),
        default: None,
        random: false,
        optional: true,
    }
}

/// Minimal plan: manifest from a file, inline descriptors, no scripts.
pub fn base_plan(manifest_file: &str, params: Vec<ParamSpec>) -> PlanConfig {
    PlanConfig {
        name: "small".to_string(),
        description: "test plan".to_string(),
        manifest_template: manifest_file.to_string(),
        bind_template: None,
        unbind_template: None,
        release: "release-for-{{deployment_name}}".to_string(),
        stemcell: "stemcell-for-{{deployment_name}}".to_string(),
        params,
    }
}

/// Broker config rooted in a temp directory, with one plan under `plan_id`.
pub fn broker_config(root: &Path, plan_id: &str, plan: PlanConfig) -> BrokerConfig {
    let mut plans = HashMap::new();
    plans.insert(plan_id.to_string(), plan);

    BrokerConfig {
        broker_id: "test-broker".to_string(),
        service_name: "dirigent".to_string(),
        service_description: "test broker".to_string(),
        director: DirectorConfig {
            target: "http://127.0.0.1:25555".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            timeout: Duration::from_secs(5),
        },
        workdir: root.join("deployments"),
        templates_dir: root.join("templates"),
        plans,
    }
}
