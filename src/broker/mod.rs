// ABOUTME: Deployment orchestrator: turns provisioning requests into director tasks.
// ABOUTME: Exports the broker, its operations, the rollout states, and catalog types.

mod catalog;
mod error;
mod rollout;

pub use catalog::{Service, ServicePlan};
pub use error::BrokerError;
pub use rollout::{
    ArtifactsRendered, Deployed, ManifestWritten, ReleaseUploaded, Resolved, Rollout,
    StemcellUploaded,
};

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::info;

use crate::config::{BrokerConfig, Plan};
use crate::director::{DirectorClient, OperationState};
use crate::error::Result;
use crate::exec::ScriptExecutor;
use crate::params::{self, SystemIdentity};
use crate::registry::{InstanceRegistry, ServiceInstance};
use crate::template::{MODE_SCRIPT, Renderer};
use crate::types::{BindingId, DeploymentName, InstanceId, ParameterSet, PlanId, TaskId};

/// Credential set returned by a successful bind.
pub type Credentials = serde_json::Map<String, serde_json::Value>;

/// The broker core: resolves parameters, renders artifacts, drives the
/// director, and tracks instances in the registry.
///
/// Operations on distinct instance ids run concurrently; operations on one
/// id are serialized by the per-instance mutex held across the whole
/// operation. Provision registers its instance only after the director
/// accepted the deployment, mirroring the original workflow.
pub struct Broker<D, E> {
    config: BrokerConfig,
    plans: HashMap<PlanId, Plan>,
    renderer: Renderer,
    registry: InstanceRegistry,
    director: D,
    executor: E,
    director_uuid: String,
}

impl<D: DirectorClient, E: ScriptExecutor> Broker<D, E> {
    /// Compile all plan templates and fetch the director identity.
    ///
    /// Any unreadable or malformed template aborts startup; plans are
    /// immutable afterwards.
    pub async fn connect(config: BrokerConfig, director: D, executor: E) -> Result<Self> {
        let mut renderer = Renderer::new();
        let mut plans = HashMap::new();
        for (id, plan_config) in &config.plans {
            let id = PlanId::new(id.clone())?;
            let plan = Plan::compile(
                id.clone(),
                plan_config,
                &config.templates_dir,
                &mut renderer,
            )?;
            plans.insert(id, plan);
        }

        let director_info = director.info().await?;
        info!(
            uuid = %director_info.uuid,
            plans = plans.len(),
            "connected to deployment director"
        );

        Ok(Self {
            config,
            plans,
            renderer,
            registry: InstanceRegistry::new(),
            director,
            executor,
            director_uuid: director_info.uuid,
        })
    }

    /// The service definition this broker advertises.
    pub fn catalog(&self) -> Service {
        let mut plans: Vec<ServicePlan> = self
            .plans
            .values()
            .map(|p| ServicePlan {
                id: p.id.clone(),
                name: p.name.clone(),
                description: p.description.clone(),
            })
            .collect();
        plans.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));

        Service {
            id: self.config.broker_id.clone(),
            name: self.config.service_name.clone(),
            description: self.config.service_description.clone(),
            bindable: true,
            plan_updatable: false,
            plans,
        }
    }

    /// Provision a new instance: resolve, render, upload, deploy, register.
    ///
    /// Returns the director task handle; the caller polls `last_operation`
    /// for completion. A failure anywhere in the chain aborts later steps and
    /// leaves earlier uploads in place for an idempotent retry.
    pub async fn provision(
        &self,
        id: &InstanceId,
        plan_id: &PlanId,
        caller_params: ParameterSet,
    ) -> std::result::Result<TaskId, BrokerError> {
        let plan = self.plan(plan_id)?;
        let (task, params) = self.deploy_instance(id, plan, caller_params).await?;

        self.registry.put(
            id.clone(),
            ServiceInstance {
                plan: plan.id.clone(),
                params,
                last_task: task.clone(),
            },
        );

        info!(instance = %id, plan = %plan_id, task = %task, "provision accepted");
        Ok(task)
    }

    /// Redeploy an existing instance with its stored parameter set.
    ///
    /// Caller parameters from the update request are not merged; the
    /// already-resolved set is reused and the task handle replaced.
    pub async fn update(&self, id: &InstanceId) -> std::result::Result<TaskId, BrokerError> {
        let entry = self.registry.get(id)?;
        let mut instance = entry.lock().await;

        let plan = self.plan(&instance.plan)?;
        let (task, params) = self
            .deploy_instance(id, plan, instance.params.clone())
            .await?;

        instance.params = params;
        instance.last_task = task.clone();

        info!(instance = %id, task = %task, "update accepted");
        Ok(task)
    }

    /// Delete the instance's local artifacts, then its remote deployment.
    ///
    /// A missing local directory is fine; any other filesystem error aborts
    /// before the remote call. The registry entry is kept so the deletion
    /// task can still be polled.
    pub async fn deprovision(&self, id: &InstanceId) -> std::result::Result<TaskId, BrokerError> {
        let entry = self.registry.get(id)?;
        let mut instance = entry.lock().await;

        let dir = self.instance_dir(id);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(BrokerError::Cleanup {
                    path: dir.display().to_string(),
                    source,
                });
            }
        }

        let task = self
            .director
            .delete_deployment(&DeploymentName::for_instance(id))
            .await?;
        instance.last_task = task.clone();

        info!(instance = %id, task = %task, "deprovision accepted");
        Ok(task)
    }

    /// Poll the instance's current task and map it to an operation state.
    pub async fn last_operation(
        &self,
        id: &InstanceId,
    ) -> std::result::Result<OperationState, BrokerError> {
        let entry = self.registry.get(id)?;
        let task = entry.lock().await.last_task.clone();

        let state = self.director.task_status(&task).await?;
        Ok(state.operation())
    }

    /// Render and run the plan's bind script, returning its credentials.
    ///
    /// The script must print a single JSON object to stdout; anything else
    /// fails the bind. Binding is independent of deployment task state.
    pub async fn bind(
        &self,
        id: &InstanceId,
        binding: &BindingId,
    ) -> std::result::Result<Credentials, BrokerError> {
        let entry = self.registry.get(id)?;
        let instance = entry.lock().await;

        let plan = self.plan(&instance.plan)?;
        let template = plan
            .templates
            .bind
            .as_ref()
            .ok_or_else(|| BrokerError::NotBindable(plan.id.clone()))?;

        let path = self.script_path(id, binding, "bind");
        self.renderer
            .render_to_file(template, &instance.params, &path, MODE_SCRIPT)?;

        let output = self.executor.run(&path).await?;
        let credentials: Credentials =
            serde_json::from_slice(&output.stdout).map_err(|e| BrokerError::Credentials {
                message: e.to_string(),
            })?;

        info!(instance = %id, binding = %binding, "bind succeeded");
        Ok(credentials)
    }

    /// Run the plan's unbind script if one is configured.
    ///
    /// No unbind template is a deliberate no-op success. Output is discarded;
    /// only the exit status matters.
    pub async fn unbind(
        &self,
        id: &InstanceId,
        binding: &BindingId,
    ) -> std::result::Result<(), BrokerError> {
        let entry = self.registry.get(id)?;
        let instance = entry.lock().await;

        let plan = self.plan(&instance.plan)?;
        let Some(template) = plan.templates.unbind.as_ref() else {
            return Ok(());
        };

        let path = self.script_path(id, binding, "unbind");
        self.renderer
            .render_to_file(template, &instance.params, &path, MODE_SCRIPT)?;
        self.executor.run(&path).await?;

        info!(instance = %id, binding = %binding, "unbind succeeded");
        Ok(())
    }

    /// Run the full rollout chain for one instance.
    async fn deploy_instance(
        &self,
        id: &InstanceId,
        plan: &Plan,
        params: ParameterSet,
    ) -> std::result::Result<(TaskId, ParameterSet), BrokerError> {
        let identity = SystemIdentity {
            director_uuid: &self.director_uuid,
            director_user: &self.config.director.username,
            director_password: &self.config.director.password,
        };
        let params = params::resolve(id, params, &plan.params, &identity)?;

        let rollout = Rollout::new(params, self.manifest_path(id))
            .write_manifest(&self.renderer, &plan.templates.manifest)?
            .render_descriptors(
                &self.renderer,
                &plan.templates.release,
                &plan.templates.stemcell,
            )?
            .upload_stemcell(&self.director)
            .await?
            .upload_release(&self.director)
            .await?
            .deploy(&self.director)
            .await?;

        Ok(rollout.finish())
    }

    fn plan(&self, id: &PlanId) -> std::result::Result<&Plan, BrokerError> {
        self.plans
            .get(id)
            .ok_or_else(|| BrokerError::UnknownPlan(id.clone()))
    }

    fn instance_dir(&self, id: &InstanceId) -> PathBuf {
        self.config.workdir.join(id.as_str())
    }

    fn manifest_path(&self, id: &InstanceId) -> PathBuf {
        self.instance_dir(id).join("manifest.yml")
    }

    fn script_path(&self, id: &InstanceId, binding: &BindingId, kind: &str) -> PathBuf {
        self.instance_dir(id).join(format!("{binding}_{kind}.sh"))
    }
}
