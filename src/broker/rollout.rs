// ABOUTME: Deployment rollout using the type state pattern.
// ABOUTME: Enforces resolve -> render -> upload -> deploy ordering at compile time.

use std::marker::PhantomData;
use std::path::PathBuf;

use crate::director::{DirectorClient, DirectorError};
use crate::template::{MODE_MANIFEST, RenderError, Renderer, TemplateRef};
use crate::types::{ParameterSet, TaskId};

/// Initial state: parameters resolved, nothing rendered yet.
/// Available actions: `write_manifest()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolved;

/// Manifest rendered and persisted to the instance directory.
/// Available actions: `render_descriptors()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestWritten;

/// Release and stemcell descriptors rendered in memory.
/// Available actions: `upload_stemcell()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactsRendered;

/// Stemcell descriptor accepted by the director.
/// Available actions: `upload_release()`
#[derive(Debug, Clone, Copy, Default)]
pub struct StemcellUploaded;

/// Release descriptor accepted by the director.
/// Available actions: `deploy()`
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseUploaded;

/// Terminal state: the director accepted the manifest and returned a task.
/// Available actions: `task()`, `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Deployed;

/// One deployment workflow for an instance, parameterized by its state.
///
/// Every transition consumes `self` and no step can run before its
/// predecessor succeeded, which is exactly the ordering contract the
/// director requires: stemcell before release, release before deploy.
/// Nothing is rolled back on failure; completed uploads stay in place and
/// a retried rollout re-renders and re-uploads idempotently.
#[derive(Debug)]
pub struct Rollout<S> {
    params: ParameterSet,
    manifest_path: PathBuf,
    release: Option<Vec<u8>>,
    stemcell: Option<Vec<u8>>,
    task: Option<TaskId>,
    _state: PhantomData<S>,
}

impl<S> Rollout<S> {
    /// Internal helper to transition to a new state.
    fn transition<T>(self) -> Rollout<T> {
        Rollout {
            params: self.params,
            manifest_path: self.manifest_path,
            release: self.release,
            stemcell: self.stemcell,
            task: self.task,
            _state: PhantomData,
        }
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn manifest_path(&self) -> &std::path::Path {
        &self.manifest_path
    }
}

impl Rollout<Resolved> {
    /// Start a rollout from a fully resolved parameter set.
    pub fn new(params: ParameterSet, manifest_path: PathBuf) -> Self {
        Rollout {
            params,
            manifest_path,
            release: None,
            stemcell: None,
            task: None,
            _state: PhantomData,
        }
    }

    /// Render the deployment manifest and persist it non-executable.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` on unresolved placeholders or persistence failure.
    #[must_use = "rollout state must be used"]
    pub fn write_manifest(
        self,
        renderer: &Renderer,
        template: &TemplateRef,
    ) -> Result<Rollout<ManifestWritten>, RenderError> {
        renderer.render_to_file(template, &self.params, &self.manifest_path, MODE_MANIFEST)?;
        Ok(self.transition())
    }
}

impl Rollout<ManifestWritten> {
    /// Render the release and stemcell descriptors in memory.
    ///
    /// Both render before either upload starts, so a rendering failure never
    /// leaves a half-uploaded artifact pair behind.
    #[must_use = "rollout state must be used"]
    pub fn render_descriptors(
        mut self,
        renderer: &Renderer,
        release: &TemplateRef,
        stemcell: &TemplateRef,
    ) -> Result<Rollout<ArtifactsRendered>, RenderError> {
        self.release = Some(renderer.render(release, &self.params)?);
        self.stemcell = Some(renderer.render(stemcell, &self.params)?);
        Ok(self.transition())
    }
}

impl Rollout<ArtifactsRendered> {
    /// Upload the stemcell descriptor. Must complete before the release upload.
    #[must_use = "rollout state must be used"]
    pub async fn upload_stemcell<D: DirectorClient>(
        self,
        director: &D,
    ) -> Result<Rollout<StemcellUploaded>, DirectorError> {
        let descriptor = self.stemcell.as_deref().expect("stemcell must be rendered");
        director.upload_stemcell(descriptor).await?;
        Ok(self.transition())
    }
}

impl Rollout<StemcellUploaded> {
    /// Upload the release descriptor. Must complete before deploy.
    #[must_use = "rollout state must be used"]
    pub async fn upload_release<D: DirectorClient>(
        self,
        director: &D,
    ) -> Result<Rollout<ReleaseUploaded>, DirectorError> {
        let descriptor = self.release.as_deref().expect("release must be rendered");
        director.upload_release(descriptor).await?;
        Ok(self.transition())
    }
}

impl Rollout<ReleaseUploaded> {
    /// Hand the manifest to the director and capture the task handle.
    ///
    /// This is the handoff step: the deployment itself runs asynchronously on
    /// the director and is tracked through the returned task.
    #[must_use = "rollout state must be used"]
    pub async fn deploy<D: DirectorClient>(
        mut self,
        director: &D,
    ) -> Result<Rollout<Deployed>, DirectorError> {
        let task = director.deploy(&self.manifest_path).await?;
        self.task = Some(task);
        Ok(self.transition())
    }
}

impl Rollout<Deployed> {
    /// Get the handle of the director task driving this deployment.
    pub fn task(&self) -> &TaskId {
        self.task.as_ref().expect("deployed rollout must have task")
    }

    /// Consume the rollout and return the task handle with the parameter set
    /// to store on the instance.
    pub fn finish(self) -> (TaskId, ParameterSet) {
        let task = self.task.expect("deployed rollout must have task");
        (task, self.params)
    }
}
