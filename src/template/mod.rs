// ABOUTME: Artifact renderer adapter over the handlebars template engine.
// ABOUTME: Renders manifests, descriptors, and bind/unbind scripts from parameter maps.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use handlebars::Handlebars;

use crate::types::ParameterSet;

/// Permission bits for persisted deployment manifests.
pub const MODE_MANIFEST: u32 = 0o640;
/// Permission bits for persisted bind/unbind scripts.
pub const MODE_SCRIPT: u32 = 0o755;

/// Errors from template compilation, rendering, or artifact persistence.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The template source failed to compile. Fatal at startup.
    #[error("template {name:?} failed to compile: {source}")]
    Compile {
        name: String,
        source: Box<handlebars::TemplateError>,
    },

    /// Rendering failed, typically an unresolved placeholder in strict mode.
    #[error("template {name:?} failed to render: {source}")]
    Render {
        name: String,
        source: Box<handlebars::RenderError>,
    },

    /// A rendered artifact could not be written to disk.
    #[error("failed to persist artifact {path}: {source}")]
    Persist {
        path: String,
        source: std::io::Error,
    },
}

/// Handle to a template registered with a [`Renderer`].
///
/// Holding a `TemplateRef` proves the source compiled at configuration time,
/// so rendering can only fail on unresolved placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef(String);

impl TemplateRef {
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Strict-mode handlebars engine holding all compiled plan templates.
///
/// Strict mode makes any placeholder absent from the parameter map a render
/// error instead of an empty substitution, which is what the deployment
/// workflow relies on to abort before any remote call.
pub struct Renderer {
    registry: Handlebars<'static>,
}

impl Renderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        Self { registry }
    }

    /// Compile and register a template source under a unique name.
    ///
    /// Compilation failure is a configuration error and should abort broker
    /// startup.
    pub fn register(&mut self, name: &str, source: &str) -> Result<TemplateRef, RenderError> {
        self.registry
            .register_template_string(name, source)
            .map_err(|e| RenderError::Compile {
                name: name.to_string(),
                source: Box::new(e),
            })?;
        Ok(TemplateRef(name.to_string()))
    }

    /// Render a registered template against the parameter map.
    pub fn render(
        &self,
        template: &TemplateRef,
        params: &ParameterSet,
    ) -> Result<Vec<u8>, RenderError> {
        self.registry
            .render(&template.0, params)
            .map(String::into_bytes)
            .map_err(|e| RenderError::Render {
                name: template.0.clone(),
                source: Box::new(e),
            })
    }

    /// Render a template and persist it with the exact requested mode bits.
    ///
    /// Parent directories are created as needed. Scripts must be persisted
    /// executable and manifests must not be, so the mode is caller-supplied.
    pub fn render_to_file(
        &self,
        template: &TemplateRef,
        params: &ParameterSet,
        path: &Path,
        mode: u32,
    ) -> Result<(), RenderError> {
        let rendered = self.render(template, params)?;

        let persist_err = |source| RenderError::Persist {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(persist_err)?;
        }
        fs::write(path, rendered).map_err(persist_err)?;
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(persist_err)?;

        Ok(())
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
