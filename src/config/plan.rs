// ABOUTME: Plan configuration: parameter specs and template references.
// ABOUTME: Compiles raw plan config into registered templates at startup.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::template::{Renderer, TemplateRef};
use crate::types::PlanId;

/// Declaration of one plan parameter.
///
/// Resolution order for a parameter absent from caller input: default value,
/// then random generation, then optional (left unset). A parameter with none
/// of the three is required.
#[derive(Debug, Clone, Deserialize)]
pub struct ParamSpec {
    pub name: String,

    /// Default value of arbitrary JSON shape.
    #[serde(default)]
    pub default: Option<Value>,

    /// Generate a fresh 128-bit random identifier when absent.
    #[serde(default)]
    pub random: bool,

    /// Leave unset when absent instead of failing resolution.
    #[serde(default)]
    pub optional: bool,
}

/// Raw plan entry as it appears in the broker configuration file.
///
/// Manifest, bind, and unbind templates are files under the templates
/// directory; release and stemcell descriptors are inline template strings.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub manifest_template: String,

    #[serde(default)]
    pub bind_template: Option<String>,

    #[serde(default)]
    pub unbind_template: Option<String>,

    pub release: String,

    pub stemcell: String,

    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

/// Compiled templates for one plan, registered with the shared renderer.
#[derive(Debug, Clone)]
pub struct PlanTemplates {
    pub manifest: TemplateRef,
    pub bind: Option<TemplateRef>,
    pub unbind: Option<TemplateRef>,
    pub release: TemplateRef,
    pub stemcell: TemplateRef,
}

/// A plan ready for use: immutable for the process lifetime once compiled.
#[derive(Debug, Clone)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    pub templates: PlanTemplates,
}

impl Plan {
    /// Load template files, compile everything, and register with the renderer.
    ///
    /// Any unreadable or malformed template is a configuration error and
    /// aborts broker startup.
    pub fn compile(
        id: PlanId,
        config: &PlanConfig,
        templates_dir: &Path,
        renderer: &mut Renderer,
    ) -> Result<Self> {
        let register_file = |renderer: &mut Renderer, kind: &str, file: &str| -> Result<TemplateRef> {
            let path = templates_dir.join(file);
            let source = std::fs::read_to_string(&path)
                .map_err(|source| Error::TemplateLoad { path, source })?;
            Ok(renderer.register(&format!("{id}/{kind}"), &source)?)
        };

        let manifest = register_file(renderer, "manifest", &config.manifest_template)?;
        let bind = config
            .bind_template
            .as_deref()
            .map(|f| register_file(renderer, "bind", f))
            .transpose()?;
        let unbind = config
            .unbind_template
            .as_deref()
            .map(|f| register_file(renderer, "unbind", f))
            .transpose()?;

        let release = renderer.register(&format!("{id}/release"), &config.release)?;
        let stemcell = renderer.register(&format!("{id}/stemcell"), &config.stemcell)?;

        Ok(Plan {
            id,
            name: config.name.clone(),
            description: config.description.clone(),
            params: config.params.clone(),
            templates: PlanTemplates {
                manifest,
                bind,
                unbind,
                release,
                stemcell,
            },
        })
    }
}
