// ABOUTME: Parameter resolution: plan defaults, generated values, system keys.
// ABOUTME: Pure over its inputs plus a randomness source; idempotent for present keys.

use serde_json::Value;
use uuid::Uuid;

use crate::config::ParamSpec;
use crate::types::{
    DeploymentName, InstanceId, KEY_BOSH_PASSWORD, KEY_BOSH_USER, KEY_DEPLOYMENT_NAME,
    KEY_DIRECTOR_UUID, KEY_INSTANCE_ID, ParameterSet,
};

/// Resolution failure: the caller omitted a parameter with no default and no
/// generation policy.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("required parameter {0} is not set")]
    MissingRequiredParameter(String),
}

/// System-derived values injected into every parameter set.
///
/// These always overwrite caller-supplied values of the same name.
#[derive(Debug, Clone, Copy)]
pub struct SystemIdentity<'a> {
    pub director_uuid: &'a str,
    pub director_user: &'a str,
    pub director_password: &'a str,
}

/// Resolve the parameter set for one instance.
///
/// For each declared parameter absent from `params`: use the default if one
/// exists, else generate a fresh UUIDv4 if marked random, else leave unset if
/// optional, else fail naming the parameter. Already-present keys are never
/// overwritten, so resolving an already-resolved set changes nothing.
/// Afterwards the five system keys are set unconditionally.
///
/// Fails on the first missing required parameter without partially
/// committing: the input set is consumed and a fresh result returned only on
/// success.
pub fn resolve(
    instance: &InstanceId,
    mut params: ParameterSet,
    specs: &[ParamSpec],
    identity: &SystemIdentity<'_>,
) -> Result<ParameterSet, ResolveError> {
    for spec in specs {
        if params.contains(&spec.name) {
            continue;
        }
        if let Some(default) = &spec.default {
            params.set(&spec.name, default.clone());
        } else if spec.random {
            params.set(&spec.name, Value::String(Uuid::new_v4().to_string()));
        } else if !spec.optional {
            return Err(ResolveError::MissingRequiredParameter(spec.name.clone()));
        }
    }

    params.set(
        KEY_DEPLOYMENT_NAME,
        Value::String(DeploymentName::for_instance(instance).as_str().to_string()),
    );
    params.set(KEY_INSTANCE_ID, Value::String(instance.to_string()));
    params.set(
        KEY_DIRECTOR_UUID,
        Value::String(identity.director_uuid.to_string()),
    );
    params.set(
        KEY_BOSH_USER,
        Value::String(identity.director_user.to_string()),
    );
    params.set(
        KEY_BOSH_PASSWORD,
        Value::String(identity.director_password.to_string()),
    );

    Ok(params)
}
