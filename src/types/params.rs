// ABOUTME: Parameter map and deployment naming shared across the broker.
// ABOUTME: Values are arbitrary JSON so plans can declare scalars or structures.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::InstanceId;

/// Template variable holding the deployment name, always system-derived.
pub const KEY_DEPLOYMENT_NAME: &str = "deployment_name";
/// Template variable holding the instance id, always system-derived.
pub const KEY_INSTANCE_ID: &str = "instance_id";
/// Template variable holding the director identity token.
pub const KEY_DIRECTOR_UUID: &str = "director_uuid";
/// Template variable holding the director principal.
pub const KEY_BOSH_USER: &str = "bosh_user";
/// Template variable holding the director secret.
pub const KEY_BOSH_PASSWORD: &str = "bosh_password";

/// The five keys the broker injects into every template, overriding any
/// caller-supplied value of the same name.
pub const SYSTEM_KEYS: [&str; 5] = [
    KEY_DEPLOYMENT_NAME,
    KEY_INSTANCE_ID,
    KEY_DIRECTOR_UUID,
    KEY_BOSH_USER,
    KEY_BOSH_PASSWORD,
];

/// Resolved parameters for one instance: plan defaults, generated values,
/// caller input, and system-injected keys, keyed by parameter name.
///
/// Backed by an ordered map so rendering and serialization are deterministic
/// for a given resolution result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, Value>);

impl ParameterSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Insert a value, replacing any existing value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Insert a value only if the name is not already present.
    ///
    /// This is the resolver's idempotence primitive: defaults and generated
    /// values never clobber caller input or a prior resolution pass.
    pub fn set_if_absent(&mut self, name: impl Into<String>, value: Value) {
        self.0.entry(name.into()).or_insert(value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<serde_json::Map<String, Value>> for ParameterSet {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

/// Name of the remote deployment backing one instance.
///
/// Derived deterministically from the instance id so retries and deletion
/// address the same deployment without any stored mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DeploymentName(String);

const DEPLOYMENT_PREFIX: &str = "deployment";

impl DeploymentName {
    pub fn for_instance(instance: &InstanceId) -> Self {
        Self(format!("{DEPLOYMENT_PREFIX}{instance}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeploymentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
