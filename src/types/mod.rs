// ABOUTME: Core identifier and parameter types shared across the broker.
// ABOUTME: Exports phantom-typed ids, the parameter map, and deployment naming.

mod id;
mod params;

pub use id::{BindingId, Id, IdError, InstanceId, PlanId, TaskId};
pub use params::{
    DeploymentName, KEY_BOSH_PASSWORD, KEY_BOSH_USER, KEY_DEPLOYMENT_NAME, KEY_DIRECTOR_UUID,
    KEY_INSTANCE_ID, ParameterSet, SYSTEM_KEYS,
};
