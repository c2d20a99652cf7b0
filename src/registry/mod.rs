// ABOUTME: In-memory instance registry, the single source of instance state.
// ABOUTME: Per-instance mutexes serialize writers for one id across await points.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::types::{InstanceId, ParameterSet, PlanId, TaskId};

/// One provisioned instance: owning plan, resolved parameters, and the handle
/// of the most recent director task. Starting a new deployment or deletion
/// replaces the handle; there is no history of earlier tasks.
#[derive(Debug)]
pub struct ServiceInstance {
    pub plan: PlanId,
    pub params: ParameterSet,
    pub last_task: TaskId,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("instance not found: {0}")]
    NotFound(InstanceId),
}

/// Registry of live instances.
///
/// The outer map lock is held only for lookups and insertions; each instance
/// carries its own async mutex so operations on one id are strictly
/// serialized while distinct ids proceed concurrently. Not durable: process
/// restart loses all instance state.
#[derive(Default)]
pub struct InstanceRegistry {
    inner: RwLock<HashMap<InstanceId, Arc<Mutex<ServiceInstance>>>>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance, replacing any existing entry for the id.
    pub fn put(&self, id: InstanceId, instance: ServiceInstance) {
        self.inner
            .write()
            .insert(id, Arc::new(Mutex::new(instance)));
    }

    /// Look up an instance. Unknown ids are a caller error, distinct from any
    /// director failure.
    pub fn get(&self, id: &InstanceId) -> Result<Arc<Mutex<ServiceInstance>>, RegistryError> {
        self.inner
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    pub fn contains(&self, id: &InstanceId) -> bool {
        self.inner.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
