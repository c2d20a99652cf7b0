// ABOUTME: Catalog types describing the brokered service and its plans.
// ABOUTME: Consumed by whatever protocol adapter fronts the broker.

use serde::Serialize;

use crate::types::PlanId;

/// The single service definition this broker exposes.
#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub bindable: bool,
    pub plan_updatable: bool,
    pub plans: Vec<ServicePlan>,
}

/// Catalog entry for one configured plan.
#[derive(Debug, Clone, Serialize)]
pub struct ServicePlan {
    pub id: PlanId,
    pub name: String,
    pub description: String,
}
