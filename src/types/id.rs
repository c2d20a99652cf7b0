// ABOUTME: Validated, phantom-typed identifiers for instances, bindings, plans, and tasks.
// ABOUTME: Ids name files under the workdir, so construction rejects path-hostile values.

use serde::{Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum InstanceMarker {}
pub enum BindingMarker {}
pub enum PlanMarker {}
pub enum TaskMarker {}

/// Rejected identifier value.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    #[error("identifier must not be empty")]
    Empty,

    #[error("identifier {0:?} contains a path separator")]
    PathSeparator(String),

    #[error("identifier {0:?} is a reserved path component")]
    Reserved(String),
}

/// A validated identifier, tagged by kind so an `InstanceId` can never be
/// passed where a `TaskId` is expected.
///
/// Instance and binding ids are interpolated into artifact paths
/// (`deployments/<instance>/<binding>_bind.sh`), so every id must be a
/// single non-empty path component: no separators, not `.` or `..`. The
/// same rule applies to all kinds; plan ids and director task handles are
/// plain tokens anyway.
#[must_use = "IDs reference resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    /// Validate and wrap an identifier value.
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        if value.is_empty() {
            return Err(IdError::Empty);
        }
        if value.contains(['/', '\\']) {
            return Err(IdError::PathSeparator(value));
        }
        if value == "." || value == ".." {
            return Err(IdError::Reserved(value));
        }
        Ok(Self {
            value,
            _marker: PhantomData,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

// Manual trait implementations so the marker type needs no bounds.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Id({:?})", self.value)
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

/// Caller-assigned identifier of one provisioned service instance.
pub type InstanceId = Id<InstanceMarker>;
/// Caller-assigned identifier of one binding on an instance.
pub type BindingId = Id<BindingMarker>;
/// Operator-assigned plan identifier from the broker configuration.
pub type PlanId = Id<PlanMarker>;
/// Opaque handle for one asynchronous director task.
pub type TaskId = Id<TaskMarker>;
