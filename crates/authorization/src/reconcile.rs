//! Convergence of live objects towards their recommended defaults.
//!
//! Every function compares an `expected` object with the `actual` one found
//! in the cluster and returns what has to be persisted. None of them perform
//! any I/O.

pub mod binding;
pub mod role;
pub mod scc;

pub use binding::{ReconcilableBinding, compute_updated_binding};
pub use role::{ReconcilableRole, compute_reconciled_role};
pub use scc::compute_updated_scc;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;
use tracing::{debug, info};

use crate::api::security::SecurityContextConstraints;

/// What has to be done to an object to reconcile it.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", content = "object", rename_all = "camelCase")]
pub enum ReconcileAction<T> {
    /// The object does not exist yet.
    Create(T),
    /// The object can be updated in place.
    Update(T),
    /// The object has an immutable field that changed: it must be deleted
    /// and created again.
    Recreate(T),
}

impl<T> ReconcileAction<T> {
    pub fn object(&self) -> &T {
        match self {
            ReconcileAction::Create(object)
            | ReconcileAction::Update(object)
            | ReconcileAction::Recreate(object) => object,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            ReconcileAction::Create(_) => "create",
            ReconcileAction::Update(_) => "update",
            ReconcileAction::Recreate(_) => "recreate",
        }
    }
}

fn name_of(metadata: &ObjectMeta) -> &str {
    metadata.name.as_deref().unwrap_or_default()
}

fn find_by_name<'a, T>(
    objects: &'a [T],
    name: &str,
    metadata: impl Fn(&T) -> &ObjectMeta,
) -> Option<&'a T> {
    objects
        .iter()
        .find(|object| name_of(metadata(*object)) == name)
}

/// Reconciles every expected role with the actual role of the same name.
/// Actual roles that are not expected are left alone.
pub fn reconcile_cluster_roles<R: ReconcilableRole>(
    expected: &[R],
    actual: &[R],
    union: bool,
) -> Vec<ReconcileAction<R>> {
    expected
        .iter()
        .filter_map(|expected_role| {
            let name = name_of(expected_role.metadata());
            match find_by_name(actual, name, R::metadata) {
                None => {
                    info!(role = name, "role is missing");
                    Some(ReconcileAction::Create(expected_role.clone()))
                }
                Some(actual_role) => {
                    let reconciled = compute_reconciled_role(expected_role, actual_role, union);
                    reconciled.map(ReconcileAction::Update)
                }
            }
        })
        .collect()
}

/// Reconciles every expected binding with the actual binding of the same
/// name. `exclude_subjects` are never added back to a binding.
pub fn reconcile_cluster_role_bindings<B: ReconcilableBinding>(
    expected: &[B],
    actual: &[B],
    exclude_subjects: &[B::Subject],
    union: bool,
) -> Vec<ReconcileAction<B>> {
    expected
        .iter()
        .filter_map(|expected_binding| {
            let name = name_of(expected_binding.metadata());
            let Some(actual_binding) = find_by_name(actual, name, B::metadata) else {
                info!(binding = name, "binding is missing");
                return Some(ReconcileAction::Create(expected_binding.clone()));
            };
            let merged =
                compute_updated_binding(expected_binding, actual_binding, exclude_subjects, union)?;
            if merged.role_ref() != actual_binding.role_ref() {
                info!(binding = name, "binding role reference changed");
                Some(ReconcileAction::Recreate(merged))
            } else {
                Some(ReconcileAction::Update(merged))
            }
        })
        .collect()
}

/// Reconciles every expected SCC with the actual SCC of the same name.
///
/// Updates carry the metadata of the actual SCC, so they can be applied on
/// top of it.
pub fn reconcile_sccs(
    expected: &[SecurityContextConstraints],
    actual: &[SecurityContextConstraints],
    union: bool,
) -> Vec<ReconcileAction<SecurityContextConstraints>> {
    expected
        .iter()
        .filter_map(|expected_scc| {
            let name = name_of(&expected_scc.metadata);
            let Some(actual_scc) = find_by_name(actual, name, |scc| &scc.metadata) else {
                info!(scc = name, "security context constraints are missing");
                return Some(ReconcileAction::Create(expected_scc.clone()));
            };
            let (mut merged, needs_update) = compute_updated_scc(expected_scc, actual_scc, union);
            if !needs_update {
                debug!(scc = name, "security context constraints are up to date");
                return None;
            }
            merged.metadata = actual_scc.metadata.clone();
            Some(ReconcileAction::Update(merged))
        })
        .collect()
}
