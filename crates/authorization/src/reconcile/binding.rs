use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::api::rbac::v1 as rbac;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::debug;

use crate::api::legacy;
use crate::subjects::diff_subjects;

/// A binding whose subjects can be reconciled against a recommended default.
pub trait ReconcilableBinding: Clone {
    type Subject: PartialEq + Clone;
    type RoleRef: PartialEq;

    fn metadata(&self) -> &ObjectMeta;
    fn subjects(&self) -> &[Self::Subject];
    fn set_subjects(&mut self, subjects: Vec<Self::Subject>);
    fn role_ref(&self) -> &Self::RoleRef;
}

macro_rules! legacy_binding {
    ($binding:ty) => {
        impl ReconcilableBinding for $binding {
            type Subject = ObjectReference;
            type RoleRef = ObjectReference;

            fn metadata(&self) -> &ObjectMeta {
                &self.metadata
            }

            fn subjects(&self) -> &[ObjectReference] {
                &self.subjects
            }

            fn set_subjects(&mut self, subjects: Vec<ObjectReference>) {
                self.subjects = subjects;
            }

            fn role_ref(&self) -> &ObjectReference {
                &self.role_ref
            }
        }
    };
}

macro_rules! rbac_binding {
    ($binding:ty) => {
        impl ReconcilableBinding for $binding {
            type Subject = rbac::Subject;
            type RoleRef = rbac::RoleRef;

            fn metadata(&self) -> &ObjectMeta {
                &self.metadata
            }

            fn subjects(&self) -> &[rbac::Subject] {
                self.subjects.as_deref().unwrap_or_default()
            }

            fn set_subjects(&mut self, subjects: Vec<rbac::Subject>) {
                self.subjects = Some(subjects);
            }

            fn role_ref(&self) -> &rbac::RoleRef {
                &self.role_ref
            }
        }
    };
}

legacy_binding!(legacy::ClusterRoleBinding);
legacy_binding!(legacy::RoleBinding);
rbac_binding!(rbac::ClusterRoleBinding);
rbac_binding!(rbac::RoleBinding);

/// Computes the binding to persist so that `actual` grants what `expected`
/// grants. Returns `None` when `actual` is already fine.
///
/// `exclude_subjects` are never added back to `actual`, but they are not
/// removed from it either. With `union` the subjects already in `actual` and
/// not in `expected` are kept, otherwise they are dropped.
///
/// A returned binding whose role ref differs from the one of `actual` cannot
/// be applied in place: the caller has to delete and create it.
pub fn compute_updated_binding<B: ReconcilableBinding>(
    expected: &B,
    actual: &B,
    exclude_subjects: &[B::Subject],
    union: bool,
) -> Option<B> {
    let mut needs_update = expected.role_ref() != actual.role_ref();

    let (do_not_add, _) = diff_subjects(exclude_subjects, actual.subjects());
    let (expected_subjects, _) = diff_subjects(expected.subjects(), &do_not_add);
    let (missing, extra) = diff_subjects(&expected_subjects, actual.subjects());

    needs_update |= !missing.is_empty();
    needs_update |= !extra.is_empty() && !union;

    if !needs_update {
        return None;
    }

    debug!(
        binding = expected.metadata().name.as_deref().unwrap_or_default(),
        missing = missing.len(),
        extra = extra.len(),
        union,
        "binding needs update"
    );

    let mut subjects = expected_subjects;
    if union {
        subjects.extend(extra);
    }
    let mut merged = expected.clone();
    merged.set_subjects(subjects);
    Some(merged)
}
