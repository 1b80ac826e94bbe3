//! Conversions between the legacy namespaced family, its cluster scoped
//! counterpart and the Kubernetes RBAC family.

pub mod cluster_scope;
pub mod rbac;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Copy of `metadata` with the namespace replaced. An empty namespace is
/// stored as `None`, the way cluster scoped objects carry it.
pub(crate) fn with_namespace(metadata: &ObjectMeta, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
        ..metadata.clone()
    }
}
