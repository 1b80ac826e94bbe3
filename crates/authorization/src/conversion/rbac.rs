//! Conversions between the legacy authorization family and Kubernetes RBAC.
//!
//! The conversion to RBAC is lossy: rules carrying attribute restrictions have
//! no RBAC equivalent and are dropped, and the `SystemUser`/`SystemGroup`
//! kinds collapse into `User`/`Group`. Role and rule conversions cannot fail;
//! binding conversions fail on cross namespace role references and on subject
//! kinds outside of the known ones.

use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::api::rbac::v1 as rbac;
use tracing::debug;

use crate::api::legacy::{
    ClusterRole, ClusterRoleBinding, ClusterRoleBindingList, ClusterRoleList, PolicyRule, Role,
    RoleBinding, RoleBindingList, RoleList,
};
use crate::constants::{CLUSTER_ROLE_KIND, RBAC_GROUP_NAME, ROLE_KIND};
use crate::errors::{ConversionError, Result};
use crate::subjects::{RbacSubjectKind, SubjectKind, rbac_group, rbac_user};

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    (!items.is_empty()).then_some(items)
}

/// Returns `None` when the rule has attribute restrictions.
pub fn convert_policy_rule_to_rbac(rule: &PolicyRule) -> Option<rbac::PolicyRule> {
    if rule.is_restricted() {
        return None;
    }
    Some(rbac::PolicyRule {
        api_groups: non_empty(rule.api_groups.clone()),
        non_resource_urls: non_empty(rule.non_resource_urls.iter().cloned().collect()),
        resource_names: non_empty(rule.resource_names.iter().cloned().collect()),
        resources: non_empty(rule.resources.iter().cloned().collect()),
        verbs: rule.verbs.iter().cloned().collect(),
    })
}

fn convert_policy_rules_to_rbac(
    owner: Option<&str>,
    rules: &[PolicyRule],
) -> Vec<rbac::PolicyRule> {
    rules
        .iter()
        .filter_map(|rule| {
            let converted = convert_policy_rule_to_rbac(rule);
            if converted.is_none() {
                debug!(
                    role = owner.unwrap_or_default(),
                    rule = format!("{rule:?}").as_str(),
                    "dropping rule with attribute restrictions"
                );
            }
            converted
        })
        .collect()
}

pub fn convert_rbac_policy_rule_to_origin(rule: &rbac::PolicyRule) -> PolicyRule {
    PolicyRule {
        verbs: rule.verbs.iter().cloned().collect(),
        attribute_restrictions: None,
        api_groups: rule.api_groups.clone().unwrap_or_default(),
        resources: rule.resources.iter().flatten().cloned().collect(),
        resource_names: rule.resource_names.iter().flatten().cloned().collect(),
        non_resource_urls: rule.non_resource_urls.iter().flatten().cloned().collect(),
    }
}

pub fn convert_role_to_rbac(role: &Role) -> rbac::Role {
    rbac::Role {
        metadata: role.metadata.clone(),
        rules: Some(convert_policy_rules_to_rbac(role.metadata.name.as_deref(), &role.rules)),
    }
}

pub fn convert_cluster_role_to_rbac(role: &ClusterRole) -> rbac::ClusterRole {
    rbac::ClusterRole {
        metadata: role.metadata.clone(),
        rules: Some(convert_policy_rules_to_rbac(role.metadata.name.as_deref(), &role.rules)),
        aggregation_rule: role.aggregation_rule.clone(),
    }
}

pub fn convert_rbac_role_to_origin(role: &rbac::Role) -> Role {
    Role {
        metadata: role.metadata.clone(),
        rules: role
            .rules
            .iter()
            .flatten()
            .map(convert_rbac_policy_rule_to_origin)
            .collect(),
    }
}

pub fn convert_rbac_cluster_role_to_origin(role: &rbac::ClusterRole) -> ClusterRole {
    ClusterRole {
        metadata: role.metadata.clone(),
        rules: role
            .rules
            .iter()
            .flatten()
            .map(convert_rbac_policy_rule_to_origin)
            .collect(),
        aggregation_rule: role.aggregation_rule.clone(),
    }
}

pub fn convert_origin_subject_to_rbac(subject: &ObjectReference) -> Result<rbac::Subject> {
    let name = subject.name.as_deref().unwrap_or_default();
    let converted = match SubjectKind::of(subject)? {
        SubjectKind::ServiceAccount => rbac::Subject {
            api_group: None,
            kind: SubjectKind::ServiceAccount.to_string(),
            name: name.to_string(),
            namespace: subject.namespace.clone(),
        },
        SubjectKind::User | SubjectKind::SystemUser => rbac_user(name),
        SubjectKind::Group | SubjectKind::SystemGroup => rbac_group(name),
    };
    Ok(converted)
}

/// RBAC has no system kinds. Names using the `prefix:name` convention
/// (`system:admin`, `system:masters`) are mapped back to the system kinds:
/// `:` is the one character ordinary user and group names may not carry.
fn origin_kind_for(kind: RbacSubjectKind, name: &str) -> SubjectKind {
    match kind {
        RbacSubjectKind::ServiceAccount => SubjectKind::ServiceAccount,
        RbacSubjectKind::User if name.contains(':') => SubjectKind::SystemUser,
        RbacSubjectKind::User => SubjectKind::User,
        RbacSubjectKind::Group if name.contains(':') => SubjectKind::SystemGroup,
        RbacSubjectKind::Group => SubjectKind::Group,
    }
}

pub fn convert_rbac_subject_to_origin(subject: &rbac::Subject) -> Result<ObjectReference> {
    let kind = origin_kind_for(RbacSubjectKind::of(subject)?, &subject.name);
    let namespace = match kind {
        SubjectKind::ServiceAccount => subject.namespace.clone(),
        _ => None,
    };
    Ok(ObjectReference {
        kind: Some(kind.to_string()),
        name: Some(subject.name.clone()),
        namespace,
        ..Default::default()
    })
}

fn convert_origin_subjects_to_rbac(
    subjects: &[ObjectReference],
) -> Result<Option<Vec<rbac::Subject>>> {
    subjects
        .iter()
        .map(convert_origin_subject_to_rbac)
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn convert_rbac_subjects_to_origin(
    subjects: Option<&Vec<rbac::Subject>>,
) -> Result<Vec<ObjectReference>> {
    subjects
        .into_iter()
        .flatten()
        .map(convert_rbac_subject_to_origin)
        .collect()
}

fn rbac_role_ref(namespace: &str, name: &str) -> rbac::RoleRef {
    let kind = if namespace.is_empty() {
        CLUSTER_ROLE_KIND
    } else {
        ROLE_KIND
    };
    rbac::RoleRef {
        api_group: RBAC_GROUP_NAME.to_string(),
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

pub fn convert_role_binding_to_rbac(binding: &RoleBinding) -> Result<rbac::RoleBinding> {
    let binding_namespace = binding.metadata.namespace.as_deref().unwrap_or_default();
    let role_namespace = binding.role_ref.namespace.as_deref().unwrap_or_default();

    // a RoleBinding can only reference a Role in its own namespace or a ClusterRole
    if !role_namespace.is_empty() && role_namespace != binding_namespace {
        return Err(ConversionError::CrossNamespaceRoleRef {
            binding: binding.metadata.name.clone().unwrap_or_default(),
            role_namespace: role_namespace.to_string(),
            binding_namespace: binding_namespace.to_string(),
        });
    }

    Ok(rbac::RoleBinding {
        metadata: binding.metadata.clone(),
        role_ref: rbac_role_ref(
            role_namespace,
            binding.role_ref.name.as_deref().unwrap_or_default(),
        ),
        subjects: convert_origin_subjects_to_rbac(&binding.subjects)?,
    })
}

pub fn convert_cluster_role_binding_to_rbac(
    binding: &ClusterRoleBinding,
) -> Result<rbac::ClusterRoleBinding> {
    let role_namespace = binding.role_ref.namespace.as_deref().unwrap_or_default();
    if !role_namespace.is_empty() {
        return Err(ConversionError::NamespacedClusterRoleRef {
            binding: binding.metadata.name.clone().unwrap_or_default(),
            role_namespace: role_namespace.to_string(),
        });
    }

    Ok(rbac::ClusterRoleBinding {
        metadata: binding.metadata.clone(),
        role_ref: rbac_role_ref("", binding.role_ref.name.as_deref().unwrap_or_default()),
        subjects: convert_origin_subjects_to_rbac(&binding.subjects)?,
    })
}

fn check_role_ref_api_group(binding: Option<&str>, role_ref: &rbac::RoleRef) -> Result<()> {
    if !role_ref.api_group.is_empty() && role_ref.api_group != RBAC_GROUP_NAME {
        return Err(ConversionError::InvalidRoleRefApiGroup {
            binding: binding.unwrap_or_default().to_string(),
            api_group: role_ref.api_group.clone(),
        });
    }
    Ok(())
}

/// RBAC does not record the namespace of the referenced Role: it is the
/// namespace of the binding, which the caller supplies as `binding_namespace`.
/// A Role reference without a binding namespace is an error, since a legacy
/// role ref without namespace designates a ClusterRole.
pub fn convert_rbac_role_binding_to_origin(
    binding: &rbac::RoleBinding,
    binding_namespace: &str,
) -> Result<RoleBinding> {
    let name = binding.metadata.name.as_deref();
    check_role_ref_api_group(name, &binding.role_ref)?;

    let role_namespace = match binding.role_ref.kind.as_str() {
        CLUSTER_ROLE_KIND => None,
        ROLE_KIND if binding_namespace.is_empty() => {
            return Err(ConversionError::MissingBindingNamespace {
                binding: name.unwrap_or_default().to_string(),
            });
        }
        ROLE_KIND => Some(binding_namespace.to_string()),
        other => {
            return Err(ConversionError::InvalidRoleRefKind {
                binding: name.unwrap_or_default().to_string(),
                kind: other.to_string(),
            });
        }
    };

    Ok(RoleBinding {
        metadata: binding.metadata.clone(),
        subjects: convert_rbac_subjects_to_origin(binding.subjects.as_ref())?,
        role_ref: ObjectReference {
            name: Some(binding.role_ref.name.clone()),
            namespace: role_namespace,
            ..Default::default()
        },
    })
}

pub fn convert_rbac_cluster_role_binding_to_origin(
    binding: &rbac::ClusterRoleBinding,
) -> Result<ClusterRoleBinding> {
    let name = binding.metadata.name.as_deref();
    check_role_ref_api_group(name, &binding.role_ref)?;

    if binding.role_ref.kind != CLUSTER_ROLE_KIND {
        return Err(ConversionError::InvalidRoleRefKind {
            binding: name.unwrap_or_default().to_string(),
            kind: binding.role_ref.kind.clone(),
        });
    }

    Ok(ClusterRoleBinding {
        metadata: binding.metadata.clone(),
        subjects: convert_rbac_subjects_to_origin(binding.subjects.as_ref())?,
        role_ref: ObjectReference {
            name: Some(binding.role_ref.name.clone()),
            ..Default::default()
        },
    })
}

pub fn convert_role_list_to_rbac(list: &RoleList) -> Vec<rbac::Role> {
    list.items.iter().map(convert_role_to_rbac).collect()
}

pub fn convert_cluster_role_list_to_rbac(list: &ClusterRoleList) -> Vec<rbac::ClusterRole> {
    list.items
        .iter()
        .map(convert_cluster_role_to_rbac)
        .collect()
}

/// Stops at the first binding that cannot be converted.
pub fn convert_role_binding_list_to_rbac(list: &RoleBindingList) -> Result<Vec<rbac::RoleBinding>> {
    list.items
        .iter()
        .map(convert_role_binding_to_rbac)
        .collect()
}

/// Stops at the first binding that cannot be converted.
pub fn convert_cluster_role_binding_list_to_rbac(
    list: &ClusterRoleBindingList,
) -> Result<Vec<rbac::ClusterRoleBinding>> {
    list.items
        .iter()
        .map(convert_cluster_role_binding_to_rbac)
        .collect()
}
