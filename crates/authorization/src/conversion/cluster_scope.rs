//! Moves legacy objects between the namespaced family and the cluster scoped
//! family.
//!
//! Only the namespace changes. Cluster scoped objects have none; namespaced
//! copies of cluster objects live in the configured master namespace. This
//! means `to_role(&to_cluster_role(&r), ns)` gives back `r` with its
//! namespace replaced by `ns`, not `r` itself.
//!
//! Callers holding optional objects map them: `role.as_ref().map(to_cluster_role)`.

use super::with_namespace;
use crate::api::legacy::{
    ClusterPolicy, ClusterPolicyBinding, ClusterPolicyBindingList, ClusterPolicyList,
    ClusterRole, ClusterRoleBinding, ClusterRoleBindingList, ClusterRoleList, Policy,
    PolicyBinding, PolicyBindingList, PolicyList, Role, RoleBinding, RoleBindingList, RoleList,
};

pub fn to_cluster_role(role: &Role) -> ClusterRole {
    ClusterRole {
        metadata: with_namespace(&role.metadata, ""),
        rules: role.rules.clone(),
        aggregation_rule: None,
    }
}

pub fn to_role(cluster_role: &ClusterRole, master_namespace: &str) -> Role {
    Role {
        metadata: with_namespace(&cluster_role.metadata, master_namespace),
        rules: cluster_role.rules.clone(),
    }
}

pub fn to_cluster_role_binding(binding: &RoleBinding) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: with_namespace(&binding.metadata, ""),
        subjects: binding.subjects.clone(),
        role_ref: binding.role_ref.clone(),
    }
}

pub fn to_role_binding(binding: &ClusterRoleBinding, master_namespace: &str) -> RoleBinding {
    RoleBinding {
        metadata: with_namespace(&binding.metadata, master_namespace),
        subjects: binding.subjects.clone(),
        role_ref: binding.role_ref.clone(),
    }
}

pub fn to_cluster_policy(policy: &Policy) -> ClusterPolicy {
    ClusterPolicy {
        metadata: with_namespace(&policy.metadata, ""),
        last_modified: policy.last_modified.clone(),
        roles: policy
            .roles
            .iter()
            .map(|(name, role)| (name.clone(), to_cluster_role(role)))
            .collect(),
    }
}

pub fn to_policy(policy: &ClusterPolicy, master_namespace: &str) -> Policy {
    Policy {
        metadata: with_namespace(&policy.metadata, master_namespace),
        last_modified: policy.last_modified.clone(),
        roles: policy
            .roles
            .iter()
            .map(|(name, role)| (name.clone(), to_role(role, master_namespace)))
            .collect(),
    }
}

pub fn to_cluster_policy_binding(binding: &PolicyBinding) -> ClusterPolicyBinding {
    ClusterPolicyBinding {
        metadata: with_namespace(&binding.metadata, ""),
        last_modified: binding.last_modified.clone(),
        policy_ref: binding.policy_ref.clone(),
        role_bindings: binding
            .role_bindings
            .iter()
            .map(|(name, binding)| (name.clone(), to_cluster_role_binding(binding)))
            .collect(),
    }
}

pub fn to_policy_binding(binding: &ClusterPolicyBinding, master_namespace: &str) -> PolicyBinding {
    PolicyBinding {
        metadata: with_namespace(&binding.metadata, master_namespace),
        last_modified: binding.last_modified.clone(),
        policy_ref: binding.policy_ref.clone(),
        role_bindings: binding
            .role_bindings
            .iter()
            .map(|(name, binding)| (name.clone(), to_role_binding(binding, master_namespace)))
            .collect(),
    }
}

pub fn to_cluster_role_list(list: &RoleList) -> ClusterRoleList {
    ClusterRoleList {
        metadata: list.metadata.clone(),
        items: list.items.iter().map(to_cluster_role).collect(),
    }
}

pub fn to_role_list(list: &ClusterRoleList, master_namespace: &str) -> RoleList {
    RoleList {
        metadata: list.metadata.clone(),
        items: list
            .items
            .iter()
            .map(|role| to_role(role, master_namespace))
            .collect(),
    }
}

pub fn to_cluster_role_binding_list(list: &RoleBindingList) -> ClusterRoleBindingList {
    ClusterRoleBindingList {
        metadata: list.metadata.clone(),
        items: list.items.iter().map(to_cluster_role_binding).collect(),
    }
}

pub fn to_role_binding_list(
    list: &ClusterRoleBindingList,
    master_namespace: &str,
) -> RoleBindingList {
    RoleBindingList {
        metadata: list.metadata.clone(),
        items: list
            .items
            .iter()
            .map(|binding| to_role_binding(binding, master_namespace))
            .collect(),
    }
}

pub fn to_cluster_policy_list(list: &PolicyList) -> ClusterPolicyList {
    ClusterPolicyList {
        metadata: list.metadata.clone(),
        items: list.items.iter().map(to_cluster_policy).collect(),
    }
}

pub fn to_policy_list(list: &ClusterPolicyList, master_namespace: &str) -> PolicyList {
    PolicyList {
        metadata: list.metadata.clone(),
        items: list
            .items
            .iter()
            .map(|policy| to_policy(policy, master_namespace))
            .collect(),
    }
}

pub fn to_cluster_policy_binding_list(list: &PolicyBindingList) -> ClusterPolicyBindingList {
    ClusterPolicyBindingList {
        metadata: list.metadata.clone(),
        items: list.items.iter().map(to_cluster_policy_binding).collect(),
    }
}

pub fn to_policy_binding_list(
    list: &ClusterPolicyBindingList,
    master_namespace: &str,
) -> PolicyBindingList {
    PolicyBindingList {
        metadata: list.metadata.clone(),
        items: list
            .items
            .iter()
            .map(|binding| to_policy_binding(binding, master_namespace))
            .collect(),
    }
}
