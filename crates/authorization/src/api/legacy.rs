use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::api::rbac::v1::AggregationRule;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ListMeta, ObjectMeta, Time};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// PolicyRule holds information that describes a policy rule, but does not contain information
/// about who the rule applies to or which namespace the rule applies to.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    /// Verbs that apply to all the resources contained in this rule. `*` represents all verbs.
    #[serde(default)]
    pub verbs: BTreeSet<String>,
    /// Opaque restrictions understood only by the legacy authorizer. A rule
    /// carrying them cannot be expressed with RBAC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_restrictions: Option<serde_json::Value>,
    /// An empty list means both the kubernetes and the origin API groups.
    #[serde(default)]
    pub api_groups: Vec<String>,
    #[serde(default)]
    pub resources: BTreeSet<String>,
    /// Optional allow list of names. An empty set means everything is allowed.
    #[serde(default)]
    pub resource_names: BTreeSet<String>,
    /// Partial urls a user should have access to. `*` is only allowed as the final step.
    #[serde(default, rename = "nonResourceURLs")]
    pub non_resource_urls: BTreeSet<String>,
}

impl PolicyRule {
    pub fn is_restricted(&self) -> bool {
        self.attribute_restrictions.is_some()
    }
}

/// A logical grouping of PolicyRules that can be referenced as a unit by RoleBindings.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

/// References a Role in the same namespace or a ClusterRole, and adds who
/// information through its subjects.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub subjects: Vec<ObjectReference>,
    /// Only the current namespace and the cluster scope (empty namespace) can be referenced.
    #[serde(default)]
    pub role_ref: ObjectReference,
}

/// Holds all the Roles of a namespace. There is at most one Policy per
/// namespace and it is always named `default`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Time>,
    #[serde(default)]
    pub roles: BTreeMap<String, Role>,
}

/// Holds all the RoleBindings of a namespace that reference the same Policy.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyBinding {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Time>,
    #[serde(default)]
    pub policy_ref: ObjectReference,
    #[serde(default)]
    pub role_bindings: BTreeMap<String, RoleBinding>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRole {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
    /// When set the rules are controller managed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_rule: Option<AggregationRule>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleBinding {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub subjects: Vec<ObjectReference>,
    #[serde(default)]
    pub role_ref: ObjectReference,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPolicy {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Time>,
    #[serde(default)]
    pub roles: BTreeMap<String, ClusterRole>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPolicyBinding {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Time>,
    #[serde(default)]
    pub policy_ref: ObjectReference,
    #[serde(default)]
    pub role_bindings: BTreeMap<String, ClusterRoleBinding>,
}

macro_rules! object_list {
    ($(#[$meta:meta])* $name:ident, $item:ty) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            #[serde(default)]
            pub metadata: ListMeta,
            #[serde(default)]
            pub items: Vec<$item>,
        }
    };
}

object_list!(RoleList, Role);
object_list!(RoleBindingList, RoleBinding);
object_list!(PolicyList, Policy);
object_list!(PolicyBindingList, PolicyBinding);
object_list!(ClusterRoleList, ClusterRole);
object_list!(ClusterRoleBindingList, ClusterRoleBinding);
object_list!(ClusterPolicyList, ClusterPolicy);
object_list!(ClusterPolicyBindingList, ClusterPolicyBinding);

/// Any legacy authorization object, tagged by its `kind` as found in
/// YAML or JSON documents.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind")]
pub enum Object {
    Role(Role),
    RoleBinding(RoleBinding),
    ClusterRole(ClusterRole),
    ClusterRoleBinding(ClusterRoleBinding),
    Policy(Policy),
    PolicyBinding(PolicyBinding),
    ClusterPolicy(ClusterPolicy),
    ClusterPolicyBinding(ClusterPolicyBinding),
}
