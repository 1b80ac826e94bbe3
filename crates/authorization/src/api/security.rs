use k8s_openapi::api::core::v1::SELinuxOptions;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ListMeta, ObjectMeta};
use serde::{Deserialize, Serialize};

/// SecurityContextConstraints governs the ability to make requests that affect the
/// security context applied to a container.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContextConstraints {
    #[serde(default)]
    pub metadata: ObjectMeta,

    /// Higher priority SCCs are sorted first when several of them match a pod.
    /// `None` is the lowest priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,

    #[serde(default)]
    pub allow_privileged_container: bool,
    #[serde(default)]
    pub default_add_capabilities: Vec<String>,
    #[serde(default)]
    pub required_drop_capabilities: Vec<String>,
    #[serde(default)]
    pub allowed_capabilities: Vec<String>,
    #[serde(default)]
    pub allow_host_dir_volume_plugin: bool,
    #[serde(default)]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub allowed_flex_volumes: Vec<AllowedFlexVolume>,
    #[serde(default)]
    pub allow_host_network: bool,
    #[serde(default)]
    pub allow_host_ports: bool,
    #[serde(default, rename = "allowHostPID")]
    pub allow_host_pid: bool,
    #[serde(default, rename = "allowHostIPC")]
    pub allow_host_ipc: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_allow_privilege_escalation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_privilege_escalation: Option<bool>,
    #[serde(default, rename = "seLinuxContext")]
    pub se_linux_context: SELinuxContextStrategyOptions,
    #[serde(default)]
    pub run_as_user: RunAsUserStrategyOptions,
    #[serde(default)]
    pub supplemental_groups: SupplementalGroupsStrategyOptions,
    #[serde(default)]
    pub fs_group: FSGroupStrategyOptions,
    #[serde(default)]
    pub read_only_root_filesystem: bool,

    /// Users who have permission to use this SCC.
    #[serde(default)]
    pub users: Vec<String>,
    /// Groups that have permission to use this SCC.
    #[serde(default)]
    pub groups: Vec<String>,

    #[serde(default)]
    pub seccomp_profiles: Vec<String>,
    #[serde(default)]
    pub allowed_unsafe_sysctls: Vec<String>,
    #[serde(default)]
    pub forbidden_sysctls: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AllowedFlexVolume {
    pub driver: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SELinuxContextStrategyOptions {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(
        default,
        rename = "seLinuxOptions",
        skip_serializing_if = "Option::is_none"
    )]
    pub se_linux_options: Option<SELinuxOptions>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunAsUserStrategyOptions {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid_range_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid_range_max: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SupplementalGroupsStrategyOptions {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default)]
    pub ranges: Vec<IDRange>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FSGroupStrategyOptions {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default)]
    pub ranges: Vec<IDRange>,
}

/// An inclusive range of IDs.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct IDRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContextConstraintsList {
    #[serde(default)]
    pub metadata: ListMeta,
    #[serde(default)]
    pub items: Vec<SecurityContextConstraints>,
}
