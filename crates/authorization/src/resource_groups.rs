//! Named groups of resources that rules can reference instead of listing
//! every resource, e.g. `resourcegroup:builds`.
//!
//! Groups can contain other groups. The escalating / non-escalating split is
//! derived from the other groups when the table is built and never changes
//! afterwards: build a [`ResourceGroups`] once and share it by reference.

use std::collections::{BTreeMap, BTreeSet};

use crate::constants::RESOURCE_GROUP_PREFIX;

pub const BUILD_GROUP: &str = "resourcegroup:builds";
pub const DEPLOYMENT_GROUP: &str = "resourcegroup:deployments";
pub const IMAGE_GROUP: &str = "resourcegroup:images";
pub const OAUTH_GROUP: &str = "resourcegroup:oauth";
pub const USER_GROUP: &str = "resourcegroup:users";
pub const TEMPLATE_GROUP: &str = "resourcegroup:templates";
pub const SDN_GROUP: &str = "resourcegroup:sdn";
pub const POLICY_OWNER_GROUP: &str = "resourcegroup:policy";
pub const PERMISSION_GRANTING_GROUP: &str = "resourcegroup:granter";
pub const OPENSHIFT_EXPOSED_GROUP: &str = "resourcegroup:exposedopenshift";
pub const OPENSHIFT_ALL_GROUP: &str = "resourcegroup:allopenshift";
pub const OPENSHIFT_STATUS_GROUP: &str = "resourcegroup:allopenshift-status";
pub const QUOTA_GROUP: &str = "resourcegroup:quota";
pub const KUBE_INTERNALS_GROUP: &str = "resourcegroup:kube-internals";
pub const KUBE_EXPOSED_GROUP: &str = "resourcegroup:exposedkube";
pub const KUBE_ALL_GROUP: &str = "resourcegroup:allkube";
pub const KUBE_STATUS_GROUP: &str = "resourcegroup:allkube-status";

/// Resources whose view rights can be used to find credentials, e.g. a
/// service account token stored in a secret.
pub const OPENSHIFT_ESCALATING_VIEWABLE_GROUP: &str = "resourcegroup:openshift-escalating";
pub const KUBE_ESCALATING_VIEWABLE_GROUP: &str = "resourcegroup:kube-escalating";
pub const ESCALATING_RESOURCES_GROUP: &str = "resourcegroup:escalating";

pub const OPENSHIFT_NON_ESCALATING_VIEWABLE_GROUP: &str = "resourcegroup:openshift-non-escalating";
pub const KUBE_NON_ESCALATING_VIEWABLE_GROUP: &str = "resourcegroup:kube-non-escalating";
/// Everything that can be viewed without the risk of locating a secret.
pub const NON_ESCALATING_RESOURCES_GROUP: &str = "resourcegroup:non-escalating";

/// Immutable lookup table from group name to its members (resources or
/// nested groups).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroups {
    groups: BTreeMap<String, Vec<String>>,
}

impl Default for ResourceGroups {
    fn default() -> Self {
        ResourceGroups::new()
    }
}

fn members(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

impl ResourceGroups {
    /// Builds the well known groups, including the derived non-escalating ones.
    pub fn new() -> Self {
        let static_groups: Vec<(&str, Vec<String>)> = vec![
            (
                BUILD_GROUP,
                members(&[
                    "builds",
                    "buildconfigs",
                    "buildlogs",
                    "buildconfigs/instantiate",
                    "buildconfigs/instantiatebinary",
                    "builds/log",
                    "builds/clone",
                    "buildconfigs/webhooks",
                ]),
            ),
            (
                IMAGE_GROUP,
                members(&[
                    "imagestreams",
                    "imagestreammappings",
                    "imagestreamtags",
                    "imagestreamimages",
                    "imagestreamimports",
                ]),
            ),
            (
                DEPLOYMENT_GROUP,
                members(&[
                    "deploymentconfigs",
                    "generatedeploymentconfigs",
                    "deploymentconfigrollbacks",
                    "deploymentconfigs/log",
                    "deploymentconfigs/scale",
                ]),
            ),
            (
                SDN_GROUP,
                members(&["clusternetworks", "hostsubnets", "netnamespaces"]),
            ),
            (
                TEMPLATE_GROUP,
                members(&["templates", "templateconfigs", "processedtemplates"]),
            ),
            (
                USER_GROUP,
                members(&["identities", "users", "useridentitymappings", "groups"]),
            ),
            (
                OAUTH_GROUP,
                members(&[
                    "oauthauthorizetokens",
                    "oauthaccesstokens",
                    "oauthclients",
                    "oauthclientauthorizations",
                ]),
            ),
            (POLICY_OWNER_GROUP, members(&["policies", "policybindings"])),
            (
                PERMISSION_GRANTING_GROUP,
                members(&[
                    "roles",
                    "rolebindings",
                    "resourceaccessreviews",
                    "subjectaccessreviews",
                    "localresourceaccessreviews",
                    "localsubjectaccessreviews",
                ]),
            ),
            (
                OPENSHIFT_EXPOSED_GROUP,
                members(&[
                    BUILD_GROUP,
                    IMAGE_GROUP,
                    DEPLOYMENT_GROUP,
                    TEMPLATE_GROUP,
                    "routes",
                ]),
            ),
            (
                OPENSHIFT_ALL_GROUP,
                members(&[
                    OPENSHIFT_EXPOSED_GROUP,
                    USER_GROUP,
                    OAUTH_GROUP,
                    POLICY_OWNER_GROUP,
                    SDN_GROUP,
                    PERMISSION_GRANTING_GROUP,
                    OPENSHIFT_STATUS_GROUP,
                    "projects",
                    "clusterroles",
                    "clusterrolebindings",
                    "clusterpolicies",
                    "clusterpolicybindings",
                    "images",
                    "projectrequests",
                    "builds/details",
                    "imagestreams/secrets",
                ]),
            ),
            (
                OPENSHIFT_STATUS_GROUP,
                members(&[
                    "imagestreams/status",
                    "routes/status",
                    "deploymentconfigs/status",
                ]),
            ),
            (
                QUOTA_GROUP,
                members(&["limitranges", "resourcequotas", "resourcequotausages"]),
            ),
            (
                KUBE_EXPOSED_GROUP,
                members(&[
                    "pods",
                    "replicationcontrollers",
                    "serviceaccounts",
                    "services",
                    "endpoints",
                    "persistentvolumeclaims",
                    "pods/log",
                    "configmaps",
                ]),
            ),
            (
                KUBE_INTERNALS_GROUP,
                members(&[
                    "minions",
                    "nodes",
                    "bindings",
                    "events",
                    "namespaces",
                    "persistentvolumes",
                    "securitycontextconstraints",
                ]),
            ),
            (
                KUBE_ALL_GROUP,
                members(&[KUBE_INTERNALS_GROUP, KUBE_EXPOSED_GROUP, QUOTA_GROUP]),
            ),
            (
                KUBE_STATUS_GROUP,
                members(&[
                    "pods/status",
                    "resourcequotas/status",
                    "namespaces/status",
                    "replicationcontrollers/status",
                ]),
            ),
            (
                OPENSHIFT_ESCALATING_VIEWABLE_GROUP,
                members(&[
                    "oauthauthorizetokens",
                    "oauthaccesstokens",
                    "imagestreams/secrets",
                ]),
            ),
            (KUBE_ESCALATING_VIEWABLE_GROUP, members(&["secrets"])),
            (
                ESCALATING_RESOURCES_GROUP,
                members(&[
                    OPENSHIFT_ESCALATING_VIEWABLE_GROUP,
                    KUBE_ESCALATING_VIEWABLE_GROUP,
                ]),
            ),
        ];

        let mut resource_groups = ResourceGroups {
            groups: static_groups
                .into_iter()
                .map(|(name, members)| (name.to_string(), members))
                .collect(),
        };

        let openshift_non_escalating =
            resource_groups.difference(OPENSHIFT_ALL_GROUP, OPENSHIFT_ESCALATING_VIEWABLE_GROUP);
        let kube_non_escalating =
            resource_groups.difference(KUBE_ALL_GROUP, KUBE_ESCALATING_VIEWABLE_GROUP);

        resource_groups.groups.insert(
            OPENSHIFT_NON_ESCALATING_VIEWABLE_GROUP.to_string(),
            openshift_non_escalating,
        );
        resource_groups.groups.insert(
            KUBE_NON_ESCALATING_VIEWABLE_GROUP.to_string(),
            kube_non_escalating,
        );
        resource_groups.groups.insert(
            NON_ESCALATING_RESOURCES_GROUP.to_string(),
            members(&[
                OPENSHIFT_NON_ESCALATING_VIEWABLE_GROUP,
                KUBE_NON_ESCALATING_VIEWABLE_GROUP,
            ]),
        );

        resource_groups
    }

    /// Resources of `group` that are not resources of `excluded`, both fully expanded.
    fn difference(&self, group: &str, excluded: &str) -> Vec<String> {
        let included = self.normalize(&BTreeSet::from([group.to_string()]));
        let excluded = self.normalize(&BTreeSet::from([excluded.to_string()]));
        included.difference(&excluded).cloned().collect()
    }

    /// Returns true when `name` uses the resource group naming convention.
    pub fn is_group(name: &str) -> bool {
        name.strip_prefix(RESOURCE_GROUP_PREFIX)
            .is_some_and(|rest| rest.starts_with(':'))
    }

    /// Direct members of a group, which may themselves be groups.
    pub fn members(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Expands every group found in `resources` until only plain resources
    /// remain. Plain resources are lowercased, unknown groups are dropped.
    pub fn normalize(&self, resources: &BTreeSet<String>) -> BTreeSet<String> {
        let mut normalized = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut to_visit: Vec<String> = resources.iter().cloned().collect();

        while let Some(current) = to_visit.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if !Self::is_group(&current) {
                normalized.insert(current.to_lowercase());
                continue;
            }
            if let Some(members) = self.groups.get(&current) {
                to_visit.extend(members.iter().cloned());
            }
        }

        normalized
    }
}
