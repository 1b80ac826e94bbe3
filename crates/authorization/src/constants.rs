/// Name of the singleton Policy (and ClusterPolicy) document
pub const POLICY_NAME: &str = "default";

/// Namespace holding the cluster wide policy when it is exposed through the
/// namespaced, deprecated, Policy/PolicyBinding singletons.
pub const DEFAULT_MASTER_NAMESPACE: &str = "openshift";

pub const API_GROUP_ALL: &str = "*";
pub const RESOURCE_ALL: &str = "*";
pub const VERB_ALL: &str = "*";

pub const USER_KIND: &str = "User";
pub const GROUP_KIND: &str = "Group";
pub const SERVICE_ACCOUNT_KIND: &str = "ServiceAccount";
pub const SYSTEM_USER_KIND: &str = "SystemUser";
pub const SYSTEM_GROUP_KIND: &str = "SystemGroup";

pub const RBAC_GROUP_NAME: &str = "rbac.authorization.k8s.io";
pub const ROLE_KIND: &str = "Role";
pub const CLUSTER_ROLE_KIND: &str = "ClusterRole";

pub const SERVICE_ACCOUNT_USERNAME_PREFIX: &str = "system:serviceaccount:";

pub const RESOURCE_GROUP_PREFIX: &str = "resourcegroup";
