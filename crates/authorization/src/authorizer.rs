//! Evaluation of requests against the legacy Policy and PolicyBinding
//! objects.
//!
//! Bindings of the master namespace apply to every namespace. A request is
//! allowed as soon as one rule of a role bound to the user matches it.

use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::api::core::v1::ObjectReference;
use tracing::{debug, warn};

use crate::api::legacy::{Policy, PolicyBinding, PolicyRule, Role, RoleBinding};
use crate::constants::POLICY_NAME;
use crate::errors::AuthorizationError;
use crate::resource_groups::ResourceGroups;
use crate::rule_coverage::{
    api_group_matches, name_matches, non_resource_url_matches, resource_matches, verb_matches,
};
use crate::subjects::SubjectKind;

/// Access to the Policy and PolicyBinding objects of each namespace.
pub trait PolicyStore {
    /// The role `name` of the policy of `namespace`.
    fn role(&self, namespace: &str, name: &str) -> Option<&Role>;
    /// Every role binding of every policy binding of `namespace`.
    fn role_bindings(&self, namespace: &str) -> Vec<&RoleBinding>;
}

/// A `PolicyStore` keeping everything in memory, keyed by namespace.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPolicyStore {
    policies: BTreeMap<String, Policy>,
    policy_bindings: BTreeMap<String, Vec<PolicyBinding>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `policy` in its namespace, replacing the previous one.
    /// Policies not named `default` are ignored.
    pub fn insert_policy(&mut self, policy: Policy) {
        let name = policy.metadata.name.as_deref().unwrap_or_default();
        if name != POLICY_NAME {
            warn!(policy = name, "ignoring policy not named {POLICY_NAME}");
            return;
        }
        let namespace = policy.metadata.namespace.clone().unwrap_or_default();
        self.policies.insert(namespace, policy);
    }

    pub fn insert_policy_binding(&mut self, binding: PolicyBinding) {
        let namespace = binding.metadata.namespace.clone().unwrap_or_default();
        self.policy_bindings
            .entry(namespace)
            .or_default()
            .push(binding);
    }

    pub fn namespaces(&self) -> BTreeSet<&str> {
        self.policies
            .keys()
            .chain(self.policy_bindings.keys())
            .map(String::as_str)
            .collect()
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn role(&self, namespace: &str, name: &str) -> Option<&Role> {
        self.policies.get(namespace)?.roles.get(name)
    }

    fn role_bindings(&self, namespace: &str) -> Vec<&RoleBinding> {
        self.policy_bindings
            .get(namespace)
            .into_iter()
            .flatten()
            .flat_map(|binding| binding.role_bindings.values())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInfo {
    pub name: String,
    pub groups: Vec<String>,
}

/// What a request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    Resource {
        api_group: String,
        resource: String,
        name: String,
    },
    NonResource {
        url: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attributes {
    pub user: UserInfo,
    pub verb: String,
    /// Empty for cluster wide requests.
    pub namespace: String,
    pub target: RequestTarget,
}

impl Attributes {
    /// A request on a resource of the core API group.
    pub fn resource(user: UserInfo, verb: &str, namespace: &str, resource: &str) -> Self {
        Attributes {
            user,
            verb: verb.to_string(),
            namespace: namespace.to_string(),
            target: RequestTarget::Resource {
                api_group: String::new(),
                resource: resource.to_string(),
                name: String::new(),
            },
        }
    }

    pub fn non_resource(user: UserInfo, verb: &str, url: &str) -> Self {
        Attributes {
            user,
            verb: verb.to_string(),
            namespace: String::new(),
            target: RequestTarget::NonResource {
                url: url.to_string(),
            },
        }
    }
}

/// Whether `rule` allows the request described by `attributes`.
pub fn rule_matches(groups: &ResourceGroups, attributes: &Attributes, rule: &PolicyRule) -> bool {
    if !verb_matches(&rule.verbs, &attributes.verb) {
        return false;
    }
    match &attributes.target {
        RequestTarget::NonResource { url } => {
            non_resource_url_matches(&rule.non_resource_urls, url)
        }
        RequestTarget::Resource {
            api_group,
            resource,
            name,
        } => {
            api_group_matches(&rule.api_groups, api_group)
                && resource_matches(&groups.normalize(&rule.resources), resource)
                && name_matches(&rule.resource_names, name)
        }
    }
}

/// The user name a subject stands for, service accounts included.
fn subject_user_name(subject: &ObjectReference, binding_namespace: &str) -> Option<String> {
    let name = subject.name.as_deref().unwrap_or_default();
    match SubjectKind::of(subject).ok()? {
        SubjectKind::User | SubjectKind::SystemUser => Some(name.to_string()),
        SubjectKind::ServiceAccount => {
            let namespace = subject
                .namespace
                .as_deref()
                .filter(|ns| !ns.is_empty())
                .unwrap_or(binding_namespace);
            Some(format!("system:serviceaccount:{namespace}:{name}"))
        }
        SubjectKind::Group | SubjectKind::SystemGroup => None,
    }
}

fn subject_group_name(subject: &ObjectReference) -> Option<&str> {
    match SubjectKind::of(subject).ok()? {
        SubjectKind::Group | SubjectKind::SystemGroup => subject.name.as_deref(),
        _ => None,
    }
}

fn binding_applies_to(binding: &RoleBinding, binding_namespace: &str, user: &UserInfo) -> bool {
    binding.subjects.iter().any(|subject| {
        subject_user_name(subject, binding_namespace).is_some_and(|name| name == user.name)
            || subject_group_name(subject)
                .is_some_and(|group| user.groups.iter().any(|g| g == group))
    })
}

/// The outcome of an authorization request that could be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed { reason: String },
    Denied { reason: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

/// Users and groups allowed to perform a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedSubjects {
    pub users: BTreeSet<String>,
    pub groups: BTreeSet<String>,
}

pub struct Authorizer<'a, S> {
    master_namespace: String,
    store: S,
    resource_groups: &'a ResourceGroups,
}

impl<'a, S: PolicyStore> Authorizer<'a, S> {
    pub fn new(master_namespace: &str, store: S, resource_groups: &'a ResourceGroups) -> Self {
        Authorizer {
            master_namespace: master_namespace.to_string(),
            store,
            resource_groups,
        }
    }

    /// Roles referenced without a namespace live in the master namespace.
    fn bound_role(&self, binding: &RoleBinding) -> Result<&Role, AuthorizationError> {
        let namespace = binding
            .role_ref
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(&self.master_namespace);
        let name = binding.role_ref.name.as_deref().unwrap_or_default();
        self.store
            .role(namespace, name)
            .ok_or_else(|| AuthorizationError::RoleNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    /// Rules granted to `user` by the bindings of `namespace`. Missing roles
    /// are reported next to the rules that could be found.
    fn effective_rules(
        &self,
        namespace: &str,
        user: &UserInfo,
    ) -> (Vec<&PolicyRule>, Vec<AuthorizationError>) {
        let mut rules = Vec::new();
        let mut errors = Vec::new();
        for binding in self.store.role_bindings(namespace) {
            if !binding_applies_to(binding, namespace, user) {
                continue;
            }
            match self.bound_role(binding) {
                Ok(role) => rules.extend(role.rules.iter()),
                Err(err) => errors.push(err),
            }
        }
        (rules, errors)
    }

    fn authorize_in_namespace(
        &self,
        namespace: &str,
        attributes: &Attributes,
    ) -> (Option<String>, Vec<AuthorizationError>) {
        let (rules, errors) = self.effective_rules(namespace, &attributes.user);
        let reason = rules
            .into_iter()
            .find(|rule| rule_matches(self.resource_groups, attributes, rule))
            .map(|rule| format!("allowed by rule in {namespace}: {rule:?}"));
        (reason, errors)
    }

    /// Decides on `attributes`. Bindings of the master namespace are checked
    /// first, then the ones of the request namespace.
    ///
    /// Missing roles do not prevent a request from being allowed by other
    /// roles. A request that is not allowed and hit missing roles is an
    /// error.
    pub fn authorize(&self, attributes: &Attributes) -> Result<Decision, AuthorizationError> {
        let mut namespaces = vec![self.master_namespace.as_str()];
        if !attributes.namespace.is_empty() && attributes.namespace != self.master_namespace {
            namespaces.push(attributes.namespace.as_str());
        }

        let mut errors = Vec::new();
        for namespace in namespaces {
            let (reason, namespace_errors) = self.authorize_in_namespace(namespace, attributes);
            if let Some(reason) = reason {
                debug!(
                    user = attributes.user.name.as_str(),
                    namespace,
                    "request allowed"
                );
                return Ok(Decision::Allowed { reason });
            }
            errors.extend(namespace_errors);
        }

        match AuthorizationError::aggregate(errors) {
            Some(err) => Err(err),
            None => Ok(Decision::Denied {
                reason: "denied by default".to_string(),
            }),
        }
    }

    fn allowed_subjects_in_namespace(
        &self,
        namespace: &str,
        attributes: &Attributes,
        allowed: &mut AllowedSubjects,
    ) -> Result<(), AuthorizationError> {
        for binding in self.store.role_bindings(namespace) {
            let role = self.bound_role(binding)?;
            if !role
                .rules
                .iter()
                .any(|rule| rule_matches(self.resource_groups, attributes, rule))
            {
                continue;
            }
            for subject in &binding.subjects {
                if let Some(user) = subject_user_name(subject, namespace) {
                    allowed.users.insert(user);
                }
                if let Some(group) = subject_group_name(subject) {
                    allowed.groups.insert(group.to_string());
                }
            }
        }
        Ok(())
    }

    /// Users and groups bound, in the master namespace or in the request
    /// namespace, to a role allowing `attributes`. The user of `attributes`
    /// is ignored.
    pub fn allowed_subjects(
        &self,
        attributes: &Attributes,
    ) -> Result<AllowedSubjects, AuthorizationError> {
        let mut allowed = AllowedSubjects::default();
        self.allowed_subjects_in_namespace(&self.master_namespace, attributes, &mut allowed)?;
        if !attributes.namespace.is_empty() && attributes.namespace != self.master_namespace {
            self.allowed_subjects_in_namespace(&attributes.namespace, attributes, &mut allowed)?;
        }
        Ok(allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use rstest::*;

    const MASTER: &str = "openshift";
    const DEPLOYER: &str = "system:serviceaccount:ns0:deployer";

    fn meta(namespace: &str, name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }
    }

    fn rule(verbs: &[&str], resources: &[&str]) -> PolicyRule {
        PolicyRule {
            verbs: verbs.iter().map(|s| s.to_string()).collect(),
            resources: resources.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn subject(kind: &str, name: &str) -> ObjectReference {
        ObjectReference {
            kind: Some(kind.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn policy(namespace: &str, roles: Vec<(&str, Vec<PolicyRule>)>) -> Policy {
        Policy {
            metadata: meta(namespace, POLICY_NAME),
            last_modified: None,
            roles: roles
                .into_iter()
                .map(|(name, rules)| {
                    let role = Role {
                        metadata: meta(namespace, name),
                        rules,
                    };
                    (name.to_string(), role)
                })
                .collect(),
        }
    }

    fn policy_binding(
        namespace: &str,
        bindings: Vec<(&str, Option<&str>, Vec<ObjectReference>)>,
    ) -> PolicyBinding {
        PolicyBinding {
            metadata: meta(namespace, MASTER),
            role_bindings: bindings
                .into_iter()
                .map(|(role, role_namespace, subjects)| {
                    let binding = RoleBinding {
                        metadata: meta(namespace, role),
                        subjects,
                        role_ref: ObjectReference {
                            name: Some(role.to_string()),
                            namespace: role_namespace.map(str::to_string),
                            ..Default::default()
                        },
                    };
                    (role.to_string(), binding)
                })
                .collect(),
            ..Default::default()
        }
    }

    fn store() -> InMemoryPolicyStore {
        let mut store = InMemoryPolicyStore::new();
        store.insert_policy(policy(
            MASTER,
            vec![
                ("cluster-admin", vec![rule(&["*"], &["*"])]),
                (
                    "view",
                    vec![rule(&["get", "list"], &["pods", "resourcegroup:builds"])],
                ),
                (
                    "health",
                    vec![PolicyRule {
                        verbs: ["get".to_string()].into(),
                        non_resource_urls: ["/healthz*".to_string()].into(),
                        ..Default::default()
                    }],
                ),
            ],
        ));
        store.insert_policy(policy(
            "ns0",
            vec![("deployer", vec![rule(&["create"], &["pods"])])],
        ));
        store.insert_policy_binding(policy_binding(
            MASTER,
            vec![
                (
                    "cluster-admin",
                    None,
                    vec![subject("SystemGroup", "system:masters")],
                ),
                (
                    "health",
                    None,
                    vec![subject("SystemGroup", "system:authenticated")],
                ),
            ],
        ));
        store.insert_policy_binding(policy_binding(
            "ns0",
            vec![
                (
                    "view",
                    None,
                    vec![subject("User", "alice"), subject("Group", "devs")],
                ),
                (
                    "deployer",
                    Some("ns0"),
                    vec![subject("ServiceAccount", "deployer")],
                ),
            ],
        ));
        store
    }

    fn user(name: &str, groups: &[&str]) -> UserInfo {
        UserInfo {
            name: name.to_string(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
        }
    }

    #[rstest]
    #[case::admin_everywhere(user("root", &["system:masters"]), "delete", "ns1", "secrets", true)]
    #[case::viewer_in_namespace(user("alice", &[]), "get", "ns0", "pods", true)]
    #[case::viewer_through_group(user("bob", &["devs"]), "list", "ns0", "builds", true)]
    #[case::viewer_other_namespace(user("alice", &[]), "get", "ns1", "pods", false)]
    #[case::viewer_cannot_delete(user("alice", &[]), "delete", "ns0", "pods", false)]
    #[case::service_account(user(DEPLOYER, &[]), "create", "ns0", "pods", true)]
    fn authorize(
        #[case] user: UserInfo,
        #[case] verb: &str,
        #[case] namespace: &str,
        #[case] resource: &str,
        #[case] allowed: bool,
    ) {
        let groups = ResourceGroups::new();
        let authorizer = Authorizer::new(MASTER, store(), &groups);
        let decision = authorizer
            .authorize(&Attributes::resource(user, verb, namespace, resource))
            .unwrap();
        assert_eq!(decision.is_allowed(), allowed, "{decision:?}");
    }

    #[test]
    fn denied_by_default() {
        let groups = ResourceGroups::new();
        let authorizer = Authorizer::new(MASTER, store(), &groups);
        let decision = authorizer
            .authorize(&Attributes::resource(user("eve", &[]), "get", "ns0", "pods"))
            .unwrap();
        assert_eq!(
            decision,
            Decision::Denied {
                reason: "denied by default".to_string(),
            }
        );
    }

    #[test]
    fn missing_role_is_reported_when_denied() {
        let groups = ResourceGroups::new();
        let mut store = store();
        store.insert_policy_binding(policy_binding(
            "ns1",
            vec![("ghost", Some("ns1"), vec![subject("User", "alice")])],
        ));
        let authorizer = Authorizer::new(MASTER, store, &groups);

        let err = authorizer
            .authorize(&Attributes::resource(user("alice", &[]), "get", "ns1", "pods"))
            .unwrap_err();
        assert_eq!(
            err,
            AuthorizationError::RoleNotFound {
                namespace: "ns1".to_string(),
                name: "ghost".to_string(),
            }
        );

        // other roles can still allow the request
        let decision = authorizer
            .authorize(&Attributes::resource(
                user("alice", &["system:masters"]),
                "get",
                "ns1",
                "pods",
            ))
            .unwrap();
        assert!(decision.is_allowed());
    }

    #[rstest]
    #[case::prefix("/healthz/ready", true)]
    #[case::other_path("/metrics", false)]
    fn non_resource_requests(#[case] url: &str, #[case] allowed: bool) {
        let groups = ResourceGroups::new();
        let authorizer = Authorizer::new(MASTER, store(), &groups);

        let alice = user("alice", &["system:authenticated"]);
        let decision = authorizer
            .authorize(&Attributes::non_resource(alice, "get", url))
            .unwrap();
        assert_eq!(decision.is_allowed(), allowed);
    }

    #[test]
    fn allowed_subjects_merge_master_and_namespace() {
        let groups = ResourceGroups::new();
        let authorizer = Authorizer::new(MASTER, store(), &groups);

        let allowed = authorizer
            .allowed_subjects(&Attributes::resource(UserInfo::default(), "get", "ns0", "pods"))
            .unwrap();
        assert_eq!(allowed.users, BTreeSet::from(["alice".to_string()]));
        assert_eq!(
            allowed.groups,
            BTreeSet::from(["devs".to_string(), "system:masters".to_string()])
        );

        let allowed = authorizer
            .allowed_subjects(&Attributes::resource(UserInfo::default(), "create", "ns0", "pods"))
            .unwrap();
        assert!(allowed.users.contains(DEPLOYER));
    }
}
