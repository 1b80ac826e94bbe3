use std::collections::BTreeSet;

use anyhow::Result;
use clap::ArgMatches;
use itertools::Itertools;
use origin_authorization::ResourceGroups;
use origin_authorization::api::legacy::{ClusterPolicy, ClusterPolicyBinding};
use origin_authorization::authorizer::{
    Attributes, Authorizer, InMemoryPolicyStore, RequestTarget, UserInfo,
};
use origin_authorization::conversion::cluster_scope::{to_policy, to_policy_binding};
use serde::Serialize;
use serde_yaml::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::io::{from_document, kind_of, print_documents, read_documents};

/// Builds a policy store out of the Policy and PolicyBinding objects found in
/// `documents`. Cluster policies are stored in `master_namespace`.
pub(crate) fn load_policy_store(
    documents: Vec<Value>,
    path: &str,
    master_namespace: &str,
) -> Result<InMemoryPolicyStore> {
    let mut store = InMemoryPolicyStore::new();
    for document in documents {
        let kind = kind_of(&document).map(str::to_owned);
        match kind.as_deref() {
            Some("Policy") => store.insert_policy(from_document(document, path)?),
            Some("PolicyBinding") => store.insert_policy_binding(from_document(document, path)?),
            Some("ClusterPolicy") => {
                let policy: ClusterPolicy = from_document(document, path)?;
                store.insert_policy(to_policy(&policy, master_namespace));
            }
            Some("ClusterPolicyBinding") => {
                let binding: ClusterPolicyBinding = from_document(document, path)?;
                store.insert_policy_binding(to_policy_binding(&binding, master_namespace));
            }
            other => warn!(path, kind = other, "skipping object that is not a policy"),
        }
    }
    info!(
        path,
        namespaces = store.namespaces().iter().join(","),
        "policies loaded"
    );
    Ok(store)
}

fn attributes(matches: &ArgMatches, user: UserInfo) -> Attributes {
    let get = |name: &str| {
        matches
            .get_one::<String>(name)
            .cloned()
            .unwrap_or_default()
    };
    let verb = get("verb");
    let resource = get("resource");

    if resource.starts_with('/') {
        return Attributes::non_resource(user, &verb, &resource);
    }
    Attributes {
        user,
        verb,
        namespace: get("namespace"),
        target: RequestTarget::Resource {
            api_group: get("api-group"),
            resource,
            name: get("resource-name"),
        },
    }
}

fn authorizer_for<'a>(
    matches: &ArgMatches,
    config: &Config,
    resource_groups: &'a ResourceGroups,
) -> Result<Authorizer<'a, InMemoryPolicyStore>> {
    let path = matches
        .get_one::<String>("policy")
        .expect("clap should have enforced the presence of policy");
    let store = load_policy_store(read_documents(path)?, path, &config.master_namespace)?;
    Ok(Authorizer::new(&config.master_namespace, store, resource_groups))
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct WhoCanReport {
    verb: String,
    resource: String,
    namespace: String,
    users: BTreeSet<String>,
    groups: BTreeSet<String>,
}

pub(crate) fn who_can(matches: &ArgMatches, config: &Config) -> Result<()> {
    let resource_groups = ResourceGroups::new();
    let authorizer = authorizer_for(matches, config, &resource_groups)?;
    let attributes = attributes(matches, UserInfo::default());

    let allowed = authorizer.allowed_subjects(&attributes)?;
    let resource = match &attributes.target {
        RequestTarget::Resource { resource, .. } => resource.clone(),
        RequestTarget::NonResource { url } => url.clone(),
    };
    print_documents(&[WhoCanReport {
        verb: attributes.verb,
        resource,
        namespace: attributes.namespace,
        users: allowed.users,
        groups: allowed.groups,
    }])
}

pub(crate) fn can_i(matches: &ArgMatches, config: &Config) -> Result<()> {
    let resource_groups = ResourceGroups::new();
    let authorizer = authorizer_for(matches, config, &resource_groups)?;
    let user = UserInfo {
        name: matches
            .get_one::<String>("user")
            .cloned()
            .expect("clap should have enforced the presence of user"),
        groups: matches
            .get_many::<String>("group")
            .unwrap_or_default()
            .cloned()
            .collect(),
    };

    let decision = authorizer.authorize(&attributes(matches, user))?;
    info!(?decision, "request reviewed");
    println!("{}", if decision.is_allowed() { "yes" } else { "no" });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn documents(yaml: &str) -> Vec<Value> {
        serde_yaml::Deserializer::from_str(yaml)
            .map(|document| Value::deserialize(document).unwrap())
            .collect()
    }

    #[test]
    fn cluster_policies_land_in_master_namespace() {
        let store = load_policy_store(
            documents(
                r#"
kind: ClusterPolicy
metadata:
  name: default
roles:
  view:
    metadata:
      name: view
    rules:
    - verbs: [get]
      resources: [pods]
---
kind: PolicyBinding
metadata:
  name: openshift:default
  namespace: ns0
roleBindings: {}
---
kind: ConfigMap
metadata:
  name: ignored
"#,
            ),
            "policy.yaml",
            "openshift",
        )
        .unwrap();

        assert_eq!(store.namespaces(), BTreeSet::from(["ns0", "openshift"]));
    }
}
