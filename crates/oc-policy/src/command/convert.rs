use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use k8s_openapi::api::rbac::v1 as rbac;
use origin_authorization::api::legacy::Object;
use origin_authorization::conversion::rbac::{
    convert_cluster_role_binding_to_rbac, convert_cluster_role_to_rbac,
    convert_rbac_cluster_role_binding_to_origin, convert_rbac_cluster_role_to_origin,
    convert_rbac_role_binding_to_origin, convert_rbac_role_to_origin, convert_role_binding_to_rbac,
    convert_role_to_rbac,
};
use serde::Serialize;
use serde_yaml::Value;
use tracing::{debug, info};

use crate::io::{from_document, kind_of, print_documents, read_documents};

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub(crate) enum RbacObject {
    Role(rbac::Role),
    ClusterRole(rbac::ClusterRole),
    RoleBinding(rbac::RoleBinding),
    ClusterRoleBinding(rbac::ClusterRoleBinding),
}

fn object_to_rbac(object: Object) -> Result<Vec<RbacObject>> {
    let converted = match object {
        Object::Role(role) => vec![RbacObject::Role(convert_role_to_rbac(&role))],
        Object::ClusterRole(role) => {
            let role = convert_cluster_role_to_rbac(&role);
            vec![RbacObject::ClusterRole(role)]
        }
        Object::RoleBinding(binding) => {
            let binding = convert_role_binding_to_rbac(&binding)?;
            vec![RbacObject::RoleBinding(binding)]
        }
        Object::ClusterRoleBinding(binding) => {
            let binding = convert_cluster_role_binding_to_rbac(&binding)?;
            vec![RbacObject::ClusterRoleBinding(binding)]
        }
        Object::Policy(policy) => policy
            .roles
            .values()
            .map(|role| RbacObject::Role(convert_role_to_rbac(role)))
            .collect(),
        Object::ClusterPolicy(policy) => policy
            .roles
            .values()
            .map(|role| RbacObject::ClusterRole(convert_cluster_role_to_rbac(role)))
            .collect(),
        Object::PolicyBinding(policy_binding) => policy_binding
            .role_bindings
            .values()
            .map(|binding| convert_role_binding_to_rbac(binding).map(RbacObject::RoleBinding))
            .collect::<Result<Vec<_>, _>>()?,
        Object::ClusterPolicyBinding(policy_binding) => policy_binding
            .role_bindings
            .values()
            .map(|binding| {
                convert_cluster_role_binding_to_rbac(binding).map(RbacObject::ClusterRoleBinding)
            })
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(converted)
}

/// Converts every legacy object found in `documents`. Policies and policy
/// bindings are flattened into the roles and bindings they hold.
pub(crate) fn to_rbac(documents: Vec<Value>, path: &str) -> Result<Vec<RbacObject>> {
    let mut converted = Vec::new();
    for document in documents {
        let object: Object = from_document(document, path)?;
        debug!(?object, "converting to rbac");
        converted.extend(object_to_rbac(object).with_context(|| format!("cannot convert {path}"))?);
    }
    Ok(converted)
}

/// Converts every RBAC object found in `documents`. Role bindings without a
/// namespace take `default_namespace`.
pub(crate) fn to_origin(
    documents: Vec<Value>,
    path: &str,
    default_namespace: &str,
) -> Result<Vec<Object>> {
    let mut converted = Vec::new();
    for document in documents {
        let kind = kind_of(&document).map(str::to_owned);
        let object = match kind.as_deref() {
            Some("Role") => {
                let role: rbac::Role = from_document(document, path)?;
                Object::Role(convert_rbac_role_to_origin(&role))
            }
            Some("ClusterRole") => {
                let role: rbac::ClusterRole = from_document(document, path)?;
                Object::ClusterRole(convert_rbac_cluster_role_to_origin(&role))
            }
            Some("RoleBinding") => {
                let binding: rbac::RoleBinding = from_document(document, path)?;
                let namespace = binding
                    .metadata
                    .namespace
                    .clone()
                    .unwrap_or_else(|| default_namespace.to_string());
                let converted = convert_rbac_role_binding_to_origin(&binding, &namespace)
                    .with_context(|| format!("cannot convert {path}"))?;
                Object::RoleBinding(converted)
            }
            Some("ClusterRoleBinding") => {
                let binding: rbac::ClusterRoleBinding = from_document(document, path)?;
                let converted = convert_rbac_cluster_role_binding_to_origin(&binding)
                    .with_context(|| format!("cannot convert {path}"))?;
                Object::ClusterRoleBinding(converted)
            }
            other => {
                return Err(anyhow!("unsupported kind {:?} in {path}", other.unwrap_or_default()));
            }
        };
        converted.push(object);
    }
    Ok(converted)
}

pub(crate) fn run(matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("file")
        .expect("clap should have enforced the presence of file");
    let documents = read_documents(path)?;
    info!(
        path = path.as_str(),
        objects = documents.len(),
        "read objects"
    );

    match matches.get_one::<String>("to").map(String::as_str) {
        Some("rbac") => print_documents(&to_rbac(documents, path)?),
        Some("origin") => {
            let namespace = matches
                .get_one::<String>("namespace")
                .map(String::as_str)
                .unwrap_or_default();
            print_documents(&to_origin(documents, path, namespace)?)
        }
        other => Err(anyhow!("unknown conversion target {other:?}")),
    }
}
