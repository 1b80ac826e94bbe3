use anyhow::{Result, anyhow};
use clap::ArgMatches;
use k8s_openapi::api::rbac::v1 as rbac;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use origin_authorization::constants::{CLUSTER_ROLE_KIND, RBAC_GROUP_NAME};
use origin_authorization::reconcile::ReconcilableBinding;
use origin_authorization::subjects::{add_subjects, build_rbac_subjects, remove_subjects};
use serde::Serialize;
use tracing::{info, warn};

use crate::io::{from_document, kind_of, print_documents, read_documents};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubjectType {
    User,
    Group,
}

/// Updates the subjects of `binding` in place.
fn modify<B>(binding: &mut B, operation: Operation, subjects: &[rbac::Subject])
where
    B: ReconcilableBinding<Subject = rbac::Subject>,
{
    let name = binding.metadata().name.clone().unwrap_or_default();
    match operation {
        Operation::Add => {
            let before = binding.subjects().len();
            let updated = add_subjects(binding.subjects(), subjects);
            info!(
                binding = name,
                added = updated.len() - before,
                "subjects added"
            );
            binding.set_subjects(updated);
        }
        Operation::Remove => {
            let (updated, removed) = remove_subjects(binding.subjects(), subjects);
            if removed == 0 {
                warn!(binding = name, "none of the subjects was bound");
            } else {
                info!(binding = name, removed, "subjects removed");
            }
            binding.set_subjects(updated);
        }
    }
}

fn check_role_ref(binding: &str, role_ref: &rbac::RoleRef, role: &str) -> Result<()> {
    if role_ref.name != role {
        return Err(anyhow!(
            "binding {binding:?} references role {:?}, not {role:?}",
            role_ref.name
        ));
    }
    Ok(())
}

/// Binding created when adding subjects to a role without an existing
/// binding: a RoleBinding named after the role, granting the cluster role.
pub(crate) fn new_role_binding(role: &str, namespace: &str) -> rbac::RoleBinding {
    rbac::RoleBinding {
        metadata: ObjectMeta {
            name: Some(role.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        role_ref: rbac::RoleRef {
            api_group: RBAC_GROUP_NAME.to_string(),
            kind: CLUSTER_ROLE_KIND.to_string(),
            name: role.to_string(),
        },
        subjects: None,
    }
}

fn modify_and_print<B>(
    mut binding: B,
    role: &str,
    operation: Operation,
    subjects: &[rbac::Subject],
) -> Result<()>
where
    B: ReconcilableBinding<Subject = rbac::Subject, RoleRef = rbac::RoleRef> + Serialize,
{
    let name = binding.metadata().name.clone().unwrap_or_default();
    check_role_ref(&name, binding.role_ref(), role)?;
    modify(&mut binding, operation, subjects);
    print_documents(&[binding])
}

pub(crate) fn run(
    matches: &ArgMatches,
    operation: Operation,
    subject_type: SubjectType,
) -> Result<()> {
    let role = matches
        .get_one::<String>("role")
        .expect("clap should have enforced the presence of role");
    let names: Vec<String> = matches
        .get_many::<String>("subjects")
        .unwrap_or_default()
        .cloned()
        .collect();
    let subjects = match subject_type {
        SubjectType::User => build_rbac_subjects(&names, &[]),
        SubjectType::Group => build_rbac_subjects(&[], &names),
    };

    let Some(path) = matches.get_one::<String>("binding") else {
        if operation == Operation::Remove {
            return Err(anyhow!("--binding is required to remove subjects from a role"));
        }
        let namespace = matches
            .get_one::<String>("namespace")
            .expect("This should not happen, there's a default value for namespace");
        let binding = new_role_binding(role, namespace);
        return modify_and_print(binding, role, operation, &subjects);
    };

    let mut documents = read_documents(path)?;
    if documents.len() != 1 {
        return Err(anyhow!(
            "{path} must hold exactly one binding, found {} objects",
            documents.len()
        ));
    }
    let document = documents.remove(0);
    let kind = kind_of(&document).map(str::to_owned);
    match kind.as_deref() {
        Some("RoleBinding") => {
            let binding: rbac::RoleBinding = from_document(document, path)?;
            modify_and_print(binding, role, operation, &subjects)
        }
        Some("ClusterRoleBinding") => {
            let binding: rbac::ClusterRoleBinding = from_document(document, path)?;
            modify_and_print(binding, role, operation, &subjects)
        }
        other => Err(anyhow!(
            "{path} must hold a RoleBinding or a ClusterRoleBinding, found {:?}",
            other.unwrap_or_default()
        )),
    }
}
