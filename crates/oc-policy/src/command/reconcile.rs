use anyhow::Result;
use clap::ArgMatches;
use k8s_openapi::api::rbac::v1 as rbac;
use origin_authorization::api::legacy;
use origin_authorization::api::security::SecurityContextConstraints;
use origin_authorization::conversion::rbac::convert_rbac_subject_to_origin;
use origin_authorization::reconcile::{
    ReconcileAction, reconcile_cluster_role_bindings, reconcile_cluster_roles, reconcile_sccs,
};
use origin_authorization::subjects::build_rbac_subjects;
use serde::Serialize;
use serde_yaml::Value;
use tracing::info;

use crate::io::{api_version_of, objects_of_kind, print_documents, read_documents, read_objects};

const RBAC_API_GROUP_PREFIX: &str = "rbac.authorization.k8s.io/";

struct ReconcileArgs<'a> {
    expected: &'a str,
    actual: &'a str,
    union: bool,
}

impl<'a> ReconcileArgs<'a> {
    fn from_matches(matches: &'a ArgMatches) -> Self {
        ReconcileArgs {
            expected: matches
                .get_one::<String>("expected")
                .expect("clap should have enforced the presence of expected"),
            actual: matches
                .get_one::<String>("actual")
                .expect("clap should have enforced the presence of actual"),
            union: matches.get_flag("additive-only"),
        }
    }
}

/// Objects are RBAC ones when the first document says so.
fn holds_rbac_objects(documents: &[Value]) -> bool {
    documents
        .first()
        .and_then(api_version_of)
        .is_some_and(|api_version| api_version.starts_with(RBAC_API_GROUP_PREFIX))
}

fn report<T: Serialize>(actions: Vec<ReconcileAction<T>>) -> Result<()> {
    info!(actions = actions.len(), "reconciliation computed");
    print_documents(&actions)
}

pub(crate) fn cluster_roles(matches: &ArgMatches) -> Result<()> {
    let args = ReconcileArgs::from_matches(matches);

    let documents = read_documents(args.expected)?;

    if holds_rbac_objects(&documents) {
        let expected: Vec<rbac::ClusterRole> =
            objects_of_kind(documents, args.expected, "ClusterRole")?;
        let actual: Vec<rbac::ClusterRole> = read_objects(args.actual, "ClusterRole")?;
        report(reconcile_cluster_roles(&expected, &actual, args.union))
    } else {
        let expected: Vec<legacy::ClusterRole> =
            objects_of_kind(documents, args.expected, "ClusterRole")?;
        let actual: Vec<legacy::ClusterRole> = read_objects(args.actual, "ClusterRole")?;
        report(reconcile_cluster_roles(&expected, &actual, args.union))
    }
}

pub(crate) fn cluster_role_bindings(matches: &ArgMatches) -> Result<()> {
    let args = ReconcileArgs::from_matches(matches);
    let excluded_users: Vec<String> = matches
        .get_many::<String>("exclude-user")
        .unwrap_or_default()
        .cloned()
        .collect();
    let excluded_groups: Vec<String> = matches
        .get_many::<String>("exclude-group")
        .unwrap_or_default()
        .cloned()
        .collect();
    let exclude_subjects = build_rbac_subjects(&excluded_users, &excluded_groups);
    let documents = read_documents(args.expected)?;

    if holds_rbac_objects(&documents) {
        let expected: Vec<rbac::ClusterRoleBinding> =
            objects_of_kind(documents, args.expected, "ClusterRoleBinding")?;
        let actual: Vec<rbac::ClusterRoleBinding> =
            read_objects(args.actual, "ClusterRoleBinding")?;
        report(reconcile_cluster_role_bindings(&expected, &actual, &exclude_subjects, args.union))
    } else {
        let exclude_subjects = exclude_subjects
            .iter()
            .map(convert_rbac_subject_to_origin)
            .collect::<Result<Vec<_>, _>>()?;
        let expected: Vec<legacy::ClusterRoleBinding> =
            objects_of_kind(documents, args.expected, "ClusterRoleBinding")?;
        let actual: Vec<legacy::ClusterRoleBinding> =
            read_objects(args.actual, "ClusterRoleBinding")?;
        report(reconcile_cluster_role_bindings(&expected, &actual, &exclude_subjects, args.union))
    }
}

pub(crate) fn sccs(matches: &ArgMatches) -> Result<()> {
    let args = ReconcileArgs::from_matches(matches);
    let expected: Vec<SecurityContextConstraints> =
        read_objects(args.expected, "SecurityContextConstraints")?;
    let actual: Vec<SecurityContextConstraints> =
        read_objects(args.actual, "SecurityContextConstraints")?;
    report(reconcile_sccs(&expected, &actual, args.union))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case::rbac("apiVersion: rbac.authorization.k8s.io/v1\nkind: ClusterRole", true)]
    #[case::legacy("apiVersion: authorization.openshift.io/v1\nkind: ClusterRole", false)]
    #[case::list_item_without_version("kind: ClusterRole", false)]
    fn object_family(#[case] yaml: &str, #[case] rbac: bool) {
        let documents = vec![serde_yaml::from_str::<Value>(yaml).unwrap()];
        assert_eq!(holds_rbac_objects(&documents), rbac);
    }

    #[test]
    fn no_documents_are_legacy() {
        assert!(!holds_rbac_objects(&[]));
    }
}
