use common::{setup_command, test_data};
use predicates::{prelude::*, str::contains, str::is_empty};
use rstest::rstest;
use tempfile::tempdir;

mod common;

#[test]
fn test_no_subcommand() {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.assert().failure();
}

#[test]
fn test_convert_to_rbac() {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("convert")
        .arg("--to")
        .arg("rbac")
        .arg("--file")
        .arg(test_data("legacy-objects.yaml"));

    cmd.assert()
        .success()
        .stdout(contains("apiVersion: rbac.authorization.k8s.io/v1"))
        .stdout(contains("kind: ServiceAccount"))
        .stdout(contains("name: system:masters"))
        .stdout(contains("localsubjectaccessreviews").not());
}

#[test]
fn test_convert_cross_namespace_role_ref() {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("convert")
        .arg("--to")
        .arg("rbac")
        .arg("--file")
        .arg(test_data("legacy-cross-namespace.yaml"));

    cmd.assert()
        .failure()
        .stdout(is_empty())
        .stderr(contains("attempts to reference role in namespace"));
}

#[test]
fn test_convert_to_origin() {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("convert")
        .arg("--to")
        .arg("origin")
        .arg("--namespace")
        .arg("ns1")
        .arg("--file")
        .arg(test_data("rbac-objects.yaml"));

    cmd.assert()
        .success()
        .stdout(contains("kind: SystemUser"))
        .stdout(contains("name: system:admin"))
        .stdout(contains("namespace: ns1"));
}

#[test]
fn test_convert_to_origin_role_without_namespace() {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("convert")
        .arg("--to")
        .arg("origin")
        .arg("--file")
        .arg(test_data("rbac-objects.yaml"));

    cmd.assert()
        .failure()
        .stdout(is_empty())
        .stderr(contains("references a Role but has no namespace"));
}

#[test]
fn test_convert_unsupported_kind() {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("convert")
        .arg("--to")
        .arg("origin")
        .arg("--file")
        .arg(test_data("config-map.yaml"));

    cmd.assert()
        .failure()
        .stderr(contains("unsupported kind \"ConfigMap\""));
}

#[rstest]
#[case::overwrite(false, &["action: update", "action: create", "name: basic-user"])]
#[case::additive_only(true, &["action: create", "name: basic-user"])]
fn test_reconcile_cluster_roles(#[case] additive_only: bool, #[case] expected: &[&str]) {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("reconcile-cluster-roles")
        .arg("--expected")
        .arg(test_data("cluster-roles-expected.yaml"))
        .arg("--actual")
        .arg(test_data("cluster-roles-actual.yaml"));
    if additive_only {
        cmd.arg("--additive-only");
    }

    let mut assert = cmd.assert().success();
    for fragment in expected {
        assert = assert.stdout(contains(*fragment));
    }
    if additive_only {
        assert.stdout(contains("action: update").not());
    }
}

#[test]
fn test_reconcile_rbac_cluster_roles_up_to_date() {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("reconcile-cluster-roles")
        .arg("--expected")
        .arg(test_data("rbac-cluster-roles.yaml"))
        .arg("--actual")
        .arg(test_data("rbac-cluster-roles.yaml"));

    cmd.assert().success().stdout(is_empty());
}

#[test]
fn test_reconcile_cluster_role_bindings() {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("reconcile-cluster-role-bindings")
        .arg("--expected")
        .arg(test_data("cluster-role-bindings-expected.yaml"))
        .arg("--actual")
        .arg(test_data("cluster-role-bindings-actual.yaml"));

    cmd.assert()
        .success()
        .stdout(contains("action: update"))
        .stdout(contains("name: system:authenticated:oauth"));
}

#[test]
fn test_reconcile_cluster_role_bindings_excluded_group() {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("reconcile-cluster-role-bindings")
        .arg("--expected")
        .arg(test_data("cluster-role-bindings-expected.yaml"))
        .arg("--actual")
        .arg(test_data("cluster-role-bindings-actual.yaml"))
        .arg("--exclude-group")
        .arg("system:authenticated:oauth");

    cmd.assert().success().stdout(is_empty());
}

#[rstest]
#[case::overwrite(false, false)]
#[case::additive_only(true, true)]
fn test_reconcile_sccs(#[case] additive_only: bool, #[case] keeps_users: bool) {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("reconcile-sccs")
        .arg("--expected")
        .arg(test_data("sccs-expected.yaml"))
        .arg("--actual")
        .arg(test_data("sccs-actual.yaml"));
    if additive_only {
        cmd.arg("--additive-only");
    }

    let assert = cmd
        .assert()
        .success()
        .stdout(contains("action: update"))
        .stdout(contains("resourceVersion: '42'").or(contains("resourceVersion: \"42\"")))
        .stdout(contains("system:authenticated"));
    if keeps_users {
        assert.stdout(contains("system:serviceaccount:ci:runner"));
    } else {
        assert.stdout(contains("system:serviceaccount:ci:runner").not());
    }
}

#[test]
fn test_add_role_to_user() {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("add-role-to-user")
        .arg("view")
        .arg("alice")
        .arg("system:serviceaccount:ci:runner")
        .arg("--binding")
        .arg(test_data("view-binding.yaml"));

    cmd.assert()
        .success()
        .stdout(contains("name: bob"))
        .stdout(contains("name: alice"))
        .stdout(contains("kind: ServiceAccount"))
        .stdout(contains("namespace: ci"));
}

#[test]
fn test_add_role_to_group_without_binding() {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("add-role-to-group")
        .arg("edit")
        .arg("qa")
        .arg("--namespace")
        .arg("ns2");

    cmd.assert()
        .success()
        .stdout(contains("kind: RoleBinding"))
        .stdout(contains("kind: ClusterRole"))
        .stdout(contains("namespace: ns2"))
        .stdout(contains("name: qa"));
}

#[test]
fn test_remove_role_from_group() {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("remove-role-from-group")
        .arg("view")
        .arg("devs")
        .arg("--binding")
        .arg(test_data("view-binding.yaml"));

    cmd.assert()
        .success()
        .stdout(contains("name: bob"))
        .stdout(contains("name: devs").not());
}

#[rstest]
#[case::role_mismatch(&["add-role-to-user", "edit", "alice", "--binding"], true, "references role")]
#[case::remove_without_binding(&["remove-role-from-user", "view", "bob"], false, "--binding is required")]
fn test_modify_role_errors(
    #[case] args: &[&str],
    #[case] with_binding_file: bool,
    #[case] message: &str,
) {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.args(args);
    if with_binding_file {
        cmd.arg(test_data("view-binding.yaml"));
    }

    cmd.assert().failure().stderr(contains(message));
}

#[test]
fn test_who_can() {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("who-can")
        .arg("get")
        .arg("pods")
        .arg("--namespace")
        .arg("ns0")
        .arg("--policy")
        .arg(test_data("policy.yaml"));

    cmd.assert()
        .success()
        .stdout(contains("- bob"))
        .stdout(contains("- system:masters"))
        .stdout(contains("alice").not());
}

#[rstest]
#[case::namespaced_role("alice", None, "create", "deploymentconfigs", "ns0", "yes")]
#[case::other_namespace("alice", None, "create", "deploymentconfigs", "ns1", "no")]
#[case::master_role("bob", None, "list", "pods", "ns0", "yes")]
#[case::read_only("bob", None, "delete", "pods", "ns0", "no")]
#[case::cluster_admin("carol", Some("system:masters"), "delete", "secrets", "ns1", "yes")]
#[case::non_resource_url("carol", Some("system:masters"), "get", "/healthz", "", "yes")]
#[case::non_resource_url_denied("carol", None, "get", "/healthz", "", "no")]
fn test_can_i(
    #[case] user: &str,
    #[case] group: Option<&str>,
    #[case] verb: &str,
    #[case] resource: &str,
    #[case] namespace: &str,
    #[case] answer: &str,
) {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("can-i")
        .arg(verb)
        .arg(resource)
        .arg("--namespace")
        .arg(namespace)
        .arg("--user")
        .arg(user)
        .arg("--policy")
        .arg(test_data("policy.yaml"));
    if let Some(group) = group {
        cmd.arg("--group").arg(group);
    }

    cmd.assert().success().stdout(format!("{answer}\n"));
}

#[test]
fn test_json_logs() {
    let tempdir = tempdir().unwrap();

    let mut cmd = setup_command(tempdir.path());
    cmd.arg("--log-level")
        .arg("info")
        .arg("--log-fmt")
        .arg("json")
        .arg("who-can")
        .arg("get")
        .arg("pods")
        .arg("--policy")
        .arg(test_data("policy.yaml"));

    cmd.assert()
        .success()
        .stderr(contains("policies loaded"))
        .stderr(contains("{"));
}
