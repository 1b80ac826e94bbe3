use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use origin_authorization::ResourceGroups;
use origin_authorization::api::legacy::{
    ClusterRole, ClusterRoleBinding, ClusterRoleList, PolicyRule, Role, RoleBinding,
};
use origin_authorization::conversion::rbac::*;
use origin_authorization::rule_coverage::covers;
use rstest::rstest;

use common::load;

mod common;

fn reference(kind: &str, name: &str, namespace: Option<&str>) -> ObjectReference {
    ObjectReference {
        kind: Some(kind.to_string()),
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        ..Default::default()
    }
}

fn role_binding(role_namespace: Option<&str>) -> RoleBinding {
    RoleBinding {
        metadata: ObjectMeta {
            name: Some("editors".to_string()),
            namespace: Some("ns0".to_string()),
            ..Default::default()
        },
        subjects: vec![
            reference("User", "alice", None),
            reference("Group", "devs", None),
            reference("ServiceAccount", "builder", Some("ns0")),
            reference("SystemUser", "system:admin", None),
            reference("SystemGroup", "system:authenticated", None),
        ],
        role_ref: ObjectReference {
            name: Some("edit".to_string()),
            namespace: role_namespace.map(str::to_string),
            ..Default::default()
        },
    }
}

#[rstest]
#[case::cluster_role_ref(None)]
#[case::local_role_ref(Some("ns0"))]
fn role_binding_round_trip(#[case] role_namespace: Option<&str>) {
    let binding = role_binding(role_namespace);
    let rbac = convert_role_binding_to_rbac(&binding).unwrap();
    let back = convert_rbac_role_binding_to_origin(&rbac, "ns0").unwrap();
    assert_eq!(back, binding);
}

#[test]
fn cluster_role_binding_round_trip() {
    let binding = ClusterRoleBinding {
        metadata: ObjectMeta {
            name: Some("cluster-admins".to_string()),
            ..Default::default()
        },
        subjects: vec![
            reference("SystemGroup", "system:cluster-admins", None),
            reference("User", "bob", None),
        ],
        role_ref: ObjectReference {
            name: Some("cluster-admin".to_string()),
            ..Default::default()
        },
    };
    let rbac = convert_cluster_role_binding_to_rbac(&binding).unwrap();
    assert_eq!(rbac.role_ref.kind, "ClusterRole");
    assert_eq!(
        convert_rbac_cluster_role_binding_to_origin(&rbac).unwrap(),
        binding
    );
}

#[test]
fn roles_without_restrictions_round_trip() {
    let roles: ClusterRoleList = load("bootstrap-cluster-roles.yaml");
    for role in roles.items.iter().filter(|r| !r.rules.iter().any(PolicyRule::is_restricted)) {
        let back = convert_rbac_cluster_role_to_origin(&convert_cluster_role_to_rbac(role));
        assert_eq!(&back, role);

        let namespaced = Role {
            metadata: ObjectMeta {
                namespace: Some("ns0".to_string()),
                ..role.metadata.clone()
            },
            rules: role.rules.clone(),
        };
        assert_eq!(
            convert_rbac_role_to_origin(&convert_role_to_rbac(&namespaced)),
            namespaced
        );
    }
}

const LOCAL_REVIEWS: &str = "localsubjectaccessreviews";

#[test]
fn restricted_rules_are_lost() {
    let groups = ResourceGroups::new();
    let roles: ClusterRoleList = load("bootstrap-cluster-roles.yaml");
    let admin: &ClusterRole = roles
        .items
        .iter()
        .find(|r| r.metadata.name.as_deref() == Some("admin"))
        .unwrap();
    let restricted: Vec<PolicyRule> = admin
        .rules
        .iter()
        .filter(|r| r.is_restricted())
        .cloned()
        .collect();
    assert_eq!(restricted.len(), 1);

    let rbac = convert_cluster_role_to_rbac(admin);
    assert!(
        rbac.rules
            .iter()
            .flatten()
            .all(|r| r.resources.iter().flatten().all(|res| res != LOCAL_REVIEWS))
    );

    let back = convert_rbac_cluster_role_to_origin(&rbac);
    assert!(back.rules.iter().all(|r| !r.is_restricted()));
    let (covered, uncovered) = covers(&groups, &back.rules, &restricted);
    assert!(!covered);
    assert_eq!(uncovered.len(), 1);

    // everything else survived
    let plain: Vec<PolicyRule> = admin
        .rules
        .iter()
        .filter(|r| !r.is_restricted())
        .cloned()
        .collect();
    assert!(covers(&groups, &back.rules, &plain).0);
}

#[test]
fn documented_errors() {
    let err = convert_role_binding_to_rbac(&role_binding(Some("ns1"))).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("ns0") && msg.contains("ns1"), "{msg}");

    let mut binding = role_binding(None);
    binding.subjects.push(reference("bogus", "x", None));
    let err = convert_role_binding_to_rbac(&binding).unwrap_err();
    assert!(err.to_string().contains("bogus"));
}
