use std::collections::BTreeMap;

use k8s_openapi::api::rbac::v1 as rbac;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::debug;

use crate::api::legacy;

/// A role whose rules can be reconciled against a recommended default.
pub trait ReconcilableRole: Clone {
    type Rule: PartialEq + Clone;

    fn metadata(&self) -> &ObjectMeta;
    fn metadata_mut(&mut self) -> &mut ObjectMeta;
    fn rules(&self) -> &[Self::Rule];
    fn set_rules(&mut self, rules: Vec<Self::Rule>);
}

macro_rules! legacy_role {
    ($role:ty) => {
        impl ReconcilableRole for $role {
            type Rule = legacy::PolicyRule;

            fn metadata(&self) -> &ObjectMeta {
                &self.metadata
            }

            fn metadata_mut(&mut self) -> &mut ObjectMeta {
                &mut self.metadata
            }

            fn rules(&self) -> &[legacy::PolicyRule] {
                &self.rules
            }

            fn set_rules(&mut self, rules: Vec<legacy::PolicyRule>) {
                self.rules = rules;
            }
        }
    };
}

macro_rules! rbac_role {
    ($role:ty) => {
        impl ReconcilableRole for $role {
            type Rule = rbac::PolicyRule;

            fn metadata(&self) -> &ObjectMeta {
                &self.metadata
            }

            fn metadata_mut(&mut self) -> &mut ObjectMeta {
                &mut self.metadata
            }

            fn rules(&self) -> &[rbac::PolicyRule] {
                self.rules.as_deref().unwrap_or_default()
            }

            fn set_rules(&mut self, rules: Vec<rbac::PolicyRule>) {
                self.rules = Some(rules);
            }
        }
    };
}

legacy_role!(legacy::ClusterRole);
legacy_role!(legacy::Role);
rbac_role!(rbac::ClusterRole);
rbac_role!(rbac::Role);

fn contains_all<T: PartialEq>(haystack: &[T], needles: &[T]) -> bool {
    needles.iter().all(|needle| haystack.contains(needle))
}

fn same_rules<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    contains_all(a, b) && contains_all(b, a)
}

/// Keys of `expected` missing from `actual` are added, values already in
/// `actual` are never overwritten. Returns `None` when nothing was added.
fn merge_map(
    expected: Option<&BTreeMap<String, String>>,
    actual: Option<&BTreeMap<String, String>>,
) -> Option<BTreeMap<String, String>> {
    let missing: Vec<(&String, &String)> = expected
        .into_iter()
        .flatten()
        .filter(|(key, _)| !actual.is_some_and(|actual| actual.contains_key(*key)))
        .collect();
    if missing.is_empty() {
        return None;
    }

    let mut merged = actual.cloned().unwrap_or_default();
    merged.extend(missing.into_iter().map(|(k, v)| (k.clone(), v.clone())));
    Some(merged)
}

/// Computes the role to persist so that `actual` grants what `expected`
/// grants. Returns `None` when `actual` is already fine.
///
/// Rules are compared as sets. With `union` the rules of `actual` missing
/// from `expected` are kept, otherwise the rules become exactly the expected
/// ones. Labels and annotations are always merged additively: keys already
/// set on `actual` win.
pub fn compute_reconciled_role<R: ReconcilableRole>(
    expected: &R,
    actual: &R,
    union: bool,
) -> Option<R> {
    let mut merged = actual.clone();
    let mut needs_update = false;

    let rules = if union {
        let mut rules = expected.rules().to_vec();
        for rule in actual.rules() {
            if !rules.contains(rule) {
                rules.push(rule.clone());
            }
        }
        rules
    } else {
        expected.rules().to_vec()
    };
    if !same_rules(&rules, actual.rules()) {
        needs_update = true;
        merged.set_rules(rules);
    }

    let expected_meta = expected.metadata();
    let actual_meta = actual.metadata();
    if let Some(labels) = merge_map(expected_meta.labels.as_ref(), actual_meta.labels.as_ref()) {
        needs_update = true;
        merged.metadata_mut().labels = Some(labels);
    }
    if let Some(annotations) = merge_map(
        expected_meta.annotations.as_ref(),
        actual_meta.annotations.as_ref(),
    ) {
        needs_update = true;
        merged.metadata_mut().annotations = Some(annotations);
    }

    if !needs_update {
        return None;
    }

    debug!(
        role = expected_meta.name.as_deref().unwrap_or_default(),
        union,
        "role needs update"
    );
    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::legacy::{ClusterRole, PolicyRule};
    use rstest::*;

    fn rule(resource: &str) -> PolicyRule {
        PolicyRule {
            verbs: ["get".to_string()].into(),
            resources: [resource.to_string()].into(),
            ..Default::default()
        }
    }

    fn role(resources: &[&str]) -> ClusterRole {
        ClusterRole {
            metadata: ObjectMeta {
                name: Some("viewer".to_string()),
                ..Default::default()
            },
            rules: resources.iter().map(|r| rule(r)).collect(),
            aggregation_rule: None,
        }
    }

    fn labels(pairs: &[(&str, &str)]) -> Option<BTreeMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[rstest]
    #[case::union(true, vec![rule("a"), rule("b")])]
    #[case::overwrite(false, vec![rule("a")])]
    fn rules_follow_union_policy(#[case] union: bool, #[case] expected_rules: Vec<PolicyRule>) {
        let expected = role(&["a"]);
        let actual = role(&["b"]);

        let merged = compute_reconciled_role(&expected, &actual, union).unwrap();
        assert_eq!(merged.rules, expected_rules);
        assert_eq!(compute_reconciled_role(&expected, &merged, union), None);
    }

    #[rstest]
    #[case::union(true)]
    #[case::overwrite(false)]
    fn rule_order_does_not_matter(#[case] union: bool) {
        let expected = role(&["a", "b"]);
        let actual = role(&["b", "a"]);
        assert_eq!(compute_reconciled_role(&expected, &actual, union), None);
    }

    #[test]
    fn union_keeps_actual_superset() {
        let expected = role(&["a"]);
        let actual = role(&["a", "b"]);
        assert_eq!(compute_reconciled_role(&expected, &actual, true), None);
        assert_eq!(
            compute_reconciled_role(&expected, &actual, false).map(|r| r.rules),
            Some(vec![rule("a")])
        );
    }

    #[rstest]
    #[case::union(true)]
    #[case::overwrite(false)]
    fn labels_are_merged_with_actual_winning(#[case] union: bool) {
        let mut expected = role(&["a"]);
        expected.metadata.labels = labels(&[("shared", "expected"), ("new", "1")]);
        let mut actual = role(&["a"]);
        actual.metadata.labels = labels(&[("shared", "actual"), ("operator", "x")]);
        actual.metadata.resource_version = Some("42".to_string());

        let merged = compute_reconciled_role(&expected, &actual, union).unwrap();
        assert_eq!(
            merged.metadata.labels,
            labels(&[("shared", "actual"), ("operator", "x"), ("new", "1")])
        );
        assert_eq!(merged.metadata.resource_version.as_deref(), Some("42"));
        assert_eq!(compute_reconciled_role(&expected, &merged, union), None);
    }

    #[test]
    fn annotations_already_present_do_not_trigger_update() {
        let mut expected = role(&["a"]);
        expected.metadata.annotations = labels(&[("description", "default")]);
        let mut actual = role(&["a"]);
        actual.metadata.annotations = labels(&[("description", "customised")]);

        assert_eq!(compute_reconciled_role(&expected, &actual, false), None);
    }

    #[test]
    fn rbac_roles_reconcile_too() {
        let read = rbac::PolicyRule {
            verbs: vec!["get".to_string()],
            resources: Some(vec!["pods".to_string()]),
            ..Default::default()
        };
        let expected = rbac::ClusterRole {
            rules: Some(vec![read.clone()]),
            ..Default::default()
        };
        let actual = rbac::ClusterRole::default();

        let merged = compute_reconciled_role(&expected, &actual, true).unwrap();
        assert_eq!(merged.rules, Some(vec![read]));
    }
}
