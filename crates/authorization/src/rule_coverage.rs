//! Matching predicates on legacy policy rules, and rule coverage: whether a
//! set of rules grants at least everything another set grants.

use std::collections::BTreeSet;

use crate::api::legacy::PolicyRule;
use crate::constants::{API_GROUP_ALL, RESOURCE_ALL, VERB_ALL};
use crate::resource_groups::ResourceGroups;

pub fn verb_matches(verbs: &BTreeSet<String>, verb: &str) -> bool {
    verbs.contains(VERB_ALL) || verbs.contains(&verb.to_lowercase())
}

/// An empty list of API groups matches every group.
pub fn api_group_matches(api_groups: &[String], api_group: &str) -> bool {
    api_groups.is_empty()
        || api_groups.iter().any(|g| g == API_GROUP_ALL)
        || api_groups.iter().any(|g| g == api_group)
}

/// `resources` must already be normalized.
pub fn resource_matches(resources: &BTreeSet<String>, resource: &str) -> bool {
    resources.contains(RESOURCE_ALL) || resources.contains(&resource.to_lowercase())
}

/// An empty list of names matches every name. An empty name in the list
/// only matches requests without a name.
pub fn name_matches(resource_names: &BTreeSet<String>, name: &str) -> bool {
    resource_names.is_empty() || resource_names.contains(name)
}

/// Paths ending with `*` match every URL they prefix, the others match
/// exactly.
pub fn non_resource_url_matches(non_resource_urls: &BTreeSet<String>, url: &str) -> bool {
    non_resource_urls
        .iter()
        .any(|allowed| match allowed.strip_suffix('*') {
            Some(prefix) => url.starts_with(prefix),
            None => allowed == url,
        })
}

/// Splits `rule` into rules granting exactly one verb on one resource (or
/// resource name) or on one non resource URL. Resource groups are expanded.
pub fn breakdown_rule(groups: &ResourceGroups, rule: &PolicyRule) -> Vec<PolicyRule> {
    let atomic = |verb: &String| PolicyRule {
        verbs: BTreeSet::from([verb.clone()]),
        attribute_restrictions: rule.attribute_restrictions.clone(),
        api_groups: rule.api_groups.clone(),
        ..Default::default()
    };
    let resources = groups.normalize(&rule.resources);

    let mut rules = Vec::new();
    for verb in &rule.verbs {
        for resource in &resources {
            if rule.resource_names.is_empty() {
                rules.push(PolicyRule {
                    resources: BTreeSet::from([resource.clone()]),
                    ..atomic(verb)
                });
                continue;
            }
            for name in &rule.resource_names {
                rules.push(PolicyRule {
                    resources: BTreeSet::from([resource.clone()]),
                    resource_names: BTreeSet::from([name.clone()]),
                    ..atomic(verb)
                });
            }
        }
        for url in &rule.non_resource_urls {
            rules.push(PolicyRule {
                api_groups: Vec::new(),
                non_resource_urls: BTreeSet::from([url.clone()]),
                ..atomic(verb)
            });
        }
    }
    rules
}

fn api_groups_covered(owner: &[String], servant: &[String]) -> bool {
    if owner.is_empty() || owner.iter().any(|g| g == API_GROUP_ALL) {
        return true;
    }
    !servant.is_empty() && servant.iter().all(|g| owner.contains(g))
}

fn names_covered(owner: &PolicyRule, servant: &PolicyRule) -> bool {
    if owner.resource_names.is_empty() {
        return true;
    }
    !servant.resource_names.is_empty() && servant.resource_names.is_subset(&owner.resource_names)
}

/// Whether `owner` grants everything `servant` grants.
pub fn rule_covers(groups: &ResourceGroups, owner: &PolicyRule, servant: &PolicyRule) -> bool {
    if owner.is_restricted() && owner.attribute_restrictions != servant.attribute_restrictions {
        return false;
    }

    let owner_resources = groups.normalize(&owner.resources);

    servant
        .verbs
        .iter()
        .all(|verb| verb_matches(&owner.verbs, verb))
        && api_groups_covered(&owner.api_groups, &servant.api_groups)
        && groups
            .normalize(&servant.resources)
            .iter()
            .all(|resource| resource_matches(&owner_resources, resource))
        && names_covered(owner, servant)
        && servant
            .non_resource_urls
            .iter()
            .all(|url| non_resource_url_matches(&owner.non_resource_urls, url))
}

fn covered_by(groups: &ResourceGroups, owner_rules: &[PolicyRule], servant: &PolicyRule) -> bool {
    owner_rules
        .iter()
        .any(|owner| rule_covers(groups, owner, servant))
}

/// Checks whether `owner_rules` grant everything `servant_rules` grant.
/// Returns the atomic rules of `servant_rules` that are not covered.
pub fn covers(
    groups: &ResourceGroups,
    owner_rules: &[PolicyRule],
    servant_rules: &[PolicyRule],
) -> (bool, Vec<PolicyRule>) {
    let uncovered: Vec<PolicyRule> = servant_rules
        .iter()
        .flat_map(|rule| breakdown_rule(groups, rule))
        .filter(|servant| !covered_by(groups, owner_rules, servant))
        .collect();
    (uncovered.is_empty(), uncovered)
}
