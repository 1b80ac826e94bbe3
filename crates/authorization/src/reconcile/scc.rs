use itertools::Itertools;
use tracing::debug;

use crate::api::security::SecurityContextConstraints;

fn sorted_union(a: &[String], b: &[String]) -> Vec<String> {
    a.iter().chain(b).cloned().sorted().dedup().collect()
}

/// Comparable copy of `scc`: list order of users and groups is irrelevant.
fn normalized(scc: &SecurityContextConstraints) -> SecurityContextConstraints {
    let mut scc = scc.clone();
    scc.users.sort();
    scc.groups.sort();
    scc
}

/// Computes the SCC to persist and whether `actual` needs to be updated.
///
/// With `union` the users and groups of `actual` are kept and its priority
/// wins when set. Metadata is never compared: the returned SCC carries the
/// metadata of `expected`.
pub fn compute_updated_scc(
    expected: &SecurityContextConstraints,
    actual: &SecurityContextConstraints,
    union: bool,
) -> (SecurityContextConstraints, bool) {
    let mut merged = expected.clone();

    if union {
        merged.users = sorted_union(&expected.users, &actual.users);
        merged.groups = sorted_union(&expected.groups, &actual.groups);
        if actual.priority.is_some() {
            merged.priority = actual.priority;
        }
    }

    let mut comparable = normalized(&merged);
    comparable.metadata = actual.metadata.clone();
    let needs_update = comparable != normalized(actual);

    if needs_update {
        debug!(
            scc = expected.metadata.name.as_deref().unwrap_or_default(),
            union,
            "security context constraints need update"
        );
    }
    (merged, needs_update)
}
