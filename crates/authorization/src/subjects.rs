use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::api::rbac::v1::Subject;
use std::{fmt, str::FromStr};

use crate::constants::{
    GROUP_KIND, RBAC_GROUP_NAME, SERVICE_ACCOUNT_KIND, SERVICE_ACCOUNT_USERNAME_PREFIX,
    SYSTEM_GROUP_KIND, SYSTEM_USER_KIND, USER_KIND,
};
use crate::errors::ConversionError;

/// The kinds of subject a legacy binding can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectKind {
    User,
    Group,
    ServiceAccount,
    SystemUser,
    SystemGroup,
}

impl SubjectKind {
    /// Parse the kind of a legacy subject reference. A missing kind is
    /// reported like any other unknown kind.
    pub fn of(subject: &ObjectReference) -> Result<Self, ConversionError> {
        subject.kind.as_deref().unwrap_or_default().parse()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::User => USER_KIND,
            SubjectKind::Group => GROUP_KIND,
            SubjectKind::ServiceAccount => SERVICE_ACCOUNT_KIND,
            SubjectKind::SystemUser => SYSTEM_USER_KIND,
            SubjectKind::SystemGroup => SYSTEM_GROUP_KIND,
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubjectKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            USER_KIND => Ok(SubjectKind::User),
            GROUP_KIND => Ok(SubjectKind::Group),
            SERVICE_ACCOUNT_KIND => Ok(SubjectKind::ServiceAccount),
            SYSTEM_USER_KIND => Ok(SubjectKind::SystemUser),
            SYSTEM_GROUP_KIND => Ok(SubjectKind::SystemGroup),
            other => Err(ConversionError::InvalidOriginSubjectKind(other.to_string())),
        }
    }
}

/// The kinds of subject an RBAC binding can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RbacSubjectKind {
    User,
    Group,
    ServiceAccount,
}

impl RbacSubjectKind {
    pub fn of(subject: &Subject) -> Result<Self, ConversionError> {
        subject.kind.parse()
    }
}

impl FromStr for RbacSubjectKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            USER_KIND => Ok(RbacSubjectKind::User),
            GROUP_KIND => Ok(RbacSubjectKind::Group),
            SERVICE_ACCOUNT_KIND => Ok(RbacSubjectKind::ServiceAccount),
            other => Err(ConversionError::InvalidRbacSubjectKind(other.to_string())),
        }
    }
}

pub fn rbac_user(name: &str) -> Subject {
    Subject {
        api_group: Some(RBAC_GROUP_NAME.to_string()),
        kind: USER_KIND.to_string(),
        name: name.to_string(),
        namespace: None,
    }
}

pub fn rbac_group(name: &str) -> Subject {
    Subject {
        api_group: Some(RBAC_GROUP_NAME.to_string()),
        kind: GROUP_KIND.to_string(),
        name: name.to_string(),
        namespace: None,
    }
}

pub fn rbac_service_account(namespace: &str, name: &str) -> Subject {
    Subject {
        api_group: None,
        kind: SERVICE_ACCOUNT_KIND.to_string(),
        name: name.to_string(),
        namespace: Some(namespace.to_string()),
    }
}

/// Splits a `system:serviceaccount:<namespace>:<name>` user name.
pub fn split_service_account_username(username: &str) -> Option<(&str, &str)> {
    let rest = username.strip_prefix(SERVICE_ACCOUNT_USERNAME_PREFIX)?;
    let (namespace, name) = rest.split_once(':')?;
    if namespace.is_empty() || name.is_empty() || name.contains(':') {
        return None;
    }
    Some((namespace, name))
}

/// Builds RBAC subjects out of user and group names. Service account user
/// names become ServiceAccount subjects.
pub fn build_rbac_subjects(users: &[String], groups: &[String]) -> Vec<Subject> {
    let users = users
        .iter()
        .map(|user| match split_service_account_username(user) {
            Some((namespace, name)) => rbac_service_account(namespace, name),
            None => rbac_user(user),
        });
    let groups = groups.iter().map(|group| rbac_group(group));
    users.chain(groups).collect()
}

/// Subjects are the same when kind, name and namespace match. The API group
/// is ignored.
fn same_subject(a: &Subject, b: &Subject) -> bool {
    a.kind == b.kind && a.name == b.name && a.namespace == b.namespace
}

/// Appends `subjects_to_add` to `existing`, skipping the ones already there.
///
/// The returned list always starts with `existing`: new subjects are found at
/// `existing.len()..`.
pub fn add_subjects(existing: &[Subject], subjects_to_add: &[Subject]) -> Vec<Subject> {
    let mut subjects = existing.to_vec();
    for subject in subjects_to_add {
        if !subjects.iter().any(|s| same_subject(s, subject)) {
            subjects.push(subject.clone());
        }
    }
    subjects
}

/// Removes every occurrence of `needles` from `haystack`, returning the
/// remaining subjects and how many were removed.
pub fn remove_subjects(haystack: &[Subject], needles: &[Subject]) -> (Vec<Subject>, usize) {
    let (removed, kept): (Vec<&Subject>, Vec<&Subject>) = haystack
        .iter()
        .partition(|existing| needles.iter().any(|n| same_subject(existing, n)));
    (kept.into_iter().cloned().collect(), removed.len())
}

/// Compares two lists by containment.
///
/// Returns the elements of `list1` missing from `list2` and the elements of
/// `list2` missing from `list1`. Duplicates are not collapsed.
pub fn diff_subjects<S: PartialEq + Clone>(list1: &[S], list2: &[S]) -> (Vec<S>, Vec<S>) {
    let only_in_1 = list1
        .iter()
        .filter(|s| !list2.contains(s))
        .cloned()
        .collect();
    let only_in_2 = list2
        .iter()
        .filter(|s| !list1.contains(s))
        .cloned()
        .collect();
    (only_in_1, only_in_2)
}
