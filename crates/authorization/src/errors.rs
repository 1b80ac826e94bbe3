use itertools::Itertools;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConversionError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error(
        "invalid origin role binding {binding}: attempts to reference role in namespace {role_namespace:?} instead of current namespace {binding_namespace:?}"
    )]
    CrossNamespaceRoleRef {
        binding: String,
        role_namespace: String,
        binding_namespace: String,
    },

    #[error(
        "invalid origin cluster role binding {binding}: attempts to reference role in namespace {role_namespace:?} instead of cluster scope"
    )]
    NamespacedClusterRoleRef {
        binding: String,
        role_namespace: String,
    },

    #[error("invalid kind for origin subject: {0:?}")]
    InvalidOriginSubjectKind(String),

    #[error("invalid kind for rbac subject: {0:?}")]
    InvalidRbacSubjectKind(String),

    #[error(
        "invalid rbac role binding {binding}: attempts to reference role in invalid API group {api_group:?}"
    )]
    InvalidRoleRefApiGroup { binding: String, api_group: String },

    #[error("invalid rbac role binding {binding}: unknown role reference kind {kind:?}")]
    InvalidRoleRefKind { binding: String, kind: String },

    #[error("invalid rbac role binding {binding}: references a Role but has no namespace")]
    MissingBindingNamespace { binding: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("role {name:?} not found in namespace {namespace:?}")]
    RoleNotFound { namespace: String, name: String },

    #[error("[{}]", .0.iter().map(ToString::to_string).join(", "))]
    Aggregate(Vec<AuthorizationError>),
}

impl AuthorizationError {
    /// Collapse a list of errors: `None` when empty, the error itself when
    /// there is exactly one.
    pub fn aggregate(mut errors: Vec<AuthorizationError>) -> Option<AuthorizationError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(AuthorizationError::Aggregate(errors)),
        }
    }
}
