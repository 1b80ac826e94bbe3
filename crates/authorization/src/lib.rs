extern crate k8s_openapi;

pub mod api;
pub mod authorizer;
pub mod constants;
pub mod conversion;
pub mod errors;
pub mod reconcile;
pub mod resource_groups;
pub mod rule_coverage;
pub mod subjects;
pub mod user_validation;

pub use errors::{AuthorizationError, ConversionError};
pub use resource_groups::ResourceGroups;
