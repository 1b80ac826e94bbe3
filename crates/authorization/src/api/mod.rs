//! Object model shared by the converters, the reconcilers and the authorizer.
//!
//! The RBAC family is not redefined here: `k8s_openapi::api::rbac::v1`
//! already provides it.

pub mod legacy;
pub mod security;
