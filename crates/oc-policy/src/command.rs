pub(crate) mod convert;
pub(crate) mod modify_roles;
pub(crate) mod reconcile;
pub(crate) mod review;
