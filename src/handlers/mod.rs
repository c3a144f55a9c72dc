//! HTTP handlers for user, role and privilege management.

pub mod user;
pub use user::*;
