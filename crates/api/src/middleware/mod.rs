//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the caller from a JWT Bearer token.
//! - [`rbac::RequireSender`] -- Requires a role allowed to send invites.

pub mod auth;
pub mod rbac;
