//! Authentication extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//!   `Option<AuthUser>` accepts anonymous requests.

pub mod auth;
