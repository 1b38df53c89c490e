//! User entity model and DTOs.

use quire_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub name_slug: String,
    pub email: String,
    /// Unverified authors cannot publish a wiki publicly.
    pub verified: bool,
    pub created_at: Timestamp,
}

/// DTO for registering a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(email)]
    pub email: String,
}
