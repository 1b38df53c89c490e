//! Repository for the `users` table.

use quire_core::types::DbId;
use quire_core::wiki::slugify;
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

/// Column list for users queries.
const COLUMNS: &str = "id, name, name_slug, email, verified, created_at";

/// Provides lookups and registration for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new, unverified user. The name slug is derived from the name.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, name_slug, email)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(slugify(&input.name))
            .bind(&input.email)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name_slug(
        pool: &PgPool,
        name_slug: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE name_slug = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(name_slug)
            .fetch_optional(pool)
            .await
    }

    /// Mark a user's e-mail address as verified.
    pub async fn set_verified(pool: &PgPool, id: DbId, verified: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET verified = $2 WHERE id = $1")
            .bind(id)
            .bind(verified)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
