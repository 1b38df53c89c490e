//! Repository for the `wikis` table.
//!
//! Creation, settings and deletion touch the page chain and therefore run
//! through [`WikiSessionRepo`].

use chrono::Utc;
use quire_core::error::CoreError;
use quire_core::lifecycle::{apply_settings, seed_title_page, teardown, WikiSettings};
use quire_core::session::WikiSession;
use quire_core::types::{DbId, Visibility};
use quire_core::wiki::{slugify, validate_wiki_title};
use sqlx::PgPool;

use crate::models::wiki::Wiki;
use crate::repositories::session_repo::WikiSessionRepo;
use crate::StoreError;

/// Column list for wikis queries.
pub(crate) const COLUMNS: &str = "id, author_id, title, title_slug, first_page_id, \
    visibility, autosave, created_at, updated_at";

/// Provides CRUD operations for wikis.
pub struct WikiRepo;

impl WikiRepo {
    /// Create a wiki with its title page.
    ///
    /// If the author already owns a wiki with the same slug, that wiki is
    /// returned unchanged. A slug held by another author is a conflict.
    pub async fn create(pool: &PgPool, author_id: DbId, title: &str) -> Result<Wiki, StoreError> {
        let title = title.trim();
        validate_wiki_title(title)?;
        let slug = slugify(title);

        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM wikis WHERE title_slug = $1");
        let existing = sqlx::query_as::<_, Wiki>(&query)
            .bind(&slug)
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(existing) = existing {
            if existing.author_id == author_id {
                return Ok(existing);
            }
            return Err(CoreError::Conflict(format!("Wiki slug '{slug}' is already taken")).into());
        }

        let query = format!(
            "INSERT INTO wikis (author_id, title, title_slug, visibility, autosave)
             VALUES ($1, $2, $3, $4, true)
             RETURNING {COLUMNS}"
        );
        let wiki = sqlx::query_as::<_, Wiki>(&query)
            .bind(author_id)
            .bind(title)
            .bind(&slug)
            .bind(Visibility::Private.as_i16())
            .fetch_one(&mut *tx)
            .await?;

        let mut session = WikiSession::new(wiki.meta()?);
        seed_title_page(&mut session)?;
        WikiSessionRepo::flush(&mut tx, &mut session).await?;

        let query = format!("SELECT {COLUMNS} FROM wikis WHERE id = $1");
        let wiki = sqlx::query_as::<_, Wiki>(&query)
            .bind(wiki.id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(wiki_id = wiki.id, author_id, slug = %slug, "Created wiki");
        Ok(wiki)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Wiki>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM wikis WHERE id = $1");
        sqlx::query_as::<_, Wiki>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Wiki>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM wikis WHERE title_slug = $1");
        sqlx::query_as::<_, Wiki>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// All wikis of one author, most recently updated first.
    pub async fn list_by_author(pool: &PgPool, author_id: DbId) -> Result<Vec<Wiki>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM wikis WHERE author_id = $1 ORDER BY updated_at DESC, id DESC"
        );
        sqlx::query_as::<_, Wiki>(&query)
            .bind(author_id)
            .fetch_all(pool)
            .await
    }

    /// The public directory, most recently updated first.
    pub async fn list_public(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Wiki>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM wikis WHERE visibility = $1
             ORDER BY updated_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Wiki>(&query)
            .bind(Visibility::Public.as_i16())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Apply the settings form and rename the title page. Returns the new slug.
    pub async fn update_settings(
        pool: &PgPool,
        wiki_id: DbId,
        settings: &WikiSettings<'_>,
        author_verified: bool,
    ) -> Result<String, StoreError> {
        WikiSessionRepo::run(pool, wiki_id, |session| {
            apply_settings(session, settings, author_verified, Utc::now())
        })
        .await
    }

    /// Delete a wiki and every page in its chain. Returns the number of
    /// pages removed.
    pub async fn delete(pool: &PgPool, wiki_id: DbId) -> Result<usize, StoreError> {
        let mut tx = pool.begin().await?;
        let mut session = WikiSessionRepo::open(&mut tx, wiki_id).await?;
        let removed = teardown(&mut session)?.len();
        WikiSessionRepo::flush(&mut tx, &mut session).await?;

        sqlx::query("DELETE FROM wikis WHERE id = $1")
            .bind(wiki_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(wiki_id, pages = removed, "Deleted wiki");
        Ok(removed)
    }
}
