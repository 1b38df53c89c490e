//! Loads and writes back a [`WikiSession`] inside one transaction.
//!
//! The wiki row is locked with `SELECT ... FOR UPDATE`, which serializes
//! every chain mutation of the same wiki. Write-back order:
//!
//! 1. insert pages created during the session (successor left `NULL`);
//! 2. update every modified page with its resolved successor;
//! 3. update the wiki row (head, title, settings) if it changed;
//! 4. delete removed pages.
//!
//! The page pointers are deferred foreign keys, so they are only checked at
//! commit. Dropping the transaction on any error rolls everything back.

use quire_core::error::CoreError;
use quire_core::session::{PageKey, StoredPage, WikiSession};
use quire_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::page::Page;
use crate::models::wiki::Wiki;
use crate::repositories::page_repo::COLUMNS as PAGE_COLUMNS;
use crate::repositories::wiki_repo::COLUMNS as WIKI_COLUMNS;
use crate::StoreError;

/// Transaction-scoped access to one wiki's page chain.
pub struct WikiSessionRepo;

impl WikiSessionRepo {
    /// Lock the wiki and load it with every page it owns.
    pub async fn open(
        tx: &mut Transaction<'_, Postgres>,
        wiki_id: DbId,
    ) -> Result<WikiSession, StoreError> {
        let query = format!("SELECT {WIKI_COLUMNS} FROM wikis WHERE id = $1 FOR UPDATE");
        let wiki = sqlx::query_as::<_, Wiki>(&query)
            .bind(wiki_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| CoreError::not_found("Wiki", wiki_id.to_string()))?;

        let query = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE wiki_id = $1 ORDER BY id");
        let pages = sqlx::query_as::<_, Page>(&query)
            .bind(wiki_id)
            .fetch_all(&mut **tx)
            .await?;

        let session = WikiSession::load(
            wiki.meta()?,
            wiki.first_page_id,
            pages.into_iter().map(StoredPage::from).collect(),
        )?;
        Ok(session)
    }

    /// Write back everything the session changed.
    pub async fn flush(
        tx: &mut Transaction<'_, Postgres>,
        session: &mut WikiSession,
    ) -> Result<(), StoreError> {
        let wiki_id = session.wiki().id;

        let unsaved: Vec<(PageKey, String, String, String)> = session
            .unsaved_pages()
            .into_iter()
            .map(|(key, page)| {
                (
                    key,
                    page.title.clone(),
                    page.title_slug.clone(),
                    page.content.clone(),
                )
            })
            .collect();
        for (key, title, title_slug, content) in unsaved {
            let id: DbId = sqlx::query_scalar(
                "INSERT INTO pages (wiki_id, title, title_slug, content)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id",
            )
            .bind(wiki_id)
            .bind(&title)
            .bind(&title_slug)
            .bind(&content)
            .fetch_one(&mut **tx)
            .await?;
            session.assign_id(key, id)?;
        }

        let updates = session.dirty_pages()?;
        for page in &updates {
            sqlx::query(
                "UPDATE pages
                 SET title = $3, title_slug = $4, content = $5, next_page_id = $6, updated_at = NOW()
                 WHERE id = $1 AND wiki_id = $2",
            )
            .bind(page.id)
            .bind(wiki_id)
            .bind(page.title)
            .bind(page.title_slug)
            .bind(page.content)
            .bind(page.next_page_id)
            .execute(&mut **tx)
            .await?;
        }

        if session.is_wiki_dirty() {
            let wiki = session.wiki();
            sqlx::query(
                "UPDATE wikis
                 SET title = $2, title_slug = $3, first_page_id = $4, visibility = $5,
                     autosave = $6, updated_at = $7
                 WHERE id = $1",
            )
            .bind(wiki_id)
            .bind(&wiki.title)
            .bind(&wiki.title_slug)
            .bind(session.head_id()?)
            .bind(wiki.visibility.as_i16())
            .bind(wiki.autosave)
            .bind(wiki.updated_at)
            .execute(&mut **tx)
            .await?;
        }

        if !session.deleted_ids().is_empty() {
            sqlx::query("DELETE FROM pages WHERE id = ANY($1) AND wiki_id = $2")
                .bind(session.deleted_ids().to_vec())
                .bind(wiki_id)
                .execute(&mut **tx)
                .await?;
        }

        tracing::debug!(
            wiki_id,
            updated = updates.len(),
            deleted = session.deleted_ids().len(),
            "Flushed wiki session"
        );
        Ok(())
    }

    /// Run `op` against the wiki's session and commit what it changed.
    ///
    /// Nothing is written if `op`, the integrity checks or any statement
    /// fails.
    pub async fn run<T>(
        pool: &PgPool,
        wiki_id: DbId,
        op: impl FnOnce(&mut WikiSession) -> Result<T, CoreError>,
    ) -> Result<T, StoreError> {
        let mut tx = pool.begin().await?;
        let mut session = Self::open(&mut tx, wiki_id).await?;
        let value = op(&mut session)?;
        Self::flush(&mut tx, &mut session).await?;
        tx.commit().await?;
        Ok(value)
    }
}
