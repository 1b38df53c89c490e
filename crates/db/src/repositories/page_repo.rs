//! Read access to the `pages` table.
//!
//! Pages are never written here: every insert, update and delete goes
//! through [`super::WikiSessionRepo`] so the chain is rewritten as a whole.

use std::collections::HashMap;

use quire_core::session::{StoredPage, WikiSession};
use quire_core::types::DbId;
use sqlx::PgPool;

use crate::models::page::Page;
use crate::models::wiki::Wiki;
use crate::StoreError;

/// Column list for pages queries.
pub(crate) const COLUMNS: &str = "id, wiki_id, title, title_slug, content, next_page_id, \
    created_at, updated_at";

/// Provides read operations for pages.
pub struct PageRepo;

impl PageRepo {
    /// Pages of a wiki in chain order, starting at the head.
    ///
    /// The stored chain is verified on the way; a broken chain is an
    /// integrity error rather than a partial list.
    pub async fn list_ordered(pool: &PgPool, wiki: &Wiki) -> Result<Vec<Page>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE wiki_id = $1 ORDER BY id");
        let pages = sqlx::query_as::<_, Page>(&query)
            .bind(wiki.id)
            .fetch_all(pool)
            .await?;

        let session = WikiSession::load(
            wiki.meta()?,
            wiki.first_page_id,
            pages.iter().cloned().map(StoredPage::from).collect(),
        )?;
        let order: Vec<DbId> = session
            .ordered()
            .map(|step| step.map(|(_, page)| page.id.unwrap_or_default()))
            .collect::<Result<_, _>>()?;

        let mut by_id: HashMap<DbId, Page> = pages.into_iter().map(|page| (page.id, page)).collect();
        Ok(order.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// A page of a wiki by slug. With duplicate slugs the oldest page wins.
    pub async fn find_by_slug(
        pool: &PgPool,
        wiki_id: DbId,
        slug: &str,
    ) -> Result<Option<Page>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pages WHERE wiki_id = $1 AND title_slug = $2 ORDER BY id LIMIT 1"
        );
        sqlx::query_as::<_, Page>(&query)
            .bind(wiki_id)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    pub async fn count_for_wiki(pool: &PgPool, wiki_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM pages WHERE wiki_id = $1")
            .bind(wiki_id)
            .fetch_one(pool)
            .await
    }
}
