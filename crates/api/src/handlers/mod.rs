//! Request handlers, one module per resource.

pub mod page;
pub mod wiki;

use quire_core::access::{ensure_author, ensure_can_view};
use quire_core::error::CoreError;
use quire_core::types::DbId;
use quire_db::models::wiki::Wiki;
use quire_db::repositories::WikiRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

/// Fetch a wiki by slug or return 404.
pub(crate) async fn ensure_wiki_by_slug(pool: &sqlx::PgPool, slug: &str) -> AppResult<Wiki> {
    Ok(WikiRepo::find_by_slug(pool, slug)
        .await?
        .ok_or_else(|| CoreError::not_found("Wiki", slug))?)
}

/// Fetch a wiki the caller may read. Private wikis of other users are 404.
pub(crate) async fn visible_wiki(
    pool: &sqlx::PgPool,
    slug: &str,
    viewer: Option<&AuthUser>,
) -> AppResult<Wiki> {
    let wiki = ensure_wiki_by_slug(pool, slug).await?;
    ensure_can_view(&wiki.meta()?, viewer.map(|user| user.user_id))?;
    Ok(wiki)
}

/// Fetch a wiki the caller owns. Other users' wikis are 403.
pub(crate) async fn owned_wiki(pool: &sqlx::PgPool, slug: &str, user_id: DbId) -> AppResult<Wiki> {
    let wiki = ensure_wiki_by_slug(pool, slug).await?;
    ensure_author(&wiki.meta()?, user_id)?;
    Ok(wiki)
}
