//! Route definitions for the `/wikis` resource and its pages.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{page, wiki};
use crate::state::AppState;

/// Routes mounted at `/wikis`.
///
/// ```text
/// GET    /                                    -> list_own
/// POST   /                                    -> create_wiki
/// GET    /public                              -> list_public
/// GET    /{wiki_slug}                         -> get_wiki
/// DELETE /{wiki_slug}                         -> delete_wiki
/// PUT    /{wiki_slug}/settings                -> update_settings
/// POST   /{wiki_slug}/index                   -> update_index
///
/// GET    /{wiki_slug}/pages                   -> list_pages
/// POST   /{wiki_slug}/pages                   -> create_page
/// GET    /{wiki_slug}/pages/{page_slug}       -> get_page
/// POST   /{wiki_slug}/pages/{page_slug}/save  -> save_page
/// ```
pub fn router() -> Router<AppState> {
    let page_routes = Router::new()
        .route("/", get(page::list_pages).post(page::create_page))
        .route("/{page_slug}", get(page::get_page))
        .route("/{page_slug}/save", post(page::save_page));

    Router::new()
        .route("/", get(wiki::list_own).post(wiki::create_wiki))
        .route("/public", get(wiki::list_public))
        .route("/{wiki_slug}", get(wiki::get_wiki).delete(wiki::delete_wiki))
        .route("/{wiki_slug}/settings", put(wiki::update_settings))
        .route("/{wiki_slug}/index", post(wiki::update_index))
        .nest("/{wiki_slug}/pages", page_routes)
}
