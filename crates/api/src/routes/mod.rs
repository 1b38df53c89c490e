pub mod health;
pub mod wiki;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /wikis                                         list own, create
/// /wikis/public                                  public directory
/// /wikis/{wiki_slug}                             get, delete
/// /wikis/{wiki_slug}/settings                    update settings (PUT)
/// /wikis/{wiki_slug}/index                       reorder pages (POST)
/// /wikis/{wiki_slug}/pages                       list, create
/// /wikis/{wiki_slug}/pages/{page_slug}           get
/// /wikis/{wiki_slug}/pages/{page_slug}/save      save patch (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/wikis", wiki::router())
}
