//! Handlers for the pages of a wiki.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use quire_core::error::CoreError;
use quire_core::lifecycle;
use quire_db::models::page::{CreatePage, SavePage, SlugResponse};
use quire_db::repositories::{PageRepo, WikiSessionRepo};
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::{owned_wiki, visible_wiki};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /wikis/{wiki_slug}/pages
pub async fn list_pages(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    Path(wiki_slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let wiki = visible_wiki(&state.pool, &wiki_slug, auth.as_ref()).await?;
    let pages = PageRepo::list_ordered(&state.pool, &wiki).await?;
    Ok(Json(DataResponse { data: pages }))
}

/// GET /wikis/{wiki_slug}/pages/{page_slug}
pub async fn get_page(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    Path((wiki_slug, page_slug)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let wiki = visible_wiki(&state.pool, &wiki_slug, auth.as_ref()).await?;
    let page = PageRepo::find_by_slug(&state.pool, wiki.id, &page_slug)
        .await?
        .ok_or_else(|| CoreError::not_found("Page", page_slug))?;
    Ok(Json(DataResponse { data: page }))
}

/// POST /wikis/{wiki_slug}/pages
///
/// Appends a page. An existing page with the same slug is left alone and
/// its slug returned.
pub async fn create_page(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(wiki_slug): Path<String>,
    Json(input): Json<CreatePage>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let wiki = owned_wiki(&state.pool, &wiki_slug, auth.user_id).await?;
    let slug = WikiSessionRepo::run(&state.pool, wiki.id, |session| {
        lifecycle::create_page(session, &input.title, Utc::now())
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SlugResponse { slug },
        }),
    ))
}

/// POST /wikis/{wiki_slug}/pages/{page_slug}/save
///
/// Applies a block patch. Saving to an unknown slug creates the page; a
/// patch that leaves nothing but an empty title deletes it and reports
/// `untitled!`.
pub async fn save_page(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((wiki_slug, page_slug)): Path<(String, String)>,
    Json(input): Json<SavePage>,
) -> AppResult<impl IntoResponse> {
    let wiki = owned_wiki(&state.pool, &wiki_slug, auth.user_id).await?;
    let outcome = WikiSessionRepo::run(&state.pool, wiki.id, |session| {
        lifecycle::save_page(session, &page_slug, &input.patch, Utc::now())
    })
    .await?;
    Ok(Json(DataResponse {
        data: SlugResponse {
            slug: outcome.slug().to_string(),
        },
    }))
}
