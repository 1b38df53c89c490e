//! Handlers for wikis: creation, listings, settings, reordering and deletion.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use quire_core::error::CoreError;
use quire_core::lifecycle::{self, WikiSettings};
use quire_core::types::Visibility;
use quire_db::models::page::{ReorderPages, SlugResponse};
use quire_db::models::wiki::{CreateWiki, UpdateWikiSettings, WikiResponse, WikiWithPages};
use quire_db::repositories::{PageRepo, UserRepo, WikiRepo, WikiSessionRepo};
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::{owned_wiki, visible_wiki};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Default page size of the public directory.
const DEFAULT_LIST_LIMIT: i64 = 50;
/// Largest page size of the public directory.
const MAX_LIST_LIMIT: i64 = 200;

#[derive(Debug, serde::Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn to_responses(wikis: Vec<quire_db::models::wiki::Wiki>) -> AppResult<Vec<WikiResponse>> {
    Ok(wikis
        .into_iter()
        .map(WikiResponse::try_from)
        .collect::<Result<_, CoreError>>()?)
}

/// GET /wikis
///
/// The caller's own wikis, most recently updated first.
pub async fn list_own(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let wikis = WikiRepo::list_by_author(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: to_responses(wikis)?,
    }))
}

/// GET /wikis/public
pub async fn list_public(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let wikis = WikiRepo::list_public(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse {
        data: to_responses(wikis)?,
    }))
}

/// POST /wikis
///
/// Creates the wiki and its title page. Returns the caller's existing wiki
/// when they already own one with the same slug.
pub async fn create_wiki(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateWiki>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("User", auth.user_id.to_string()))?;

    let wiki = WikiRepo::create(&state.pool, auth.user_id, &input.title).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: WikiResponse::try_from(wiki)?,
        }),
    ))
}

/// GET /wikis/{wiki_slug}
///
/// The wiki with its pages in chain order.
pub async fn get_wiki(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    Path(wiki_slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let wiki = visible_wiki(&state.pool, &wiki_slug, auth.as_ref()).await?;
    let pages = PageRepo::list_ordered(&state.pool, &wiki).await?;
    Ok(Json(DataResponse {
        data: WikiWithPages {
            wiki: WikiResponse::try_from(wiki)?,
            pages,
        },
    }))
}

/// PUT /wikis/{wiki_slug}/settings
///
/// Returns the wiki's new slug.
pub async fn update_settings(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(wiki_slug): Path<String>,
    Json(input): Json<UpdateWikiSettings>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let visibility = Visibility::parse(&input.visibility)?;
    let wiki = owned_wiki(&state.pool, &wiki_slug, auth.user_id).await?;
    let author = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("User", auth.user_id.to_string()))?;

    let settings = WikiSettings {
        title: &input.title,
        visibility,
        autosave: input.autosave,
    };
    let slug = WikiRepo::update_settings(&state.pool, wiki.id, &settings, author.verified).await?;
    Ok(Json(DataResponse {
        data: SlugResponse { slug },
    }))
}

/// POST /wikis/{wiki_slug}/index
///
/// Move a page after another one (or to the head). Pages are named by title.
pub async fn update_index(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(wiki_slug): Path<String>,
    Json(input): Json<ReorderPages>,
) -> AppResult<impl IntoResponse> {
    let wiki = owned_wiki(&state.pool, &wiki_slug, auth.user_id).await?;
    WikiSessionRepo::run(&state.pool, wiki.id, |session| {
        lifecycle::update_index(
            session,
            &input.page,
            input.previously_preceding.as_deref(),
            input.new_preceding.as_deref(),
        )
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /wikis/{wiki_slug}
pub async fn delete_wiki(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(wiki_slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let wiki = owned_wiki(&state.pool, &wiki_slug, auth.user_id).await?;
    WikiRepo::delete(&state.pool, wiki.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
