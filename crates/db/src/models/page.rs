//! Page entity model and DTOs.

use quire_core::patch::Patch;
use quire_core::session::StoredPage;
use quire_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `pages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Page {
    pub id: DbId,
    pub wiki_id: DbId,
    pub title: String,
    pub title_slug: String,
    pub content: String,
    /// Successor in the wiki's page chain; `None` at the tail.
    pub next_page_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Page> for StoredPage {
    fn from(page: Page) -> Self {
        Self {
            id: page.id,
            title: page.title,
            title_slug: page.title_slug,
            content: page.content,
            next_page_id: page.next_page_id,
        }
    }
}

/// DTO for explicitly creating a page.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePage {
    #[validate(length(min = 1, max = 50))]
    pub title: String,
}

/// Body of a save request.
#[derive(Debug, Deserialize)]
pub struct SavePage {
    /// One entry per block; `null` or `"undefined"` leaves a block alone.
    #[serde(default)]
    pub patch: Patch,
}

/// Body of a reorder request. Pages are named by title.
#[derive(Debug, Deserialize)]
pub struct ReorderPages {
    pub page: String,
    #[serde(default)]
    pub previously_preceding: Option<String>,
    #[serde(default)]
    pub new_preceding: Option<String>,
}

/// Slug reported by save and page creation. `untitled!` after a deletion.
#[derive(Debug, Clone, Serialize)]
pub struct SlugResponse {
    pub slug: String,
}
