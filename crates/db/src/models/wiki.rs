//! Wiki entity model and DTOs.

use quire_core::error::CoreError;
use quire_core::session::WikiMeta;
use quire_core::types::{DbId, Timestamp, Visibility};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::page::Page;

/// A row from the `wikis` table.
#[derive(Debug, Clone, FromRow)]
pub struct Wiki {
    pub id: DbId,
    pub author_id: DbId,
    pub title: String,
    pub title_slug: String,
    /// Head of the page chain. `None` only while the wiki is being created.
    pub first_page_id: Option<DbId>,
    /// Storage value of [`Visibility`].
    pub visibility: i16,
    pub autosave: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Wiki {
    /// The fields the domain engine works on.
    pub fn meta(&self) -> Result<WikiMeta, CoreError> {
        Ok(WikiMeta {
            id: self.id,
            author_id: self.author_id,
            title: self.title.clone(),
            title_slug: self.title_slug.clone(),
            visibility: Visibility::from_i16(self.visibility)?,
            autosave: self.autosave,
            updated_at: self.updated_at,
        })
    }
}

/// Wiki representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct WikiResponse {
    pub id: DbId,
    pub author_id: DbId,
    pub title: String,
    pub title_slug: String,
    pub visibility: Visibility,
    pub autosave: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<Wiki> for WikiResponse {
    type Error = CoreError;

    fn try_from(wiki: Wiki) -> Result<Self, Self::Error> {
        Ok(Self {
            id: wiki.id,
            author_id: wiki.author_id,
            visibility: Visibility::from_i16(wiki.visibility)?,
            title: wiki.title,
            title_slug: wiki.title_slug,
            autosave: wiki.autosave,
            created_at: wiki.created_at,
            updated_at: wiki.updated_at,
        })
    }
}

/// A wiki together with its pages in chain order.
#[derive(Debug, Clone, Serialize)]
pub struct WikiWithPages {
    #[serde(flatten)]
    pub wiki: WikiResponse,
    pub pages: Vec<Page>,
}

/// DTO for creating a wiki.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateWiki {
    #[validate(length(min = 1, max = 50))]
    pub title: String,
}

/// DTO for the wiki settings form. A blank title resets it to `Untitled`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateWikiSettings {
    #[validate(length(max = 50))]
    pub title: String,
    /// `private`, `unlisted` (or `hidden`) or `public`.
    pub visibility: String,
    #[serde(default = "default_autosave")]
    pub autosave: bool,
}

fn default_autosave() -> bool {
    true
}
