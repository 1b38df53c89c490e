//! Who may read or change a wiki.

use crate::error::CoreError;
use crate::session::WikiMeta;
use crate::types::{DbId, Visibility};

/// Anyone may read a wiki above private; a private wiki only by its author.
pub fn can_view(wiki: &WikiMeta, viewer: Option<DbId>) -> bool {
    wiki.visibility != Visibility::Private || viewer == Some(wiki.author_id)
}

/// Reading a wiki the viewer may not see is reported as not found, so
/// private wikis do not leak their existence.
pub fn ensure_can_view(wiki: &WikiMeta, viewer: Option<DbId>) -> Result<(), CoreError> {
    if can_view(wiki, viewer) {
        Ok(())
    } else {
        Err(CoreError::not_found("Wiki", wiki.title_slug.clone()))
    }
}

/// Every mutation requires the author.
pub fn ensure_author(wiki: &WikiMeta, user_id: DbId) -> Result<(), CoreError> {
    if wiki.author_id == user_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Wiki '{}' belongs to another user",
            wiki.title_slug
        )))
    }
}
