//! Page lifecycle controller.
//!
//! Every operation here takes the [`WikiSession`] of one wiki, mutates it and
//! re-checks the wiki's invariants before returning. A returned error means
//! the session must be discarded; the persistence layer then rolls back.

use serde::Serialize;

use crate::error::CoreError;
use crate::patch::{merge_and_sanitize, Patch};
use crate::session::{PageKey, WikiSession};
use crate::title::{is_blank_title_content, resolve_title, rewrite_title_block};
use crate::types::{DbId, Timestamp, Visibility};
use crate::wiki::{default_content, slugify, validate_title, validate_wiki_title, UNTITLED_WIKI};

/// Reported in place of a slug when a save deleted the page.
pub const UNTITLED: &str = "untitled!";

/// Result of [`save_page`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved { slug: String },
    Deleted,
}

impl SaveOutcome {
    /// The page's slug, or [`UNTITLED`] after deletion.
    pub fn slug(&self) -> &str {
        match self {
            SaveOutcome::Saved { slug } => slug,
            SaveOutcome::Deleted => UNTITLED,
        }
    }
}

/// Settings form of a wiki.
#[derive(Debug, Clone)]
pub struct WikiSettings<'a> {
    pub title: &'a str,
    pub visibility: Visibility,
    pub autosave: bool,
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

/// The chain reaches every page once and some page carries the wiki title.
pub fn verify_wiki(session: &WikiSession) -> Result<(), CoreError> {
    session.verify()?;
    if session.page_count() > 0 && session.title_page().is_none() {
        return Err(CoreError::Integrity(format!(
            "Wiki {} has no page titled '{}'",
            session.wiki().id,
            session.wiki().title
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Create the title page of a freshly created wiki.
pub fn seed_title_page(session: &mut WikiSession) -> Result<PageKey, CoreError> {
    if session.page_count() > 0 {
        return Err(CoreError::Conflict(format!(
            "Wiki '{}' already has pages",
            session.wiki().title_slug
        )));
    }
    let title = session.wiki().title.clone();
    let key = session.create_page(&title, default_content(&title));
    session.append(key)?;
    verify_wiki(session)?;
    Ok(key)
}

/// Save a patch against the page addressed by `page_slug`.
///
/// An unknown slug creates a blank page at the end of the chain first. If
/// the merged content is only an `<h1>` holding line breaks, the page is
/// deleted and [`SaveOutcome::Deleted`] is returned. A page whose title is
/// empty but which still has other blocks is kept.
pub fn save_page(
    session: &mut WikiSession,
    page_slug: &str,
    patch: &Patch,
    now: Timestamp,
) -> Result<SaveOutcome, CoreError> {
    let key = match session.find_by_slug(page_slug) {
        Some(key) => key,
        None => {
            let key = session.create_page("", "<h1></h1>".to_string());
            session.append(key)?;
            tracing::debug!(wiki_id = session.wiki().id, slug = %page_slug, "Created page on first save");
            key
        }
    };

    resolve_title(session, key, patch)?;
    let content = merge_and_sanitize(&session.page(key)?.content, patch);
    session.touch(now);

    let outcome = if is_blank_title_content(&content) {
        session.delete_page(key)?;
        tracing::info!(wiki_id = session.wiki().id, slug = %page_slug, "Deleted page with blank title");
        SaveOutcome::Deleted
    } else {
        let page = session.page_mut(key)?;
        page.content = content;
        let slug = page.title_slug.clone();
        tracing::info!(wiki_id = session.wiki().id, slug = %slug, "Saved page");
        SaveOutcome::Saved { slug }
    };

    verify_wiki(session)?;
    Ok(outcome)
}

/// Reorder a page by title.
///
/// `new_preceding` names the page `moved` should follow; `None`, an empty
/// name or an unknown name puts it at the head. `previously_preceding` is
/// only checked against the chain: the real predecessor is always used.
pub fn update_index(
    session: &mut WikiSession,
    moved: &str,
    previously_preceding: Option<&str>,
    new_preceding: Option<&str>,
) -> Result<(), CoreError> {
    let wiki_id = session.wiki().id;
    let key = session
        .find_by_title(moved)
        .ok_or_else(|| CoreError::not_found("Page", moved))?;

    let claimed = previously_preceding
        .filter(|name| !name.is_empty())
        .map(|name| session.find_by_title(name));
    let actual = session.predecessor(key);
    match claimed {
        Some(None) => {
            tracing::warn!(wiki_id, page = %moved, "Previously preceding page not found, ignored")
        }
        Some(claimed) if claimed != actual => {
            tracing::warn!(wiki_id, page = %moved, "Stale previously preceding page, using the chain")
        }
        _ => {}
    }

    let after = match new_preceding.filter(|name| !name.is_empty()) {
        Some(name) => {
            let found = session.find_by_title(name);
            if found.is_none() {
                tracing::warn!(wiki_id, page = %moved, new_preceding = %name, "New preceding page not found, moving to head");
            }
            found
        }
        None => None,
    };

    session.move_after(key, after)?;
    verify_wiki(session)?;
    tracing::info!(wiki_id, page = %moved, "Reordered page");
    Ok(())
}

/// Create a page titled `title` at the end of the chain unless one with the
/// same slug exists. Returns the slug either way.
pub fn create_page(
    session: &mut WikiSession,
    title: &str,
    now: Timestamp,
) -> Result<String, CoreError> {
    validate_title(title)?;
    let slug = slugify(title);
    if session.find_by_slug(&slug).is_some() {
        return Ok(slug);
    }

    let key = session.create_page(title, default_content(title));
    session.append(key)?;
    session.touch(now);
    verify_wiki(session)?;
    tracing::info!(wiki_id = session.wiki().id, slug = %slug, "Created page");
    Ok(slug)
}

/// Apply the settings form. The title page follows the wiki title.
///
/// A blank title becomes [`UNTITLED_WIKI`]. `public` is downgraded to
/// `unlisted` for an author who has not verified their account. Returns the
/// wiki's new slug.
pub fn apply_settings(
    session: &mut WikiSession,
    settings: &WikiSettings<'_>,
    author_verified: bool,
    now: Timestamp,
) -> Result<String, CoreError> {
    let title = match settings.title.trim() {
        "" => UNTITLED_WIKI,
        trimmed => trimmed,
    };
    validate_wiki_title(title)?;
    let slug = slugify(title);

    let visibility = if settings.visibility == Visibility::Public && !author_verified {
        tracing::info!(wiki_id = session.wiki().id, "Unverified author, public downgraded to unlisted");
        Visibility::Unlisted
    } else {
        settings.visibility
    };

    let title_page = session.title_page();
    let wiki = session.wiki_mut();
    wiki.title = title.to_string();
    wiki.title_slug = slug.clone();
    wiki.visibility = visibility;
    wiki.autosave = settings.autosave;
    wiki.updated_at = now;

    match title_page {
        Some(key) => {
            let page = session.page_mut(key)?;
            page.title = title.to_string();
            page.title_slug = slug.clone();
            page.content = rewrite_title_block(&page.content, title);
        }
        None => {
            let key = session.create_page(title, default_content(title));
            session.prepend(key)?;
        }
    }

    verify_wiki(session)?;
    tracing::info!(wiki_id = session.wiki().id, slug = %slug, "Updated wiki settings");
    Ok(slug)
}

/// Snapshot the ids of every page by full traversal, then delete them all.
///
/// The snapshot is taken before anything is unlinked, so each page is found
/// exactly once. Pages that were never stored are dropped without an id.
pub fn teardown(session: &mut WikiSession) -> Result<Vec<DbId>, CoreError> {
    let members = session.ordered_keys()?;
    for key in &members {
        session.delete_page(*key)?;
    }
    if session.page_count() != 0 {
        return Err(CoreError::Integrity(format!(
            "Wiki {} kept {} pages after teardown",
            session.wiki().id,
            session.page_count()
        )));
    }
    Ok(session.deleted_ids().to_vec())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::session::tests::{meta, stored};

    fn patch(json: &str) -> Patch {
        serde_json::from_str(json).unwrap()
    }

    fn now() -> Timestamp {
        chrono::DateTime::<chrono::Utc>::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn titles(session: &WikiSession) -> Vec<String> {
        session
            .ordered()
            .map(|step| step.unwrap().1.title.clone())
            .collect()
    }

    /// Wiki "Home" with `[Home -> B -> C]`.
    fn wiki() -> WikiSession {
        let mut pages = vec![
            stored(1, "Home", Some(2)),
            stored(2, "B", Some(3)),
            stored(3, "C", None),
        ];
        pages[0].content = "<h1>Home</h1><p>Hi</p>".into();
        WikiSession::load(meta("Home"), Some(1), pages).unwrap()
    }

    // -- save ----------------------------------------------------------------

    #[test]
    fn save_replaces_a_paragraph() {
        let mut session = wiki();

        let outcome = save_page(&mut session, "home", &patch(r#"["undefined", "<p>Bye</p>"]"#), now()).unwrap();

        assert_eq!(outcome, SaveOutcome::Saved { slug: "home".into() });
        let home = session.find_by_slug("home").unwrap();
        assert_eq!(session.page(home).unwrap().content, "<h1>Home</h1><p>Bye</p>");
        assert_eq!(session.page(home).unwrap().title, "Home");
        assert_eq!(session.wiki().updated_at, now());
    }

    #[test]
    fn save_to_blank_title_deletes_and_bridges() {
        let mut session = wiki();
        let (home, c) = (
            session.find_by_slug("home").unwrap(),
            session.find_by_slug("c").unwrap(),
        );

        let outcome = save_page(&mut session, "b", &patch(r#"["<h1></h1>", ""]"#), now()).unwrap();

        assert_eq!(outcome, SaveOutcome::Deleted);
        assert_eq!(outcome.slug(), UNTITLED);
        assert_eq!(session.page(home).unwrap().next(), Some(c));
        assert_eq!(session.deleted_ids(), &[2]);
        assert_eq!(titles(&session), ["Home", "C"]);
    }

    #[test]
    fn save_with_only_line_breaks_in_title_deletes() {
        let mut session = wiki();
        let outcome = save_page(&mut session, "c", &patch(r#"["<h1><br><br></h1>", ""]"#), now()).unwrap();
        assert_eq!(outcome, SaveOutcome::Deleted);
        assert_eq!(titles(&session), ["Home", "B"]);
    }

    #[test]
    fn empty_title_with_remaining_blocks_is_kept() {
        let mut session = wiki();
        let b = session.find_by_slug("b").unwrap();

        let outcome = save_page(&mut session, "b", &patch(r#"["<h1></h1>", "<p>keep me</p>"]"#), now()).unwrap();

        assert_eq!(outcome, SaveOutcome::Saved { slug: String::new() });
        assert_eq!(session.page(b).unwrap().content, "<h1></h1><p>keep me</p>");
        assert_eq!(titles(&session), ["Home", "", "C"]);
        assert!(session.deleted_ids().is_empty());
    }

    #[test]
    fn whitespace_title_is_kept() {
        let mut session = wiki();
        let c = session.find_by_slug("c").unwrap();

        let outcome = save_page(&mut session, "c", &patch(r#"["<h1>   </h1>", ""]"#), now()).unwrap();

        assert_eq!(outcome, SaveOutcome::Saved { slug: String::new() });
        assert_eq!(session.page(c).unwrap().title, "   ");
        assert_eq!(titles(&session), ["Home", "B", "   "]);
    }

    #[test]
    fn non_heading_title_block_is_unwrapped() {
        let mut session = wiki();

        let outcome = save_page(&mut session, "b", &patch(r#"["<h2>Sub</h2>"]"#), now()).unwrap();

        assert_eq!(outcome.slug(), "sub");
        let sub = session.find_by_slug("sub").unwrap();
        assert_eq!(session.page(sub).unwrap().title, "Sub");
    }

    #[test]
    fn save_to_unknown_slug_creates_page_at_the_end() {
        let mut session = wiki();

        let outcome = save_page(
            &mut session,
            "draft",
            &patch(r#"["<h1>Draft</h1>", "<p>text</p>"]"#),
            now(),
        )
        .unwrap();

        assert_eq!(outcome.slug(), "draft");
        assert_eq!(titles(&session), ["Home", "B", "C", "Draft"]);
        let draft = session.find_by_slug("draft").unwrap();
        assert_eq!(session.page(draft).unwrap().content, "<h1>Draft</h1><p>text</p>");
        assert_eq!(session.unsaved_pages().len(), 1);
    }

    #[test]
    fn save_to_unknown_slug_without_title_keeps_an_untitled_page() {
        let mut session = wiki();

        let outcome = save_page(&mut session, "ghost", &patch(r#"[null, "<p>x</p>"]"#), now()).unwrap();

        assert_eq!(outcome, SaveOutcome::Saved { slug: String::new() });
        assert_eq!(titles(&session), ["Home", "B", "C", ""]);
        assert_eq!(session.unsaved_pages().len(), 1);
    }

    #[test]
    fn save_to_unknown_slug_with_blank_title_leaves_nothing_behind() {
        let mut session = wiki();

        let outcome = save_page(&mut session, "ghost", &patch(r#"["<h1></h1>"]"#), now()).unwrap();

        assert_eq!(outcome, SaveOutcome::Deleted);
        assert_eq!(titles(&session), ["Home", "B", "C"]);
        assert!(session.unsaved_pages().is_empty());
        assert!(session.deleted_ids().is_empty());
    }

    #[test]
    fn renaming_title_page_to_blank_keeps_a_title_page() {
        let mut session = wiki();

        let outcome = save_page(&mut session, "home", &patch(r#"["<h1></h1>", ""]"#), now()).unwrap();

        assert_eq!(outcome, SaveOutcome::Deleted);
        assert_eq!(titles(&session), ["Home", "B", "C"]);
        let home = session.title_page().unwrap();
        assert_eq!(session.head(), Some(home));
        assert_eq!(session.page(home).unwrap().content, "<h1>Home</h1><p></p>");
        assert_eq!(session.deleted_ids(), &[1]);
    }

    #[test]
    fn renaming_title_page_keeps_renamed_page_after_new_one() {
        let mut session = wiki();

        let outcome = save_page(&mut session, "home", &patch(r#"["<h1>Intro</h1>"]"#), now()).unwrap();

        assert_eq!(outcome.slug(), "intro");
        assert_eq!(titles(&session), ["Home", "Intro", "B", "C"]);
    }

    #[test]
    fn save_sanitizes_patched_blocks() {
        let mut session = wiki();
        save_page(&mut session, "b", &patch(r#"[null, "<p><script>x</script></p>"]"#), now()).unwrap();
        let b = session.find_by_slug("b").unwrap();
        assert_eq!(
            session.page(b).unwrap().content,
            "<h1>B</h1><p>&lt;script&gt;x&lt;/script&gt;</p>"
        );
    }

    // -- update_index --------------------------------------------------------

    #[test]
    fn update_index_moves_after_named_page() {
        let mut session = wiki();
        update_index(&mut session, "C", Some("B"), Some("Home")).unwrap();
        assert_eq!(titles(&session), ["Home", "C", "B"]);
    }

    #[test]
    fn update_index_to_head() {
        let mut session = wiki();
        update_index(&mut session, "C", Some("B"), None).unwrap();
        assert_eq!(titles(&session), ["C", "Home", "B"]);

        update_index(&mut session, "B", Some("Home"), Some("")).unwrap();
        assert_eq!(titles(&session), ["B", "C", "Home"]);
    }

    #[test]
    fn update_index_ignores_stale_previous_page() {
        let mut session = wiki();
        update_index(&mut session, "C", Some("Nope"), Some("Home")).unwrap();
        assert_eq!(titles(&session), ["Home", "C", "B"]);
    }

    #[test]
    fn update_index_with_unknown_new_preceding_moves_to_head() {
        let mut session = wiki();
        update_index(&mut session, "B", None, Some("Missing")).unwrap();
        assert_eq!(titles(&session), ["B", "Home", "C"]);
    }

    #[test]
    fn update_index_after_current_predecessor_is_a_no_op() {
        let mut session = wiki();
        update_index(&mut session, "B", Some("Home"), Some("Home")).unwrap();
        assert_eq!(titles(&session), ["Home", "B", "C"]);
        assert!(!session.is_wiki_dirty());
    }

    #[test]
    fn update_index_of_unknown_page_is_not_found() {
        let mut session = wiki();
        assert_matches!(
            update_index(&mut session, "Nope", None, None),
            Err(CoreError::NotFound { entity: "Page", .. })
        );
    }

    // -- create / settings / teardown ----------------------------------------

    #[test]
    fn seed_title_page_builds_a_one_page_chain() {
        let mut session = WikiSession::new(meta("My Wiki"));
        let key = seed_title_page(&mut session).unwrap();
        assert_eq!(session.head(), Some(key));
        assert_eq!(session.page(key).unwrap().content, "<h1>My Wiki</h1><p></p>");
        assert_matches!(seed_title_page(&mut session), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn create_page_appends_once() {
        let mut session = wiki();
        assert_eq!(create_page(&mut session, "Ideas", now()).unwrap(), "ideas");
        assert_eq!(create_page(&mut session, "ideas!", now()).unwrap(), "ideas");
        assert_eq!(titles(&session), ["Home", "B", "C", "Ideas"]);
        assert_matches!(create_page(&mut session, " ", now()), Err(CoreError::Validation(_)));
    }

    #[test]
    fn settings_rename_wiki_and_title_page() {
        let mut session = wiki();
        let settings = WikiSettings {
            title: "Garden",
            visibility: Visibility::Public,
            autosave: false,
        };

        let slug = apply_settings(&mut session, &settings, false, now()).unwrap();

        assert_eq!(slug, "garden");
        let wiki = session.wiki();
        assert_eq!(wiki.title, "Garden");
        assert_eq!(wiki.visibility, Visibility::Unlisted);
        assert!(!wiki.autosave);
        let page = session.page(session.title_page().unwrap()).unwrap();
        assert_eq!(page.title_slug, "garden");
        assert_eq!(page.content, "<h1>Garden</h1><p>Hi</p>");
    }

    #[test]
    fn settings_blank_title_becomes_untitled() {
        let mut session = wiki();
        let settings = WikiSettings {
            title: "  ",
            visibility: Visibility::Public,
            autosave: true,
        };
        assert_eq!(apply_settings(&mut session, &settings, true, now()).unwrap(), "untitled");
        assert_eq!(session.wiki().visibility, Visibility::Public);
    }

    #[test]
    fn settings_reject_a_reserved_slug() {
        let mut session = wiki();
        let settings = WikiSettings {
            title: "Public",
            visibility: Visibility::Private,
            autosave: true,
        };
        assert_matches!(
            apply_settings(&mut session, &settings, true, now()),
            Err(CoreError::Validation(_))
        );
        assert_eq!(session.wiki().title, "Home");
    }

    #[test]
    fn teardown_collects_every_stored_page() {
        let mut session = wiki();
        create_page(&mut session, "Unsaved", now()).unwrap();

        let mut ids = teardown(&mut session).unwrap();
        ids.sort();

        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(session.page_count(), 0);
        assert_eq!(session.head(), None);
    }

    #[test]
    fn verify_wiki_requires_a_title_page() {
        let session = WikiSession::load(meta("Home"), Some(2), vec![stored(2, "B", None)]).unwrap();
        assert_matches!(verify_wiki(&session), Err(CoreError::Integrity(_)));
    }
}
