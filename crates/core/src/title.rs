//! Title and rename resolution.
//!
//! A page's displayed title lives in its first `<h1>` block. When a save
//! changes that block, the page is renamed, a same-titled sibling is pushed
//! aside with [`ALTERNATIVE_SUFFIX`], and the wiki keeps a page carrying its
//! own title.

use std::sync::LazyLock;

use regex::Regex;

use crate::blocks::{block_tag, inner_text, split_blocks};
use crate::error::CoreError;
use crate::patch::{merge_and_sanitize, BlockEdit, Patch};
use crate::sanitize::sanitize;
use crate::session::{PageKey, WikiSession};
use crate::wiki::{default_content, slugify};

/// Appended to a page displaced by a rename.
pub const ALTERNATIVE_SUFFIX: &str = " (alternative)";

/// Content made of a single `<h1>` holding only line breaks, raw or already
/// escaped.
static BLANK_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<h1>(?:<br>|&lt;br&gt;)*</h1>$").expect("valid regex")
});

/// What [`resolve_title`] did to the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TitleChange {
    /// The page's title after resolution.
    pub title: String,
    /// A sibling renamed out of the way, if any.
    pub displaced: Option<PageKey>,
    /// The page created to keep the wiki's title page, if any.
    pub new_title_page: Option<PageKey>,
}

/// Title carried by block 0 of the patch, if the patch replaces it.
///
/// The block's own tags are removed, whichever heading or paragraph it is,
/// and embedded line breaks dropped.
pub fn title_from_patch(patch: &Patch) -> Option<String> {
    let block = patch.replacement(0)?;
    Some(inner_text(block).chars().filter(|c| !matches!(c, '\n' | '\r')).collect())
}

/// Whether sanitized content is nothing but an `<h1>` holding line breaks.
///
/// Whitespace counts as text, and any block after the heading keeps the
/// page.
pub fn is_blank_title_content(content: &str) -> bool {
    BLANK_TITLE_RE.is_match(content)
}

/// Replace the text of the first block with `title` when it is an `<h1>`,
/// otherwise put a new `<h1>` in front. The result is sanitized.
pub fn rewrite_title_block(content: &str, title: &str) -> String {
    let heading = format!("<h1>{title}</h1>");
    match split_blocks(content).first() {
        Some(first) if block_tag(first) == Some("h1") => {
            merge_and_sanitize(content, &Patch::new(vec![BlockEdit::Replace(heading)]))
        }
        _ => sanitize(&format!("{heading}{content}")),
    }
}

/// Rename `key` to the title carried by `patch`.
///
/// Nothing happens when the patch leaves block 0 alone or repeats the
/// current title. Otherwise:
///
/// - another page of the wiki holding the new title (or its slug) gets
///   [`ALTERNATIVE_SUFFIX`] appended to its title and heading;
/// - if `key` was the title page, a fresh title page with default content is
///   put at the head of the chain;
/// - `key` takes the new title and slug.
pub fn resolve_title(
    session: &mut WikiSession,
    key: PageKey,
    patch: &Patch,
) -> Result<TitleChange, CoreError> {
    let current = session.page(key)?.title.clone();
    let Some(new_title) = title_from_patch(patch).filter(|title| *title != current) else {
        return Ok(TitleChange {
            title: current,
            ..TitleChange::default()
        });
    };

    let new_slug = slugify(&new_title);
    let displaced = session
        .pages()
        .find(|(other, page)| {
            *other != key
                && (page.title == new_title || (!new_slug.is_empty() && page.title_slug == new_slug))
        })
        .map(|(other, _)| other);
    if let Some(other) = displaced {
        displace(session, other)?;
    }

    let new_title_page = if current == session.wiki().title {
        let wiki_title = current.clone();
        let title_page = session.create_page(&wiki_title, default_content(&wiki_title));
        session.prepend(title_page)?;
        tracing::info!(
            wiki_id = session.wiki().id,
            title = %wiki_title,
            "Title page renamed, created a replacement"
        );
        Some(title_page)
    } else {
        None
    };

    let page = session.page_mut(key)?;
    page.title = new_title.clone();
    page.title_slug = new_slug;

    Ok(TitleChange {
        title: new_title,
        displaced,
        new_title_page,
    })
}

/// Append [`ALTERNATIVE_SUFFIX`] to a page's title, slug and heading.
fn displace(session: &mut WikiSession, key: PageKey) -> Result<(), CoreError> {
    let wiki_id = session.wiki().id;
    let page = session.page_mut(key)?;
    page.title.push_str(ALTERNATIVE_SUFFIX);
    page.title_slug = slugify(&page.title);
    page.content = rewrite_title_block(&page.content, &page.title);
    tracing::info!(wiki_id, title = %page.title, "Displaced page with colliding title");
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::session::tests::{meta, stored};

    fn patch(json: &str) -> Patch {
        serde_json::from_str(json).unwrap()
    }

    fn titles(session: &WikiSession) -> Vec<String> {
        session
            .ordered()
            .map(|step| step.unwrap().1.title.clone())
            .collect()
    }

    /// Wiki "Home" with `[Home -> Notes -> Todo]`.
    fn wiki() -> WikiSession {
        WikiSession::load(
            meta("Home"),
            Some(1),
            vec![
                stored(1, "Home", Some(2)),
                stored(2, "Notes", Some(3)),
                stored(3, "Todo", None),
            ],
        )
        .unwrap()
    }

    // -- extraction ----------------------------------------------------------

    #[test]
    fn title_is_taken_from_first_patch_entry() {
        assert_eq!(
            title_from_patch(&patch(r#"["<h1>New\nname</h1>"]"#)).as_deref(),
            Some("Newname")
        );
        assert_eq!(title_from_patch(&patch(r#"[null, "<p>x</p>"]"#)), None);
        assert_eq!(title_from_patch(&patch(r#"["undefined"]"#)), None);
        assert_eq!(title_from_patch(&patch(r#"["<h1></h1>"]"#)).as_deref(), Some(""));
    }

    #[test]
    fn title_is_stripped_of_any_block_tag() {
        assert_eq!(title_from_patch(&patch(r#"["<h2>Sub</h2>"]"#)).as_deref(), Some("Sub"));
        assert_eq!(title_from_patch(&patch(r#"["<p>Plain</p>"]"#)).as_deref(), Some("Plain"));
        assert_eq!(title_from_patch(&patch(r#"["Bare"]"#)).as_deref(), Some("Bare"));
    }

    #[test]
    fn blank_title_content_detection() {
        assert!(is_blank_title_content("<h1></h1>"));
        assert!(is_blank_title_content("<h1><br><br></h1>"));
        assert!(is_blank_title_content("<h1>&lt;br&gt;</h1>"));
        assert!(!is_blank_title_content("<h1>x</h1>"));
        assert!(!is_blank_title_content("<h1>   </h1>"));
        assert!(!is_blank_title_content("<h1></h1><p>keep me</p>"));
        assert!(!is_blank_title_content("<h1><br></h1><p></p>"));
        assert!(!is_blank_title_content("<p></p><h1></h1>"));
    }

    #[test]
    fn rewrite_title_block_replaces_or_prepends() {
        assert_eq!(
            rewrite_title_block("<h1>Old</h1><p>body</p>", "New"),
            "<h1>New</h1><p>body</p>"
        );
        assert_eq!(rewrite_title_block("<p>body</p>", "New"), "<h1>New</h1><p>body</p>");
    }

    // -- resolve_title -------------------------------------------------------

    #[test]
    fn unchanged_title_does_nothing() {
        let mut session = wiki();
        let notes = session.find_by_slug("notes").unwrap();

        let change = resolve_title(&mut session, notes, &patch(r#"["<h1>Notes</h1>"]"#)).unwrap();

        assert_eq!(change.title, "Notes");
        assert_eq!(change.displaced, None);
        assert!(session.dirty_pages().unwrap().is_empty());
    }

    #[test]
    fn rename_applies_title_and_slug() {
        let mut session = wiki();
        let notes = session.find_by_slug("notes").unwrap();

        resolve_title(&mut session, notes, &patch(r#"["<h1>Field Notes</h1>"]"#)).unwrap();

        let page = session.page(notes).unwrap();
        assert_eq!(page.title, "Field Notes");
        assert_eq!(page.title_slug, "field-notes");
    }

    #[test]
    fn colliding_sibling_gets_suffix_once() {
        let mut session = wiki();
        let (notes, todo) = (
            session.find_by_slug("notes").unwrap(),
            session.find_by_slug("todo").unwrap(),
        );

        let change = resolve_title(&mut session, notes, &patch(r#"["<h1>Todo</h1>"]"#)).unwrap();

        assert_eq!(change.displaced, Some(todo));
        let displaced = session.page(todo).unwrap();
        assert_eq!(displaced.title, "Todo (alternative)");
        assert_eq!(displaced.title_slug, "todo-alternative");
        assert_eq!(displaced.content, "<h1>Todo (alternative)</h1><p></p>");
        assert_eq!(session.find_by_slug("todo"), Some(notes));
    }

    #[test]
    fn sibling_with_same_slug_is_displaced() {
        let mut session = wiki();
        let (notes, todo) = (
            session.find_by_slug("notes").unwrap(),
            session.find_by_slug("todo").unwrap(),
        );

        let change = resolve_title(&mut session, notes, &patch(r#"["<h1>todo</h1>"]"#)).unwrap();

        assert_eq!(change.displaced, Some(todo));
        assert_eq!(session.page(todo).unwrap().title, "Todo (alternative)");
        assert_eq!(session.page(notes).unwrap().title, "todo");
        assert_eq!(session.find_by_slug("todo"), Some(notes));
    }

    #[test]
    fn pages_in_other_wikis_are_not_displaced() {
        // Another wiki's "Home" is out of reach; only this wiki's title page
        // collides, and it is the one renamed.
        let mut session = wiki();
        let notes = session.find_by_slug("notes").unwrap();
        let home = session.find_by_slug("home").unwrap();

        resolve_title(&mut session, notes, &patch(r#"["<h1>Home</h1>"]"#)).unwrap();

        assert_eq!(session.page(home).unwrap().title, "Home (alternative)");
        assert_eq!(session.title_page(), Some(notes));
    }

    #[test]
    fn renaming_the_title_page_creates_a_replacement_at_the_head() {
        let mut session = wiki();
        let home = session.find_by_slug("home").unwrap();

        let change = resolve_title(&mut session, home, &patch(r#"["<h1>Welcome</h1>"]"#)).unwrap();

        let replacement = change.new_title_page.unwrap();
        assert_eq!(session.head(), Some(replacement));
        assert_eq!(session.title_page(), Some(replacement));
        assert_eq!(
            session.page(replacement).unwrap().content,
            "<h1>Home</h1><p></p>"
        );
        assert_eq!(titles(&session), ["Home", "Welcome", "Notes", "Todo"]);
        session.verify().unwrap();
    }

    #[test]
    fn renaming_a_title_page_that_is_not_head_keeps_every_page() {
        let mut session = WikiSession::load(
            meta("Home"),
            Some(2),
            vec![stored(1, "Home", None), stored(2, "Intro", Some(1))],
        )
        .unwrap();
        let home = session.find_by_slug("home").unwrap();

        resolve_title(&mut session, home, &patch(r#"["<h1>Outro</h1>"]"#)).unwrap();

        assert_eq!(titles(&session), ["Home", "Intro", "Outro"]);
        session.verify().unwrap();
    }

    #[test]
    fn missing_page_is_an_integrity_error() {
        let mut session = wiki();
        let todo = session.find_by_slug("todo").unwrap();
        session.delete_page(todo).unwrap();

        assert_matches!(
            resolve_title(&mut session, todo, &patch(r#"["<h1>x</h1>"]"#)),
            Err(CoreError::Integrity(_))
        );
    }
}
