//! Wiki and page title validation, slug generation and default content.
//!
//! Slugs are the addressing scheme for both wikis and pages, so every layer
//! (lifecycle controller, repositories, handlers) goes through [`slugify`].

use unicode_normalization::UnicodeNormalization;

use crate::error::CoreError;

/// Maximum length of a wiki or page title, in characters.
pub const MAX_TITLE_LEN: usize = 50;

/// Title given to a wiki whose settings form submitted a blank title.
pub const UNTITLED_WIKI: &str = "Untitled";

/// Wiki slugs taken by fixed routes under `/wikis`.
pub const RESERVED_WIKI_SLUGS: &[&str] = &["public"];

// ---------------------------------------------------------------------------
// Slug generation
// ---------------------------------------------------------------------------

/// Turn arbitrary text into a URL-safe slug.
///
/// Accented letters are folded to their ASCII base letter, everything is
/// lowercased, whitespace runs become a single dash, any other
/// non-alphanumeric character is dropped, and leading/trailing dashes are
/// trimmed. Total for any input; may return an empty string.
///
/// ```
/// use quire_core::wiki::slugify;
/// assert_eq!(slugify("Rise and shine, Mr. Freeman."), "rise-and-shine-mr-freeman");
/// assert_eq!(slugify("It's already 2 PM..."), "its-already-2-pm");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.nfkd() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' {
            pending_dash = true;
            continue;
        }
        if !c.is_ascii_alphanumeric() {
            continue;
        }
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.push(c.to_ascii_lowercase());
    }

    slug
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a user-supplied wiki or page title (non-blank, at most
/// [`MAX_TITLE_LEN`] characters, must produce a non-empty slug).
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    if slugify(title).is_empty() {
        return Err(CoreError::Validation(
            "Title must contain at least one letter or digit".into(),
        ));
    }
    Ok(())
}

/// Validate a wiki title: a valid title whose slug is not reserved.
pub fn validate_wiki_title(title: &str) -> Result<(), CoreError> {
    validate_title(title)?;
    let slug = slugify(title);
    if RESERVED_WIKI_SLUGS.contains(&slug.as_str()) {
        return Err(CoreError::Validation(format!(
            "Wiki slug '{slug}' is reserved"
        )));
    }
    Ok(())
}

/// Validate a slug taken from a URL path (non-empty, only lowercase
/// alphanumeric + hyphens).
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.is_empty() {
        return Err(CoreError::Validation("Slug must not be empty".into()));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(CoreError::Validation(
            "Slug must contain only lowercase alphanumeric characters and hyphens".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Content of a freshly created page: its title heading and one empty
/// paragraph.
pub fn default_content(title: &str) -> String {
    format!("<h1>{title}</h1><p></p>")
}
