//! Markup sanitizer for page content.
//!
//! Only the tags in [`ALLOWED_TAGS`] survive, and only in their bare
//! `<tag>` / `</tag>` form (no attributes). Every other angle bracket is
//! escaped to its HTML entity.
//!
//! The sanitizer runs two forward-only passes:
//!
//! 1. Each `<` must be followed by an optional `/`, an allowed tag name and
//!    `>`. Otherwise it becomes `&lt;`.
//! 2. The string is reversed. Each `>` must be followed by a
//!    [`MIRRORED_TAGS`] token, an optional `/` and `<`. Otherwise it becomes
//!    `;tg&`, which reads `&gt;` once the string is reversed back.
//!
//! Pass 2 checks what precedes each `>` in the original string without any
//! look-behind matching.

/// Tag names permitted in page content.
pub const ALLOWED_TAGS: &[&str] = &["h1", "h2", "h3", "p", "b", "i", "u"];

/// [`ALLOWED_TAGS`] spelled backwards, for the reversed pass.
pub const MIRRORED_TAGS: &[&str] = &["1h", "2h", "3h", "p", "b", "i", "u"];

const LT_ENTITY: &str = "&lt;";
const GT_ENTITY_REVERSED: &str = ";tg&";

/// Escape every `<` and `>` that is not part of an allowed tag.
///
/// Idempotent: sanitizing already-sanitized content returns it unchanged.
pub fn sanitize(content: &str) -> String {
    let opened = escape_where(content, '<', LT_ENTITY, opens_allowed_tag);
    let reversed: String = opened.chars().rev().collect();
    let closed = escape_where(&reversed, '>', GT_ENTITY_REVERSED, closes_allowed_tag_reversed);
    closed.chars().rev().collect()
}

/// Replace each `bracket` with `entity` unless `keep` accepts the text that
/// follows it.
fn escape_where(text: &str, bracket: char, entity: &str, keep: fn(&str) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (index, c) in text.char_indices() {
        if c == bracket && !keep(&text[index + c.len_utf8()..]) {
            out.push_str(entity);
        } else {
            out.push(c);
        }
    }
    out
}

/// `/?(h1|h2|h3|p|b|i|u)>` at the start of `rest`.
fn opens_allowed_tag(rest: &str) -> bool {
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    ALLOWED_TAGS
        .iter()
        .any(|tag| rest.strip_prefix(tag).is_some_and(|tail| tail.starts_with('>')))
}

/// `(1h|2h|3h|p|b|i|u)/?<` at the start of `rest`.
fn closes_allowed_tag_reversed(rest: &str) -> bool {
    MIRRORED_TAGS.iter().any(|token| {
        rest.strip_prefix(token).is_some_and(|tail| {
            let tail = tail.strip_prefix('/').unwrap_or(tail);
            tail.starts_with('<')
        })
    })
}
