//! Content block splitter.
//!
//! Page content is a concatenation of block elements (`h1`, `h2`, `h3`, `p`).
//! Each block is matched as the shortest run from an opening block tag to the
//! next closing block tag. Text outside any block is not part of the
//! sequence and is lost when the page is re-merged.

use std::sync::LazyLock;

use regex::Regex;

/// Tags that may open or close a block.
pub const BLOCK_TAGS: &[&str] = &["h1", "h2", "h3", "p"];

/// Shortest `<tag>...</tag>` run. `(?s)` lets blocks span newlines.
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:h1|h2|h3|p)>.*?</(?:h1|h2|h3|p)>").expect("valid regex")
});

/// Split content into its blocks, in document order.
///
/// The returned slices borrow from `content`. Concatenating them reproduces
/// `content` exactly when it holds nothing but well-formed blocks.
pub fn split_blocks(content: &str) -> Vec<&str> {
    BLOCK_RE.find_iter(content).map(|m| m.as_str()).collect()
}

/// Tag name of a block's opening element, if it is one of [`BLOCK_TAGS`].
pub fn block_tag(block: &str) -> Option<&'static str> {
    BLOCK_TAGS
        .iter()
        .find(|tag| {
            block
                .strip_prefix('<')
                .and_then(|rest| rest.strip_prefix(**tag))
                .is_some_and(|rest| rest.starts_with('>'))
        })
        .copied()
}

/// Text between a block's opening and closing tags.
pub fn inner_text(block: &str) -> &str {
    let Some(tag) = block_tag(block) else {
        return block;
    };
    let open = tag.len() + 2;
    match block.rfind("</") {
        Some(close) if close >= open => &block[open..close],
        _ => &block[open..],
    }
}
