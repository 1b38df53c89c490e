//! Sparse block patches and the sanitizing merger.
//!
//! A patch is a JSON array indexed by block position. Each entry is either a
//! replacement string or an "unchanged" marker, which clients send as `null`
//! or as the literal string `"undefined"`.

use serde::{Deserialize, Serialize};

use crate::blocks::split_blocks;
use crate::sanitize::sanitize;

/// Literal some clients send for an untouched block.
pub const UNCHANGED_MARKER: &str = "undefined";

/// One entry of a [`Patch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockEdit {
    Unchanged,
    Replace(String),
}

impl From<Option<String>> for BlockEdit {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(text) if text != UNCHANGED_MARKER => BlockEdit::Replace(text),
            _ => BlockEdit::Unchanged,
        }
    }
}

impl From<BlockEdit> for Option<String> {
    fn from(edit: BlockEdit) -> Self {
        match edit {
            BlockEdit::Unchanged => None,
            BlockEdit::Replace(text) => Some(text),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Option<String>>", into = "Vec<Option<String>>")]
pub struct Patch {
    edits: Vec<BlockEdit>,
}

impl From<Vec<Option<String>>> for Patch {
    fn from(entries: Vec<Option<String>>) -> Self {
        Self {
            edits: entries.into_iter().map(BlockEdit::from).collect(),
        }
    }
}

impl From<Patch> for Vec<Option<String>> {
    fn from(patch: Patch) -> Self {
        patch.edits.into_iter().map(Option::from).collect()
    }
}

impl FromIterator<BlockEdit> for Patch {
    fn from_iter<I: IntoIterator<Item = BlockEdit>>(iter: I) -> Self {
        Self {
            edits: iter.into_iter().collect(),
        }
    }
}

impl Patch {
    pub fn new(edits: Vec<BlockEdit>) -> Self {
        Self { edits }
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Replacement for block `index`, if the patch carries one.
    pub fn replacement(&self, index: usize) -> Option<&str> {
        match self.edits.get(index) {
            Some(BlockEdit::Replace(text)) => Some(text),
            _ => None,
        }
    }

    /// Apply the patch to a block sequence and join the result.
    ///
    /// Replacements beyond the current block count are appended in index
    /// order. Unchanged entries beyond the current block count contribute
    /// nothing.
    pub fn merge(&self, blocks: &[&str]) -> String {
        let len = blocks.len().max(self.edits.len());
        (0..len)
            .filter_map(|index| self.replacement(index).or_else(|| blocks.get(index).copied()))
            .collect()
    }
}

/// Split `content`, apply `patch` and sanitize the result.
///
/// Pure: the ordering chain is never consulted.
pub fn merge_and_sanitize(content: &str, patch: &Patch) -> String {
    let blocks = split_blocks(content);
    sanitize(&patch.merge(&blocks))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn patch(json: &str) -> Patch {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn null_and_undefined_both_mean_unchanged() {
        let p = patch(r#"[null, "undefined", "<p>x</p>"]"#);
        assert_eq!(p.len(), 3);
        assert_eq!(p.replacement(0), None);
        assert_eq!(p.replacement(1), None);
        assert_eq!(p.replacement(2), Some("<p>x</p>"));
    }

    #[test]
    fn serializes_unchanged_as_null() {
        let p = Patch::new(vec![BlockEdit::Unchanged, BlockEdit::Replace("<p>a</p>".into())]);
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"[null,"<p>a</p>"]"#);
    }

    #[test]
    fn replaces_second_block_and_keeps_title() {
        let out = merge_and_sanitize("<h1>Home</h1><p>Hi</p>", &patch(r#"["undefined", "<p>Bye</p>"]"#));
        assert_eq!(out, "<h1>Home</h1><p>Bye</p>");
    }

    #[test]
    fn replacements_past_the_end_are_appended() {
        let out = merge_and_sanitize(
            "<h1>Home</h1>",
            &patch(r#"[null, "<p>one</p>", null, "<p>three</p>"]"#),
        );
        assert_eq!(out, "<h1>Home</h1><p>one</p><p>three</p>");
    }

    #[test]
    fn empty_patch_keeps_blocks_and_drops_loose_text() {
        let out = merge_and_sanitize("<h1>Home</h1>loose<p>x</p>", &Patch::default());
        assert_eq!(out, "<h1>Home</h1><p>x</p>");
    }

    #[test]
    fn injected_markup_is_escaped() {
        let out = merge_and_sanitize(
            "<h1>Home</h1><p></p>",
            &patch(r#"[null, "<p><img src=x onerror=alert(1)></p>"]"#),
        );
        assert_eq!(out, "<h1>Home</h1><p>&lt;img src=x onerror=alert(1)&gt;</p>");
    }

    fn block() -> impl Strategy<Value = String> {
        (
            prop::sample::select(crate::blocks::BLOCK_TAGS),
            "[a-zA-Z0-9 ]{0,10}",
        )
            .prop_map(|(tag, text)| format!("<{tag}>{text}</{tag}>"))
    }

    proptest! {
        #[test]
        fn all_unchanged_patch_reproduces_content(
            blocks in proptest::collection::vec(block(), 0..8),
            extra in 0usize..4,
        ) {
            let content = blocks.concat();
            let unchanged = Patch::new(vec![BlockEdit::Unchanged; blocks.len() + extra]);
            prop_assert_eq!(merge_and_sanitize(&content, &unchanged), content);
        }
    }
}
