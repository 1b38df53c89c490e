//! Ordering chain: the singly-linked order of a wiki's pages.
//!
//! The wiki holds a head pointer, every page holds a pointer to its successor,
//! and the tail points nowhere. All traversal and relinking goes through this
//! module so the invariants are checked in one place:
//!
//! - following `next` from the head visits every live page exactly once;
//! - exactly one page (the tail) has no successor;
//! - a non-empty wiki always has a head.
//!
//! Predecessors are found by scanning the arena for the page whose `next`
//! names the target. No reverse index is kept, so the persisted pointers are
//! the only source of truth.

use crate::error::CoreError;
use crate::session::{PageKey, PageNode, WikiSession};

/// Where a page is attached in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// The wiki's head pointer names the page.
    Head,
    /// The given page's `next` names the page.
    After(PageKey),
}

/// Lazy walk of the chain from the head.
///
/// Yields an integrity error and stops if the walk takes more steps than the
/// wiki has pages (a cycle) or reaches a pointer to a page that is not live.
pub struct Ordered<'s> {
    session: &'s WikiSession,
    cursor: Option<PageKey>,
    visited: usize,
    limit: usize,
    failed: bool,
}

impl<'s> Iterator for Ordered<'s> {
    type Item = Result<(PageKey, &'s PageNode), CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let key = self.cursor?;
        if self.visited == self.limit {
            self.failed = true;
            return Some(Err(CoreError::Integrity(format!(
                "Chain of wiki {} is longer than its {} pages (cycle)",
                self.session.wiki().id,
                self.limit
            ))));
        }
        match self.session.node(key) {
            Some(node) => {
                self.visited += 1;
                self.cursor = node.next;
                Some(Ok((key, node)))
            }
            None => {
                self.failed = true;
                Some(Err(CoreError::Integrity(format!(
                    "Chain of wiki {} points at a deleted page",
                    self.session.wiki().id
                ))))
            }
        }
    }
}

impl WikiSession {
    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Pages in chain order. Each call starts a fresh walk from the head.
    pub fn ordered(&self) -> Ordered<'_> {
        Ordered {
            session: self,
            cursor: self.head(),
            visited: 0,
            limit: self.page_count(),
            failed: false,
        }
    }

    /// Keys in chain order, or the first integrity error met on the way.
    pub fn ordered_keys(&self) -> Result<Vec<PageKey>, CoreError> {
        self.ordered()
            .map(|step| step.map(|(key, _)| key))
            .collect()
    }

    /// Check that the chain reaches every live page exactly once.
    pub fn verify(&self) -> Result<(), CoreError> {
        let reached = self.ordered_keys()?.len();
        let total = self.page_count();
        if reached != total {
            return Err(CoreError::Integrity(format!(
                "Wiki {} has {} unreachable pages",
                self.wiki().id,
                total - reached
            )));
        }
        Ok(())
    }

    /// The last page of the chain.
    pub fn tail(&self) -> Result<Option<PageKey>, CoreError> {
        let mut tail = None;
        for step in self.ordered() {
            tail = Some(step?.0);
        }
        Ok(tail)
    }

    /// How `key` is attached, found by linear search over the arena.
    pub fn link_of(&self, key: PageKey) -> Option<Link> {
        if self.head() == Some(key) {
            return Some(Link::Head);
        }
        self.find_page(|page| page.next == Some(key))
            .map(Link::After)
    }

    /// The page whose successor is `key`.
    pub fn predecessor(&self, key: PageKey) -> Option<PageKey> {
        match self.link_of(key) {
            Some(Link::After(prev)) => Some(prev),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Attach `key` at the end of the chain.
    ///
    /// A page that is already linked is detached first, so appending never
    /// creates a cycle.
    pub fn append(&mut self, key: PageKey) -> Result<(), CoreError> {
        self.page(key)?;
        if self.link_of(key).is_some() {
            self.unlink(key);
        }
        let tail = self.tail()?;
        self.link(key, None);
        match tail {
            Some(tail) => self.link(tail, Some(key)),
            None => self.set_head(Some(key)),
        }
        Ok(())
    }

    /// Attach `key` as the new head.
    pub fn prepend(&mut self, key: PageKey) -> Result<(), CoreError> {
        self.move_after(key, None)
    }

    /// Detach `key`, bridging its predecessor (or the head) to its successor.
    ///
    /// Returns `false` without touching anything when `key` is not attached;
    /// an earlier step of the same request may already have detached it.
    /// The detached page's `next` is cleared so no scan can mistake it for a
    /// predecessor.
    pub fn unlink(&mut self, key: PageKey) -> bool {
        let Some(next) = self.node(key).map(|node| node.next) else {
            return false;
        };
        match self.link_of(key) {
            Some(Link::Head) => self.set_head(next),
            Some(Link::After(prev)) => self.link(prev, next),
            None => {
                tracing::debug!(
                    wiki_id = self.wiki().id,
                    "Unlink of a page that is not in the chain ignored"
                );
                return false;
            }
        }
        self.link(key, None);
        true
    }

    /// Reposition `key` directly after `after`, or at the head when `after`
    /// is `None`.
    ///
    /// Naming the page itself, the predecessor it already has, or its own
    /// immediate successor is an identity move. The new successor is read
    /// after detaching, so the moved page can never end up pointing at itself.
    pub fn move_after(&mut self, key: PageKey, after: Option<PageKey>) -> Result<(), CoreError> {
        let successor = self.page(key)?.next;
        if let Some(target) = after {
            self.page(target)?;
        }

        let current = self.link_of(key);
        let unchanged = match (current, after) {
            (_, Some(target)) if target == key => true,
            (Some(_), Some(target)) if successor == Some(target) => true,
            (Some(Link::Head), None) => true,
            (Some(Link::After(prev)), Some(target)) => prev == target,
            _ => false,
        };
        if unchanged {
            tracing::debug!(wiki_id = self.wiki().id, "Identity move ignored");
            return Ok(());
        }

        self.unlink(key);
        match after {
            Some(target) => {
                let successor = self.page(target)?.next;
                self.link(key, successor);
                self.link(target, Some(key));
            }
            None => {
                let old_head = self.head();
                self.link(key, old_head);
                self.set_head(Some(key));
            }
        }
        Ok(())
    }
}
