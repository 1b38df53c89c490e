//! Transaction context for one wiki.
//!
//! A [`WikiSession`] is an arena holding the wiki record and every page that
//! belongs to it. Pages are addressed by [`PageKey`], which stays stable for
//! the whole session, including for pages created during the session that do
//! not have a database id yet. The persistence layer loads a session inside a
//! database transaction, lets the lifecycle controller mutate it, then writes
//! back exactly what changed (see the "Persistence hooks" section) before
//! committing. Dropping a session without flushing it discards every change.
//!
//! Chain traversal and mutation live in [`crate::chain`]; this module only
//! owns storage and bookkeeping.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp, Visibility};
use crate::wiki::slugify;

/// Stable handle of a page inside a [`WikiSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey(usize);

/// Wiki-level fields the engine reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiMeta {
    pub id: DbId,
    pub author_id: DbId,
    pub title: String,
    pub title_slug: String,
    pub visibility: Visibility,
    pub autosave: bool,
    pub updated_at: Timestamp,
}

/// A page as held in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNode {
    /// `None` until the page has been inserted by the persistence layer.
    pub id: Option<DbId>,
    pub title: String,
    pub title_slug: String,
    pub content: String,
    pub(crate) next: Option<PageKey>,
}

impl PageNode {
    /// Successor in the ordering chain; `None` marks the tail.
    pub fn next(&self) -> Option<PageKey> {
        self.next
    }
}

/// A page row as read from storage.
#[derive(Debug, Clone)]
pub struct StoredPage {
    pub id: DbId,
    pub title: String,
    pub title_slug: String,
    pub content: String,
    pub next_page_id: Option<DbId>,
}

/// A page row to write back, with its successor resolved to a database id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUpdate<'a> {
    pub id: DbId,
    pub title: &'a str,
    pub title_slug: &'a str,
    pub content: &'a str,
    pub next_page_id: Option<DbId>,
}

#[derive(Debug, Clone)]
struct Slot {
    node: Option<PageNode>,
    dirty: bool,
}

#[derive(Debug, Clone)]
pub struct WikiSession {
    wiki: WikiMeta,
    head: Option<PageKey>,
    slots: Vec<Slot>,
    deleted: Vec<DbId>,
    wiki_dirty: bool,
}

impl WikiSession {
    /// Start a session for a wiki that has no pages yet (wiki creation).
    pub fn new(wiki: WikiMeta) -> Self {
        Self {
            wiki,
            head: None,
            slots: Vec::new(),
            deleted: Vec::new(),
            wiki_dirty: false,
        }
    }

    /// Build a session from stored rows and verify the chain they describe.
    ///
    /// Fails with [`CoreError::Integrity`] if a pointer names a page outside
    /// the wiki, if the chain has a cycle, or if some page is unreachable from
    /// the head.
    pub fn load(
        wiki: WikiMeta,
        first_page_id: Option<DbId>,
        pages: Vec<StoredPage>,
    ) -> Result<Self, CoreError> {
        let keys: HashMap<DbId, PageKey> = pages
            .iter()
            .enumerate()
            .map(|(index, page)| (page.id, PageKey(index)))
            .collect();

        let resolve = |id: DbId| {
            keys.get(&id).copied().ok_or_else(|| {
                CoreError::Integrity(format!(
                    "Wiki {} points at page {id}, which does not belong to it",
                    wiki.id
                ))
            })
        };

        let head = first_page_id.map(resolve).transpose()?;
        if head.is_none() && !pages.is_empty() {
            return Err(CoreError::Integrity(format!(
                "Wiki {} has {} pages but no first page",
                wiki.id,
                pages.len()
            )));
        }

        let mut slots = Vec::with_capacity(pages.len());
        for page in pages {
            let next = page.next_page_id.map(resolve).transpose()?;
            slots.push(Slot {
                node: Some(PageNode {
                    id: Some(page.id),
                    title: page.title,
                    title_slug: page.title_slug,
                    content: page.content,
                    next,
                }),
                dirty: false,
            });
        }

        let session = Self {
            wiki,
            head,
            slots,
            deleted: Vec::new(),
            wiki_dirty: false,
        };
        session.verify()?;
        Ok(session)
    }

    // -----------------------------------------------------------------------
    // Wiki record
    // -----------------------------------------------------------------------

    pub fn wiki(&self) -> &WikiMeta {
        &self.wiki
    }

    /// Mutable access to the wiki record; marks it for write-back.
    pub fn wiki_mut(&mut self) -> &mut WikiMeta {
        self.wiki_dirty = true;
        &mut self.wiki
    }

    /// Bump the wiki's update timestamp.
    pub fn touch(&mut self, now: Timestamp) {
        self.wiki_mut().updated_at = now;
    }

    pub fn head(&self) -> Option<PageKey> {
        self.head
    }

    pub(crate) fn set_head(&mut self, head: Option<PageKey>) {
        if self.head != head {
            self.head = head;
            self.wiki_dirty = true;
        }
    }

    // -----------------------------------------------------------------------
    // Pages
    // -----------------------------------------------------------------------

    /// Number of live pages (created pages included, deleted ones excluded).
    pub fn page_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub(crate) fn node(&self, key: PageKey) -> Option<&PageNode> {
        self.slots.get(key.0).and_then(|slot| slot.node.as_ref())
    }

    pub fn page(&self, key: PageKey) -> Result<&PageNode, CoreError> {
        self.node(key)
            .ok_or_else(|| CoreError::Integrity(format!("Page key {} is not live", key.0)))
    }

    /// Mutable access to a page; marks it for write-back.
    pub fn page_mut(&mut self, key: PageKey) -> Result<&mut PageNode, CoreError> {
        let slot = self
            .slots
            .get_mut(key.0)
            .filter(|slot| slot.node.is_some())
            .ok_or_else(|| CoreError::Integrity(format!("Page key {} is not live", key.0)))?;
        slot.dirty = true;
        slot.node
            .as_mut()
            .ok_or_else(|| CoreError::Internal("live slot lost its page".into()))
    }

    /// Repoint a page's successor. Unknown keys are ignored.
    pub(crate) fn link(&mut self, key: PageKey, next: Option<PageKey>) {
        if let Some(slot) = self.slots.get_mut(key.0) {
            if let Some(node) = slot.node.as_mut() {
                if node.next != next {
                    node.next = next;
                    slot.dirty = true;
                }
            }
        }
    }

    /// Live pages in arena order (not chain order, see [`WikiSession::ordered`]).
    pub fn pages(&self) -> impl Iterator<Item = (PageKey, &PageNode)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.node.as_ref().map(|node| (PageKey(index), node)))
    }

    /// First live page matching `predicate`, in arena order.
    pub fn find_page(&self, predicate: impl Fn(&PageNode) -> bool) -> Option<PageKey> {
        self.pages()
            .find(|(_, node)| predicate(node))
            .map(|(key, _)| key)
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<PageKey> {
        self.find_page(|page| page.title_slug == slug)
    }

    pub fn find_by_title(&self, title: &str) -> Option<PageKey> {
        self.find_page(|page| page.title == title)
    }

    /// The page whose title equals the wiki's title, if any.
    pub fn title_page(&self) -> Option<PageKey> {
        self.find_by_title(&self.wiki.title)
    }

    /// Add a page to the arena. The page is not linked into the chain; callers
    /// go through [`WikiSession::append`] or [`WikiSession::prepend`].
    pub fn create_page(&mut self, title: &str, content: String) -> PageKey {
        let key = PageKey(self.slots.len());
        self.slots.push(Slot {
            node: Some(PageNode {
                id: None,
                title: title.to_string(),
                title_slug: slugify(title),
                content,
                next: None,
            }),
            dirty: true,
        });
        key
    }

    /// Unlink a page from the chain and drop it from the arena.
    pub fn delete_page(&mut self, key: PageKey) -> Result<PageNode, CoreError> {
        self.page(key)?;
        self.unlink(key);
        let slot = &mut self.slots[key.0];
        slot.dirty = false;
        let node = slot
            .node
            .take()
            .ok_or_else(|| CoreError::Internal("live slot lost its page".into()))?;
        if let Some(id) = node.id {
            self.deleted.push(id);
        }
        Ok(node)
    }

    // -----------------------------------------------------------------------
    // Persistence hooks
    // -----------------------------------------------------------------------

    /// Pages created during this session that still need an `INSERT`.
    pub fn unsaved_pages(&self) -> Vec<(PageKey, &PageNode)> {
        self.pages().filter(|(_, node)| node.id.is_none()).collect()
    }

    /// Record the database id the persistence layer assigned to a new page.
    pub fn assign_id(&mut self, key: PageKey, id: DbId) -> Result<(), CoreError> {
        self.page_mut(key)?.id = Some(id);
        Ok(())
    }

    fn id_of(&self, key: PageKey) -> Result<DbId, CoreError> {
        self.page(key)?.id.ok_or_else(|| {
            CoreError::Internal(format!("Page key {} was never inserted", key.0))
        })
    }

    /// Database id of the chain head, resolved for write-back.
    pub fn head_id(&self) -> Result<Option<DbId>, CoreError> {
        self.head.map(|key| self.id_of(key)).transpose()
    }

    /// Every modified page with its successor resolved to a database id.
    ///
    /// Must be called after every unsaved page has been given an id.
    pub fn dirty_pages(&self) -> Result<Vec<PageUpdate<'_>>, CoreError> {
        self.slots
            .iter()
            .filter(|slot| slot.dirty)
            .filter_map(|slot| slot.node.as_ref())
            .map(|node| -> Result<PageUpdate<'_>, CoreError> {
                Ok(PageUpdate {
                    id: node.id.ok_or_else(|| {
                        CoreError::Internal(format!("Page '{}' was never inserted", node.title))
                    })?,
                    title: &node.title,
                    title_slug: &node.title_slug,
                    content: &node.content,
                    next_page_id: node.next.map(|next| self.id_of(next)).transpose()?,
                })
            })
            .collect()
    }

    pub fn is_wiki_dirty(&self) -> bool {
        self.wiki_dirty
    }

    /// Ids of stored pages deleted during this session.
    pub fn deleted_ids(&self) -> &[DbId] {
        &self.deleted
    }
}
