use tracing::{debug, error};

use crate::types::{CactusError, ChainId, EndId, LinkId, Result};

use super::destroy::{collect_tail, destroy_cascade};
use super::flower::Catalog;
use super::link::Link;
use super::store::LinkStore;

/// Ordered container of links between two boundary Ends.
///
/// The chain owns the sequence: every splice goes through it so that
/// adjacency, the `chain` back-reference, and `link_index` change together.
/// Links themselves live in a [`LinkStore`] shared by the chains of one
/// flower; a chain must always be used with the store its links live in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chain {
    id: ChainId,
    head: Option<LinkId>,
    tail: Option<LinkId>,
    len: usize,
}

impl Chain {
    /// Creates an empty chain.
    pub fn new(id: ChainId) -> Self {
        Self {
            id,
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Identifier of the chain.
    pub fn id(&self) -> ChainId {
        self.id
    }

    /// First link, if any.
    pub fn head(&self) -> Option<LinkId> {
        self.head
    }

    /// Last link, if any.
    pub fn tail(&self) -> Option<LinkId> {
        self.tail
    }

    /// Number of links.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the chain holds no links.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Creates a link spanning `three_end`..`five_end` and appends it.
    ///
    /// The link's group is the group of its 3' End; both Ends must resolve in
    /// `catalog` and share that group.
    pub fn push_link(
        &mut self,
        store: &mut LinkStore,
        catalog: &Catalog,
        three_end: EndId,
        five_end: EndId,
    ) -> Result<LinkId> {
        let group = catalog.link_group(three_end, five_end)?;
        let index = to_index(self.len)?;
        let id = store.create(three_end, five_end, group, self.id)?;
        self.attach_back(store, id, index)?;
        Ok(id)
    }

    /// Creates a link and places it before the current head.
    pub fn push_front(
        &mut self,
        store: &mut LinkStore,
        catalog: &Catalog,
        three_end: EndId,
        five_end: EndId,
    ) -> Result<LinkId> {
        let group = catalog.link_group(three_end, five_end)?;
        to_index(self.len)?;
        let id = store.create(three_end, five_end, group, self.id)?;
        let old_head = self.head;
        store.link_mut(id)?.set_next(old_head);
        match old_head {
            Some(head) => store.link_mut(head)?.set_prev(Some(id)),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
        self.renumber_from(store, id)?;
        Ok(id)
    }

    /// Creates a link and splices it directly after `after`.
    pub fn insert_after(
        &mut self,
        store: &mut LinkStore,
        catalog: &Catalog,
        after: LinkId,
        three_end: EndId,
        five_end: EndId,
    ) -> Result<LinkId> {
        self.ensure_member(store, after)?;
        let group = catalog.link_group(three_end, five_end)?;
        to_index(self.len)?;
        let next = store.link(after)?.next();
        let id = store.create(three_end, five_end, group, self.id)?;
        {
            let link = store.link_mut(id)?;
            link.set_prev(Some(after));
            link.set_next(next);
        }
        store.link_mut(after)?.set_next(Some(id));
        match next {
            Some(next) => store.link_mut(next)?.set_prev(Some(id)),
            None => self.tail = Some(id),
        }
        self.len += 1;
        self.renumber_from(store, id)?;
        Ok(id)
    }

    /// Detaches and destroys a single link, closing the gap it leaves.
    pub fn remove(&mut self, store: &mut LinkStore, link: LinkId) -> Result<Link> {
        self.ensure_member(store, link)?;
        let (prev, next) = {
            let current = store.link(link)?;
            (current.prev(), current.next())
        };
        match prev {
            Some(prev) => store.link_mut(prev)?.set_next(next),
            None => self.head = next,
        }
        match next {
            Some(next) => store.link_mut(next)?.set_prev(prev),
            None => self.tail = prev,
        }
        self.len -= 1;
        let removed = store.release(link)?;
        if let Some(next) = next {
            self.renumber_from(store, next)?;
        }
        debug!(chain = %self.id, link = %link, "chain.remove");
        Ok(removed)
    }

    /// Destroys `from` and every later link, re-terminating the chain at the
    /// predecessor of `from`.
    pub fn truncate(&mut self, store: &mut LinkStore, from: LinkId) -> Result<usize> {
        self.ensure_member(store, from)?;
        let prev = store.link(from)?.prev();
        let released = destroy_cascade(store, from)?;
        match prev {
            Some(prev) => store.link_mut(prev)?.set_next(None),
            None => self.head = None,
        }
        self.tail = prev;
        self.len = self.len.checked_sub(released).ok_or_else(|| {
            self.violation(format!(
                "released {released} links from a chain of length {}",
                self.len
            ))
        })?;
        Ok(released)
    }

    /// Moves `at` and every later link into a new chain `new_id`.
    ///
    /// Moved links get their `chain` back-reference updated and are
    /// renumbered from 0.
    pub fn split_off(
        &mut self,
        store: &mut LinkStore,
        at: LinkId,
        new_id: ChainId,
    ) -> Result<Chain> {
        if new_id == self.id {
            return Err(CactusError::Invalid("split target must be a different chain"));
        }
        self.ensure_member(store, at)?;
        let moved = collect_tail(store, at)?;
        let remaining = self.len.checked_sub(moved.len()).ok_or_else(|| {
            self.violation(format!(
                "split of {} links from a chain of length {}",
                moved.len(),
                self.len
            ))
        })?;
        let prev = store.link(at)?.prev();
        match prev {
            Some(prev) => store.link_mut(prev)?.set_next(None),
            None => self.head = None,
        }
        store.link_mut(at)?.set_prev(None);
        for (index, id) in moved.iter().enumerate() {
            let link = store.link_mut(*id)?;
            link.set_chain(new_id);
            link.set_link_index(to_index(index)?);
        }
        let other = Chain {
            id: new_id,
            head: Some(at),
            tail: self.tail,
            len: moved.len(),
        };
        self.tail = prev;
        self.len = remaining;
        debug!(from = %self.id, to = %new_id, moved = other.len, "chain.split");
        Ok(other)
    }

    /// Moves every link of `other` onto the end of this chain.
    pub fn append_chain(&mut self, store: &mut LinkStore, other: Chain) -> Result<()> {
        if other.id == self.id {
            return Err(CactusError::Invalid("cannot append a chain to itself"));
        }
        let Some(other_head) = other.head else {
            return Ok(());
        };
        let moved = collect_tail(store, other_head)?;
        to_index(self.len + moved.len())?;
        match self.tail {
            Some(tail) => store.link_mut(tail)?.set_next(Some(other_head)),
            None => self.head = Some(other_head),
        }
        store.link_mut(other_head)?.set_prev(self.tail);
        for (offset, id) in moved.iter().enumerate() {
            let link = store.link_mut(*id)?;
            link.set_chain(self.id);
            link.set_link_index(to_index(self.len + offset)?);
        }
        self.tail = other.tail;
        self.len += moved.len();
        debug!(into = %self.id, from = %other.id, moved = moved.len(), "chain.append");
        Ok(())
    }

    /// Reassigns `link_index` for `from` and everything after it, continuing
    /// from the index of its predecessor. `from` must belong to this chain.
    pub fn renumber_from(&self, store: &mut LinkStore, from: LinkId) -> Result<()> {
        self.ensure_member(store, from)?;
        let mut index = match store.link(from)?.prev() {
            Some(prev) => store.link(prev)?.link_index() + 1,
            None => 0,
        };
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let link = store.link_mut(id)?;
            link.set_link_index(index);
            index += 1;
            cursor = link.next();
        }
        Ok(())
    }

    /// Walks the chain from the head.
    pub fn iter<'a>(&self, store: &'a LinkStore) -> ChainIter<'a> {
        ChainIter {
            store,
            cursor: self.head,
            budget: store.len(),
        }
    }

    /// Handle of the link at `index`, if the chain is that long.
    pub fn link_at(&self, store: &LinkStore, index: usize) -> Option<LinkId> {
        self.iter(store).nth(index).map(|(id, _)| id)
    }

    /// Destroys every link of the chain.
    pub fn destroy(self, store: &mut LinkStore) -> Result<usize> {
        match self.head {
            Some(head) => destroy_cascade(store, head),
            None => Ok(0),
        }
    }

    /// Verifies adjacency symmetry, contiguous indices, back-references,
    /// acyclicity, and the cached head/tail/length.
    pub fn check(&self, store: &LinkStore) -> Result<()> {
        let mut prev: Option<LinkId> = None;
        let mut cursor = self.head;
        let mut count = 0usize;
        while let Some(id) = cursor {
            let link = store
                .get(id)
                .ok_or_else(|| self.violation(format!("{id} is destroyed but still linked")))?;
            if link.chain() != self.id {
                return Err(self.violation(format!("{id} points back to {}", link.chain())));
            }
            if link.prev() != prev {
                return Err(self.violation(format!(
                    "{id} has prev {:?}, expected {:?}",
                    link.prev(),
                    prev
                )));
            }
            if i64::from(link.link_index()) != count as i64 {
                return Err(self.violation(format!(
                    "{id} has index {}, expected {count}",
                    link.link_index()
                )));
            }
            count += 1;
            if count > store.len() {
                return Err(self.violation("next pointers form a cycle".to_string()));
            }
            prev = Some(id);
            cursor = link.next();
        }
        if self.tail != prev {
            return Err(self.violation(format!(
                "tail is {:?}, last reachable link is {:?}",
                self.tail, prev
            )));
        }
        if count != self.len {
            return Err(self.violation(format!(
                "length is {}, {count} links reachable",
                self.len
            )));
        }
        Ok(())
    }

    pub(crate) fn attach_back(
        &mut self,
        store: &mut LinkStore,
        id: LinkId,
        index: i32,
    ) -> Result<()> {
        let prev = self.tail;
        {
            let link = store.link_mut(id)?;
            link.set_prev(prev);
            link.set_next(None);
            link.set_chain(self.id);
            link.set_link_index(index);
        }
        match prev {
            Some(prev) => store.link_mut(prev)?.set_next(Some(id)),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
        Ok(())
    }

    fn ensure_member(&self, store: &LinkStore, id: LinkId) -> Result<()> {
        if store.link(id)?.chain() != self.id {
            return Err(CactusError::Invalid("link does not belong to this chain"));
        }
        Ok(())
    }

    fn violation(&self, message: String) -> CactusError {
        error!(chain = %self.id, %message, "chain.check.violation");
        CactusError::InvariantViolation(format!("{}: {message}", self.id))
    }
}

pub(crate) fn to_index(position: usize) -> Result<i32> {
    i32::try_from(position).map_err(|_| CactusError::Invalid("chain exceeds i32 link index range"))
}

/// Iterator over `(handle, link)` pairs in chain order.
pub struct ChainIter<'a> {
    store: &'a LinkStore,
    cursor: Option<LinkId>,
    budget: usize,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = (LinkId, &'a Link);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        if self.budget == 0 {
            self.cursor = None;
            return None;
        }
        self.budget -= 1;
        let link = self.store.get(id)?;
        self.cursor = link.next();
        Some((id, link))
    }
}
