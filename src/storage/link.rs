use crate::types::{ChainId, EndId, GroupId, LinkId};

/// One ordered element of a chain, spanning a 3' End and a 5' End.
///
/// Ends, group, and chain are identifiers into the owning flower; the link
/// never owns them. `prev`/`next` are handles into the same
/// [`super::LinkStore`]. Structural fields are only changed by chain splice
/// operations and by the codec while loading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    three_end: EndId,
    five_end: EndId,
    chain: ChainId,
    group: GroupId,
    prev: Option<LinkId>,
    next: Option<LinkId>,
    link_index: i32,
}

impl Link {
    /// Creates an unattached link. The index starts at 0 and is assigned by
    /// the chain once the link has a position.
    pub fn new(three_end: EndId, five_end: EndId, group: GroupId, chain: ChainId) -> Self {
        Self {
            three_end,
            five_end,
            chain,
            group,
            prev: None,
            next: None,
            link_index: 0,
        }
    }

    /// The End on the 3' side of the link.
    pub fn three_end(&self) -> EndId {
        self.three_end
    }

    /// The End on the 5' side of the link.
    pub fn five_end(&self) -> EndId {
        self.five_end
    }

    /// Chain currently holding the link.
    pub fn chain(&self) -> ChainId {
        self.chain
    }

    /// Group enclosing the link's region.
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Previous link in the chain, if any.
    pub fn prev(&self) -> Option<LinkId> {
        self.prev
    }

    /// Next link in the chain, if any.
    pub fn next(&self) -> Option<LinkId> {
        self.next
    }

    /// Zero-based position in the chain.
    pub fn link_index(&self) -> i32 {
        self.link_index
    }

    /// Returns true if the link has no predecessor.
    pub fn is_head(&self) -> bool {
        self.prev.is_none()
    }

    pub(crate) fn set_prev(&mut self, prev: Option<LinkId>) {
        self.prev = prev;
    }

    pub(crate) fn set_next(&mut self, next: Option<LinkId>) {
        self.next = next;
    }

    pub(crate) fn set_chain(&mut self, chain: ChainId) {
        self.chain = chain;
    }

    pub(crate) fn set_group(&mut self, group: GroupId) {
        self.group = group;
    }

    pub(crate) fn set_link_index(&mut self, link_index: i32) {
        self.link_index = link_index;
    }
}
