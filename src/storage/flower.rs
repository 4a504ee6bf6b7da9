use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::primitives::io::{ByteSink, ByteSource};
use crate::types::{
    CactusError, ChainId, EndId, EntityKind, FlowerName, GroupId, LinkId, Result,
};

use super::chain::Chain;
use super::codec::{load_link_chain, write_link_chain};
use super::link::Link;
use super::options::CodecOptions;
use super::store::LinkStore;

/// Boundary node referenced by links.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct End {
    /// Identifier of the End.
    pub id: EndId,
    /// Group the End sits in.
    pub group: GroupId,
}

/// Sub-region of a flower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Group {
    /// Identifier of the group.
    pub id: GroupId,
}

/// Lookup of live Ends and Groups by identifier.
///
/// The codec depends on nothing else from the flower: decoding only asks
/// whether an identifier names something that already exists.
pub trait Resolver {
    /// Returns `id` if it names a live End.
    fn resolve_end(&self, id: EndId) -> Result<EndId>;
    /// Returns `id` if it names a live Group.
    fn resolve_group(&self, id: GroupId) -> Result<GroupId>;
}

/// End and Group tables of a flower.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    ends: FxHashMap<EndId, End>,
    groups: FxHashMap<GroupId, Group>,
}

impl Catalog {
    /// Registers a group.
    pub fn add_group(&mut self, id: GroupId) -> Result<()> {
        if id.is_null() {
            return Err(CactusError::Invalid("group id is reserved"));
        }
        if self.groups.insert(id, Group { id }).is_some() {
            return Err(CactusError::Invalid("group already registered"));
        }
        Ok(())
    }

    /// Registers an End inside an existing group.
    pub fn add_end(&mut self, id: EndId, group: GroupId) -> Result<()> {
        if id.is_null() {
            return Err(CactusError::Invalid("end id is reserved"));
        }
        self.resolve_group(group)?;
        if self.ends.contains_key(&id) {
            return Err(CactusError::Invalid("end already registered"));
        }
        self.ends.insert(id, End { id, group });
        Ok(())
    }

    /// Looks up an End.
    pub fn end(&self, id: EndId) -> Result<&End> {
        self.ends
            .get(&id)
            .ok_or_else(|| CactusError::unresolved(EntityKind::End, id.0))
    }

    /// Looks up a Group.
    pub fn group(&self, id: GroupId) -> Result<&Group> {
        self.groups
            .get(&id)
            .ok_or_else(|| CactusError::unresolved(EntityKind::Group, id.0))
    }

    /// Number of registered Ends.
    pub fn end_count(&self) -> usize {
        self.ends.len()
    }

    /// Number of registered Groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Group a link between `three_end` and `five_end` belongs to.
    pub(crate) fn link_group(&self, three_end: EndId, five_end: EndId) -> Result<GroupId> {
        let group = self.end(three_end)?.group;
        if self.end(five_end)?.group != group {
            return Err(CactusError::Invalid("link ends belong to different groups"));
        }
        Ok(group)
    }
}

impl Resolver for Catalog {
    fn resolve_end(&self, id: EndId) -> Result<EndId> {
        self.end(id).map(|end| end.id)
    }

    fn resolve_group(&self, id: GroupId) -> Result<GroupId> {
        self.group(id).map(|group| group.id)
    }
}

/// A graph region holding Ends, Groups, and the chains linking them.
///
/// All links of the flower share one [`LinkStore`]; chains are keyed by id.
#[derive(Clone, Debug)]
pub struct Flower {
    name: FlowerName,
    catalog: Catalog,
    chains: BTreeMap<ChainId, Chain>,
    links: LinkStore,
}

impl Flower {
    /// Creates an empty flower.
    pub fn new(name: FlowerName) -> Self {
        Self {
            name,
            catalog: Catalog::default(),
            chains: BTreeMap::new(),
            links: LinkStore::new(),
        }
    }

    /// Name of the flower.
    pub fn name(&self) -> FlowerName {
        self.name
    }

    /// End and Group tables.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Link arena.
    pub fn links(&self) -> &LinkStore {
        &self.links
    }

    #[cfg(test)]
    pub(crate) fn links_mut(&mut self) -> &mut LinkStore {
        &mut self.links
    }

    /// Registers a group.
    pub fn add_group(&mut self, id: GroupId) -> Result<()> {
        self.catalog.add_group(id)
    }

    /// Registers an End inside an existing group.
    pub fn add_end(&mut self, id: EndId, group: GroupId) -> Result<()> {
        self.catalog.add_end(id, group)
    }

    /// Creates an empty chain.
    pub fn create_chain(&mut self, id: ChainId) -> Result<()> {
        if id.is_null() {
            return Err(CactusError::Invalid("chain id is reserved"));
        }
        if self.chains.contains_key(&id) {
            return Err(CactusError::Invalid("chain already exists"));
        }
        self.chains.insert(id, Chain::new(id));
        Ok(())
    }

    /// Looks up a chain.
    pub fn chain(&self, id: ChainId) -> Result<&Chain> {
        self.chains.get(&id).ok_or(CactusError::NotFound("chain"))
    }

    /// Iterates over chains in ascending id order.
    pub fn chains(&self) -> impl Iterator<Item = &Chain> + '_ {
        self.chains.values()
    }

    /// Number of chains.
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Looks up a live link.
    pub fn link(&self, id: LinkId) -> Result<&Link> {
        self.links.link(id)
    }

    /// Appends a new link to `chain`.
    pub fn push_link(&mut self, chain: ChainId, three_end: EndId, five_end: EndId) -> Result<LinkId> {
        let target = self.chains.get_mut(&chain).ok_or(CactusError::NotFound("chain"))?;
        target.push_link(&mut self.links, &self.catalog, three_end, five_end)
    }

    /// Splices a new link into `chain` after `after`.
    pub fn insert_link_after(
        &mut self,
        chain: ChainId,
        after: LinkId,
        three_end: EndId,
        five_end: EndId,
    ) -> Result<LinkId> {
        let target = self.chains.get_mut(&chain).ok_or(CactusError::NotFound("chain"))?;
        target.insert_after(&mut self.links, &self.catalog, after, three_end, five_end)
    }

    /// Removes a single link from `chain`.
    pub fn remove_link(&mut self, chain: ChainId, link: LinkId) -> Result<Link> {
        let target = self.chains.get_mut(&chain).ok_or(CactusError::NotFound("chain"))?;
        target.remove(&mut self.links, link)
    }

    /// Destroys `from` and everything after it in `chain`.
    pub fn truncate_chain(&mut self, chain: ChainId, from: LinkId) -> Result<usize> {
        let target = self.chains.get_mut(&chain).ok_or(CactusError::NotFound("chain"))?;
        target.truncate(&mut self.links, from)
    }

    /// Moves `at` and its successors out of `chain` into a new chain `new_id`.
    pub fn split_chain(&mut self, chain: ChainId, at: LinkId, new_id: ChainId) -> Result<()> {
        if new_id.is_null() {
            return Err(CactusError::Invalid("chain id is reserved"));
        }
        if self.chains.contains_key(&new_id) {
            return Err(CactusError::Invalid("chain already exists"));
        }
        let target = self.chains.get_mut(&chain).ok_or(CactusError::NotFound("chain"))?;
        let split = target.split_off(&mut self.links, at, new_id)?;
        self.chains.insert(new_id, split);
        Ok(())
    }

    /// Appends every link of `second` to `first` and drops `second`.
    pub fn join_chains(&mut self, first: ChainId, second: ChainId) -> Result<()> {
        if first == second {
            return Err(CactusError::Invalid("cannot join a chain to itself"));
        }
        if !self.chains.contains_key(&first) {
            return Err(CactusError::NotFound("chain"));
        }
        let other = self.chains.remove(&second).ok_or(CactusError::NotFound("chain"))?;
        let target = self.chains.get_mut(&first).ok_or(CactusError::NotFound("chain"))?;
        if let Err(err) = target.append_chain(&mut self.links, other.clone()) {
            self.chains.insert(second, other);
            return Err(err);
        }
        Ok(())
    }

    /// Reassigns the group of a link. The group must exist.
    pub fn set_link_group(&mut self, link: LinkId, group: GroupId) -> Result<()> {
        let group = self.catalog.resolve_group(group)?;
        self.links.set_group(link, group)
    }

    /// Destroys a chain and all of its links.
    ///
    /// A chain whose links cannot be walked stays registered, with every link
    /// still alive.
    pub fn destroy_chain(&mut self, chain: ChainId) -> Result<usize> {
        let target = self.chains.remove(&chain).ok_or(CactusError::NotFound("chain"))?;
        match target.clone().destroy(&mut self.links) {
            Ok(released) => Ok(released),
            Err(err) => {
                warn!(
                    chain = %chain,
                    head = ?target.head(),
                    error = %err,
                    "flower.destroy_chain.failed"
                );
                self.chains.insert(chain, target);
                Err(err)
            }
        }
    }

    /// Encodes `chain` from its head. Returns the number of links written.
    pub fn write_chain<S: ByteSink + ?Sized>(
        &self,
        chain: ChainId,
        sink: &mut S,
        opts: &CodecOptions,
    ) -> Result<usize> {
        let target = self.chain(chain)?;
        write_link_chain(&self.links, target.head(), sink, opts)
    }

    /// Decodes a link stream into a new chain `id`.
    ///
    /// On failure the chain is not created and no links are added.
    pub fn load_chain<S: ByteSource + ?Sized>(
        &mut self,
        id: ChainId,
        source: &mut S,
        opts: &CodecOptions,
    ) -> Result<Option<LinkId>> {
        if id.is_null() {
            return Err(CactusError::Invalid("chain id is reserved"));
        }
        if self.chains.contains_key(&id) {
            return Err(CactusError::Invalid("chain already exists"));
        }
        let mut chain = Chain::new(id);
        let head = load_link_chain(source, &mut self.links, &mut chain, &self.catalog, opts)?;
        debug!(chain = %id, links = chain.len(), "flower.load_chain");
        self.chains.insert(id, chain);
        Ok(head)
    }

    /// Checks the invariants of every chain.
    pub fn check(&self) -> Result<()> {
        for chain in self.chains.values() {
            chain.check(&self.links)?;
        }
        Ok(())
    }

    /// Destroys every chain, leaving Ends and Groups in place.
    pub fn clear_chains(&mut self) -> Result<usize> {
        let ids: Vec<ChainId> = self.chains.keys().copied().collect();
        let mut released = 0;
        for id in ids {
            released += self.destroy_chain(id)?;
        }
        info!(flower = %self.name, links = released, "flower.clear_chains");
        Ok(released)
    }
}
