use crate::types::{CactusError, ChainId, EndId, GroupId, LinkId, Result};

use super::link::Link;

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    link: Option<Link>,
}

/// Arena holding every link of a flower.
///
/// Slots are reused through a free list; each reuse bumps the slot
/// generation so that a [`LinkId`] kept past its link's destruction never
/// resolves to the new occupant.
#[derive(Clone, Debug, Default)]
pub struct LinkStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl LinkStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for `capacity` links.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Allocates a new unattached link belonging to `chain`.
    ///
    /// The link has no neighbours until a chain splices it in, and its index
    /// is left for the chain to assign. Fails with [`CactusError::Invalid`]
    /// once every `u32` slot is live.
    pub fn create(
        &mut self,
        three_end: EndId,
        five_end: EndId,
        group: GroupId,
        chain: ChainId,
    ) -> Result<LinkId> {
        self.insert(Link::new(three_end, five_end, group, chain))
    }

    pub(crate) fn insert(&mut self, link: Link) -> Result<LinkId> {
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot as usize];
            debug_assert!(entry.link.is_none(), "free slot still occupied");
            entry.link = Some(link);
            self.live += 1;
            return Ok(LinkId {
                slot,
                generation: entry.generation,
            });
        }
        let slot = next_slot(self.slots.len())?;
        self.slots.push(Slot {
            generation: 0,
            link: Some(link),
        });
        self.live += 1;
        Ok(LinkId {
            slot,
            generation: 0,
        })
    }

    /// Returns the link behind `id`, or `None` if it has been destroyed.
    pub fn get(&self, id: LinkId) -> Option<&Link> {
        self.slots
            .get(id.slot as usize)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.link.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: LinkId) -> Option<&mut Link> {
        self.slots
            .get_mut(id.slot as usize)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.link.as_mut())
    }

    /// Returns the link behind `id` or [`CactusError::StaleLink`].
    pub fn link(&self, id: LinkId) -> Result<&Link> {
        self.get(id).ok_or(CactusError::StaleLink(id))
    }

    pub(crate) fn link_mut(&mut self, id: LinkId) -> Result<&mut Link> {
        self.get_mut(id).ok_or(CactusError::StaleLink(id))
    }

    /// Returns true while the link behind `id` is alive.
    pub fn contains(&self, id: LinkId) -> bool {
        self.get(id).is_some()
    }

    /// Reassigns the group of a live link.
    ///
    /// Group membership is not structural, so callers such as chain promotion
    /// may change it freely.
    pub fn set_group(&mut self, id: LinkId, group: GroupId) -> Result<()> {
        self.link_mut(id)?.set_group(group);
        Ok(())
    }

    /// Frees the slot behind `id` and returns its link as it was.
    pub(crate) fn release(&mut self, id: LinkId) -> Result<Link> {
        let entry = self
            .slots
            .get_mut(id.slot as usize)
            .filter(|entry| entry.generation == id.generation)
            .ok_or(CactusError::StaleLink(id))?;
        let link = entry.link.take().ok_or(CactusError::StaleLink(id))?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.slot);
        self.live -= 1;
        Ok(link)
    }

    /// Number of live links.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if no link is alive.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots ever allocated, live or free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Iterates over live links in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (LinkId, &Link)> + '_ {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| {
            entry.link.as_ref().map(|link| {
                (
                    LinkId {
                        slot: slot as u32,
                        generation: entry.generation,
                    },
                    link,
                )
            })
        })
    }
}

// `u32::MAX` is left unused so a slot index never wraps.
fn next_slot(allocated: usize) -> Result<u32> {
    u32::try_from(allocated)
        .ok()
        .filter(|slot| *slot < u32::MAX)
        .ok_or(CactusError::Invalid("link store exhausted u32 slot space"))
}
