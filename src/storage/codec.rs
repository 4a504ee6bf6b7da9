use serde::Serialize;
use tracing::{debug, warn};

use crate::primitives::bytes::fixed;
use crate::primitives::io::{ByteSink, ByteSource};
use crate::types::{CactusError, EndId, GroupId, LinkId, Result, NULL_NAME};

use super::chain::{to_index, Chain};
use super::flower::Resolver;
use super::link::Link;
use super::options::CodecOptions;
use super::store::LinkStore;

/// Value written in the 3' End position to terminate a link stream.
pub const END_SENTINEL: u64 = NULL_NAME;

/// Encoded size of one link record.
pub const LINK_RECORD_LEN: usize = 8 + 8 + 8 + 4;

/// The persisted fields of one link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LinkRecord {
    /// 3' End identifier.
    pub three_end: EndId,
    /// 5' End identifier.
    pub five_end: EndId,
    /// Group identifier.
    pub group: GroupId,
    /// Position in the chain.
    pub link_index: i32,
}

impl LinkRecord {
    /// Captures the persisted fields of `link`.
    pub fn of(link: &Link) -> Self {
        Self {
            three_end: link.three_end(),
            five_end: link.five_end(),
            group: link.group(),
            link_index: link.link_index(),
        }
    }

    fn write_to<S: ByteSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        if self.three_end.is_null() || self.five_end.is_null() || self.group.is_null() {
            return Err(CactusError::Invalid(
                "link references the reserved end-of-chain identifier",
            ));
        }
        fixed::put_u64(sink, self.three_end.0)?;
        fixed::put_u64(sink, self.five_end.0)?;
        fixed::put_u64(sink, self.group.0)?;
        fixed::put_i32(sink, self.link_index)
    }
}

/// Encodes the link `head` and every successor, followed by the end-of-chain
/// sentinel. `None` writes an empty chain (the sentinel alone).
///
/// Returns the number of links written.
pub fn write_link_chain<S: ByteSink + ?Sized>(
    store: &LinkStore,
    head: Option<LinkId>,
    sink: &mut S,
    opts: &CodecOptions,
) -> Result<usize> {
    let mut cursor = head;
    let mut written = 0usize;
    while let Some(id) = cursor {
        let link = store.link(id)?;
        if written >= store.len() {
            return Err(CactusError::InvariantViolation(format!(
                "link chain from {id} revisits a link while encoding"
            )));
        }
        if opts.max_links.is_some_and(|max| written >= max) {
            return Err(CactusError::Invalid("chain exceeds configured max_links"));
        }
        LinkRecord::of(link).write_to(sink)?;
        written += 1;
        cursor = link.next();
    }
    fixed::put_u64(sink, END_SENTINEL)?;
    debug!(links = written, "chain.write.done");
    Ok(written)
}

/// Decodes link records up to and including the end-of-chain sentinel,
/// without resolving any identifier. Indices are returned as stored.
pub fn read_link_records<S: ByteSource + ?Sized>(
    source: &mut S,
    opts: &CodecOptions,
) -> Result<Vec<LinkRecord>> {
    let mut records = Vec::new();
    loop {
        let three_end = fixed::get_u64(source, "three end id")?;
        if three_end == END_SENTINEL {
            break;
        }
        if let Some(max) = opts.max_links {
            if records.len() >= max {
                return Err(CactusError::Format(format!(
                    "link stream exceeds {max} links"
                )));
            }
        }
        let five_end = fixed::get_u64(source, "five end id")?;
        let group = fixed::get_u64(source, "group id")?;
        let link_index = fixed::get_i32(source, "link index")?;
        to_index(records.len())
            .map_err(|_| CactusError::Format("link stream exceeds i32 index range".into()))?;
        records.push(LinkRecord {
            three_end: EndId(three_end),
            five_end: EndId(five_end),
            group: GroupId(group),
            link_index,
        });
    }
    Ok(records)
}

/// Decodes a link stream into the empty `chain`, resolving every End and
/// Group through `resolver`.
///
/// The whole stream is read and resolved before any link is created, so a
/// format or resolution failure leaves both `store` and `chain` untouched.
/// Decoded indices are kept as read. With `verify_after_load` set, a chain
/// whose indices do not run `0, 1, 2, …` fails [`Chain::check`]; its links
/// are destroyed again and the [`CactusError::InvariantViolation`] is
/// returned. Returns the head link, or `None` for an empty stream.
pub fn load_link_chain<S, R>(
    source: &mut S,
    store: &mut LinkStore,
    chain: &mut Chain,
    resolver: &R,
    opts: &CodecOptions,
) -> Result<Option<LinkId>>
where
    S: ByteSource + ?Sized,
    R: Resolver + ?Sized,
{
    if !chain.is_empty() {
        return Err(CactusError::Invalid("chain already holds links"));
    }
    let chain_id = chain.id();
    let records = read_link_records(source, opts).inspect_err(|err| {
        warn!(chain = %chain_id, error = %err, "chain.load.format");
    })?;
    for record in &records {
        resolve_record(resolver, record).inspect_err(|err| {
            warn!(chain = %chain_id, index = record.link_index, error = %err, "chain.load.resolve");
        })?;
    }

    for record in &records {
        let id = store.insert(Link::new(
            record.three_end,
            record.five_end,
            record.group,
            chain_id,
        ))?;
        chain.attach_back(store, id, record.link_index)?;
    }

    if opts.verify_after_load {
        if let Err(err) = chain.check(store) {
            let loaded = std::mem::replace(chain, Chain::new(chain_id));
            let released = loaded.destroy(store)?;
            warn!(chain = %chain_id, released, error = %err, "chain.load.rolled_back");
            return Err(err);
        }
    }
    debug!(chain = %chain_id, links = records.len(), "chain.load.done");
    Ok(chain.head())
}

fn resolve_record<R: Resolver + ?Sized>(resolver: &R, record: &LinkRecord) -> Result<()> {
    resolver.resolve_end(record.three_end)?;
    resolver.resolve_end(record.five_end)?;
    resolver.resolve_group(record.group)?;
    Ok(())
}
