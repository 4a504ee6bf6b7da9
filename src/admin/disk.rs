//! Whole-flower persistence: every chain of a flower in one framed stream.
//!
//! ```text
//! FlowerFile := Magic("CLNKFLWR") Version(u16) Flags(u16) FlowerName(u64)
//!               ChainCount(u32) { ChainId(u64) LinkStream }* [Crc32(u32)]
//! ```
//!
//! Loading is all-or-nothing: if any chain fails to decode or resolve, or
//! the checksum does not match, chains already loaded from the file are
//! destroyed again before the error is returned.

use serde::Serialize;
use tracing::{info, warn};

use crate::primitives::bytes::fixed;
use crate::primitives::io::{ByteSink, ByteSource, SliceSource};
use crate::storage::{read_link_records, CodecOptions, Flower, LinkRecord};
use crate::types::checksum::{ChecksumSink, ChecksumSource};
use crate::types::{CactusError, ChainId, EntityKind, FlowerName, Result};

/// Leading bytes of every flower file.
pub const FLOWER_FILE_MAGIC: [u8; 8] = *b"CLNKFLWR";
/// Current flower file version.
pub const FLOWER_FILE_VERSION: u16 = 1;

const FLAG_CHECKSUM: u16 = 0x0001;
const KNOWN_FLAGS: u16 = FLAG_CHECKSUM;
// Chain id plus the bare end-of-chain sentinel.
const MIN_CHAIN_ENTRY_LEN: usize = 8 + 8;

/// Decoded flower file header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FlowerFileHeader {
    /// Format version.
    pub version: u16,
    /// Whether a CRC32 footer follows the last chain.
    pub checksum: bool,
    /// Flower the chains belong to.
    pub flower: FlowerName,
    /// Number of chains in the file.
    pub chain_count: u32,
}

impl FlowerFileHeader {
    fn write_to<S: ByteSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        sink.write_bytes(&FLOWER_FILE_MAGIC)?;
        fixed::put_u16(sink, self.version)?;
        fixed::put_u16(sink, if self.checksum { FLAG_CHECKSUM } else { 0 })?;
        fixed::put_u64(sink, self.flower.0)?;
        fixed::put_u32(sink, self.chain_count)
    }

    fn read_from<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self> {
        let mut magic = [0u8; 8];
        source
            .read_bytes(&mut magic)
            .map_err(|err| err.in_field("magic"))?;
        if magic != FLOWER_FILE_MAGIC {
            return Err(CactusError::Format(format!(
                "bad magic {}",
                hex::encode(magic)
            )));
        }
        let version = fixed::get_u16(source, "version")?;
        if version != FLOWER_FILE_VERSION {
            return Err(CactusError::Format(format!(
                "unsupported flower file version {version}"
            )));
        }
        let flags = fixed::get_u16(source, "flags")?;
        if flags & !KNOWN_FLAGS != 0 {
            return Err(CactusError::Format(format!("unknown flags 0x{flags:04X}")));
        }
        let flower = FlowerName(fixed::get_u64(source, "flower name")?);
        let chain_count = fixed::get_u32(source, "chain count")?;
        Ok(Self {
            version,
            checksum: flags & FLAG_CHECKSUM != 0,
            flower,
            chain_count,
        })
    }
}

/// Outcome of writing a flower.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FlowerWriteSummary {
    /// Chains written.
    pub chains: usize,
    /// Links written across all chains.
    pub links: usize,
    /// CRC32 footer, when enabled.
    pub checksum: Option<u32>,
}

/// Outcome of loading a flower.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FlowerLoadSummary {
    /// Chains created.
    pub chains: usize,
    /// Links created across all chains.
    pub links: usize,
    /// Verified CRC32 footer, when present.
    pub checksum: Option<u32>,
}

/// Writes every chain of `flower`, in ascending chain id order.
pub fn write_flower<S: ByteSink + ?Sized>(
    flower: &Flower,
    sink: &mut S,
    opts: &CodecOptions,
) -> Result<FlowerWriteSummary> {
    let chain_count = u32::try_from(flower.chain_count())
        .map_err(|_| CactusError::Invalid("flower holds more than u32::MAX chains"))?;
    let header = FlowerFileHeader {
        version: FLOWER_FILE_VERSION,
        checksum: opts.checksum,
        flower: flower.name(),
        chain_count,
    };
    let mut summed = ChecksumSink::new(sink);
    header.write_to(&mut summed)?;
    let mut summary = FlowerWriteSummary::default();
    for chain in flower.chains() {
        fixed::put_u64(&mut summed, chain.id().0)?;
        summary.links += flower.write_chain(chain.id(), &mut summed, opts)?;
        summary.chains += 1;
    }
    let checksum = summed.checksum();
    if opts.checksum {
        fixed::put_u32(summed.into_inner(), checksum)?;
        summary.checksum = Some(checksum);
    }
    info!(
        flower = %flower.name(),
        chains = summary.chains,
        links = summary.links,
        "flower.write.done"
    );
    Ok(summary)
}

/// Loads every chain stored in `source` into `flower`, whose Ends and Groups
/// must already be present.
///
/// Any failure rolls back the chains loaded so far; the flower is left as it
/// was before the call.
pub fn load_flower_chains<S: ByteSource + ?Sized>(
    flower: &mut Flower,
    source: &mut S,
    opts: &CodecOptions,
) -> Result<FlowerLoadSummary> {
    let mut loaded = Vec::new();
    match load_into(flower, source, opts, &mut loaded) {
        Ok(summary) => {
            info!(
                flower = %flower.name(),
                chains = summary.chains,
                links = summary.links,
                "flower.load.done"
            );
            Ok(summary)
        }
        Err(err) => {
            for id in loaded.into_iter().rev() {
                if let Err(cleanup) = flower.destroy_chain(id) {
                    warn!(chain = %id, error = %cleanup, "flower.load.rollback_failed");
                }
            }
            warn!(flower = %flower.name(), error = %err, "flower.load.aborted");
            Err(err)
        }
    }
}

fn load_into<S: ByteSource + ?Sized>(
    flower: &mut Flower,
    source: &mut S,
    opts: &CodecOptions,
    loaded: &mut Vec<ChainId>,
) -> Result<FlowerLoadSummary> {
    let mut summed = ChecksumSource::new(source);
    let header = FlowerFileHeader::read_from(&mut summed)?;
    if header.flower != flower.name() {
        return Err(CactusError::unresolved(
            EntityKind::Flower,
            header.flower.0,
        ));
    }
    let mut links = 0;
    for _ in 0..header.chain_count {
        let id = ChainId(fixed::get_u64(&mut summed, "chain id")?);
        flower.load_chain(id, &mut summed, opts)?;
        loaded.push(id);
        links += flower.chain(id)?.len();
    }
    let computed = summed.checksum();
    let checksum = if header.checksum {
        let stored = fixed::get_u32(summed.into_inner(), "checksum")?;
        if stored != computed {
            return Err(CactusError::Format(format!(
                "checksum mismatch (stored {stored:#010x}, computed {computed:#010x})"
            )));
        }
        Some(stored)
    } else {
        None
    };
    Ok(FlowerLoadSummary {
        chains: loaded.len(),
        links,
        checksum,
    })
}

/// Raw records of one chain in a flower file.
#[derive(Clone, Debug, Serialize)]
pub struct ChainDump {
    /// Chain identifier.
    pub id: ChainId,
    /// Link records in stream order.
    pub links: Vec<LinkRecord>,
}

/// Contents of a flower file decoded without resolving any identifier.
#[derive(Clone, Debug, Serialize)]
pub struct FlowerFileDump {
    /// File header.
    pub header: FlowerFileHeader,
    /// Chains in file order.
    pub chains: Vec<ChainDump>,
    /// Stored footer, when present.
    pub checksum: Option<u32>,
    /// Whether the stored footer matches the content.
    pub checksum_ok: Option<bool>,
}

/// Decodes a flower file for inspection. Identifiers are reported as stored.
pub fn inspect_flower_bytes(bytes: &[u8], opts: &CodecOptions) -> Result<FlowerFileDump> {
    let mut source = SliceSource::new(bytes);
    let mut summed = ChecksumSource::new(&mut source);
    let header = FlowerFileHeader::read_from(&mut summed)?;
    let claimed = usize::try_from(header.chain_count).unwrap_or(usize::MAX);
    let mut chains = Vec::with_capacity(claimed.min(bytes.len() / MIN_CHAIN_ENTRY_LEN));
    for _ in 0..header.chain_count {
        let id = ChainId(fixed::get_u64(&mut summed, "chain id")?);
        let links = read_link_records(&mut summed, opts)?;
        chains.push(ChainDump { id, links });
    }
    let computed = summed.checksum();
    let (checksum, checksum_ok) = if header.checksum {
        let stored = fixed::get_u32(summed.into_inner(), "checksum")?;
        (Some(stored), Some(stored == computed))
    } else {
        (None, None)
    };
    if !source.is_exhausted() {
        return Err(CactusError::Format(format!(
            "{} trailing bytes after flower file",
            source.remaining().len()
        )));
    }
    Ok(FlowerFileDump {
        header,
        chains,
        checksum,
        checksum_ok,
    })
}
