use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use tracing::{debug, warn};

use crate::primitives::io::{IoSink, IoSource};
use crate::storage::{CodecOptions, Flower};
use crate::types::{CactusError, ChainId};

use crate::admin::disk::{load_flower_chains, write_flower, FlowerLoadSummary, FlowerWriteSummary};
use crate::admin::error::{AdminError, Result};

/// Writes `flower` to a file at `path`, creating parent directories.
pub fn write_flower_file(
    path: &Path,
    flower: &Flower,
    opts: &CodecOptions,
) -> Result<FlowerWriteSummary> {
    ensure_parent_dir(path)?;
    let file = File::create(path)?;
    let mut sink = IoSink::new(BufWriter::new(file));
    let summary = write_flower(flower, &mut sink, opts)?;
    let writer = sink.into_inner()?;
    writer.into_inner().map_err(|err| err.into_error())?.sync_all()?;
    Ok(summary)
}

/// Loads the chains stored at `path` into `flower`.
///
/// The file must hold exactly one flower; trailing bytes are rejected and
/// the chains loaded from the file are destroyed again.
pub fn load_flower_file(
    path: &Path,
    flower: &mut Flower,
    opts: &CodecOptions,
) -> Result<FlowerLoadSummary> {
    if !path.exists() {
        return Err(AdminError::missing_file(path));
    }
    let before: BTreeSet<ChainId> = flower.chains().map(|chain| chain.id()).collect();
    let mut source = IoSource::new(BufReader::new(File::open(path)?));
    let summary = load_flower_chains(flower, &mut source, opts)?;
    let consumed = source.bytes_read();
    let trailing = io::copy(&mut source.into_inner(), &mut io::sink())?;
    debug!(path = %path.display(), bytes = consumed, trailing, "flower.file.read");
    if trailing > 0 {
        let added: Vec<ChainId> = flower
            .chains()
            .map(|chain| chain.id())
            .filter(|id| !before.contains(id))
            .collect();
        for id in added {
            if let Err(err) = flower.destroy_chain(id) {
                warn!(chain = %id, error = %err, "flower.load.rollback_failed");
            }
        }
        return Err(CactusError::Format(format!(
            "{trailing} trailing bytes after flower file"
        ))
        .into());
    }
    Ok(summary)
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
