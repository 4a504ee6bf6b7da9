#![allow(missing_docs)]

use bytes::{Bytes, BytesMut};
use cactus_link::primitives::io::SliceSource;
use cactus_link::storage::{
    load_link_chain, write_link_chain, Catalog, END_SENTINEL, LINK_RECORD_LEN,
};
use cactus_link::types::EntityKind;
use cactus_link::{
    CactusError, Chain, ChainId, CodecOptions, EndId, Flower, FlowerName, GroupId, LinkStore,
    Result,
};

fn catalog() -> Result<Catalog> {
    let mut catalog = Catalog::default();
    catalog.add_group(GroupId(10))?;
    for end in 1..=6 {
        catalog.add_end(EndId(end), GroupId(10))?;
    }
    Ok(catalog)
}

fn three_link_chain(store: &mut LinkStore, catalog: &Catalog) -> Result<Chain> {
    let mut chain = Chain::new(ChainId(1));
    chain.push_link(store, catalog, EndId(1), EndId(2))?;
    chain.push_link(store, catalog, EndId(3), EndId(4))?;
    chain.push_link(store, catalog, EndId(5), EndId(6))?;
    Ok(chain)
}

#[test]
fn three_link_chain_survives_encode_and_decode() -> Result<()> {
    let catalog = catalog()?;
    let mut store = LinkStore::new();
    let chain = three_link_chain(&mut store, &catalog)?;

    let mut buf = BytesMut::new();
    let written = write_link_chain(&store, chain.head(), &mut buf, &CodecOptions::default())?;
    assert_eq!(written, 3);
    assert_eq!(buf.len(), 3 * LINK_RECORD_LEN + 8);
    assert_eq!(&buf[buf.len() - 8..], &END_SENTINEL.to_le_bytes());

    let mut target = LinkStore::new();
    let mut decoded = Chain::new(ChainId(2));
    let mut source = buf.freeze();
    let head = load_link_chain(
        &mut source,
        &mut target,
        &mut decoded,
        &catalog,
        &CodecOptions::default(),
    )?
    .expect("non-empty chain");

    let first = target.link(head)?;
    assert_eq!(first.link_index(), 0);
    assert!(first.is_head());
    let second_id = first.next().expect("second link");
    let second = target.link(second_id)?;
    assert_eq!(second.link_index(), 1);
    assert_eq!(second.prev(), Some(head));
    let third_id = second.next().expect("third link");
    let third = target.link(third_id)?;
    assert_eq!(third.link_index(), 2);
    assert_eq!(third.next(), None);
    assert_eq!(decoded.tail(), Some(third_id));

    let pairs: Vec<(EndId, EndId, GroupId)> = decoded
        .iter(&target)
        .map(|(_, link)| (link.three_end(), link.five_end(), link.group()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (EndId(1), EndId(2), GroupId(10)),
            (EndId(3), EndId(4), GroupId(10)),
            (EndId(5), EndId(6), GroupId(10)),
        ]
    );
    assert!(decoded.iter(&target).all(|(_, link)| link.chain() == ChainId(2)));
    decoded.check(&target)?;
    Ok(())
}

#[test]
fn unresolved_end_leaves_no_partial_chain() -> Result<()> {
    let catalog = catalog()?;
    let mut store = LinkStore::new();
    let chain = three_link_chain(&mut store, &catalog)?;
    let mut buf = Vec::new();
    write_link_chain(&store, chain.head(), &mut buf, &CodecOptions::default())?;

    // A context that lacks End 5.
    let mut partial = Catalog::default();
    partial.add_group(GroupId(10))?;
    for end in 1..=4 {
        partial.add_end(EndId(end), GroupId(10))?;
    }
    partial.add_end(EndId(6), GroupId(10))?;

    let mut target = LinkStore::new();
    let mut decoded = Chain::new(ChainId(2));
    let err = load_link_chain(
        &mut SliceSource::new(&buf),
        &mut target,
        &mut decoded,
        &partial,
        &CodecOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CactusError::Resolution {
            kind: EntityKind::End,
            id: 5
        }
    ));
    assert!(target.is_empty());
    assert!(decoded.is_empty());
    assert_eq!(decoded.head(), None);
    Ok(())
}

#[test]
fn flower_load_failure_does_not_create_the_chain() -> Result<()> {
    let mut source = Flower::new(FlowerName(1));
    source.add_group(GroupId(10))?;
    source.add_end(EndId(1), GroupId(10))?;
    source.add_end(EndId(2), GroupId(10))?;
    source.create_chain(ChainId(7))?;
    source.push_link(ChainId(7), EndId(1), EndId(2))?;
    let mut buf = BytesMut::new();
    source.write_chain(ChainId(7), &mut buf, &CodecOptions::default())?;

    let mut target = Flower::new(FlowerName(1));
    target.add_group(GroupId(11))?;
    target.add_end(EndId(1), GroupId(11))?;
    target.add_end(EndId(2), GroupId(11))?;
    let mut bytes: Bytes = buf.freeze();
    let err = target
        .load_chain(ChainId(7), &mut bytes, &CodecOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        CactusError::Resolution {
            kind: EntityKind::Group,
            id: 10
        }
    ));
    assert!(target.chain(ChainId(7)).is_err());
    assert!(target.links().is_empty());
    Ok(())
}

#[test]
fn empty_chain_is_a_lone_sentinel() -> Result<()> {
    let catalog = catalog()?;
    let store = LinkStore::new();
    let mut buf = Vec::new();
    assert_eq!(
        write_link_chain(&store, None, &mut buf, &CodecOptions::default())?,
        0
    );
    assert_eq!(buf, END_SENTINEL.to_le_bytes());

    let mut target = LinkStore::new();
    let mut decoded = Chain::new(ChainId(3));
    let head = load_link_chain(
        &mut SliceSource::new(&buf),
        &mut target,
        &mut decoded,
        &catalog,
        &CodecOptions::default(),
    )?;
    assert_eq!(head, None);
    assert!(decoded.is_empty());
    Ok(())
}

#[test]
fn truncated_stream_is_a_format_error() -> Result<()> {
    let catalog = catalog()?;
    let mut store = LinkStore::new();
    let chain = three_link_chain(&mut store, &catalog)?;
    let mut buf = Vec::new();
    write_link_chain(&store, chain.head(), &mut buf, &CodecOptions::default())?;
    buf.truncate(LINK_RECORD_LEN + 10);

    let mut target = LinkStore::new();
    let mut decoded = Chain::new(ChainId(2));
    let err = load_link_chain(
        &mut SliceSource::new(&buf),
        &mut target,
        &mut decoded,
        &catalog,
        &CodecOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CactusError::Format(_)));
    assert!(target.is_empty());
    Ok(())
}
