#![allow(missing_docs)]

use cactus_link::storage::{destroy_cascade, Catalog};
use cactus_link::{CactusError, Chain, ChainId, EndId, GroupId, LinkStore, Result};

fn catalog() -> Result<Catalog> {
    let mut catalog = Catalog::default();
    catalog.add_group(GroupId(1))?;
    for end in 1..=12 {
        catalog.add_end(EndId(end), GroupId(1))?;
    }
    Ok(catalog)
}

fn chain_of(
    store: &mut LinkStore,
    catalog: &Catalog,
    id: u64,
    ends: &[(u64, u64)],
) -> Result<Chain> {
    let mut chain = Chain::new(ChainId(id));
    for (three, five) in ends {
        chain.push_link(store, catalog, EndId(*three), EndId(*five))?;
    }
    Ok(chain)
}

#[test]
fn destroying_the_middle_link_takes_its_tail() -> Result<()> {
    let catalog = catalog()?;
    let mut store = LinkStore::new();
    let chain = chain_of(&mut store, &catalog, 1, &[(1, 2), (3, 4), (5, 6)])?;
    let first = chain.link_at(&store, 0).expect("first");
    let middle = chain.link_at(&store, 1).expect("middle");
    let last = chain.link_at(&store, 2).expect("last");

    assert_eq!(destroy_cascade(&mut store, middle)?, 2);
    assert!(store.contains(first));
    assert!(!store.contains(middle));
    assert!(!store.contains(last));
    assert_eq!(store.len(), 1);

    // The predecessor is not re-terminated.
    assert_eq!(store.link(first)?.next(), Some(middle));
    assert!(matches!(
        store.link(middle),
        Err(CactusError::StaleLink(id)) if id == middle
    ));
    assert!(matches!(
        chain.check(&store),
        Err(CactusError::InvariantViolation(_))
    ));
    Ok(())
}

#[test]
fn destroying_the_head_releases_every_link() -> Result<()> {
    let catalog = catalog()?;
    let mut store = LinkStore::new();
    let chain = chain_of(
        &mut store,
        &catalog,
        1,
        &[(1, 2), (3, 4), (5, 6), (7, 8)],
    )?;
    let ids: Vec<_> = chain.iter(&store).map(|(id, _)| id).collect();
    let head = chain.head().expect("head");

    assert_eq!(destroy_cascade(&mut store, head)?, 4);
    assert!(store.is_empty());
    assert!(ids.iter().all(|id| !store.contains(*id)));

    assert!(matches!(
        destroy_cascade(&mut store, head),
        Err(CactusError::StaleLink(_))
    ));
    Ok(())
}

#[test]
fn sibling_chain_is_unaffected() -> Result<()> {
    let catalog = catalog()?;
    let mut store = LinkStore::new();
    let doomed = chain_of(&mut store, &catalog, 1, &[(1, 2), (3, 4), (5, 6)])?;
    let sibling = chain_of(&mut store, &catalog, 2, &[(7, 8), (9, 10), (11, 12)])?;

    let head = doomed.head().expect("head");
    assert_eq!(destroy_cascade(&mut store, head)?, 3);
    assert_eq!(store.len(), 3);
    sibling.check(&store)?;
    let indices: Vec<i32> = sibling
        .iter(&store)
        .map(|(_, link)| link.link_index())
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);
    Ok(())
}

#[test]
fn released_slots_are_reused_under_a_new_generation() -> Result<()> {
    let catalog = catalog()?;
    let mut store = LinkStore::new();
    let chain = chain_of(&mut store, &catalog, 1, &[(1, 2)])?;
    let old = chain.head().expect("head");
    destroy_cascade(&mut store, old)?;

    let fresh = store.create(EndId(3), EndId(4), GroupId(1), ChainId(1))?;
    assert_eq!(fresh.slot(), old.slot());
    assert_ne!(fresh.generation(), old.generation());
    assert!(store.get(old).is_none());
    assert_eq!(store.link(fresh)?.three_end(), EndId(3));
    Ok(())
}

#[test]
fn truncate_detaches_before_destroying() -> Result<()> {
    let catalog = catalog()?;
    let mut store = LinkStore::new();
    let mut chain = chain_of(&mut store, &catalog, 1, &[(1, 2), (3, 4), (5, 6)])?;
    let first = chain.head().expect("head");
    let middle = chain.link_at(&store, 1).expect("middle");

    assert_eq!(chain.truncate(&mut store, middle)?, 2);
    assert_eq!(chain.len(), 1);
    assert_eq!(chain.tail(), Some(first));
    assert_eq!(store.link(first)?.next(), None);
    chain.check(&store)?;
    Ok(())
}
