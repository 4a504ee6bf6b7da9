#![allow(missing_docs)]

use std::fs;

use cactus_link::admin::{
    inspect_flower_bytes, load_flower_file, verify_file, write_flower_file, AdminError,
    FlowerContext, FLOWER_FILE_MAGIC,
};
use cactus_link::{CactusError, ChainId, CodecOptions, EndId, Flower};
use tempfile::TempDir;

const CONTEXT: &str = r#"{
    "name": 42,
    "groups": [1, 2],
    "ends": [
        { "id": 1, "group": 1 }, { "id": 2, "group": 1 },
        { "id": 3, "group": 1 }, { "id": 4, "group": 1 },
        { "id": 5, "group": 2 }, { "id": 6, "group": 2 }
    ],
    "chains": [
        { "id": 100, "links": [[1, 2], [3, 4]] },
        { "id": 200, "links": [[5, 6]] },
        { "id": 300, "links": [] }
    ]
}"#;

fn context() -> FlowerContext {
    FlowerContext::from_json(CONTEXT).expect("context")
}

fn write_sample(dir: &TempDir, opts: &CodecOptions) -> std::path::PathBuf {
    let path = dir.path().join("sample.clf");
    let flower = context().build().expect("build flower");
    write_flower_file(&path, &flower, opts).expect("write flower");
    path
}

fn chain_pairs(flower: &Flower, id: u64) -> Vec<(EndId, EndId)> {
    let chain = flower.chain(ChainId(id)).expect("chain");
    chain
        .iter(flower.links())
        .map(|(_, link)| (link.three_end(), link.five_end()))
        .collect()
}

#[test]
fn flower_file_roundtrip_restores_every_chain() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_sample(&dir, &CodecOptions::default());

    let mut flower = context().empty_flower().expect("empty flower");
    let summary = load_flower_file(&path, &mut flower, &CodecOptions::default()).expect("load");
    assert_eq!(summary.chains, 3);
    assert_eq!(summary.links, 3);
    assert!(summary.checksum.is_some());

    assert_eq!(
        chain_pairs(&flower, 100),
        vec![(EndId(1), EndId(2)), (EndId(3), EndId(4))]
    );
    assert_eq!(chain_pairs(&flower, 200), vec![(EndId(5), EndId(6))]);
    assert!(flower.chain(ChainId(300)).expect("empty chain").is_empty());
    flower.check().expect("invariants");
}

#[test]
fn corrupt_checksum_rolls_back_all_chains() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_sample(&dir, &CodecOptions::default());
    let mut bytes = fs::read(&path).expect("read");
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&path, &bytes).expect("rewrite");

    let mut flower = context().empty_flower().expect("empty flower");
    let err = load_flower_file(&path, &mut flower, &CodecOptions::default()).unwrap_err();
    assert!(matches!(err, AdminError::Core(CactusError::Format(ref msg)) if msg.contains("checksum")));
    assert_eq!(flower.chain_count(), 0);
    assert!(flower.links().is_empty());
}

#[test]
fn wrong_context_rolls_back_and_verify_reports_it() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_sample(&dir, &CodecOptions::default());

    // Same flower name, but End 6 is missing.
    let narrow = FlowerContext::from_json(
        r#"{ "name": 42, "groups": [1, 2],
             "ends": [{ "id": 1, "group": 1 }, { "id": 2, "group": 1 },
                      { "id": 3, "group": 1 }, { "id": 4, "group": 1 },
                      { "id": 5, "group": 2 }] }"#,
    )
    .expect("context");
    let mut flower = narrow.empty_flower().expect("empty flower");
    let err = load_flower_file(&path, &mut flower, &CodecOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        AdminError::Core(CactusError::Resolution { id: 6, .. })
    ));
    assert_eq!(flower.chain_count(), 0);
    assert!(flower.links().is_empty());

    let report = verify_file(&path, &narrow, &CodecOptions::default()).expect("verify");
    assert!(!report.success);
    assert_eq!(report.counts.chains, 0);

    let report = verify_file(&path, &context(), &CodecOptions::default()).expect("verify");
    assert!(report.success, "{:?}", report.findings);
    assert_eq!(report.counts.chains, 3);
    assert_eq!(report.counts.links, 3);
}

#[test]
fn inspect_reports_raw_records_without_resolution() {
    let dir = TempDir::new().expect("tempdir");
    let opts = CodecOptions::default().checksum(false);
    let path = write_sample(&dir, &opts);
    let bytes = fs::read(&path).expect("read");
    assert_eq!(&bytes[..8], &FLOWER_FILE_MAGIC);

    let dump = inspect_flower_bytes(&bytes, &opts).expect("inspect");
    assert_eq!(dump.header.chain_count, 3);
    assert!(!dump.header.checksum);
    assert_eq!(dump.checksum, None);
    let ids: Vec<u64> = dump.chains.iter().map(|chain| chain.id.0).collect();
    assert_eq!(ids, vec![100, 200, 300]);
    let indices: Vec<i32> = dump.chains[0]
        .links
        .iter()
        .map(|record| record.link_index)
        .collect();
    assert_eq!(indices, vec![0, 1]);

    let json = serde_json::to_value(&dump).expect("serialize");
    assert_eq!(json["chains"][1]["links"][0]["three_end"], 5);
}

#[test]
fn max_links_rejects_long_chains_on_load() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_sample(&dir, &CodecOptions::default());
    let mut flower = context().empty_flower().expect("empty flower");
    let err = load_flower_file(&path, &mut flower, &CodecOptions::default().max_links(1))
        .unwrap_err();
    assert!(matches!(err, AdminError::Core(CactusError::Format(_))));
    assert_eq!(flower.chain_count(), 0);
}
