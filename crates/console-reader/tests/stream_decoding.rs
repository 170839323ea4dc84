//! End-to-end decoding of node output through the public API.

use std::sync::Arc;

use chrono::Utc;
use console_reader::{
    BincodeBlockCodec, Block, BlockCodec, BlockHeader, BlockMeta, BlockReader, CacheError,
    ConsoleReader, ConsoleReaderConfig, CryptoHash, LineError, LinkageField,
    MockBlockMetaFetcher, NoFallbackFetcher, ReaderError, ReaderState,
};
use tokio::sync::mpsc;

fn hash(height: u64) -> CryptoHash {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&height.to_be_bytes());
    bytes[31] = 0xab;
    CryptoHash(bytes)
}

fn make_block(height: u64, prev: CryptoHash, prev_height: u64, lib: CryptoHash) -> Block {
    Block {
        author: format!("validator{}", height % 3),
        header: BlockHeader {
            height,
            hash: hash(height),
            prev_hash: prev,
            prev_height,
            last_final_block: lib,
            timestamp_nanosec: 1_650_000_000_000_000_000 + height * 1_000_000_000,
            ..Default::default()
        },
        chunks: vec![],
    }
}

fn current_line(block: &Block) -> String {
    let bytes = BincodeBlockCodec.encode(block).unwrap();
    format!(
        "FIRE BLOCK {} {} {} {} {} {} {} 0",
        block.header.height,
        hex::encode(block.header.hash.0),
        block.header.prev_height,
        hex::encode(block.header.prev_hash.0),
        hex::encode(block.header.last_final_block.0),
        block.header.timestamp_nanosec,
        hex::encode(bytes)
    )
}

fn legacy_line(block: &Block) -> String {
    let bytes = BincodeBlockCodec.encode(block).unwrap();
    format!(
        "FIRE BLOCK {} {} {} 0",
        block.header.height,
        hex::encode(block.header.hash.0),
        hex::encode(bytes)
    )
}

/// Chain starting at genesis, LIB trailing the head by two blocks.
fn chain(len: u64) -> Vec<Block> {
    (1..=len)
        .map(|height| {
            let (prev, prev_height) = if height == 1 {
                (CryptoHash::SENTINEL, 0)
            } else {
                (hash(height - 1), height - 1)
            };
            let lib = if height <= 2 {
                CryptoHash::SENTINEL
            } else {
                hash(height - 2)
            };
            make_block(height, prev, prev_height, lib)
        })
        .collect()
}

fn reader(
    config: &ConsoleReaderConfig,
    lines: Vec<String>,
    fetcher: Arc<MockBlockMetaFetcher>,
) -> ConsoleReader<BincodeBlockCodec> {
    let (tx, rx) = mpsc::channel(lines.len().max(1));
    for line in lines {
        tx.try_send(line).unwrap();
    }
    ConsoleReader::new(config, rx, BincodeBlockCodec, fetcher)
}

#[tokio::test]
async fn decodes_chain_in_order_with_resolved_heights() {
    let blocks = chain(10);
    let mut lines = vec!["INFO neard: starting".to_string()];
    for b in &blocks {
        lines.push(current_line(b));
        lines.push("INFO stats: #tick".to_string());
    }

    let fetcher = Arc::new(MockBlockMetaFetcher::default());
    let mut reader = reader(&ConsoleReaderConfig::for_testing(), lines, fetcher.clone());

    for expected in 1..=10u64 {
        let block = reader.read_block().await.unwrap().unwrap();
        assert_eq!(block.number(), expected);
        assert_eq!(block.header.prev_height, expected - 1);
        assert_eq!(block.header.last_final_block_height, expected.saturating_sub(2));
    }

    assert!(reader.read_block().await.unwrap().is_none());
    assert_eq!(reader.state(), ReaderState::Closed);
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(reader.skipped_lines(), 11);
}

#[tokio::test]
async fn first_streamable_block_for_sentinels() {
    let config = ConsoleReaderConfig {
        first_streamable_block: 9_820_210,
        ..ConsoleReaderConfig::for_testing()
    };
    let genesis_child = make_block(9_820_211, CryptoHash::SENTINEL, 0, CryptoHash::SENTINEL);

    let fetcher = Arc::new(MockBlockMetaFetcher::default());
    let mut reader = reader(&config, vec![current_line(&genesis_child)], fetcher.clone());

    let block = reader.read_block().await.unwrap().unwrap();
    assert_eq!(block.header.prev_height, 9_820_210);
    assert_eq!(block.header.last_final_block_height, 9_820_210);
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn legacy_lines_resolve_through_cache() {
    let blocks = chain(4);
    let lines = vec![
        current_line(&blocks[0]),
        current_line(&blocks[1]),
        legacy_line(&make_block(3, hash(2), 0, hash(1))),
        legacy_line(&make_block(4, hash(3), 0, hash(2))),
    ];

    let fetcher = Arc::new(MockBlockMetaFetcher::default());
    let mut reader = reader(&ConsoleReaderConfig::for_testing(), lines, fetcher.clone());

    reader.read_block().await.unwrap().unwrap();
    reader.read_block().await.unwrap().unwrap();

    let third = reader.read_block().await.unwrap().unwrap();
    assert_eq!(third.header.prev_height, 2);
    assert_eq!(third.header.last_final_block_height, 1);

    let fourth = reader.read_block().await.unwrap().unwrap();
    assert_eq!(fourth.header.prev_height, 3);
    assert_eq!(fourth.header.last_final_block_height, 2);
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn legacy_line_with_unknown_parent_fails_session() {
    let orphan = make_block(50, hash(49), 0, hash(48));
    let fetcher = Arc::new(MockBlockMetaFetcher::default());
    let mut reader = reader(
        &ConsoleReaderConfig::for_testing(),
        vec![legacy_line(&orphan), current_line(&chain(1)[0])],
        fetcher.clone(),
    );

    let err = reader.read_block().await.unwrap_err();
    match err {
        ReaderError::InvalidLine { source, line, .. } => {
            assert!(line.starts_with("BLOCK 50 "));
            assert_eq!(
                source,
                LineError::MetadataResolution {
                    role: "prev height",
                    source: CacheError::NotFound(hash(49).to_base58()),
                }
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(reader.state(), ReaderState::Failed);
    assert_eq!(reader.read_block().await, Err(ReaderError::SessionFailed));
}

#[tokio::test]
async fn fallback_fetch_resolves_old_lib_without_caching_it() {
    let old_lib = BlockMeta::new(hash(1_000).to_base58(), 1_000, Utc::now());
    let fetcher = Arc::new(MockBlockMetaFetcher::with_metas(vec![old_lib]));

    let head = make_block(5_000, hash(4_999), 4_999, hash(1_000));
    let mut reader = reader(
        &ConsoleReaderConfig::for_testing(),
        vec![current_line(&head)],
        fetcher.clone(),
    );

    let block = reader.read_block().await.unwrap().unwrap();
    assert_eq!(block.header.prev_height, 4_999);
    assert_eq!(block.header.last_final_block_height, 1_000);
    assert_eq!(fetcher.calls(), 1);

    let cache = reader.meta_cache();
    assert!(!cache.contains(&hash(1_000).to_base58()));
    assert!(cache.contains(&hash(5_000).to_base58()));
}

#[tokio::test]
async fn parent_hash_mismatch_is_linkage_error() {
    let mut block = make_block(7, hash(6), 6, CryptoHash::SENTINEL);
    let mut line = current_line(&block);
    // Payload claims a different parent than the line.
    block.header.prev_hash = hash(99);
    let bytes = BincodeBlockCodec.encode(&block).unwrap();
    let fields: Vec<&str> = line.split(' ').collect();
    let mut fields: Vec<String> = fields.into_iter().map(str::to_string).collect();
    fields[8] = hex::encode(bytes);
    line = fields.join(" ");

    let mut reader = reader(
        &ConsoleReaderConfig::for_testing(),
        vec![line],
        Arc::new(MockBlockMetaFetcher::default()),
    );

    match reader.read_block().await.unwrap_err() {
        ReaderError::InvalidLine { source, .. } => assert_eq!(
            source,
            LineError::LinkageValidation {
                field: LinkageField::ParentHash,
                expected: hash(6).to_base58(),
                actual: hash(99).to_base58(),
            }
        ),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn cache_stays_bounded_over_long_stream() {
    let config = ConsoleReaderConfig {
        meta_cache_capacity: 5,
        ..ConsoleReaderConfig::for_testing()
    };
    let lines: Vec<String> = chain(40).iter().map(current_line).collect();
    let mut reader = reader(&config, lines, Arc::new(MockBlockMetaFetcher::default()));

    while let Some(block) = reader.read_block().await.unwrap() {
        assert!(reader.meta_cache().len() <= 5);
        assert!(reader.meta_cache().contains(&block.id()));
    }

    let oldest = reader.meta_cache().peek_oldest().unwrap();
    assert_eq!(oldest.height, 36);
}

#[tokio::test]
async fn spawned_reader_decodes_byte_stream() {
    let mut output = String::from("booting\r\n");
    for b in chain(3) {
        output.push_str(&current_line(&b));
        output.push('\n');
    }

    let (mut reader, scanner) = ConsoleReader::spawn(
        std::io::Cursor::new(output.into_bytes()),
        &ConsoleReaderConfig::for_testing(),
        BincodeBlockCodec,
        Arc::new(NoFallbackFetcher),
    );

    let mut heights = Vec::new();
    while let Some(encoded) = reader.read_encoded_block().await.unwrap() {
        heights.push((encoded.number, encoded.parent_number, encoded.lib_number));
    }

    assert_eq!(heights, vec![(1, 0, 0), (2, 1, 0), (3, 2, 1)]);
    assert_eq!(scanner.await.unwrap().unwrap(), 4);
}
