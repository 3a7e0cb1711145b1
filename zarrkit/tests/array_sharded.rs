#![allow(missing_docs)]

use std::{error::Error, num::NonZeroU64, sync::Arc};

use zarrkit::array::{
    codec::{CodecError, CodecOptions, Crc32cCodec, ShardingCodecBuilder},
    Array, ArrayBuilder, ArrayError, ArrayShardedExt, ArraySubset, DataType,
};
use zarrkit::storage::{
    storage_adapter::performance_metrics::PerformanceMetricsStorageAdapter, store::MemoryStore,
    ReadableStorageTraits, StoreKey, WritableStorageTraits,
};

type MetricsStore = PerformanceMetricsStorageAdapter<MemoryStore>;

/// The encoded size of the default shard index of a shard with four inner chunks.
const INDEX_SIZE: usize = 4 * 16 + 4;

/// An 8x8 `uint16` array of 4x4 shards with 2x2 inner chunks, each protected by a `crc32c` checksum.
fn sharded_array(store: Arc<MetricsStore>) -> Result<Array<MetricsStore>, Box<dyn Error>> {
    Ok(ArrayBuilder::new(vec![8, 8], DataType::UInt16, vec![4, 4], 0u16)
        .array_to_bytes_codec(
            ShardingCodecBuilder::new(vec![NonZeroU64::new(2).unwrap(); 2])
                .bytes_to_bytes_codecs(vec![Crc32cCodec::new().into()])
                .build()
                .into(),
        )
        .build(store, "/sharded")?)
}

fn metrics_store() -> Arc<MetricsStore> {
    Arc::new(PerformanceMetricsStorageAdapter::new(Arc::new(
        MemoryStore::new(),
    )))
}

#[test]
fn array_sharded_partial_decode_matches_full_decode() -> Result<(), Box<dyn Error>> {
    let store = metrics_store();
    let array = sharded_array(store.clone())?;
    let elements: Vec<u16> = (0..64).collect();
    array.store_array_elements(&elements)?;

    let inner_chunk_grid = array.inner_chunk_grid();
    for inner_row in 0..4 {
        for inner_col in 0..4 {
            let inner_chunk_indices = [inner_row, inner_col];
            store.reset();
            let partial = array.retrieve_inner_chunk(&inner_chunk_indices)?;
            let partial_bytes_read = store.bytes_read();
            assert_eq!(store.byte_range_reads(), 2);

            let inner_chunk_subset = inner_chunk_grid.subset(&inner_chunk_indices)?;
            let shard_indices = array.chunk_grid().chunk_indices(inner_chunk_subset.start())?;
            let shard_origin = array.chunk_grid().chunk_origin(&shard_indices)?;
            store.reset();
            let shard = array.retrieve_chunk(&shard_indices)?;
            let full_bytes_read = store.bytes_read();
            let expected = inner_chunk_subset
                .relative_to(&shard_origin)?
                .extract_bytes(&shard, &[4, 4], 2)?;

            assert_eq!(partial, expected, "{inner_chunk_indices:?}");
            assert_eq!(partial_bytes_read, INDEX_SIZE + 8 + 4);
            assert_eq!(full_bytes_read, INDEX_SIZE + 4 * (8 + 4));
        }
    }
    Ok(())
}

#[test]
fn array_sharded_untouched_inner_chunks_survive_rewrite() -> Result<(), Box<dyn Error>> {
    let store = metrics_store();
    let array = sharded_array(store.clone())?;
    let elements: Vec<u16> = (0..64).collect();
    array.store_array_elements(&elements)?;

    let before: Vec<Vec<u16>> = (0..16)
        .map(|i| array.retrieve_inner_chunk_elements::<u16>(&[i / 4, i % 4]))
        .collect::<Result<_, _>>()?;

    // Overwrite inner chunk [2, 1] of shard [1, 0]
    store.reset();
    array.store_array_subset_elements::<u16>(
        &ArraySubset::new_with_ranges(&[4..6, 2..4]),
        &[100, 101, 102, 103],
    )?;
    assert_eq!(store.reads(), 1);
    assert_eq!(store.writes(), 1);

    for i in 0..16 {
        let inner_chunk_indices = [i / 4, i % 4];
        let after = array.retrieve_inner_chunk_elements::<u16>(&inner_chunk_indices)?;
        if inner_chunk_indices == [2, 1] {
            assert_eq!(after, vec![100, 101, 102, 103]);
        } else {
            assert_eq!(after, before[i as usize], "{inner_chunk_indices:?}");
        }
    }
    Ok(())
}

#[test]
fn array_sharded_unwritten_inner_chunks_are_fill_value() -> Result<(), Box<dyn Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![4, 4], DataType::Int32, vec![4, 4], -1i32)
        .array_to_bytes_codec(
            ShardingCodecBuilder::new(vec![NonZeroU64::new(2).unwrap(); 2])
                .build()
                .into(),
        )
        .build(store.clone(), "/")?;

    testing_logger::setup();
    assert_eq!(array.retrieve_inner_chunk_elements::<i32>(&[1, 1])?, vec![-1; 4]);

    array.store_array_subset_elements::<i32>(
        &ArraySubset::new_with_ranges(&[2..4, 0..2]),
        &[1, 2, 3, 4],
    )?;
    // The index and the one written inner chunk
    let shard = store.get(&StoreKey::new("c/0/0")?)?.ok_or("shard is absent")?;
    assert_eq!(shard.len(), INDEX_SIZE + 16);

    assert_eq!(array.retrieve_inner_chunk_elements::<i32>(&[1, 0])?, vec![1, 2, 3, 4]);
    assert_eq!(array.retrieve_inner_chunk_elements::<i32>(&[0, 0])?, vec![-1; 4]);
    assert_eq!(array.retrieve_inner_chunk_elements::<i32>(&[0, 1])?, vec![-1; 4]);
    assert_eq!(array.retrieve_inner_chunk_elements::<i32>(&[1, 1])?, vec![-1; 4]);
    assert_eq!(
        array.retrieve_array_elements::<i32>()?,
        vec![-1, -1, -1, -1, -1, -1, -1, -1, 1, 2, -1, -1, 3, 4, -1, -1]
    );

    testing_logger::validate(|captured_logs| {
        assert!(captured_logs.iter().any(|log| log.level == log::Level::Trace
            && log.body.contains("is absent from the shard")));
    });
    Ok(())
}

#[test]
fn array_sharded_corrupt_inner_chunk() -> Result<(), Box<dyn Error>> {
    let store = metrics_store();
    let array = sharded_array(store.clone())?;
    let elements: Vec<u16> = (0..64).collect();
    array.store_array_elements(&elements)?;

    // Locate the first inner chunk of shard [0, 0] from the index at the end of the shard
    let key = StoreKey::new("sharded/c/0/0")?;
    let mut shard = store.get(&key)?.ok_or("shard is absent")?.to_vec();
    let index_start = shard.len() - INDEX_SIZE;
    let offset = u64::from_le_bytes(shard[index_start..index_start + 8].try_into()?);
    shard[usize::try_from(offset)?] ^= 0xff;
    store.set(&key, shard.into())?;

    assert!(matches!(
        array.retrieve_inner_chunk(&[0, 0]),
        Err(ArrayError::CodecError(CodecError::InvalidChecksum))
    ));
    assert!(matches!(
        array.retrieve_chunk(&[0, 0]),
        Err(ArrayError::CodecError(CodecError::InvalidChecksum))
    ));

    // Sibling inner chunks decode independently
    assert_eq!(array.retrieve_inner_chunk_elements::<u16>(&[0, 1])?, vec![2, 3, 10, 11]);
    assert_eq!(array.retrieve_inner_chunk_elements::<u16>(&[1, 0])?, vec![16, 17, 24, 25]);
    assert_eq!(array.retrieve_inner_chunk_elements::<u16>(&[1, 1])?, vec![18, 19, 26, 27]);

    // Without validation the checksum is stripped but not verified
    let options = CodecOptions::default().with_validate_checksums(false);
    assert!(array.retrieve_inner_chunk_opt(&[0, 0], &options).is_ok());
    Ok(())
}

#[test]
fn array_sharded_corrupt_index() -> Result<(), Box<dyn Error>> {
    let store = metrics_store();
    let array = sharded_array(store.clone())?;
    let elements: Vec<u16> = (0..64).collect();
    array.store_array_elements(&elements)?;

    // Flip a bit of the index checksum
    let key = StoreKey::new("sharded/c/1/1")?;
    let mut shard = store.get(&key)?.ok_or("shard is absent")?.to_vec();
    let last = shard.len() - 1;
    shard[last] ^= 0x01;
    store.set(&key, shard.into())?;

    assert!(matches!(
        array.retrieve_inner_chunk(&[3, 3]),
        Err(ArrayError::CodecError(CodecError::InvalidChecksum))
    ));
    assert!(array
        .retrieve_array_subset(&ArraySubset::new_with_ranges(&[3..5, 3..5]))
        .is_err());

    // Other shards are unaffected
    assert_eq!(array.retrieve_inner_chunk_elements::<u16>(&[0, 0])?, vec![0, 1, 8, 9]);

    let options = CodecOptions::default().with_validate_checksums(false);
    assert_eq!(
        array.retrieve_inner_chunk_elements_opt::<u16>(&[3, 3], &options)?,
        vec![54, 55, 62, 63]
    );
    Ok(())
}
