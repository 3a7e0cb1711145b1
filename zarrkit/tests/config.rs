#![allow(missing_docs)]

use std::{error::Error, num::NonZeroU64, sync::Arc};

use serial_test::serial;
use zarrkit::array::{
    codec::{CodecOptions, Crc32cCodec, ShardingCodecBuilder},
    ArrayBuilder, DataType,
};
use zarrkit::config::{global_config, global_config_mut};
use zarrkit::storage::{
    store::MemoryStore, ListableStorageTraits, ReadableStorageTraits, StoreKey,
    WritableStorageTraits,
};

#[test]
#[serial]
fn config_defaults() {
    {
        let config = global_config();
        assert!(config.validate_checksums());
        assert!(!config.store_empty_chunks());
        assert_eq!(config.codec_concurrent_target(), 1);
    }

    let options = CodecOptions::default();
    assert!(options.validate_checksums());
    assert!(!options.store_empty_chunks());
    assert_eq!(options.concurrent_target(), 1);
}

#[test]
#[serial]
fn config_store_empty_chunks() -> Result<(), Box<dyn Error>> {
    let builder = ArrayBuilder::new(vec![4, 4], DataType::UInt8, vec![2, 2], 0u8);

    let store = Arc::new(MemoryStore::new());
    let array = builder.build(store.clone(), "/")?;
    array.store_array_elements(&[0u8; 16])?;
    assert!(store.list()?.is_empty());

    global_config_mut().set_store_empty_chunks(true);
    let store = Arc::new(MemoryStore::new());
    let array = builder.build(store.clone(), "/")?;
    let result = array.store_array_elements(&[0u8; 16]);
    global_config_mut().set_store_empty_chunks(false);
    result?;
    assert_eq!(store.list()?.len(), 4);
    Ok(())
}

#[test]
#[serial]
fn config_validate_checksums() -> Result<(), Box<dyn Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![4], DataType::UInt8, vec![4], 0u8)
        .bytes_to_bytes_codecs(vec![Crc32cCodec::new().into()])
        .build(store.clone(), "/")?;
    array.store_chunk_elements::<u8>(&[0], &[1, 2, 3, 4])?;

    // Corrupt the checksum
    let key = StoreKey::new("c/0")?;
    let mut encoded = store.get(&key)?.ok_or("chunk is absent")?.to_vec();
    encoded[4] ^= 0xff;
    store.set(&key, encoded.into())?;
    assert!(array.retrieve_chunk(&[0]).is_err());

    global_config_mut().set_validate_checksums(false);
    let array = ArrayBuilder::new(vec![4], DataType::UInt8, vec![4], 0u8)
        .bytes_to_bytes_codecs(vec![Crc32cCodec::new().into()])
        .build(store, "/");
    global_config_mut().set_validate_checksums(true);
    assert_eq!(array?.retrieve_chunk_elements::<u8>(&[0])?, vec![1, 2, 3, 4]);
    Ok(())
}

#[test]
#[serial]
fn config_codec_concurrent_target() -> Result<(), Box<dyn Error>> {
    let builder = ArrayBuilder::new(vec![16, 16], DataType::UInt32, vec![8, 8], 0u32)
        .array_to_bytes_codec(
            ShardingCodecBuilder::new(vec![NonZeroU64::new(2).unwrap(); 2])
                .build()
                .into(),
        )
        .clone();
    let elements: Vec<u32> = (1..=256).collect();

    let store_serial = Arc::new(MemoryStore::new());
    let array_serial = builder.build(store_serial.clone(), "/")?;
    array_serial.store_array_elements(&elements)?;

    global_config_mut().set_codec_concurrent_target(4);
    let store_parallel = Arc::new(MemoryStore::new());
    let array_parallel = builder.build(store_parallel.clone(), "/");
    global_config_mut().set_codec_concurrent_target(1);
    let array_parallel = array_parallel?;
    assert_eq!(array_parallel.codec_options().concurrent_target(), 4);
    array_parallel.store_array_elements(&elements)?;

    // Parallel encoding produces the same shards
    for key in store_serial.list()? {
        assert_eq!(store_serial.get(&key)?, store_parallel.get(&key)?, "{key}");
    }
    assert_eq!(array_parallel.retrieve_array_elements::<u32>()?, elements);
    assert_eq!(array_serial.retrieve_array_elements::<u32>()?, elements);
    Ok(())
}
