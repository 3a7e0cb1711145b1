//! `zarrkit` is a Rust library for chunked, compressed, N-dimensional arrays in the [Zarr V3](https://zarr-specs.readthedocs.io/en/latest/v3/core/index.html) storage format.
//!
//! An [`Array`](array::Array) is split into a regular grid of chunks.
//! Each chunk is encoded through a codec chain and stored under a key of a [store](storage) derived by a chunk key encoding.
//! Reading and writing a region of an array touches only the chunks that intersect the region.
//! With the `sharding_indexed` codec, a chunk (a *shard*) is itself split into inner chunks that can be read independently with byte range requests.
//!
//! ### Supported Extensions
//!
//! | Extension           | Supported                                                                               |
//! |---------------------|-----------------------------------------------------------------------------------------|
//! | Data types          | `bool`, `int8`-`int64`, `uint8`-`uint64`, `float32`, `float64`                          |
//! | Chunk grids         | `regular`                                                                               |
//! | Chunk key encodings | `default`, `v2`                                                                         |
//! | Codecs              | `transpose`, `bytes` (deprecated alias `endian`), `sharding_indexed`, `blosc`, `crc32c`, `gzip`, `zstd` |
//!
//! Storage transformers are not supported.
//!
//! ### Storage Support
//!  - [`MemoryStore`](storage::store::MemoryStore): an in-memory store.
//!  - [`FilesystemStore`](filesystem::FilesystemStore): a local filesystem store (`filesystem` feature).
//!  - [`PerformanceMetricsStorageAdapter`](storage::storage_adapter::performance_metrics::PerformanceMetricsStorageAdapter): counts bytes and operations of an inner store.
//!  - [`UsageLogStorageAdapter`](storage::storage_adapter::usage_log::UsageLogStorageAdapter): logs the operations of an inner store.
//!
//! ## Examples
//! ```rust
//! # use std::sync::Arc;
//! use zarrkit::array::{codec::GzipCodec, ArrayBuilder, ArraySubset, DataType};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(zarrkit::storage::store::MemoryStore::new());
//! let array = ArrayBuilder::new(
//!     vec![8, 8], // array shape
//!     DataType::Float32,
//!     vec![4, 4], // regular chunk shape
//!     f32::NAN, // fill value
//! )
//! .bytes_to_bytes_codecs(vec![GzipCodec::new(5)?.into()])
//! .dimension_names(Some(vec![Some("y".to_string()), Some("x".to_string())]))
//! .build(store.clone(), "/group/array")?;
//! array.store_metadata()?;
//!
//! array.store_array_subset_elements::<f32>(
//!     &ArraySubset::new_with_ranges(&[3..5, 3..6]),
//!     &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
//! )?;
//! let elements = array.retrieve_array_subset_elements::<f32>(
//!     &ArraySubset::new_with_ranges(&[4..5, 2..6]),
//! )?;
//! assert!(elements[0].is_nan());
//! assert_eq!(&elements[1..], &[4.0, 5.0, 6.0]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Features
//!  - `filesystem` (default): re-export `zarrkit_filesystem` as [`zarrkit::filesystem`](filesystem).
//!  - `blosc` (default): the `blosc` codec, built from the bundled c-blosc sources.
//!  - `gzip` (default): the `gzip` codec.
//!  - `zstd` (default): the `zstd` codec.
//!  - `transpose` (default): the `transpose` codec.
//!  - `ndarray` (default): [`ndarray`] retrieve and store methods on [`Array`](array::Array).
//!
//! ## Logging
//! `zarrkit` logs with the [`log`] crate.
//! Warnings are emitted for deprecated codec aliases, and trace messages for chunk level operations.
//! Install a logger such as `env_logger` in an application to see them.
//!
//! ## Licence
//! `zarrkit` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted for inclusion in the work by you, as defined in the Apache-2.0 license, shall be dual licensed as above, without any additional terms or conditions.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(clippy::wildcard_enum_match_arm)]

pub mod array;
pub mod config;

pub use zarrkit_chunk_grid as chunk_grid;
pub use zarrkit_chunk_key_encoding as chunk_key_encoding;
#[cfg(feature = "filesystem")]
pub use zarrkit_filesystem as filesystem;
pub use zarrkit_metadata as metadata;
pub use zarrkit_storage as storage;
