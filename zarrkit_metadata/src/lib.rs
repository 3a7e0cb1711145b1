//! [Zarr](https://zarr-specs.readthedocs.io/) array metadata support for the [`zarrkit`](https://docs.rs/zarrkit/latest/zarrkit/index.html) crate.
//!
//! This crate models the `zarr.json` document of a Zarr V3 array with [`serde`]:
//!  - [`ArrayMetadataV3`]: the array document,
//!  - [`MetadataV3`]: the `{"name": ..., "configuration": {...}}` form shared by data types, chunk grids, chunk key encodings, and codecs,
//!  - [`FillValueMetadata`]: the unparsed fill value, interpreted later against a data type,
//!  - configuration structs for the supported [`codec`]s, [`chunk_grid`]s, and [`chunk_key_encoding`]s.
//!
//! ## Licence
//! `zarrkit_metadata` is licensed under either of
//! - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//! - the MIT license <http://opensource.org/licenses/MIT>, at your option.

mod array;
pub mod chunk_grid;
pub mod chunk_key_encoding;
pub mod codec;
mod endianness;
mod fill_value;
mod metadata_v3;

use std::num::NonZeroU64;

pub use array::{AdditionalFields, ArrayMetadataV3, UnsupportedAdditionalFieldError};
pub use endianness::Endianness;
pub use fill_value::FillValueMetadata;
pub use metadata_v3::{ConfigurationInvalidError, MetadataConfiguration, MetadataV3};

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// The shape of a chunk. All dimensions must be non-zero.
pub type ChunkShape = Vec<NonZeroU64>;

/// A dimension name.
pub type DimensionName = Option<String>;
