//! Lazy handles to stored, encoded, or decoded chunk values.
//!
//! A [`ValueHandle`] refers to a value without necessarily holding it.
//! It can reference a key in a store, a byte range of a key, bytes in memory, a decoded array, or nothing at all.
//! Selecting a byte range of a stored value with [`ValueHandle::get`] does not read the store, so a codec can narrow a handle down to exactly the bytes it needs before anything is fetched.
//!
//! Decoding and encoding can be queued on a handle with [`ValueHandle::with_decode`] and [`ValueHandle::with_encode`].
//! Queued transforms run only when a terminal representation is requested ([`to_bytes`](ValueHandle::to_bytes), [`to_array`](ValueHandle::to_array), etc.).

use std::borrow::Cow;

use zarrkit_storage::{
    byte_range::{extract_byte_range, ByteRange, InvalidByteRangeError},
    Bytes, MaybeBytes, ReadableStorage, StoreKey,
};

use super::{
    array_bytes::validate_bytes_len,
    codec::{CodecChain, CodecError, CodecOptions},
    ArrayBytes, ChunkRepresentation,
};

/// The referent of a [`ValueHandle`].
#[derive(Clone)]
enum ValueSource {
    /// The entire value at a store key.
    Stored {
        storage: ReadableStorage,
        key: StoreKey,
    },
    /// A byte range of the value at a store key.
    StoredRange {
        storage: ReadableStorage,
        key: StoreKey,
        byte_range: ByteRange,
    },
    /// Encoded bytes in memory.
    Bytes(Bytes),
    /// A decoded array in memory.
    Array(Bytes),
    /// Nothing, such as a key that is not in the store.
    Absent,
}

impl std::fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stored { key, .. } => write!(f, "Stored({key})"),
            Self::StoredRange {
                key, byte_range, ..
            } => write!(f, "StoredRange({key}, {byte_range})"),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Self::Array(bytes) => write!(f, "Array({} bytes)", bytes.len()),
            Self::Absent => f.write_str("Absent"),
        }
    }
}

/// A codec transform queued on a [`ValueHandle`].
#[derive(Debug, Clone, Copy)]
enum PendingTransform<'a> {
    Decode {
        codecs: &'a CodecChain,
        representation: &'a ChunkRepresentation,
        options: CodecOptions,
    },
    Encode {
        codecs: &'a CodecChain,
        representation: &'a ChunkRepresentation,
        options: CodecOptions,
    },
}

/// A lazy handle to a value.
///
/// See the [module documentation](self).
#[derive(Debug, Clone)]
pub struct ValueHandle<'a> {
    source: ValueSource,
    transforms: Vec<PendingTransform<'a>>,
}

impl<'a> ValueHandle<'a> {
    const fn with_source(source: ValueSource) -> Self {
        Self {
            source,
            transforms: Vec::new(),
        }
    }

    /// Create a handle to the value at `key` in `storage`.
    ///
    /// Nothing is read until the handle is materialised.
    #[must_use]
    pub const fn new_stored(storage: ReadableStorage, key: StoreKey) -> Self {
        Self::with_source(ValueSource::Stored { storage, key })
    }

    /// Create a handle to encoded bytes in memory.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::with_source(ValueSource::Bytes(bytes.into()))
    }

    /// Create a handle to a decoded array in memory.
    ///
    /// `bytes` are the elements of the array in C order and native endianness.
    #[must_use]
    pub fn from_array(bytes: impl Into<Bytes>) -> Self {
        Self::with_source(ValueSource::Array(bytes.into()))
    }

    /// Create a handle to nothing.
    #[must_use]
    pub const fn absent() -> Self {
        Self::with_source(ValueSource::Absent)
    }

    /// Queue decoding of the value with `codecs`.
    ///
    /// The decoded value has `representation`.
    #[must_use]
    pub fn with_decode(
        mut self,
        codecs: &'a CodecChain,
        representation: &'a ChunkRepresentation,
        options: &CodecOptions,
    ) -> Self {
        self.transforms.push(PendingTransform::Decode {
            codecs,
            representation,
            options: *options,
        });
        self
    }

    /// Queue encoding of the value with `codecs`.
    ///
    /// The value must be a decoded array with `representation` when the handle is materialised.
    #[must_use]
    pub fn with_encode(
        mut self,
        codecs: &'a CodecChain,
        representation: &'a ChunkRepresentation,
        options: &CodecOptions,
    ) -> Self {
        self.transforms.push(PendingTransform::Encode {
            codecs,
            representation,
            options: *options,
        });
        self
    }

    /// Returns true if the handle refers to nothing without reading anything.
    ///
    /// A stored handle may still turn out to be absent when materialised.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self.source, ValueSource::Absent)
    }

    /// Returns true if the handle has queued transforms.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.transforms.is_empty()
    }

    /// Return a handle to `byte_range` of this value.
    ///
    /// A byte range of a stored value is another stored value and nothing is read.
    /// The exception is a byte range relative to the end of an already relative byte range, which needs the size of the stored value.
    /// If the handle has queued transforms, they are applied first.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if `byte_range` is invalid for the value, a queued transform fails, or the store fails.
    pub fn get(&self, byte_range: &ByteRange) -> Result<ValueHandle<'a>, CodecError> {
        let source = if self.transforms.is_empty() {
            self.source.clone()
        } else {
            self.force()?
        };
        let source = match source {
            ValueSource::Stored { storage, key } => ValueSource::StoredRange {
                storage,
                key,
                byte_range: *byte_range,
            },
            ValueSource::StoredRange {
                storage,
                key,
                byte_range: outer,
            } => {
                if let Some(byte_range) = outer.select(byte_range) {
                    ValueSource::StoredRange {
                        storage,
                        key,
                        byte_range,
                    }
                } else if let Some(size) = storage.size_key(&key)? {
                    let outer = ByteRange::from(outer.to_range(size)?);
                    let byte_range = outer.select(byte_range).ok_or_else(|| {
                        InvalidByteRangeError::new(*byte_range, outer.length(size).unwrap_or(0))
                    })?;
                    ValueSource::StoredRange {
                        storage,
                        key,
                        byte_range,
                    }
                } else {
                    ValueSource::Absent
                }
            }
            ValueSource::Bytes(bytes) | ValueSource::Array(bytes) => {
                ValueSource::Bytes(extract_byte_range(&bytes, byte_range)?)
            }
            ValueSource::Absent => ValueSource::Absent,
        };
        Ok(Self::with_source(source))
    }

    /// Overwrite `byte_range` of this value with the bytes of `value`.
    ///
    /// The handle is materialised into memory first; an absent value is treated as empty.
    /// The store is never modified.
    /// An unbounded `byte_range` may extend the value.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if `byte_range` is incompatible with the length of either value, or materialising either handle fails.
    pub fn set(&mut self, byte_range: &ByteRange, value: &ValueHandle<'_>) -> Result<(), CodecError> {
        let bytes = self.to_bytes()?;
        let value = value.to_bytes()?;
        let range = byte_range.to_write_range(bytes.len() as u64, value.len() as u64)?;
        let range = usize::try_from(range.start)
            .map_err(|_| InvalidByteRangeError::new(*byte_range, bytes.len() as u64))?
            ..usize::try_from(range.end)
                .map_err(|_| InvalidByteRangeError::new(*byte_range, bytes.len() as u64))?;

        let mut bytes = Vec::from(bytes);
        if bytes.len() < range.end {
            bytes.resize(range.end, 0);
        }
        bytes[range].copy_from_slice(&value);
        self.source = ValueSource::Bytes(Bytes::from(bytes));
        self.transforms.clear();
        Ok(())
    }

    /// Read the source and apply any queued transforms.
    fn force(&self) -> Result<ValueSource, CodecError> {
        let mut source = match &self.source {
            ValueSource::Stored { storage, key } => storage
                .get(key)?
                .map_or(ValueSource::Absent, ValueSource::Bytes),
            ValueSource::StoredRange {
                storage,
                key,
                byte_range,
            } => storage
                .get_byte_range(key, byte_range)?
                .map_or(ValueSource::Absent, ValueSource::Bytes),
            source => source.clone(),
        };
        for transform in &self.transforms {
            source = match (transform, source) {
                (_, ValueSource::Absent) => ValueSource::Absent,
                (
                    PendingTransform::Decode {
                        codecs,
                        representation,
                        options,
                    },
                    ValueSource::Bytes(bytes),
                ) => {
                    let decoded = codecs.decode(Cow::Borrowed(&bytes[..]), representation, options)?;
                    ValueSource::Array(Bytes::from(decoded.into_owned()))
                }
                (
                    PendingTransform::Encode {
                        codecs,
                        representation,
                        options,
                    },
                    ValueSource::Array(bytes),
                ) => {
                    let encoded = codecs.encode(Cow::Borrowed(&bytes[..]), representation, options)?;
                    ValueSource::Bytes(Bytes::from(encoded.into_owned()))
                }
                (PendingTransform::Decode { .. }, _) => {
                    return Err(CodecError::from("cannot decode a value that is already decoded"))
                }
                (PendingTransform::Encode { .. }, _) => {
                    return Err(CodecError::from("cannot encode a value that is not a decoded array"))
                }
            };
        }
        Ok(source)
    }

    /// Materialise the bytes of the value, or [`None`] if it is absent.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the store or a queued transform fails.
    pub fn to_maybe_bytes(&self) -> Result<MaybeBytes, CodecError> {
        match self.force()? {
            ValueSource::Bytes(bytes) | ValueSource::Array(bytes) => Ok(Some(bytes)),
            _ => Ok(None),
        }
    }

    /// Materialise the bytes of the value.
    ///
    /// An absent value has no bytes.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the store or a queued transform fails.
    pub fn to_bytes(&self) -> Result<Bytes, CodecError> {
        Ok(self.to_maybe_bytes()?.unwrap_or_default())
    }

    /// Materialise the value as an array with `representation`, or [`None`] if it is absent.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the store or a queued transform fails, or the value does not have the size of `representation`.
    pub fn to_maybe_array(
        &self,
        representation: &ChunkRepresentation,
    ) -> Result<Option<ArrayBytes<'static>>, CodecError> {
        match self.to_maybe_bytes()? {
            Some(bytes) => {
                validate_bytes_len(&bytes, representation.size())?;
                Ok(Some(Cow::Owned(Vec::from(bytes))))
            }
            None => Ok(None),
        }
    }

    /// Materialise the value as an array with `representation`.
    ///
    /// An absent value is an array filled with the fill value of `representation`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the store or a queued transform fails, or the value does not have the size of `representation`.
    pub fn to_array(
        &self,
        representation: &ChunkRepresentation,
    ) -> Result<ArrayBytes<'static>, CodecError> {
        Ok(self
            .to_maybe_array(representation)?
            .unwrap_or_else(|| Cow::Owned(representation.fill_bytes())))
    }
}
