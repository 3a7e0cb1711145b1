//! Byte ranges.
//!
//! A [`ByteRange`] is a half-open interval `[start, end)` over the bytes of a stored value.
//! Either endpoint may be negative, in which case it is relative to the end of the value.
//! An omitted end means "to the end of the value".
//!
//! This mirrors slice semantics familiar from many languages:
//!
//! | Byte range                   | Value of length 10 |
//! |------------------------------|--------------------|
//! | `ByteRange::new(2, Some(5))` | `2..5`             |
//! | `ByteRange::new(-4, None)`   | `6..10`            |
//! | `ByteRange::new(0, Some(-1))`| `0..9`             |
//! | `ByteRange::suffix(3)`       | `7..10`            |
//!
//! Unlike slicing in some languages, endpoints that resolve outside of the value are an error rather than being clamped.
//!
//! [`extract_byte_ranges`] is a convenience function for extracting byte ranges from a slice of bytes.

use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use thiserror::Error;

use crate::Bytes;

/// A byte offset.
pub type ByteOffset = u64;

/// A byte length.
pub type ByteLength = u64;

/// A byte range.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ByteRange {
    start: i64,
    end: Option<i64>,
}

impl Default for ByteRange {
    fn default() -> Self {
        Self::all()
    }
}

impl From<Range<u64>> for ByteRange {
    fn from(range: Range<u64>) -> Self {
        Self::from_start(range.start, Some(range.end.saturating_sub(range.start)))
    }
}

impl From<RangeFrom<u64>> for ByteRange {
    fn from(range: RangeFrom<u64>) -> Self {
        Self::from_start(range.start, None)
    }
}

impl From<RangeTo<u64>> for ByteRange {
    fn from(range: RangeTo<u64>) -> Self {
        Self::from_start(0, Some(range.end))
    }
}

impl From<RangeFull> for ByteRange {
    fn from(_: RangeFull) -> Self {
        Self::all()
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl ByteRange {
    /// Create a new byte range from a `start` and optional exclusive `end`.
    ///
    /// Negative endpoints are relative to the end of the value.
    #[must_use]
    pub const fn new(start: i64, end: Option<i64>) -> Self {
        Self { start, end }
    }

    /// A byte range spanning an entire value.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            start: 0,
            end: None,
        }
    }

    /// Create a byte range beginning at `offset` with an optional `length`.
    ///
    /// If `length` is [`None`], the byte range extends to the end of the value.
    #[must_use]
    pub fn from_start(offset: ByteOffset, length: Option<ByteLength>) -> Self {
        let start = saturating_i64(offset);
        Self {
            start,
            end: length.map(|length| start.saturating_add(saturating_i64(length))),
        }
    }

    /// Create a byte range spanning the last `length` bytes of a value.
    #[must_use]
    pub fn suffix(length: ByteLength) -> Self {
        Self {
            start: -saturating_i64(length),
            end: None,
        }
    }

    /// Returns the (possibly negative) start of the byte range.
    #[must_use]
    pub const fn start_raw(&self) -> i64 {
        self.start
    }

    /// Returns the (possibly negative) exclusive end of the byte range, if bounded.
    #[must_use]
    pub const fn end_raw(&self) -> Option<i64> {
        self.end
    }

    /// Returns true if the byte range spans an entire value.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        self.start == 0 && self.end.is_none()
    }

    /// Returns true if both endpoints are known without the size of the value.
    #[must_use]
    pub const fn is_absolute(&self) -> bool {
        matches!(self.end, Some(end) if end >= 0) && self.start >= 0
    }

    fn resolve_endpoint(endpoint: i64, size: u64) -> Option<u64> {
        if endpoint < 0 {
            size.checked_sub(endpoint.unsigned_abs())
        } else {
            let endpoint = endpoint.unsigned_abs();
            (endpoint <= size).then_some(endpoint)
        }
    }

    /// Resolve the byte range against a value of length `size`.
    ///
    /// # Errors
    /// Returns [`InvalidByteRangeError`] if either endpoint lies outside of the value or the end precedes the start.
    pub fn to_range(&self, size: u64) -> Result<Range<u64>, InvalidByteRangeError> {
        let err = || InvalidByteRangeError::new(*self, size);
        let start = Self::resolve_endpoint(self.start, size).ok_or_else(err)?;
        let end = match self.end {
            Some(end) => Self::resolve_endpoint(end, size).ok_or_else(err)?,
            None => size,
        };
        if start > end {
            Err(err())
        } else {
            Ok(start..end)
        }
    }

    /// Resolve the byte range against a value of length `size` as a [`Range<usize>`].
    ///
    /// # Errors
    /// Returns [`InvalidByteRangeError`] if the byte range is invalid for a value of length `size` or exceeds [`usize::MAX`].
    pub fn to_range_usize(&self, size: u64) -> Result<Range<usize>, InvalidByteRangeError> {
        let range = self.to_range(size)?;
        let err = || InvalidByteRangeError::new(*self, size);
        Ok(usize::try_from(range.start).map_err(|_| err())?
            ..usize::try_from(range.end).map_err(|_| err())?)
    }

    /// Resolve the destination of a write of `value_len` bytes into a value of length `size`.
    ///
    /// The start is resolved against `size` and may equal `size` (an append).
    /// An unbounded byte range accepts any `value_len` and may extend the value.
    /// A bounded byte range must resolve within the value and span exactly `value_len` bytes.
    ///
    /// # Errors
    /// Returns [`InvalidByteRangeError`] if the write is not compatible with the byte range.
    pub fn to_write_range(
        &self,
        size: u64,
        value_len: u64,
    ) -> Result<Range<u64>, InvalidByteRangeError> {
        if self.end.is_some() {
            let range = self.to_range(size)?;
            if range.end - range.start == value_len {
                Ok(range)
            } else {
                Err(InvalidByteRangeError::new(*self, size))
            }
        } else {
            let start = Self::resolve_endpoint(self.start, size)
                .ok_or_else(|| InvalidByteRangeError::new(*self, size))?;
            Ok(start..start + value_len)
        }
    }

    /// Return the length of the byte range when applied to a value of length `size`.
    ///
    /// # Errors
    /// Returns [`InvalidByteRangeError`] if the byte range is invalid for a value of length `size`.
    pub fn length(&self, size: u64) -> Result<ByteLength, InvalidByteRangeError> {
        let range = self.to_range(size)?;
        Ok(range.end - range.start)
    }

    /// Select `inner` relative to this byte range, producing a byte range relative to the underlying value.
    ///
    /// Returns [`None`] if this byte range is not absolute (see [`is_absolute`](ByteRange::is_absolute)) or if `inner` does not fit within it.
    #[must_use]
    pub fn select(&self, inner: &ByteRange) -> Option<ByteRange> {
        let (Ok(outer_start), Some(Ok(outer_end))) = (
            u64::try_from(self.start),
            self.end.map(u64::try_from),
        ) else {
            return None;
        };
        let inner = inner.to_range(outer_end.checked_sub(outer_start)?).ok()?;
        Some(ByteRange::from(
            outer_start + inner.start..outer_start + inner.end,
        ))
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        if self.start != 0 {
            write!(f, "{}", self.start)?;
        }
        f.write_str("..")?;
        if let Some(end) = self.end {
            write!(f, "{end}")?;
        }
        Ok(())
    }
}

/// An invalid byte range error.
#[derive(Copy, Clone, Debug, Error)]
#[error("invalid byte range {0} for bytes of length {1}")]
pub struct InvalidByteRangeError(ByteRange, u64);

impl InvalidByteRangeError {
    /// Create a new [`InvalidByteRangeError`].
    #[must_use]
    pub fn new(byte_range: ByteRange, bytes_len: u64) -> Self {
        Self(byte_range, bytes_len)
    }
}

/// Extract a byte range from `bytes`.
///
/// # Errors
/// Returns [`InvalidByteRangeError`] if the byte range is invalid for `bytes`.
pub fn extract_byte_range(
    bytes: &Bytes,
    byte_range: &ByteRange,
) -> Result<Bytes, InvalidByteRangeError> {
    let range = byte_range.to_range_usize(bytes.len() as u64)?;
    Ok(bytes.slice(range))
}

/// Extract byte ranges from `bytes`.
///
/// # Errors
/// Returns [`InvalidByteRangeError`] if any byte range is invalid for `bytes`.
pub fn extract_byte_ranges(
    bytes: &Bytes,
    byte_ranges: &[ByteRange],
) -> Result<Vec<Bytes>, InvalidByteRangeError> {
    byte_ranges
        .iter()
        .map(|byte_range| extract_byte_range(bytes, byte_range))
        .collect()
}
