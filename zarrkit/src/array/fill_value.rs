use derive_more::From;

/// The fill value of an array.
///
/// Provides an element value to use for uninitialised portions of the array.
/// The value is held as native endian bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, From)]
pub struct FillValue(Vec<u8>);

impl core::fmt::Display for FillValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<&[u8]> for FillValue {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl From<bool> for FillValue {
    fn from(value: bool) -> Self {
        Self(vec![u8::from(value)])
    }
}

macro_rules! impl_fill_value_from_pod {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FillValue {
                fn from(value: $t) -> Self {
                    Self(value.to_ne_bytes().to_vec())
                }
            }
        )*
    };
}

impl_fill_value_from_pod!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl FillValue {
    /// Create a new fill value composed of `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the native endian byte representation of the fill value.
    #[must_use]
    pub fn as_ne_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Return `num_elements` repetitions of the fill value.
    #[must_use]
    pub fn repeat(&self, num_elements: usize) -> Vec<u8> {
        self.0.repeat(num_elements)
    }

    /// Check if the bytes are equal to a sequence of the fill value.
    ///
    /// Returns false if the length of `bytes` is not a multiple of the fill value size.
    #[must_use]
    pub fn equals_all(&self, bytes: &[u8]) -> bool {
        match self.0.as_slice() {
            [] => bytes.is_empty(),
            [fill] => bytes.iter().all(|byte| byte == fill),
            fill => {
                bytes.len() % fill.len() == 0
                    && bytes.chunks_exact(fill.len()).all(|element| element == fill)
            }
        }
    }
}
