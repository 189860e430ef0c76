//! Matrix element types that can be stored in a problem file.

use std::fmt::{Debug, Display, LowerExp};

use num::Float;

/// A fixed-width floating-point element as stored on disk.
///
/// Elements are serialized little-endian with no padding between them.
pub trait Element: Float + Send + Sync + Debug + Display + LowerExp + 'static {
    /// Encoded width in bytes.
    const BYTES: usize;

    /// Native precision of the type, counting the implicit leading bit.
    const MANTISSA_DIGITS: i32;

    /// Binary exponent bounding the magnitude of generated input elements.
    ///
    /// Products of two inputs are bounded by `2^(2 * MAGNITUDE_EXPONENT)`, which is
    /// what the tolerance thresholds scale from.
    const MAGNITUDE_EXPONENT: i32;

    /// Decodes one element from exactly [`Self::BYTES`] little-endian bytes.
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// Appends the little-endian encoding of `self` to `out`.
    fn extend_le(self, out: &mut Vec<u8>);

    /// Converts from `f64`, rounding to the nearest representable value.
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_element {
    ($t:ty, $exponent:expr) => {
        impl Element for $t {
            const BYTES: usize = std::mem::size_of::<$t>();
            const MANTISSA_DIGITS: i32 = <$t>::MANTISSA_DIGITS as i32;
            const MAGNITUDE_EXPONENT: i32 = $exponent;

            #[inline(always)]
            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(bytes);
                <$t>::from_le_bytes(raw)
            }

            #[inline(always)]
            fn extend_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline(always)]
            fn from_f64(value: f64) -> Self {
                value as $t
            }
        }
    };
}

impl_element!(f32, 2);
impl_element!(f64, 2);

/// Decodes a packed little-endian byte run into `dst`.
///
/// `bytes.len()` must equal `dst.len() * E::BYTES`.
pub(crate) fn decode_into<E: Element>(bytes: &[u8], dst: &mut [E]) {
    debug_assert_eq!(bytes.len(), dst.len() * E::BYTES);
    for (value, chunk) in dst.iter_mut().zip(bytes.chunks_exact(E::BYTES)) {
        *value = E::from_le_slice(chunk);
    }
}
