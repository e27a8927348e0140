//! Elias Gamma universal code.
//!
//! A positive integer `v` is written as `N = floor(log2(v))` zero bits, a one bit,
//! and then the low `N` bits of `v` most significant first (its binary form with the
//! leading one omitted). The code is prefix-free, so no length field is needed, and
//! it occupies exactly `2N + 1` bits.
//!
//! Non-negative integers are shifted by one. Signed integers use the mapping
//! `v >= 0 => 2v + 1`, `v < 0 => -2v`, so that `0, -1, 1, -2, 2` become
//! `1, 2, 3, 4, 5`. Note that this is not zig-zag (which would map `0` to `0`).

use spanpack_common::{Result, error::Error, verify_arg};

use crate::bitstream::{BitReader, BitWriter};

/// Largest zero prefix that still yields a value representable as `u64`.
const MAX_PREFIX_ZEROS: u32 = u64::BITS - 1;

/// Number of bits used by the Elias Gamma code of a positive `value`.
///
/// # Panics
///
/// Panics in debug builds if `value` is zero.
#[inline]
pub fn gamma_bit_len(value: u64) -> u32 {
    debug_assert!(value >= 1);
    2 * value.ilog2() + 1
}

/// Decoding half of the Elias Gamma code.
pub trait EliasGammaRead {
    /// Reads a positive integer (`>= 1`).
    fn read_gamma_positive(&mut self) -> Result<u64>;

    /// Reads a non-negative integer (`>= 0`).
    #[inline]
    fn read_gamma_non_negative(&mut self) -> Result<u64> {
        Ok(self.read_gamma_positive()? - 1)
    }

    /// Reads a signed integer.
    #[inline]
    fn read_gamma_signed(&mut self) -> Result<i64> {
        let u = self.read_gamma_positive()?;
        // Both halves fit: `u >> 1` never exceeds `i64::MAX`.
        let half = (u >> 1) as i64;
        Ok(if u & 1 == 0 { -half } else { half })
    }
}

/// Encoding half of the Elias Gamma code.
pub trait EliasGammaWrite {
    /// Writes a positive integer. Fails with `InvalidArgument` for zero.
    fn write_gamma_positive(&mut self, value: u64) -> Result<()>;

    /// Writes a non-negative integer. Fails with `InvalidArgument` for `u64::MAX`,
    /// which has no positive successor.
    #[inline]
    fn write_gamma_non_negative(&mut self, value: u64) -> Result<()> {
        let shifted = value
            .checked_add(1)
            .ok_or_else(|| Error::invalid_arg("value", "must be less than u64::MAX"))?;
        self.write_gamma_positive(shifted)
    }

    /// Writes a signed integer. Fails with `InvalidArgument` for `i64::MIN`.
    #[inline]
    fn write_gamma_signed(&mut self, value: i64) -> Result<()> {
        let mapped = if value >= 0 {
            value as u64 * 2 + 1
        } else {
            value
                .unsigned_abs()
                .checked_mul(2)
                .ok_or_else(|| Error::invalid_arg("value", "must be greater than i64::MIN"))?
        };
        self.write_gamma_positive(mapped)
    }
}

impl EliasGammaRead for BitReader<'_> {
    #[inline]
    fn read_gamma_positive(&mut self) -> Result<u64> {
        let zeros = self.read_unary()?;
        if zeros > MAX_PREFIX_ZEROS {
            // A short buffer reports exhaustion, not overflow.
            for _ in 0..zeros {
                self.read_bit()?;
            }
            return Err(Error::integer_overflow("elias gamma prefix"));
        }
        let suffix = self.read_bits(zeros)?;
        Ok((1u64 << zeros) | suffix)
    }
}

impl EliasGammaWrite for BitWriter {
    #[inline]
    fn write_gamma_positive(&mut self, value: u64) -> Result<()> {
        verify_arg!(value, value >= 1);
        let n = value.ilog2();
        self.write_zeros(n);
        self.write_bit(true);
        self.write_bits(value, n);
        Ok(())
    }
}
