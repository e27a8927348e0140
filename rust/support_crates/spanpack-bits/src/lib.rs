//! Bit-level primitives for spanpack payloads.
//!
//! - [`bitstream`]: a reader and a writer addressing a byte buffer one bit at a time,
//!   least-significant bit of each byte first.
//! - [`elias_gamma`]: the Elias Gamma universal code for positive, non-negative and
//!   signed integers, layered on top of the bit stream.
//!
//! # Usage Examples
//!
//! ```rust
//! use spanpack_bits::bitstream::{BitReader, BitWriter};
//! use spanpack_bits::elias_gamma::{EliasGammaRead, EliasGammaWrite};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bit(true);
//! writer.write_gamma_non_negative(41).unwrap();
//! writer.write_gamma_signed(-3).unwrap();
//! let bytes = writer.finish();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert!(reader.read_bit().unwrap());
//! assert_eq!(reader.read_gamma_non_negative().unwrap(), 41);
//! assert_eq!(reader.read_gamma_signed().unwrap(), -3);
//! ```

pub mod bitstream;
pub mod elias_gamma;
