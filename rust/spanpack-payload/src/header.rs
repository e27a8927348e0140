//! The seven leading bits of every payload.
//!
//! | bit | meaning |
//! |-----|---------|
//! | 0, 1 | position shape tag, see [`ShapeTag`] |
//! | 2 | an analyzed offset follows |
//! | 3 | a real (pre-normalization) offset follows |
//! | 4 | a parent id follows |
//! | 5 | trailing payload bytes follow |
//! | 6 | reserved value kind, no effect on decoding |
//!
//! Every combination of these bits is a legal header.

use bitflags::bitflags;
use spanpack_bits::bitstream::{BitReader, BitWriter};
use spanpack_common::Result;

/// Number of bits occupied by [`PayloadHeader`].
pub const HEADER_BITS: usize = 7;

/// Which position shape the payload stores, as two wire bits `(h0, h1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeTag {
    /// `(0, 0)`: the start position alone.
    Single,
    /// `(1, 0)`: a run length follows.
    Range,
    /// `(0, 1)`: a point count and gaps follow.
    Set,
    /// `(1, 1)`: no position.
    None,
}

impl ShapeTag {
    pub fn from_bits(h0: bool, h1: bool) -> Self {
        match (h0, h1) {
            (true, true) => ShapeTag::None,
            (true, false) => ShapeTag::Range,
            (false, true) => ShapeTag::Set,
            (false, false) => ShapeTag::Single,
        }
    }

    pub fn to_bits(self) -> (bool, bool) {
        match self {
            ShapeTag::None => (true, true),
            ShapeTag::Range => (true, false),
            ShapeTag::Set => (false, true),
            ShapeTag::Single => (false, false),
        }
    }
}

bitflags! {
    /// Optional fields announced by the header, in wire order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PayloadFlags: u8 {
        const OFFSET = 1;
        const REAL_OFFSET = 2;
        const PARENT = 4;
        const PAYLOAD = 8;
        /// Reserved. Read and written for compatibility, otherwise ignored.
        const VALUE_KIND = 16;
    }
}

/// Flag bits in the order they appear after the shape tag.
const FLAG_ORDER: [PayloadFlags; 5] = [
    PayloadFlags::OFFSET,
    PayloadFlags::REAL_OFFSET,
    PayloadFlags::PARENT,
    PayloadFlags::PAYLOAD,
    PayloadFlags::VALUE_KIND,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadHeader {
    pub shape: ShapeTag,
    pub flags: PayloadFlags,
}

impl PayloadHeader {
    pub fn new(shape: ShapeTag, flags: PayloadFlags) -> Self {
        PayloadHeader { shape, flags }
    }

    pub fn read(reader: &mut BitReader) -> Result<Self> {
        let h0 = reader.read_bit()?;
        let h1 = reader.read_bit()?;
        let mut flags = PayloadFlags::empty();
        for flag in FLAG_ORDER {
            flags.set(flag, reader.read_bit()?);
        }
        Ok(PayloadHeader {
            shape: ShapeTag::from_bits(h0, h1),
            flags,
        })
    }

    pub fn write(&self, writer: &mut BitWriter) {
        let (h0, h1) = self.shape.to_bits();
        writer.write_bit(h0);
        writer.write_bit(h1);
        for flag in FLAG_ORDER {
            writer.write_bit(self.flags.contains(flag));
        }
    }

    #[inline]
    pub fn has_offset(&self) -> bool {
        self.flags.contains(PayloadFlags::OFFSET)
    }

    #[inline]
    pub fn has_real_offset(&self) -> bool {
        self.flags.contains(PayloadFlags::REAL_OFFSET)
    }

    #[inline]
    pub fn has_parent(&self) -> bool {
        self.flags.contains(PayloadFlags::PARENT)
    }

    #[inline]
    pub fn has_payload(&self) -> bool {
        self.flags.contains(PayloadFlags::PAYLOAD)
    }
}

/// Reads only the header of an encoded payload.
///
/// Lets a caller check for a parent or trailing bytes without decoding the rest.
pub fn peek_header(bytes: &[u8]) -> Result<PayloadHeader> {
    PayloadHeader::read(&mut BitReader::new(bytes))
}
