//! Bit-granular reader and writer over byte buffers.
//!
//! Both sides use LSB-first bit ordering within a byte: the first bit of the stream
//! is bit 0 of byte 0, the ninth bit is bit 0 of byte 1, and so on.
//!
//! The read position is an explicit [`BitCursor`] value. A reader can hand its
//! cursor out, and a new reader can be resumed from it with
//! [`BitReader::with_cursor`], which makes snapshots free and keeps the reader
//! itself a thin view over a borrowed slice.

use spanpack_common::{Result, error::Error};

/// Read position within a bit stream.
///
/// `byte_pos` counts the bytes pulled from the buffer so far. `bit_offset` is the
/// number of bits already taken from the most recently pulled byte; zero means that
/// byte is fully used up and the next read must pull a fresh one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitCursor {
    byte_pos: usize,
    bit_offset: u8,
}

impl BitCursor {
    /// Cursor positioned at the very beginning of a stream.
    pub const fn start() -> BitCursor {
        BitCursor {
            byte_pos: 0,
            bit_offset: 0,
        }
    }

    /// Number of bytes pulled from the buffer, including a partially read one.
    #[inline]
    pub fn byte_pos(&self) -> usize {
        self.byte_pos
    }

    /// Bits consumed from the current partially read byte (always `< 8`).
    #[inline]
    pub fn bit_offset(&self) -> u8 {
        self.bit_offset
    }

    /// Total number of bits consumed from the start of the stream.
    #[inline]
    pub fn bits_consumed(&self) -> usize {
        if self.bit_offset == 0 {
            self.byte_pos * 8
        } else {
            (self.byte_pos - 1) * 8 + self.bit_offset as usize
        }
    }
}

/// Reads individual bits from a byte slice, LSB first.
///
/// Once any bit of a byte has been read, the whole byte counts as consumed: it will
/// not be returned by [`BitReader::read_remaining_bytes`].
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    cursor: BitCursor,
}

impl<'a> BitReader<'a> {
    /// Creates a reader positioned at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> BitReader<'a> {
        Self::with_cursor(data, BitCursor::start())
    }

    /// Creates a reader over `data` resuming at `cursor`.
    ///
    /// The cursor must have been obtained from a reader over the same buffer.
    pub fn with_cursor(data: &'a [u8], cursor: BitCursor) -> BitReader<'a> {
        debug_assert!(cursor.byte_pos <= data.len());
        debug_assert!(cursor.bit_offset < 8);
        debug_assert!(cursor.bit_offset == 0 || cursor.byte_pos > 0);
        BitReader { data, cursor }
    }

    /// Returns the current read position.
    #[inline]
    pub fn cursor(&self) -> BitCursor {
        self.cursor
    }

    /// Moves the reader to a previously obtained position.
    #[inline]
    pub fn seek(&mut self, cursor: BitCursor) {
        debug_assert!(cursor.byte_pos <= self.data.len());
        self.cursor = cursor;
    }

    /// Total number of bits consumed so far.
    #[inline]
    pub fn bits_consumed(&self) -> usize {
        self.cursor.bits_consumed()
    }

    /// Number of whole bytes not yet touched by any read.
    #[inline]
    pub fn remaining_bytes(&self) -> usize {
        self.data.len() - self.cursor.byte_pos
    }

    /// Returns `true` if no further bit can be read.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.cursor.bit_offset == 0 && self.cursor.byte_pos == self.data.len()
    }

    /// Reads the next bit.
    ///
    /// A new byte is pulled from the buffer only after all 8 bits of the previous
    /// one were consumed; fails with `StreamExhausted` if none is left.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.cursor.bit_offset == 0 {
            self.pull_byte()?;
        }
        let byte = self.data[self.cursor.byte_pos - 1];
        let bit = (byte >> self.cursor.bit_offset) & 1;
        self.advance_in_byte(1);
        Ok(bit != 0)
    }

    /// Reads `count` bits (at most 64) and assembles them most significant first.
    #[inline]
    pub fn read_bits(&mut self, count: u32) -> Result<u64> {
        debug_assert!(count <= 64, "bit count must be 0..=64, got {count}");
        let mut value = 0u64;
        for _ in 0..count {
            value = (value << 1) | u64::from(self.read_bit()?);
        }
        Ok(value)
    }

    /// Counts zero bits up to and including the next one bit, and returns the number
    /// of zeros. The terminating one bit is consumed.
    ///
    /// Works a byte at a time, so long zero runs cost one step per byte rather than
    /// one per bit.
    pub fn read_unary(&mut self) -> Result<u32> {
        let mut zeros = 0u32;
        loop {
            if self.cursor.bit_offset == 0 {
                self.pull_byte()?;
            }
            let pending = self.data[self.cursor.byte_pos - 1] >> self.cursor.bit_offset;
            if pending != 0 {
                let run = pending.trailing_zeros();
                zeros += run;
                self.advance_in_byte(run as u8 + 1);
                return Ok(zeros);
            }
            zeros += u32::from(8 - self.cursor.bit_offset);
            self.cursor.bit_offset = 0;
        }
    }

    /// Returns every byte not yet touched by a read and moves the cursor to the end.
    ///
    /// A partially read byte is not included. Fails with `StreamExhausted` if no
    /// whole byte is left.
    pub fn read_remaining_bytes(&mut self) -> Result<&'a [u8]> {
        let rest = &self.data[self.cursor.byte_pos..];
        if rest.is_empty() {
            return Err(Error::stream_exhausted(self.bits_consumed()));
        }
        self.cursor = BitCursor {
            byte_pos: self.data.len(),
            bit_offset: 0,
        };
        Ok(rest)
    }

    #[inline]
    fn pull_byte(&mut self) -> Result<()> {
        if self.cursor.byte_pos >= self.data.len() {
            return Err(Error::stream_exhausted(self.bits_consumed()));
        }
        self.cursor.byte_pos += 1;
        Ok(())
    }

    #[inline]
    fn advance_in_byte(&mut self, bits: u8) {
        let offset = self.cursor.bit_offset + bits;
        debug_assert!(offset <= 8);
        self.cursor.bit_offset = offset & 7;
    }
}

/// Writes individual bits into a growable byte buffer, LSB first.
///
/// Bits accumulate in a partial byte that is pushed to the buffer once full.
/// [`BitWriter::finish`] pads the trailing partial byte with zero bits.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    buf: Vec<u8>,
    /// Pending bits of the partial byte, occupying bits `0..pending_bits`.
    pending: u8,
    pending_bits: u8,
}

impl BitWriter {
    /// Creates a new empty `BitWriter`.
    pub fn new() -> BitWriter {
        Self::with_capacity(0)
    }

    /// Creates a writer whose buffer can hold `capacity` bytes without reallocating.
    pub fn with_capacity(capacity: usize) -> BitWriter {
        BitWriter {
            buf: Vec::with_capacity(capacity),
            pending: 0,
            pending_bits: 0,
        }
    }

    /// Number of bits written so far.
    #[inline]
    pub fn bit_len(&self) -> usize {
        self.buf.len() * 8 + self.pending_bits as usize
    }

    /// Returns `true` if no bit has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bit_len() == 0
    }

    /// Writes a single bit. `true` = 1, `false` = 0.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.pending |= u8::from(bit) << self.pending_bits;
        self.pending_bits += 1;
        if self.pending_bits == 8 {
            self.buf.push(self.pending);
            self.pending = 0;
            self.pending_bits = 0;
        }
    }

    /// Writes the low `count` bits of `value`, most significant first.
    /// When `count` is 0 this is a no-op.
    #[inline]
    pub fn write_bits(&mut self, value: u64, count: u32) {
        debug_assert!(count <= 64, "bit count must be 0..=64, got {count}");
        for i in (0..count).rev() {
            self.write_bit((value >> i) & 1 != 0);
        }
    }

    /// Writes `count` zero bits.
    #[inline]
    pub fn write_zeros(&mut self, count: u32) {
        for _ in 0..count {
            self.write_bit(false);
        }
    }

    /// Pads with zero bits up to the next byte boundary. No-op if already aligned.
    pub fn align_to_byte(&mut self) {
        if self.pending_bits > 0 {
            self.buf.push(self.pending);
            self.pending = 0;
            self.pending_bits = 0;
        }
    }

    /// Aligns to a byte boundary, then appends `bytes` verbatim.
    pub fn write_bytes_aligned(&mut self, bytes: &[u8]) {
        self.align_to_byte();
        self.buf.extend_from_slice(bytes);
    }

    /// Discards everything written, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.pending = 0;
        self.pending_bits = 0;
    }

    /// Finalizes the writer, padding the last byte with zero bits, and returns the buffer.
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.buf
    }

    /// Pads the last byte, appends the written bytes to `target` and resets the
    /// writer for reuse.
    pub fn finish_into(&mut self, target: &mut Vec<u8>) {
        self.align_to_byte();
        target.extend_from_slice(&self.buf);
        self.clear();
    }
}
