//! Payload decoding.
//!
//! Decoding runs once per matched posting while a query is evaluated, so the
//! [`PayloadDecoder`] keeps the vectors of the previously decoded record and
//! refills them on the next call. In steady state no allocation takes place.

use spanpack_bits::{bitstream::BitReader, elias_gamma::EliasGammaRead};
use spanpack_common::{Result, error::Error};

use crate::{
    header::{PayloadHeader, ShapeTag},
    position::PositionShape,
    record::{Offset, PayloadRecord},
};

/// Reusable payload decoder.
///
/// # Examples
///
/// ```rust
/// use spanpack_payload::{PayloadDecoder, PayloadRecord, PositionShape, encode};
///
/// let record = PayloadRecord::new(5, PositionShape::range(10, 12)).with_offset(100, 105);
/// let bytes = encode(&record, 10).unwrap();
///
/// let mut decoder = PayloadDecoder::new();
/// let decoded = decoder.decode(10, &bytes).unwrap();
/// assert_eq!(decoded, &record);
/// ```
#[derive(Debug, Default)]
pub struct PayloadDecoder {
    record: PayloadRecord,
    header: Option<PayloadHeader>,
    /// Spare buffers recycled from the previous record.
    spare_points: Vec<u64>,
    spare_payload: Vec<u8>,
}

impl PayloadDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `bytes`, interpreting positions relative to `start_position`.
    ///
    /// On failure nothing of the partially decoded record remains observable:
    /// [`PayloadDecoder::record`] returns `None` until the next successful call.
    pub fn decode(&mut self, start_position: u64, bytes: &[u8]) -> Result<&PayloadRecord> {
        self.recycle();
        match self.decode_fields(start_position, bytes) {
            Ok(header) => {
                self.header = Some(header);
                Ok(&self.record)
            }
            Err(e) => {
                log::trace!(
                    "payload decode failed at start position {start_position} ({} bytes): {e}",
                    bytes.len()
                );
                self.header = None;
                Err(e)
            }
        }
    }

    /// The most recently decoded record, if the last call succeeded.
    pub fn record(&self) -> Option<&PayloadRecord> {
        self.header.map(|_| &self.record)
    }

    /// Header of the most recently decoded record, including the reserved bit.
    pub fn header(&self) -> Option<PayloadHeader> {
        self.header
    }

    /// Consumes the decoder, returning the last decoded record.
    pub fn into_record(self) -> Option<PayloadRecord> {
        self.header.map(|_| self.record)
    }

    /// Moves the vectors of the previous record into the spare slots.
    fn recycle(&mut self) {
        let previous = std::mem::take(&mut self.record);
        if let PositionShape::Set(points) = previous.position {
            self.spare_points = points;
        }
        if let Some(payload) = previous.payload {
            self.spare_payload = payload;
        }
    }

    fn decode_fields(&mut self, start_position: u64, bytes: &[u8]) -> Result<PayloadHeader> {
        let mut reader = BitReader::new(bytes);
        let header = PayloadHeader::read(&mut reader)?;

        let id = reader.read_gamma_non_negative()?;
        let position = self.decode_position(&mut reader, header.shape, start_position)?;

        let mut offset = None;
        let mut real_offset = None;
        if header.has_offset() {
            let start = to_signed(reader.read_gamma_non_negative()?, "offset")?;
            offset = Some(read_span(&mut reader, start, "offset")?);
            if header.has_real_offset() {
                // The delta may place the real start below zero.
                let delta = reader.read_gamma_signed()?;
                let real_start = start
                    .checked_add(delta)
                    .ok_or_else(|| Error::integer_overflow("real_offset"))?;
                real_offset = Some(read_span(&mut reader, real_start, "real_offset")?);
            }
        } else if header.has_real_offset() {
            // Without an analyzed offset the real start is stored absolute.
            let real_start = to_signed(reader.read_gamma_non_negative()?, "real_offset")?;
            real_offset = Some(read_span(&mut reader, real_start, "real_offset")?);
        }

        let parent_id = if header.has_parent() {
            let delta = reader.read_gamma_signed()?;
            let parent_id = i64::try_from(i128::from(id) + i128::from(delta))
                .map_err(|_| Error::integer_overflow("parent_id"))?;
            Some(parent_id)
        } else {
            None
        };

        let payload = if header.has_payload() {
            let rest = reader.read_remaining_bytes()?;
            let mut payload = std::mem::take(&mut self.spare_payload);
            payload.clear();
            payload.extend_from_slice(rest);
            Some(payload)
        } else {
            None
        };

        self.record = PayloadRecord {
            id,
            parent_id,
            position,
            offset,
            real_offset,
            payload,
        };
        Ok(header)
    }

    fn decode_position(
        &mut self,
        reader: &mut BitReader,
        shape: ShapeTag,
        start_position: u64,
    ) -> Result<PositionShape> {
        Ok(match shape {
            ShapeTag::None => PositionShape::None,
            ShapeTag::Single => PositionShape::Single(start_position),
            ShapeTag::Range => {
                let length = reader.read_gamma_positive()?;
                let end = start_position
                    .checked_add(length - 1)
                    .ok_or_else(|| Error::integer_overflow("position"))?;
                PositionShape::Range {
                    start: start_position,
                    end,
                }
            }
            ShapeTag::Set => {
                let count = reader.read_gamma_positive()?;
                let mut points = std::mem::take(&mut self.spare_points);
                points.clear();
                points.push(start_position);
                let mut current = start_position;
                for _ in 1..count {
                    let gap = reader.read_gamma_positive()?;
                    current = current
                        .checked_add(gap)
                        .ok_or_else(|| Error::integer_overflow("position"))?;
                    points.push(current);
                }
                PositionShape::Set(points)
            }
        })
    }
}

/// Reads the length of a span starting at `start`.
#[inline]
fn read_span(reader: &mut BitReader, start: i64, element: &str) -> Result<Offset> {
    let length = reader.read_gamma_positive()?;
    let end = start
        .checked_add_unsigned(length - 1)
        .ok_or_else(|| Error::integer_overflow(element))?;
    Ok(Offset { start, end })
}

#[inline]
fn to_signed(value: u64, element: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| Error::integer_overflow(element))
}

/// Decodes a single payload into an owned record.
///
/// Use a [`PayloadDecoder`] when decoding many payloads in a loop.
pub fn decode(start_position: u64, bytes: &[u8]) -> Result<PayloadRecord> {
    let mut decoder = PayloadDecoder::new();
    decoder.decode(start_position, bytes)?;
    Ok(decoder.record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spanpack_bits::{bitstream::BitWriter, elias_gamma::EliasGammaWrite};

    use crate::header::PayloadFlags;

    fn header_bits(shape: ShapeTag, flags: PayloadFlags) -> BitWriter {
        let mut writer = BitWriter::new();
        PayloadHeader::new(shape, flags).write(&mut writer);
        writer
    }

    #[test]
    fn test_decode_hand_built_range() {
        let mut writer = header_bits(ShapeTag::Range, PayloadFlags::OFFSET);
        writer.write_gamma_non_negative(5).unwrap();
        writer.write_gamma_positive(3).unwrap();
        writer.write_gamma_non_negative(100).unwrap();
        writer.write_gamma_positive(6).unwrap();
        let bytes = writer.finish();

        let record = decode(10, &bytes).unwrap();
        assert_eq!(record.id, 5);
        assert_eq!(record.position, PositionShape::Range { start: 10, end: 12 });
        assert_eq!(record.offset, Some(Offset { start: 100, end: 105 }));
        assert_eq!(record.real_offset, None);
        assert_eq!(record.parent_id, None);
        assert_eq!(record.payload, None);
    }

    #[test]
    fn test_decode_set_accumulates_gaps() {
        let mut writer = header_bits(ShapeTag::Set, PayloadFlags::empty());
        writer.write_gamma_non_negative(1).unwrap();
        writer.write_gamma_positive(3).unwrap();
        writer.write_gamma_positive(2).unwrap();
        writer.write_gamma_positive(5).unwrap();
        let bytes = writer.finish();

        let record = decode(20, &bytes).unwrap();
        assert_eq!(record.position, PositionShape::Set(vec![20, 22, 27]));
    }

    #[test]
    fn test_decode_real_offset_delta_and_absolute() {
        // Both offsets: the real start is a signed delta from the analyzed start.
        let mut writer = header_bits(
            ShapeTag::None,
            PayloadFlags::OFFSET | PayloadFlags::REAL_OFFSET,
        );
        writer.write_gamma_non_negative(0).unwrap();
        writer.write_gamma_non_negative(50).unwrap();
        writer.write_gamma_positive(4).unwrap();
        writer.write_gamma_signed(-8).unwrap();
        writer.write_gamma_positive(6).unwrap();
        let record = decode(0, &writer.finish()).unwrap();
        assert_eq!(record.offset, Some(Offset { start: 50, end: 53 }));
        assert_eq!(record.real_offset, Some(Offset { start: 42, end: 47 }));

        // Real offset alone: the start is absolute.
        let mut writer = header_bits(ShapeTag::None, PayloadFlags::REAL_OFFSET);
        writer.write_gamma_non_negative(0).unwrap();
        writer.write_gamma_non_negative(42).unwrap();
        writer.write_gamma_positive(6).unwrap();
        let record = decode(0, &writer.finish()).unwrap();
        assert_eq!(record.offset, None);
        assert_eq!(record.real_offset, Some(Offset { start: 42, end: 47 }));
    }

    #[test]
    fn test_reserved_bit_is_ignored() {
        for flags in [PayloadFlags::empty(), PayloadFlags::VALUE_KIND] {
            let mut writer = header_bits(ShapeTag::Single, flags);
            writer.write_gamma_non_negative(9).unwrap();
            let bytes = writer.finish();

            let mut decoder = PayloadDecoder::new();
            let record = decoder.decode(3, &bytes).unwrap().clone();
            assert_eq!(record, PayloadRecord::new(9, PositionShape::Single(3)));
            assert_eq!(decoder.header().unwrap().flags, flags);
        }
    }

    #[test]
    fn test_negative_derived_values_decode() {
        let mut writer = header_bits(ShapeTag::None, PayloadFlags::PARENT);
        writer.write_gamma_non_negative(2).unwrap();
        writer.write_gamma_signed(-3).unwrap();
        let record = decode(0, &writer.finish()).unwrap();
        assert_eq!(record.parent_id, Some(-1));

        let mut writer = header_bits(
            ShapeTag::None,
            PayloadFlags::OFFSET | PayloadFlags::REAL_OFFSET,
        );
        writer.write_gamma_non_negative(0).unwrap();
        writer.write_gamma_non_negative(2).unwrap();
        writer.write_gamma_positive(1).unwrap();
        writer.write_gamma_signed(-5).unwrap();
        writer.write_gamma_positive(1).unwrap();
        let record = decode(0, &writer.finish()).unwrap();
        assert_eq!(record.offset, Some(Offset { start: 2, end: 2 }));
        assert_eq!(record.real_offset, Some(Offset { start: -3, end: -3 }));
    }

    #[test]
    fn test_oversized_id_without_suffix_is_exhausted() {
        // Zero prefix too long for 64 bits, cut off inside the suffix.
        let mut writer = header_bits(ShapeTag::None, PayloadFlags::empty());
        writer.write_zeros(70);
        writer.write_bit(true);
        let bytes = writer.finish();
        assert_eq!(bytes.len(), 10);

        let err = decode(0, &bytes).unwrap_err();
        assert!(err.is_stream_exhausted(), "unexpected error: {err}");
    }

    #[test]
    fn test_failure_hides_partial_record() {
        let mut decoder = PayloadDecoder::new();
        let good = crate::encode(&PayloadRecord::new(4, PositionShape::Single(1)), 1).unwrap();
        decoder.decode(1, &good).unwrap();
        assert!(decoder.record().is_some());

        // Header announces trailing bytes but there are none.
        let mut writer = header_bits(ShapeTag::Single, PayloadFlags::PAYLOAD);
        writer.write_gamma_non_negative(4).unwrap();
        let err = decoder.decode(1, &writer.finish()).unwrap_err();
        assert!(err.is_stream_exhausted());
        assert!(decoder.record().is_none());
        assert!(decoder.header().is_none());
    }

    #[test]
    fn test_decoder_reuses_buffers() {
        let first = PayloadRecord::new(1, PositionShape::Set(vec![5, 7, 30, 31, 90]))
            .with_payload(vec![1u8; 64]);
        let second = PayloadRecord::new(2, PositionShape::Set(vec![5, 9])).with_payload([7u8]);
        let first_bytes = crate::encode(&first, 5).unwrap();
        let second_bytes = crate::encode(&second, 5).unwrap();

        let mut decoder = PayloadDecoder::new();
        assert_eq!(decoder.decode(5, &first_bytes).unwrap(), &first);
        let (points_capacity, payload_capacity) = match decoder.record() {
            Some(PayloadRecord {
                position: PositionShape::Set(points),
                payload: Some(payload),
                ..
            }) => (points.capacity(), payload.capacity()),
            other => panic!("unexpected record: {other:?}"),
        };

        let decoded = decoder.decode(5, &second_bytes).unwrap();
        assert_eq!(decoded, &second);
        match decoded {
            PayloadRecord {
                position: PositionShape::Set(points),
                payload: Some(payload),
                ..
            } => {
                assert_eq!(points.capacity(), points_capacity);
                assert_eq!(payload.capacity(), payload_capacity);
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }
}
