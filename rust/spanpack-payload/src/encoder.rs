//! Payload encoding, the index-build counterpart of [`crate::decoder`].

use spanpack_bits::{bitstream::BitWriter, elias_gamma::EliasGammaWrite};
use spanpack_common::{Result, error::Error, verify_arg};

use crate::{
    header::{PayloadFlags, PayloadHeader, ShapeTag},
    position::PositionShape,
    record::{Offset, PayloadRecord},
};

/// How a position shape goes onto the wire once canonicalized.
enum PositionPlan<'a> {
    None,
    Single,
    Range { length: u64 },
    Set { points: &'a [u64] },
}

impl PositionPlan<'_> {
    fn tag(&self) -> ShapeTag {
        match self {
            PositionPlan::None => ShapeTag::None,
            PositionPlan::Single => ShapeTag::Single,
            PositionPlan::Range { .. } => ShapeTag::Range,
            PositionPlan::Set { .. } => ShapeTag::Set,
        }
    }
}

/// Reusable payload encoder.
///
/// The encoder validates the record while writing it. A record is rejected with
/// `InvalidArgument` when:
/// - its position does not begin at the start position,
/// - a range ends before it starts, or a set is not strictly ascending,
/// - an offset ends before it starts,
/// - an offset start stored absolute (the analyzed one, or a real one on its
///   own) is negative,
/// - the payload is present but empty (it could not be told apart from a
///   truncated buffer),
/// - a delta between two values does not fit in `i64`.
///
/// Position shapes are written in canonical form: a one-point range or set is
/// written as `Single`, a gap-free set as `Range`.
#[derive(Debug)]
pub struct PayloadEncoder {
    writer: BitWriter,
}

impl PayloadEncoder {
    /// Initial buffer capacity, enough for a typical payload without trailing bytes.
    pub const DEFAULT_CAPACITY: usize = 32;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        PayloadEncoder {
            writer: BitWriter::with_capacity(capacity),
        }
    }

    /// Encodes `record` relative to `start_position` into a new buffer.
    pub fn encode(&mut self, record: &PayloadRecord, start_position: u64) -> Result<Vec<u8>> {
        let mut target = Vec::new();
        self.encode_into(record, start_position, &mut target)?;
        Ok(target)
    }

    /// Encodes `record` relative to `start_position`, appending the bytes to `target`.
    /// On failure `target` is left untouched.
    pub fn encode_into(
        &mut self,
        record: &PayloadRecord,
        start_position: u64,
        target: &mut Vec<u8>,
    ) -> Result<()> {
        self.writer.clear();
        if let Err(e) = self.write_record(record, start_position) {
            log::debug!("rejected payload record {} at {start_position}: {e}", record.id);
            self.writer.clear();
            return Err(e);
        }
        self.writer.finish_into(target);
        Ok(())
    }

    fn write_record(&mut self, record: &PayloadRecord, start_position: u64) -> Result<()> {
        let plan = plan_position(&record.position, start_position)?;

        let mut flags = PayloadFlags::empty();
        flags.set(PayloadFlags::OFFSET, record.offset.is_some());
        flags.set(PayloadFlags::REAL_OFFSET, record.real_offset.is_some());
        flags.set(PayloadFlags::PARENT, record.parent_id.is_some());
        flags.set(PayloadFlags::PAYLOAD, record.payload.is_some());
        PayloadHeader::new(plan.tag(), flags).write(&mut self.writer);

        let writer = &mut self.writer;
        writer.write_gamma_non_negative(record.id)?;

        match plan {
            PositionPlan::None | PositionPlan::Single => {}
            PositionPlan::Range { length } => writer.write_gamma_positive(length)?,
            PositionPlan::Set { points } => {
                writer.write_gamma_positive(points.len() as u64)?;
                for pair in points.windows(2) {
                    writer.write_gamma_positive(pair[1] - pair[0])?;
                }
            }
        }

        match (record.offset, record.real_offset) {
            (Some(offset), real_offset) => {
                let length = span_length(offset, "offset")?;
                writer.write_gamma_non_negative(absolute_start(offset, "offset")?)?;
                writer.write_gamma_positive(length)?;
                if let Some(real_offset) = real_offset {
                    let length = span_length(real_offset, "real_offset")?;
                    let delta = real_offset.start.checked_sub(offset.start).ok_or_else(|| {
                        Error::invalid_arg("real_offset", "delta does not fit in i64")
                    })?;
                    writer.write_gamma_signed(delta)?;
                    writer.write_gamma_positive(length)?;
                }
            }
            (None, Some(real_offset)) => {
                let length = span_length(real_offset, "real_offset")?;
                writer.write_gamma_non_negative(absolute_start(real_offset, "real_offset")?)?;
                writer.write_gamma_positive(length)?;
            }
            (None, None) => {}
        }

        if let Some(parent_id) = record.parent_id {
            writer.write_gamma_signed(signed_delta(record.id, parent_id, "parent_id")?)?;
        }

        if let Some(payload) = &record.payload {
            verify_arg!(payload, !payload.is_empty());
            writer.write_bytes_aligned(payload);
        }
        Ok(())
    }
}

impl Default for PayloadEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn plan_position(shape: &PositionShape, start_position: u64) -> Result<PositionPlan<'_>> {
    match shape {
        PositionShape::None => Ok(PositionPlan::None),
        PositionShape::Single(position) => {
            verify_arg!(position, *position == start_position);
            Ok(PositionPlan::Single)
        }
        PositionShape::Range { start, end } => {
            verify_arg!(position, *start == start_position);
            verify_arg!(position, end >= start);
            if start == end {
                return Ok(PositionPlan::Single);
            }
            let length = (end - start)
                .checked_add(1)
                .ok_or_else(|| Error::invalid_arg("position", "range too long"))?;
            Ok(PositionPlan::Range { length })
        }
        PositionShape::Set(points) => {
            let (&first, &last) = match (points.first(), points.last()) {
                (Some(first), Some(last)) => (first, last),
                _ => return Err(Error::invalid_arg("position", "empty position set")),
            };
            verify_arg!(position, first == start_position);
            verify_arg!(position, points.windows(2).all(|pair| pair[0] < pair[1]));
            if points.len() == 1 {
                Ok(PositionPlan::Single)
            } else if last - first == points.len() as u64 - 1 {
                Ok(PositionPlan::Range {
                    length: points.len() as u64,
                })
            } else {
                Ok(PositionPlan::Set { points })
            }
        }
    }
}

fn span_length(span: Offset, name: &str) -> Result<u64> {
    verify_arg!(span, span.end >= span.start);
    span.end
        .abs_diff(span.start)
        .checked_add(1)
        .ok_or_else(|| Error::invalid_arg(name, "span too long"))
}

fn absolute_start(span: Offset, name: &str) -> Result<u64> {
    u64::try_from(span.start)
        .map_err(|_| Error::invalid_arg(name, "start must not be negative"))
}

/// `to - from` as a signed delta.
fn signed_delta(from: u64, to: i64, name: &str) -> Result<i64> {
    i64::try_from(i128::from(to) - i128::from(from))
        .map_err(|_| Error::invalid_arg(name, "delta does not fit in i64"))
}

/// Encodes a single record into a new buffer.
///
/// Use a [`PayloadEncoder`] when encoding many records in a loop.
pub fn encode(record: &PayloadRecord, start_position: u64) -> Result<Vec<u8>> {
    PayloadEncoder::new().encode(record, start_position)
}
