//! The decoded form of one occurrence payload.

use serde::{Deserialize, Serialize};

use crate::position::PositionShape;

/// A character span, both bounds inclusive.
///
/// Bounds are signed: a real offset stored as a delta from the analyzed offset
/// may decode to a negative start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    pub start: i64,
    pub end: i64,
}

impl Offset {
    pub fn new(start: i64, end: i64) -> Self {
        debug_assert!(end >= start);
        Offset { start, end }
    }

    /// Number of characters covered by the span, zero if `end` precedes `start`.
    pub fn len(&self) -> u64 {
        if self.end < self.start {
            0
        } else {
            self.end.abs_diff(self.start).saturating_add(1)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Metadata of a single indexed occurrence, as carried by a posting payload.
///
/// A record is transient: it is decoded from a posting's raw bytes together with
/// the posting's start position, used by the caller, and dropped. Only the encoded
/// bytes are ever stored.
///
/// Occurrences reference each other through `parent_id`, forming a forest over the
/// occurrences of a document that hierarchical span queries walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadRecord {
    /// Identifier of the occurrence, unique within its document.
    pub id: u64,

    /// Identifier of the enclosing occurrence, if any. Stored as a signed delta
    /// from `id`, so an arbitrary buffer may decode to a negative value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,

    /// Token positions covered by the occurrence.
    #[serde(default)]
    pub position: PositionShape,

    /// Character span in the analyzed text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Offset>,

    /// Character span in the original text, before normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_offset: Option<Offset>,

    /// Application-defined bytes; when present on the wire they fill the rest of
    /// the buffer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
}

impl PayloadRecord {
    pub fn new(id: u64, position: PositionShape) -> Self {
        PayloadRecord {
            id,
            position,
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_offset(mut self, start: i64, end: i64) -> Self {
        self.offset = Some(Offset::new(start, end));
        self
    }

    pub fn with_real_offset(mut self, start: i64, end: i64) -> Self {
        self.real_offset = Some(Offset::new(start, end));
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn has_parent(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Returns the record with its position in canonical form.
    ///
    /// Decoding an encoded record always yields the canonical form.
    pub fn canonical(mut self) -> Self {
        self.position = std::mem::take(&mut self.position).canonical();
        self
    }
}
