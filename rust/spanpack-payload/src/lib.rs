//! Per-occurrence posting payloads for annotated token indexes.
//!
//! Every indexed occurrence (a word, a span, a node of an annotation tree) carries a
//! small payload in its posting. The payload packs the occurrence metadata into a
//! bit stream of Elias Gamma coded fields:
//!
//! 1. a seven bit [`header`] announcing the position shape and the optional fields,
//! 2. the occurrence id,
//! 3. the position shape relative to the posting's start position,
//! 4. the analyzed offset and/or the real offset,
//! 5. the parent id as a signed delta from the id,
//! 6. opaque payload bytes filling the rest of the buffer.
//!
//! # Quick Start
//!
//! ```rust
//! use spanpack_payload::{PayloadRecord, PositionShape, decode, encode};
//!
//! let record = PayloadRecord::new(0, PositionShape::Single(7))
//!     .with_parent(3)
//!     .with_payload(*b"AB");
//! let bytes = encode(&record, 7).unwrap();
//! assert_eq!(decode(7, &bytes).unwrap(), record);
//! ```

pub mod decoder;
pub mod encoder;
pub mod header;
pub mod position;
pub mod record;

pub use decoder::{PayloadDecoder, decode};
pub use encoder::{PayloadEncoder, encode};
pub use header::{PayloadFlags, PayloadHeader, ShapeTag, peek_header};
pub use position::PositionShape;
pub use record::{Offset, PayloadRecord};
