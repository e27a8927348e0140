//! Position shapes of an indexed occurrence.
//!
//! An occurrence covers one or more token positions of a field. The payload stores
//! the shape of that coverage relative to the posting's own position (the
//! *start position*), which the caller always knows from the postings list.
//!
//! # Shapes
//!
//! ## Single
//! The occurrence sits on exactly the start position. Costs no payload bits.
//!
//! ## Range
//! A contiguous run of positions beginning at the start position. Only the run
//! length is stored.
//!
//! ## Set
//! An arbitrary strictly ascending set of positions beginning at the start
//! position. The point count and the gaps between consecutive points are stored.
//!
//! ## None
//! The occurrence carries no position information at all.

use serde::{Deserialize, Serialize};

/// The positions covered by an occurrence.
///
/// All bounds are inclusive. A well-formed shape satisfies `end >= start` for
/// [`PositionShape::Range`], and holds at least two strictly increasing points in
/// [`PositionShape::Set`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionShape {
    /// No position information.
    #[default]
    None,

    /// A single position.
    Single(u64),

    /// All positions from `start` through `end`, inclusive.
    Range { start: u64, end: u64 },

    /// A strictly ascending list of positions, such as `[10, 12, 17]`.
    Set(Vec<u64>),
}

impl PositionShape {
    /// Creates a range shape, collapsing a one-position range to `Single`.
    pub fn range(start: u64, end: u64) -> Self {
        debug_assert!(end >= start);
        if start == end {
            PositionShape::Single(start)
        } else {
            PositionShape::Range { start, end }
        }
    }

    /// Builds the most compact shape covering exactly the given positions.
    ///
    /// The positions are sorted and deduplicated first. No positions yield `None`,
    /// one yields `Single`, a gap-free run yields `Range` and anything else `Set`.
    pub fn from_points(points: &[u64]) -> Self {
        let mut points = points.to_vec();
        points.sort_unstable();
        points.dedup();
        Self::from_sorted(points)
    }

    fn from_sorted(points: Vec<u64>) -> Self {
        match points.as_slice() {
            [] => PositionShape::None,
            [single] => PositionShape::Single(*single),
            [first, .., last] if last - first == points.len() as u64 - 1 => {
                PositionShape::Range {
                    start: *first,
                    end: *last,
                }
            }
            _ => PositionShape::Set(points),
        }
    }

    /// Returns the canonical form of this shape, the one the payload encoder
    /// writes and the decoder reproduces.
    pub fn canonical(self) -> Self {
        match self {
            PositionShape::Range { start, end } if start == end => PositionShape::Single(start),
            PositionShape::Set(points) => Self::from_sorted(points),
            other => other,
        }
    }

    /// Returns true if the shape carries no position information.
    pub fn is_none(&self) -> bool {
        matches!(self, PositionShape::None)
    }

    /// First covered position.
    pub fn start(&self) -> Option<u64> {
        match self {
            PositionShape::None => None,
            PositionShape::Single(position) => Some(*position),
            PositionShape::Range { start, .. } => Some(*start),
            PositionShape::Set(points) => points.first().copied(),
        }
    }

    /// Last covered position.
    pub fn end(&self) -> Option<u64> {
        match self {
            PositionShape::None => None,
            PositionShape::Single(position) => Some(*position),
            PositionShape::Range { end, .. } => Some(*end),
            PositionShape::Set(points) => points.last().copied(),
        }
    }

    /// Number of covered positions. A range whose end precedes its start covers none.
    pub fn len(&self) -> u64 {
        match self {
            PositionShape::None => 0,
            PositionShape::Single(_) => 1,
            PositionShape::Range { start, end } => {
                end.checked_sub(*start).map_or(0, |d| d.saturating_add(1))
            }
            PositionShape::Set(points) => points.len() as u64,
        }
    }

    /// Returns true if no position is covered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks whether `position` is covered by this shape.
    pub fn contains(&self, position: u64) -> bool {
        match self {
            PositionShape::None => false,
            PositionShape::Single(single) => *single == position,
            PositionShape::Range { start, end } => (*start..=*end).contains(&position),
            PositionShape::Set(points) => points.binary_search(&position).is_ok(),
        }
    }

    /// Returns an iterator over all covered positions in ascending order.
    pub fn points(&self) -> Box<dyn Iterator<Item = u64> + '_> {
        match self {
            PositionShape::None => Box::new(std::iter::empty()),
            PositionShape::Single(position) => Box::new(std::iter::once(*position)),
            PositionShape::Range { start, end } => Box::new(*start..=*end),
            PositionShape::Set(points) => Box::new(points.iter().copied()),
        }
    }
}
