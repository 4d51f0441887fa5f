//! Byte-level source positions.
use std::{convert::TryInto, fmt};

/// A byte range within a source, kept as a compact `(start, end)` pair of
/// offsets. The range is half-open: `start` is covered, `end` is not.
#[derive(Debug, Eq, Hash, Clone, Copy, PartialEq)]
pub struct Span(u32, u32);

impl Span {
    /// Build a span over the byte range `start..end`.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(end >= start, "span ends ({end}) before it starts ({start})");

        Span(start.try_into().unwrap(), end.try_into().unwrap())
    }

    /// Stretch this span up to the end of a later one. When `end` does not
    /// in fact lie past this span, `self` comes back unchanged.
    #[must_use]
    pub fn join(&self, end: Self) -> Self {
        if self.end() <= end.start() {
            return Span::new(self.start(), end.end());
        }

        *self
    }

    /// The offset of the first covered byte.
    pub fn start(&self) -> usize {
        self.0.try_into().unwrap()
    }

    /// The offset one past the last covered byte.
    pub fn end(&self) -> usize {
        self.1.try_into().unwrap()
    }

    /// How many bytes the span covers.
    pub fn size(&self) -> usize {
        self.end() - self.start()
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}
