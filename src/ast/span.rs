use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A half-open byte-span `[start, end)` into the **raw** markup.
///
/// Offsets are measured in bytes (UTF-8), so a span can slice the input
/// directly even when the text contains multi-byte Unicode.
///
/// IMPORTANT: Spans are defined over the *pre-normalization* input bytes.
/// Fragments parsed out of a larger document carry their absolute base
/// offset so that diagnostics keep pointing into the original markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Hash)]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

impl Span {
    #[inline]
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "Span start must be <= end");
        Self { start, end }
    }

    /// Builds a span from `usize` offsets, the unit the scanners work in.
    #[inline]
    pub fn from_range(start: usize, end: usize) -> Self {
        Self::new(start as u64, end as u64)
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    #[inline]
    pub fn contains(&self, pos: u64) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Returns a span that covers both `self` and `other`.
    #[inline]
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Shifts a fragment-relative span to an absolute one.
    #[inline]
    pub fn offset(self, base: usize) -> Span {
        Span {
            start: self.start + base as u64,
            end: self.end + base as u64,
        }
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// The text covered by this span.
    ///
    /// The span must have been produced against `src`.
    #[inline]
    pub fn slice<'a>(&self, src: &'a str) -> &'a str {
        &src[self.range()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_and_offset() {
        let src = "ab{{c}}d";
        let span = Span::from_range(2, 7);
        assert_eq!(span.slice(src), "{{c}}");
        assert_eq!(span.len(), 5);
        assert_eq!(span.offset(10), Span::new(12, 17));
        assert!(span.contains(2));
        assert!(!span.contains(7));
    }

    #[test]
    fn cover_spans_both() {
        let a = Span::new(3, 5);
        let b = Span::new(1, 4);
        assert_eq!(a.cover(b), Span::new(1, 5));
        assert!(Span::new(4, 4).is_empty());
    }
}
