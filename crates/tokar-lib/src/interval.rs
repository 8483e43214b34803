//! Closed integer intervals over the code-point domain, plus their set algebra.
//!
//! Intervals are inclusive on both ends. The domain edges are represented by
//! the [`Interval::MIN`] / [`Interval::MAX`] sentinels, which stand in for
//! "open towards negative/positive infinity": the wildcard `.` matches
//! `[MIN, MAX]`, and negation results that touch the domain edge keep the
//! sentinel bound.

use std::fmt;

/// A closed code-point range `[start, end]`.
///
/// `start <= end` holds for every non-empty interval; [`Interval::EMPTY`] is
/// the one sanctioned exception (`start > end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval {
    pub start: i32,
    pub end: i32,
}

impl Interval {
    /// Domain-open lower bound.
    pub const MIN: i32 = i32::MIN;

    /// Domain-open upper bound.
    pub const MAX: i32 = i32::MAX;

    /// The empty interval. Matches nothing.
    pub const EMPTY: Interval = Interval { start: 0, end: -1 };

    /// The domain-spanning interval. Matches any code point (wildcard `.`).
    pub const FULL: Interval = Interval {
        start: Self::MIN,
        end: Self::MAX,
    };

    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Single-code-point interval.
    pub fn of(c: char) -> Self {
        let cp = c as i32;
        Self { start: cp, end: cp }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn is_full(&self) -> bool {
        self.start == Self::MIN && self.end == Self::MAX
    }

    pub fn contains(&self, point: i32) -> bool {
        self.start <= point && point <= self.end
    }

    /// Two intervals overlap when they share at least one point.
    pub fn intersects(&self, other: &Interval) -> bool {
        !self.is_empty() && !other.is_empty() && self.start <= other.end && other.start <= self.end
    }

    pub fn intersection(&self, other: &Interval) -> Interval {
        if self.intersects(other) {
            Interval::new(self.start.max(other.start), self.end.min(other.end))
        } else {
            Interval::EMPTY
        }
    }

    /// Whether `other` overlaps or is adjacent to `self`, so the two can be
    /// coalesced into one interval.
    fn touches(&self, other: &Interval) -> bool {
        // Widened to i64 so `end + 1` cannot overflow at MAX.
        i64::from(self.start) <= i64::from(other.end) + 1
            && i64::from(other.start) <= i64::from(self.end) + 1
    }

    /// Domain complement of a single interval.
    ///
    /// Yields zero intervals for [`Interval::FULL`], the full domain for
    /// [`Interval::EMPTY`], one interval when `self` touches a domain edge,
    /// and two disjoint intervals otherwise.
    pub fn negate(&self) -> Vec<Interval> {
        if self.is_empty() {
            return vec![Interval::FULL];
        }
        if self.is_full() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(2);
        if self.start != Self::MIN {
            out.push(Interval::new(Self::MIN, self.start - 1));
        }
        if self.end != Self::MAX {
            out.push(Interval::new(self.end + 1, Self::MAX));
        }
        out
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "∅");
        }
        if self.is_full() {
            return write!(f, "·");
        }
        if self.start == self.end {
            return write!(f, "{}", format_bound(self.start));
        }
        write!(f, "{}..{}", format_bound(self.start), format_bound(self.end))
    }
}

fn format_bound(point: i32) -> String {
    if point == Interval::MIN {
        return "min".to_string();
    }
    if point == Interval::MAX {
        return "max".to_string();
    }
    match u32::try_from(point).ok().and_then(char::from_u32) {
        Some(c) if !c.is_control() && !c.is_whitespace() => format!("'{c}'"),
        _ => format!("#{point:x}"),
    }
}

/// An ordered set of pairwise-disjoint, non-touching intervals.
///
/// Maintained in normalized form: sorted by `start`, no overlaps, adjacent
/// intervals coalesced. This is the shape the negation remover and the
/// disambiguator rely on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Insert an interval, merging it with any overlapping or touching
    /// members to keep the set normalized.
    pub fn add(&mut self, interval: Interval) {
        if interval.is_empty() {
            return;
        }
        let mut merged = interval;
        let mut out = Vec::with_capacity(self.intervals.len() + 1);
        let mut placed = false;
        for existing in self.intervals.drain(..) {
            if existing.touches(&merged) {
                merged = Interval::new(
                    merged.start.min(existing.start),
                    merged.end.max(existing.end),
                );
            } else if existing.end < merged.start {
                out.push(existing);
            } else {
                if !placed {
                    out.push(merged);
                    placed = true;
                }
                out.push(existing);
            }
        }
        if !placed {
            out.push(merged);
        }
        self.intervals = out;
    }

    pub fn union(&mut self, other: &IntervalSet) {
        for interval in &other.intervals {
            self.add(*interval);
        }
    }

    /// Domain complement: the gaps between members, bounded by the
    /// [`Interval::MIN`] / [`Interval::MAX`] sentinels.
    pub fn complement(&self) -> IntervalSet {
        let mut out = IntervalSet::new();
        if self.intervals.is_empty() {
            out.add(Interval::FULL);
            return out;
        }
        let first = self.intervals[0];
        if first.start != Interval::MIN {
            out.add(Interval::new(Interval::MIN, first.start - 1));
        }
        for pair in self.intervals.windows(2) {
            let gap = Interval::new(pair[0].end + 1, pair[1].start - 1);
            out.add(gap);
        }
        let last = self.intervals[self.intervals.len() - 1];
        if last.end != Interval::MAX {
            out.add(Interval::new(last.end + 1, Interval::MAX));
        }
        out
    }
}

impl FromIterator<Interval> for IntervalSet {
    fn from_iter<I: IntoIterator<Item = Interval>>(iter: I) -> Self {
        let mut set = IntervalSet::new();
        for interval in iter {
            set.add(interval);
        }
        set
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, interval) in self.intervals.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{interval}")?;
        }
        write!(f, "}}")
    }
}
