//! Range arithmetic
//!
//! Ranges over any totally ordered copyable value (remaining durations,
//! UTC date/times, counters). Each end may be unbounded and each bounded
//! end is either inclusive or exclusive. Ranges are normalized on
//! construction: a range whose upper bound precedes its lower bound, or a
//! degenerate range that is not closed on both sides, is the empty range.

use std::cmp::Ordering;
use std::fmt;

/// A possibly empty range with optional bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range<T> {
    lower: Option<T>,
    upper: Option<T>,
    lower_inclusive: bool,
    upper_inclusive: bool,
    empty: bool,
}

impl<T: Copy + Ord> Range<T> {
    /// The empty range
    pub fn empty() -> Self {
        Self {
            lower: None,
            upper: None,
            lower_inclusive: false,
            upper_inclusive: false,
            empty: true,
        }
    }

    /// The range covering every value
    pub fn unbounded() -> Self {
        Self::new(None, None, false, false)
    }

    /// Create a range, `None` meaning unbounded on that side
    pub fn new(
        lower: Option<T>,
        upper: Option<T>,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> Self {
        let lower_inclusive = lower_inclusive && lower.is_some();
        let upper_inclusive = upper_inclusive && upper.is_some();
        if let (Some(l), Some(u)) = (lower, upper) {
            match l.cmp(&u) {
                Ordering::Greater => return Self::empty(),
                Ordering::Equal if !(lower_inclusive && upper_inclusive) => {
                    return Self::empty()
                }
                _ => {}
            }
        }
        Self {
            lower,
            upper,
            lower_inclusive,
            upper_inclusive,
            empty: false,
        }
    }

    /// `[lower, upper]`
    pub fn closed(lower: T, upper: T) -> Self {
        Self::new(Some(lower), Some(upper), true, true)
    }

    /// `[lower, upper)`
    pub fn half_open(lower: T, upper: T) -> Self {
        Self::new(Some(lower), Some(upper), true, false)
    }

    /// `[value, value]`
    pub fn point(value: T) -> Self {
        Self::closed(value, value)
    }

    /// `[lower, upper)`, or the point `[lower, lower]` when both bounds are equal.
    ///
    /// Estimated ranges never vanish because their bounds met.
    pub fn collapsing(lower: Option<T>, upper: Option<T>) -> Self {
        match (lower, upper) {
            (Some(l), Some(u)) if l == u => Self::point(l),
            _ => Self::new(lower, upper, true, false),
        }
    }

    /// Is the range empty?
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Lower bound, `None` if unbounded or empty
    pub fn lower(&self) -> Option<T> {
        if self.empty {
            None
        } else {
            self.lower
        }
    }

    /// Upper bound, `None` if unbounded or empty
    pub fn upper(&self) -> Option<T> {
        if self.empty {
            None
        } else {
            self.upper
        }
    }

    /// Is the lower bound inclusive?
    pub fn is_lower_inclusive(&self) -> bool {
        self.lower_inclusive
    }

    /// Is the upper bound inclusive?
    pub fn is_upper_inclusive(&self) -> bool {
        self.upper_inclusive
    }

    /// Both ends bounded and not empty
    pub fn is_bounded(&self) -> bool {
        !self.empty && self.lower.is_some() && self.upper.is_some()
    }

    /// The single value of a degenerate `[v, v]` range
    pub fn as_point(&self) -> Option<T> {
        match (self.lower(), self.upper()) {
            (Some(l), Some(u)) if l == u => Some(l),
            _ => None,
        }
    }

    /// Does the range contain `value`?
    pub fn contains(&self, value: T) -> bool {
        if self.empty {
            return false;
        }
        let above_lower = match self.lower {
            None => true,
            Some(l) if self.lower_inclusive => l <= value,
            Some(l) => l < value,
        };
        let below_upper = match self.upper {
            None => true,
            Some(u) if self.upper_inclusive => value <= u,
            Some(u) => value < u,
        };
        above_lower && below_upper
    }

    /// Do both ranges share at least one value?
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.intersection(other).is_empty()
    }

    /// Intersection of two ranges
    pub fn intersection(&self, other: &Self) -> Self {
        if self.empty || other.empty {
            return Self::empty();
        }

        let (lower, lower_inclusive) = match (self.lower, other.lower) {
            (None, _) => (other.lower, other.lower_inclusive),
            (_, None) => (self.lower, self.lower_inclusive),
            (Some(a), Some(b)) => match a.cmp(&b) {
                Ordering::Greater => (Some(a), self.lower_inclusive),
                Ordering::Less => (Some(b), other.lower_inclusive),
                Ordering::Equal => (Some(a), self.lower_inclusive && other.lower_inclusive),
            },
        };
        let (upper, upper_inclusive) = match (self.upper, other.upper) {
            (None, _) => (other.upper, other.upper_inclusive),
            (_, None) => (self.upper, self.upper_inclusive),
            (Some(a), Some(b)) => match a.cmp(&b) {
                Ordering::Less => (Some(a), self.upper_inclusive),
                Ordering::Greater => (Some(b), other.upper_inclusive),
                Ordering::Equal => (Some(a), self.upper_inclusive && other.upper_inclusive),
            },
        };

        Self::new(lower, upper, lower_inclusive, upper_inclusive)
    }

    /// Project the range through a monotonically increasing function,
    /// keeping the inclusivity of each end
    pub fn map<U: Copy + Ord>(&self, f: impl Fn(T) -> U) -> Range<U> {
        if self.empty {
            return Range::empty();
        }
        Range::new(
            self.lower.map(&f),
            self.upper.map(&f),
            self.lower_inclusive,
            self.upper_inclusive,
        )
    }
}

impl<T: Copy + Ord> Default for Range<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Copy + Ord + fmt::Display> fmt::Display for Range<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.empty {
            return write!(f, "empty");
        }
        let open = if self.lower_inclusive { '[' } else { '(' };
        let close = if self.upper_inclusive { ']' } else { ')' };
        match self.lower {
            Some(l) => write!(f, "{}{}", open, l)?,
            None => write!(f, "{}-oo", open)?,
        }
        match self.upper {
            Some(u) => write!(f, ",{}{}", u, close),
            None => write!(f, ",+oo{}", close),
        }
    }
}
