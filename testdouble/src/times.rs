// vim: tw=80
use std::{
    fmt::{self, Display},
    sync::atomic::{AtomicUsize, Ordering}
};

/// How many times an expectation must be called.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Cardinality {
    Never,
    Exactly(usize),
    AtLeastOnce,
    AtLeast(usize),
    AtMost(usize),
    #[default]
    AnyNumber,
}

impl Cardinality {
    /// Minimum number of calls needed to satisfy the expectation.
    pub fn min(&self) -> usize {
        match self {
            Cardinality::Never | Cardinality::AtMost(_)
                | Cardinality::AnyNumber => 0,
            Cardinality::Exactly(n) | Cardinality::AtLeast(n) => *n,
            Cardinality::AtLeastOnce => 1,
        }
    }

    /// Maximum number of calls allowed, if any.
    pub fn max(&self) -> Option<usize> {
        match self {
            Cardinality::Never => Some(0),
            Cardinality::Exactly(n) | Cardinality::AtMost(n) => Some(*n),
            Cardinality::AtLeastOnce | Cardinality::AtLeast(_)
                | Cardinality::AnyNumber => None,
        }
    }

    /// Does this cardinality require an exact number of calls?
    pub fn is_exact(&self) -> bool {
        self.max() == Some(self.min())
    }
}

impl Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cardinality::Never => f.write_str("never"),
            Cardinality::Exactly(n) => write!(f, "exactly {}", n),
            Cardinality::AtLeastOnce => f.write_str("at least once"),
            Cardinality::AtLeast(n) => write!(f, "at least {}", n),
            Cardinality::AtMost(n) => write!(f, "at most {}", n),
            Cardinality::AnyNumber => f.write_str("any number of times"),
        }
    }
}

impl From<usize> for Cardinality {
    fn from(n: usize) -> Self {
        if n == 0 {
            Cardinality::Never
        } else {
            Cardinality::Exactly(n)
        }
    }
}

/// Call counter for a single expectation.
#[derive(Debug, Default)]
pub(crate) struct Times {
    /// How many times has the expectation already been called?
    count: AtomicUsize,
    cardinality: Cardinality,
}

impl Times {
    /// Count one call, unless the maximum has already been reached.
    ///
    /// Returns false, without counting, if the expectation is exhausted.
    pub fn try_call(&self) -> bool {
        let max = self.cardinality.max();
        self.count.fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
            match max {
                Some(m) if c >= m => None,
                _ => Some(c + 1)
            }
        }).is_ok()
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Has this expectation already been called the maximum allowed number of
    /// times?
    pub fn is_done(&self) -> bool {
        self.cardinality.max()
            .map_or(false, |m| self.count() >= m)
    }

    /// Is the expectation forbidden from ever being called?
    pub fn is_never(&self) -> bool {
        self.cardinality.max() == Some(0)
    }

    /// Has this expectation already been called the minimum required number of
    /// times?
    pub fn is_satisfied(&self) -> bool {
        self.count() >= self.cardinality.min()
    }

    pub fn set(&mut self, cardinality: Cardinality) {
        self.cardinality = cardinality;
    }
}

#[cfg(test)]
mod t {
    use super::*;

    fn times(c: Cardinality) -> Times {
        let mut t = Times::default();
        t.set(c);
        t
    }

    #[test]
    fn exactly() {
        let t = times(Cardinality::Exactly(2));
        assert!(!t.is_satisfied());
        assert!(t.try_call());
        assert!(t.try_call());
        assert!(t.is_satisfied());
        assert!(t.is_done());
        assert!(!t.try_call());
        assert_eq!(t.count(), 2);
    }

    #[test]
    fn never() {
        let t = times(Cardinality::Never);
        assert!(t.is_satisfied());
        assert!(t.is_done());
        assert!(!t.try_call());
    }

    #[test]
    fn at_least_once() {
        let t = times(Cardinality::AtLeastOnce);
        assert!(!t.is_satisfied());
        for _ in 0..10 {
            assert!(t.try_call());
        }
        assert!(t.is_satisfied());
        assert!(!t.is_done());
    }

    #[test]
    fn from_usize() {
        assert_eq!(Cardinality::from(0), Cardinality::Never);
        assert_eq!(Cardinality::from(3), Cardinality::Exactly(3));
        assert!(Cardinality::Exactly(3).is_exact());
        assert!(Cardinality::Never.is_exact());
        assert!(!Cardinality::AtMost(3).is_exact());
    }
}
