// vim: tw=80
//! Verification of expectations at the end of a test.
//!
//! Verification never stops at the first problem.  Every unsatisfied
//! expectation and every unexpected call is collected into a single
//! [`Violations`] report.

use std::fmt::{self, Display};
use tracing::warn;

use crate::{
    error::{MockError, Result, UnexpectedCall},
    mock::MockObject,
    times::Cardinality
};

/// A single way in which a mock was misused.
#[derive(Clone, Debug)]
pub enum Violation {
    /// An expectation was called fewer times than its cardinality requires.
    Unsatisfied {
        mock: String,
        method: String,
        /// Description of the expectation's argument matchers.
        expectation: String,
        expected: Cardinality,
        calls: usize,
    },
    /// A call that was rejected when it was made.
    Unexpected(UnexpectedCall),
}

impl Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Violation::Unsatisfied{mock, method, expectation, expected, calls}
                => write!(f,
                    "{}::{}: Expectation({}) called {} time(s) which is fewer \
                    than expected {}",
                    mock, method, expectation, calls, expected.min()),
            Violation::Unexpected(uc) => write!(f, "{}", uc),
        }
    }
}

/// Every violation found by one verification.
#[derive(Clone, Debug, Default)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    /// Just the unsatisfied expectations.
    pub fn unsatisfied(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
            .filter(|v| matches!(v, Violation::Unsatisfied{..}))
    }

    /// Just the unexpected calls.
    pub fn unexpected(&self) -> impl Iterator<Item = &UnexpectedCall> {
        self.0.iter()
            .filter_map(|v| match v {
                Violation::Unexpected(uc) => Some(uc),
                _ => None
            })
    }
}

impl Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} mock violation(s):", self.0.len())?;
        for (i, v) in self.0.iter().enumerate() {
            write!(f, "\n{}. ", i + 1)?;
            // Indent continuation lines of multi-line diagnoses
            for (j, line) in v.to_string().lines().enumerate() {
                if j > 0 {
                    write!(f, "\n   ")?;
                }
                f.write_str(line)?;
            }
        }
        Ok(())
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Collects violations from one or more mock objects, so that a test can
/// verify all of its mocks with a single report.
///
/// # Examples
/// ```
/// # use testdouble::*;
/// let desc = InterfaceDescriptor::new("Clock").method("now", 0);
/// let mut a = MockObject::from_descriptor(desc.clone());
/// let b = MockObject::from_descriptor(desc);
/// a.expect_call("now").unwrap().once();
///
/// let err = Verifier::new()
///     .check(&a)
///     .check(&b)
///     .finish()
///     .unwrap_err();
/// assert!(err.to_string().contains("MockClock::now"));
/// # a.checkpoint().unwrap_err();
/// ```
#[derive(Debug, Default)]
pub struct Verifier {
    violations: Vec<Violation>,
}

impl Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the violations of `mock` to the report.
    pub fn check<I: ?Sized>(mut self, mock: &MockObject<I>) -> Self {
        mock.collect_violations(&mut self.violations);
        mock.mark_verified();
        self
    }

    /// The violations collected so far.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Succeed if no violation was found, or report all of them at once.
    pub fn finish(self) -> Result<()> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            let violations = Violations(self.violations);
            warn!(count = violations.len(), "mock verification failed");
            Err(MockError::Unsatisfied(violations))
        }
    }
}
