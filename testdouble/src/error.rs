// vim: tw=80
//! Failures reported by mock objects.

use std::fmt::{self, Display};
use thiserror::Error;

use crate::{
    invocation::Invocation,
    value::Fault,
    verify::Violations
};

/// Result type alias for mock operations
pub type Result<T> = std::result::Result<T, MockError>;

/// Everything that can go wrong while configuring, calling or verifying a mock.
#[derive(Clone, Debug, Error)]
pub enum MockError {
    /// A call that no expectation allowed.
    #[error(transparent)]
    UnexpectedCall(#[from] UnexpectedCall),

    /// One or more expectations were violated.  Reported all at once.
    #[error("{0}")]
    Unsatisfied(Violations),

    /// The error a stub was configured to raise.  This is not a fault of the
    /// mock framework, and is passed to the caller unchanged.
    #[error(transparent)]
    Thrown(Fault),

    /// Invalid mock or expectation configuration.
    #[error("invalid mock configuration: {0}")]
    Construction(String),

    /// A value sequence ran out and its exhaustion policy is
    /// [`Exhaustion::Fail`](crate::Exhaustion::Fail).
    #[error("{method}: return sequence of {len} value(s) is exhausted")]
    SequenceExhausted {
        method: String,
        len: usize
    },

    /// A returned value could not be converted into the method's return type.
    #[error("expected a return value of type {expected}, got {actual}")]
    ReturnType {
        expected: &'static str,
        actual: String
    },
}

impl MockError {
    /// The configured fault, if this error was deliberately raised by a stub
    /// or matcher callback.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            MockError::Thrown(f) => Some(f),
            _ => None
        }
    }

    pub fn is_unexpected_call(&self) -> bool {
        matches!(self, MockError::UnexpectedCall(_))
    }

    pub(crate) fn construction<S: Into<String>>(msg: S) -> Self {
        MockError::Construction(msg.into())
    }
}

impl From<Fault> for MockError {
    fn from(f: Fault) -> Self {
        MockError::Thrown(f)
    }
}

/// A call to a mock object that was not permitted.
#[derive(Clone, Debug, Error)]
#[error("{mock}::{}: {reason} (call #{} with {})", .invocation.method(),
        .invocation.seq(), .invocation.display_args())]
pub struct UnexpectedCall {
    pub mock: String,
    pub invocation: Invocation,
    pub reason: UnexpectedReason,
}

/// Why a call was rejected.
#[derive(Clone, Debug)]
pub enum UnexpectedReason {
    /// The method is neither declared by the interface nor added.
    UnknownMethod,
    /// The call's argument count differs from the declared arity.
    Arity { expected: usize },
    /// A strict mock has no expectation for this method.
    NotConfigured,
    /// The matching expectation must never be called.
    Forbidden { expectation: String },
    /// Every matching expectation has reached its maximum call count.
    Exhausted { expectation: String, calls: usize },
    /// The matching expectation was called before its predecessors in a
    /// [`Sequence`](crate::Sequence) were satisfied.
    OutOfSequence { expectation: String },
    /// No expectation accepted the arguments.
    ArgumentMismatch(Vec<ArgumentMismatch>),
}

impl Display for UnexpectedReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnexpectedReason::UnknownMethod => f.write_str("no such method"),
            UnexpectedReason::Arity{expected} =>
                write!(f, "method takes {} argument(s)", expected),
            UnexpectedReason::NotConfigured =>
                f.write_str("No matching expectation found"),
            UnexpectedReason::Forbidden{expectation} =>
                write!(f, "Expectation({}) should not have been called",
                       expectation),
            UnexpectedReason::Exhausted{expectation, calls} =>
                write!(f, "Expectation({}) already called {} time(s)",
                       expectation, calls),
            UnexpectedReason::OutOfSequence{expectation} =>
                write!(f, "Expectation({}) called out of sequence",
                       expectation),
            UnexpectedReason::ArgumentMismatch(mismatches) => {
                f.write_str("No matching expectation found")?;
                for m in mismatches {
                    write!(f, "\n{}", m)?;
                }
                Ok(())
            }
        }
    }
}

/// One expectation's verdict on one argument of a rejected call.
#[derive(Clone, Debug)]
pub struct ArgumentMismatch {
    /// Description of the expectation that rejected the call.
    pub expectation: String,
    /// Zero-based argument position, or `None` when the whole argument list
    /// was rejected (wrong arity or a `withf` predicate).
    pub position: Option<usize>,
    pub expected: String,
    pub actual: String,
    /// Rendering of the failed predicate as a case tree.
    pub tree: Option<String>,
}

impl Display for ArgumentMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.position {
            Some(i) => write!(f, "  Expectation({}): argument {} expected {}, \
                                  got {}",
                              self.expectation, i, self.expected, self.actual)?,
            None => write!(f, "  Expectation({}): expected {}, got {}",
                           self.expectation, self.expected, self.actual)?,
        }
        if let Some(tree) = &self.tree {
            for line in tree.lines() {
                write!(f, "\n    {}", line)?;
            }
        }
        Ok(())
    }
}
