// vim: tw=80
use fragile::Fragile;
use std::{
    error::Error,
    fmt::{self, Debug, Display},
    sync::{Arc, Mutex}
};
use tracing::trace;

use crate::{
    MockError,
    error::ArgumentMismatch,
    lock,
    matcher::Matcher,
    sequence::{SeqHandle, Sequence},
    stub::{Exhaustion, Stub},
    times::{Cardinality, Times},
    value::{Fault, Value}
};

/// How an expectation decides whether a call's arguments are acceptable.
enum ArgMatcher {
    /// Any arguments, of any arity.
    Any,
    /// One matcher per positional argument.
    Each(Vec<Matcher>),
    /// A predicate over the whole argument list.
    Func(Box<dyn Fn(&[Value]) -> bool + Send + Sync>),
}

impl Display for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArgMatcher::Any => f.write_str("<anything>"),
            ArgMatcher::Each(matchers) => {
                for (i, m) in matchers.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", m)?;
                }
                Ok(())
            },
            ArgMatcher::Func(_) => f.write_str("<function>"),
        }
    }
}

/// A rule for one method of a mock object: which arguments it accepts, how
/// many times it must be called, and what it returns.
///
/// Expectations are created by
/// [`MockObject::expect_call`](crate::MockObject::expect_call) and configured
/// with chained calls.  Unless told otherwise, an expectation accepts any
/// arguments, any number of times, and returns [`Value::Null`].
pub struct Expectation {
    method: String,
    matcher: ArgMatcher,
    times: Times,
    stub: Mutex<Stub>,
    seq_handle: Option<SeqHandle>,
}

impl Expectation {
    pub(crate) fn new(method: &str) -> Self {
        Expectation {
            method: method.to_owned(),
            matcher: ArgMatcher::Any,
            times: Times::default(),
            stub: Mutex::new(Stub::Default),
            seq_handle: None
        }
    }

    /// Name of the method this expectation applies to.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// How many calls have been matched so far.
    pub fn call_count(&self) -> usize {
        self.times.count()
    }

    pub fn cardinality(&self) -> Cardinality {
        self.times.cardinality()
    }

    /// Has the minimum call count been reached?
    pub fn is_satisfied(&self) -> bool {
        self.times.is_satisfied()
    }

    /// Human readable description of the argument matchers.
    pub fn describe(&self) -> String {
        self.matcher.to_string()
    }

    /// Match `args` against this expectation.  Returns the reasons they were
    /// rejected, which is empty if they were accepted.
    ///
    /// Every matcher runs exactly once.  An error raised by a callback matcher
    /// is returned as is.
    pub(crate) fn check(&self, args: &[Value])
        -> Result<Vec<ArgumentMismatch>, Fault>
    {
        let mismatch = |position, expected, actual, tree| ArgumentMismatch {
            expectation: self.describe(),
            position,
            expected,
            actual,
            tree
        };
        let rejected = match &self.matcher {
            ArgMatcher::Any => Vec::new(),
            ArgMatcher::Func(f) if f(args) => Vec::new(),
            ArgMatcher::Func(_) => vec![mismatch(None,
                "<function>".to_owned(), display_list(args), None)],
            ArgMatcher::Each(matchers) if matchers.len() != args.len() => {
                vec![mismatch(None,
                    format!("{} argument(s)", matchers.len()),
                    format!("{} argument(s)", args.len()),
                    None)]
            },
            ArgMatcher::Each(matchers) => {
                let mut rejected = Vec::new();
                for (i, (m, a)) in matchers.iter().zip(args).enumerate() {
                    if !m.matches(a)? {
                        rejected.push(mismatch(Some(i), m.to_string(),
                            a.to_string(), m.rejection_tree(a)));
                    }
                }
                rejected
            }
        };
        Ok(rejected)
    }

    pub(crate) fn is_never(&self) -> bool {
        self.times.is_never()
    }

    /// Has the maximum call count been reached?
    pub(crate) fn is_done(&self) -> bool {
        self.times.is_done()
    }

    /// Is it this expectation's turn according to its sequence, if any?
    pub(crate) fn in_turn(&self) -> bool {
        self.seq_handle.as_ref().map_or(true, SeqHandle::verify)
    }

    /// Count one call against this expectation's cardinality.  Returns false
    /// if the expectation is already exhausted.
    pub(crate) fn try_call(&self) -> bool {
        if !self.times.try_call() {
            return false;
        }
        if self.times.is_satisfied() {
            if let Some(handle) = &self.seq_handle {
                handle.satisfy();
            }
        }
        true
    }

    /// Run the stub for a call that this expectation has accepted.
    pub(crate) fn respond(&self, args: &[Value]) -> Result<Value, MockError> {
        trace!(method = %self.method, expectation = %self.matcher,
               count = self.times.count(), "expectation matched");
        let action = lock(&self.stub).next_action(&self.method);
        action.run(args)
    }

    fn set_stub(&mut self, stub: Stub) -> &mut Self {
        *lock(&self.stub) = stub;
        self
    }

    /// Add this expectation to a [`Sequence`].
    ///
    /// The call count must already be exact, e.g. set with
    /// [`once`](#method.once) or [`times`](#method.times).
    pub fn in_sequence(&mut self, seq: &mut Sequence) -> &mut Self {
        assert!(self.times.cardinality().is_exact(),
            "Only Expectations with an exact call count have sequences");
        self.seq_handle = Some(seq.next_handle());
        self
    }

    /// Forbid this expectation from ever being called.
    pub fn never(&mut self) -> &mut Self {
        self.times(Cardinality::Never)
    }

    /// Expect this expectation to be called exactly once.  Shortcut for
    /// [`times(1)`](#method.times).
    pub fn once(&mut self) -> &mut Self {
        self.times(Cardinality::Exactly(1))
    }

    /// Set the call count constraint.
    ///
    /// Either a [`Cardinality`] or a number of calls, in which case the
    /// expectation must be called exactly that many times.  `times(0)` is the
    /// same as [`never`](#method.never).
    pub fn times<C: Into<Cardinality>>(&mut self, c: C) -> &mut Self {
        self.times.set(c.into());
        self
    }

    /// Allow this expectation to be called any number of times
    ///
    /// This behavior is the default, but the method is provided in case the
    /// default behavior changes.
    pub fn times_any(&mut self) -> &mut Self {
        self.times(Cardinality::AnyNumber)
    }

    pub fn at_least_once(&mut self) -> &mut Self {
        self.times(Cardinality::AtLeastOnce)
    }

    pub fn at_least(&mut self, n: usize) -> &mut Self {
        self.times(Cardinality::AtLeast(n))
    }

    pub fn at_most(&mut self, n: usize) -> &mut Self {
        self.times(Cardinality::AtMost(n))
    }

    /// Set one matcher per argument.  The call must have exactly as many
    /// arguments as there are matchers.
    ///
    /// Plain values are converted into equality matchers, so
    /// `with(["bar"])` is the same as `with([matcher::eq("bar")])`.
    pub fn with<I, M>(&mut self, matchers: I) -> &mut Self
        where I: IntoIterator<Item = M>,
              M: Into<Matcher>
    {
        let matchers = matchers.into_iter().map(Into::into).collect();
        self.matcher = ArgMatcher::Each(matchers);
        self
    }

    /// Set a matching function for the whole argument list.
    pub fn withf<F>(&mut self, f: F) -> &mut Self
        where F: Fn(&[Value]) -> bool + Send + Sync + 'static
    {
        self.matcher = ArgMatcher::Func(Box::new(f));
        self
    }

    /// Return a constant value from the `Expectation`
    pub fn return_const<V: Into<Value>>(&mut self, v: V) -> &mut Self {
        self.set_stub(Stub::Value(v.into()))
    }

    /// Return [`Value::Null`], the default for unconfigured methods.
    pub fn return_default(&mut self) -> &mut Self {
        self.set_stub(Stub::Default)
    }

    /// Return each value in turn, one per call.  Once the values run out,
    /// further calls fail with [`MockError::SequenceExhausted`].
    pub fn return_sequence<I, V>(&mut self, values: I) -> &mut Self
        where I: IntoIterator<Item = V>,
              V: Into<Value>
    {
        self.return_sequence_then(values, Exhaustion::Fail)
    }

    /// Like [`return_sequence`](#method.return_sequence), with an explicit
    /// policy for calls made after the values run out.
    pub fn return_sequence_then<I, V>(&mut self, values: I,
                                      on_exhausted: Exhaustion) -> &mut Self
        where I: IntoIterator<Item = V>,
              V: Into<Value>
    {
        let values = values.into_iter().map(Into::into).collect();
        self.set_stub(Stub::Sequence{values, cursor: 0, on_exhausted})
    }

    /// Raise `e` on every matched call.  The same error value is returned
    /// each time, as [`MockError::Thrown`].
    pub fn throwing<E>(&mut self, e: E) -> &mut Self
        where E: Error + Send + Sync + 'static
    {
        self.throwing_fault(Fault::new(e))
    }

    pub fn throwing_fault(&mut self, fault: Fault) -> &mut Self {
        self.set_stub(Stub::Throw(fault))
    }

    /// Supply a closure that will compute the return value.  It receives the
    /// call's arguments verbatim.  An `Err` it returns becomes
    /// [`MockError::Thrown`].
    pub fn returning<F>(&mut self, f: F) -> &mut Self
        where F: FnMut(&[Value]) -> Result<Value, Fault> + Send + 'static
    {
        self.set_stub(Stub::Callback(Arc::new(Mutex::new(Box::new(f)))))
    }

    /// Single-threaded version of [`returning`](#method.returning).  Can be
    /// used when the closure isn't `Send`.
    ///
    /// It is a runtime error to call the mock method from a different thread
    /// than the one that originally called this method.
    pub fn returning_st<F>(&mut self, f: F) -> &mut Self
        where F: FnMut(&[Value]) -> Result<Value, Fault> + 'static
    {
        let mut fragile = Fragile::new(f);
        self.returning(move |args| (fragile.get_mut())(args))
    }
}

impl Debug for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("method", &self.method)
            .field("matcher", &self.matcher.to_string())
            .field("cardinality", &self.times.cardinality())
            .field("calls", &self.times.count())
            .finish()
    }
}

fn display_list(args: &[Value]) -> String {
    let args = args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    format!("({})", args.join(", "))
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::matcher::*;

    #[test]
    fn arity_must_match() {
        let mut e = Expectation::new("foo");
        e.with(["bar"]);
        assert!(!e.check(&[]).unwrap().is_empty());
        assert!(e.check(&[Value::from("bar")]).unwrap().is_empty());
        assert!(!e.check(&[Value::from("bar"), Value::Null]).unwrap().is_empty());
    }

    #[test]
    fn no_matchers_accept_any_arity() {
        let e = Expectation::new("foo");
        assert!(e.check(&[]).unwrap().is_empty());
        assert!(e.check(&[Value::Int(1), Value::Int(2)]).unwrap().is_empty());
    }

    #[test]
    fn withf() {
        let mut e = Expectation::new("foo");
        e.withf(|args| args.len() == 2 && args[0] == args[1]);
        assert!(e.check(&[Value::Int(1), Value::Int(1)]).unwrap().is_empty());
        assert!(!e.check(&[Value::Int(1), Value::Int(2)]).unwrap().is_empty());
        assert_eq!(e.describe(), "<function>");
    }

    #[test]
    fn check_reports_failing_positions() {
        let mut e = Expectation::new("foo");
        e.with(vec![contains("foo"), ge(100), anything()]);
        let args = [Value::from("bar"), Value::from(101), Value::Null];
        let mismatches = e.check(&args).unwrap();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].position, Some(0));
        assert_eq!(mismatches[0].actual, "\"bar\"");
        assert!(mismatches[0].tree.is_some());
    }

    /// Callback matchers run once per call, even when the call is rejected
    #[test]
    fn check_runs_each_matcher_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut e = Expectation::new("foo");
        e.with(vec![
            function(move |_| {
                c.fetch_add(1, Ordering::Relaxed);
                false
            }),
            eq(1)
        ]);
        let mismatches = e.check(&[Value::Null, Value::Int(2)]).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[0].expected, "<function>");
        assert!(mismatches[0].tree.is_some());
        assert_eq!(mismatches[1].position, Some(1));
    }

    #[test]
    fn check_arity() {
        let mut e = Expectation::new("foo");
        e.with(["bar"]);
        let mismatches = e.check(&[]).unwrap();
        assert_eq!(mismatches[0].position, None);
        assert_eq!(mismatches[0].expected, "1 argument(s)");
    }

    #[test]
    fn try_call_respects_cardinality() {
        let mut e = Expectation::new("foo");
        e.once();
        assert!(e.try_call());
        assert!(!e.try_call());
        assert_eq!(e.call_count(), 1);
        assert!(e.is_satisfied());
    }

    #[test]
    fn returning_counts_with_state() {
        let mut e = Expectation::new("foo");
        let mut total = 0;
        e.returning(move |args| {
            total += args[0].as_i64().unwrap_or(0);
            Ok(Value::Int(total))
        });
        assert_eq!(e.respond(&[Value::Int(5)]).unwrap(), Value::Int(5));
        assert_eq!(e.respond(&[Value::Int(5)]).unwrap(), Value::Int(10));
    }

    #[test]
    fn returning_st() {
        use std::rc::Rc;
        let mut e = Expectation::new("foo");
        let rc = Rc::new(42);
        e.returning_st(move |_| Ok(Value::Int(*rc)));
        assert_eq!(e.respond(&[]).unwrap(), Value::Int(42));
    }

    #[test]
    #[should_panic(expected = "Only Expectations with an exact call count")]
    fn in_sequence_requires_exact_count() {
        let mut seq = Sequence::new();
        let mut e = Expectation::new("foo");
        e.at_least_once().in_sequence(&mut seq);
    }
}
