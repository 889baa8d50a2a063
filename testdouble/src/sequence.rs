// vim: tw=80
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering}
};

/// An expectation's place in a [`Sequence`].
#[derive(Debug)]
pub(crate) struct SeqHandle {
    inner: Arc<SeqInner>,
    seq: usize
}

impl SeqHandle {
    /// Tell the Sequence that this expectation has been fully satisfied
    pub fn satisfy(&self) {
        self.inner.satisfy(self.seq);
    }

    /// Is it this expectation's turn to be called?
    pub fn verify(&self) -> bool {
        self.inner.verify(self.seq)
    }
}

#[derive(Debug, Default)]
struct SeqInner {
    satisfaction_level: AtomicUsize,
}

impl SeqInner {
    /// Record the call identified by `seq` as fully satisfied.
    fn satisfy(&self, seq: usize) {
        // Only the expectation whose turn it is can advance the sequence.
        let _ = self.satisfaction_level.compare_exchange(seq, seq + 1,
            Ordering::AcqRel, Ordering::Acquire);
    }

    fn verify(&self, seq: usize) -> bool {
        seq == self.satisfaction_level.load(Ordering::Acquire)
    }
}

/// Used to enforce that mock calls must happen in the sequence specified.
///
/// Each expectation must expect to be called a fixed number of times.  Once
/// satisfied, the next expectation in the sequence will expect to be called.
/// A sequence may span several mock objects.
///
/// # Examples
/// ```
/// # use testdouble::*;
/// let mut seq = Sequence::new();
/// let desc = InterfaceDescriptor::new("Door")
///     .method("open", 0)
///     .method("close", 0);
/// let mut mock = MockBuilder::from_descriptor(desc).build().unwrap();
/// mock.expect_call("open").unwrap()
///     .once()
///     .in_sequence(&mut seq);
/// mock.expect_call("close").unwrap()
///     .once()
///     .in_sequence(&mut seq);
///
/// assert!(mock.call("close", args![]).unwrap_err().is_unexpected_call());
/// mock.call("open", args![]).unwrap();
/// mock.call("close", args![]).unwrap();
/// # mock.checkpoint().unwrap_err();
/// ```
#[derive(Debug, Default)]
pub struct Sequence {
    inner: Arc<SeqInner>,
    next_seq: usize,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_handle(&mut self) -> SeqHandle {
        let handle = SeqHandle{inner: self.inner.clone(), seq: self.next_seq};
        self.next_seq += 1;
        handle
    }
}
