// vim: tw=80
//! A minimal mock object library.
//!
//! Testdouble creates mock objects of explicitly declared interfaces.  A mock
//! records every call made to it, answers each call with a preprogrammed
//! response, and checks at the end of the test that it was called the way the
//! test expected.
//!
//! # Usage
//!
//! There are two ways to declare the interface of a mock.  The easiest is the
//! [`#[mockable]`](mockable) attribute on a trait, which makes the mock
//! implement that trait.  The other is an [`InterfaceDescriptor`] built at
//! runtime, which is useful for interfaces that don't exist as Rust traits.
//!
//! Whichever method is used, the basic idea is the same.
//! * Create a mock object with [`create_mock`], [`MockObject::new`], or a
//!   [`MockBuilder`].
//! * Set expectations on the mock.  Each expectation can have argument
//!   matchers, a call count, a position in a [`Sequence`], and a response.
//! * Supply the mock to the code that you're testing.
//! * Verify the mock, or let it verify itself when it is dropped.
//!
//! # User Guide
//!
//! * [`Getting started`](#getting-started)
//! * [`Return values`](#return-values)
//! * [`Matching arguments`](#matching-arguments)
//! * [`Call counts`](#call-counts)
//! * [`Sequences`](#sequences)
//! * [`Mock builder`](#mock-builder)
//! * [`Verification`](#verification)
//!
//! ## Getting Started
//! ```
//! use testdouble::*;
//!
//! #[mockable]
//! trait MyTrait {
//!     fn foo(&self, x: u32) -> u32;
//! }
//!
//! fn call_with_four(x: &dyn MyTrait) -> u32 {
//!     x.foo(4)
//! }
//!
//! let mut mock = MockMyTrait::new();
//! mock.expect_call("foo").unwrap()
//!     .with([4])
//!     .times(1)
//!     .return_const(5);
//! assert_eq!(5, call_with_four(&mock));
//! ```
//!
//! The same mock can be made without a trait.  Calls are then made by name,
//! with [`Value`] arguments:
//! ```
//! # use testdouble::*;
//! let desc = InterfaceDescriptor::new("MyTrait").method("foo", 1);
//! let mut mock = MockObject::from_descriptor(desc);
//! mock.expect_call("foo").unwrap()
//!     .with([4])
//!     .return_const(5);
//! assert_eq!(mock.call("foo", args![4]).unwrap(), Value::Int(5));
//! ```
//!
//! ## Return values
//!
//! A method with no expectations returns [`Value::Null`], which converts into
//! the default of most return types.  An expectation can return a constant,
//! a sequence of values, an error, or the result of a closure.
//! ```
//! # use testdouble::*;
//! # let desc = InterfaceDescriptor::new("Foo").method("foo", 1);
//! # let mut mock = MockObject::from_descriptor(desc);
//! mock.expect_call("foo").unwrap()
//!     .with([matcher::ge(0)])
//!     .returning(|args| Ok(args[0].clone()));
//! mock.expect_call("foo").unwrap()
//!     .throwing_fault(Fault::msg("negative"));
//! assert_eq!(mock.call("foo", args![10]).unwrap(), Value::Int(10));
//! assert_eq!(mock.call("foo", args![-1]).unwrap_err().to_string(),
//!            "negative");
//! ```
//!
//! [`return_sequence`](Expectation::return_sequence) returns its values in
//! order.  What happens after the last one is chosen with an [`Exhaustion`]
//! policy; by default the call fails.
//!
//! ## Matching arguments
//!
//! [`with`](Expectation::with) takes one [`Matcher`] per argument.  Plain
//! values match by equality.  The [`matcher`] module has the rest, and any
//! [`Predicate`] from the `predicates` crate works too.
//! ```
//! # use testdouble::*;
//! use testdouble::matcher::*;
//! # let desc = InterfaceDescriptor::new("Foo").method("foo", 3);
//! # let mut mock = MockObject::from_descriptor(desc);
//! mock.expect_call("foo").unwrap()
//!     .with([contains("foo"), ge(100), anything()]);
//! mock.call("foo", args!["foobar", 101, ()]).unwrap();
//! ```
//!
//! An argument that no expectation accepts causes an [`UnexpectedCall`] that
//! explains, for every expectation, which argument didn't match.
//!
//! ## Call counts
//!
//! By default an expectation may be called any number of times.  Use
//! [`once`](Expectation::once), [`times`](Expectation::times),
//! [`never`](Expectation::never), [`at_least`](Expectation::at_least) and
//! friends to require something else.  An expectation that has been called
//! its maximum number of times no longer matches; if nothing else does, the
//! extra call fails.
//!
//! ## Sequences
//!
//! By default expectations may be matched in any order.  A [`Sequence`]
//! enforces an order, even across mocks.  See its documentation.
//!
//! ## Mock builder
//!
//! [`MockBuilder`] can restrict interception to an allow-list of methods, add
//! methods the interface doesn't declare, pass constructor arguments or
//! disable the constructor, and make the mock strict.
//!
//! ## Verification
//!
//! [`MockObject::verify`] reports every unsatisfied expectation and every
//! unexpected call at once.  A mock that hasn't been verified verifies itself
//! when dropped, and panics on failure.
//! ```should_panic
//! # use testdouble::*;
//! # let desc = InterfaceDescriptor::new("Foo").method("foo", 0);
//! let mut mock = MockObject::from_descriptor(desc);
//! mock.expect_call("foo").unwrap().once();
//! // Panics: MockFoo::foo was never called
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

mod builder;
mod error;
mod expectation;
mod interface;
mod invocation;
pub mod matcher;
mod mock;
mod sequence;
mod stub;
mod times;
mod value;
mod verify;

pub use builder::{MockBuilder, MockConfig, Strictness};
pub use error::{
    ArgumentMismatch, MockError, Result, UnexpectedCall, UnexpectedReason
};
pub use expectation::Expectation;
pub use interface::{
    Constructor, ConstructorHook, Dynamic, Interface, InterfaceDescriptor,
    MethodDecl
};
pub use invocation::Invocation;
pub use matcher::Matcher;
pub use mock::{MockObject, create_mock};
pub use predicates::prelude::{Predicate, predicate};
pub use sequence::Sequence;
pub use stub::Exhaustion;
pub use testdouble_derive::mockable;
pub use times::Cardinality;
pub use value::{Fault, FromValue, Object, ObjectRef, Value};
pub use verify::{Verifier, Violation, Violations};

/// Lock a mutex, ignoring poison.  A panic in one test thread must not hide
/// the mock's state from verification.
pub(crate) fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
