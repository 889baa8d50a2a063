// vim: tw=80
//! Proc Macros for use with testdouble
//!
//! You probably don't want to use this crate directly.  Instead, use its
//! reexports via the [`testdouble`](../testdouble/index.html) crate.

extern crate proc_macro;

mod mockable;
use crate::mockable::do_mockable;

/// Declare a trait as a mockable interface.
///
/// The trait is kept as is.  In addition, the attribute
/// * implements `testdouble::Interface` for `dyn Trait`, describing each
///   method and its number of arguments,
/// * implements the trait for `testdouble::MockObject<dyn Trait>`, and
/// * defines `type MockTrait = MockObject<dyn Trait>`.
///
/// Every method must take `&self` or `&mut self`, have no generic
/// parameters, and name each of its arguments.  Arguments are converted with
/// `Value::from`, and return values with `FromValue`.
///
/// A method returning `Result<T, E>` returns framework failures as `Err`,
/// which requires `E: From<MockError>`.  Any other method panics on failure,
/// just like it would on an unexpected call.
///
/// # Examples
/// ```
/// # use testdouble::*;
/// #[mockable]
/// trait Foo {
///     fn foo(&self, x: i64) -> i64;
///     fn bar(&self) -> std::result::Result<String, MockError>;
/// }
///
/// let mut mock = MockFoo::new();
/// mock.expect_call("foo").unwrap().return_const(42);
/// assert_eq!(42, mock.foo(1));
/// // Methods without expectations return the zero value
/// assert_eq!("", mock.bar().unwrap());
/// ```
///
/// A constructor arity may be declared, for use with
/// `MockBuilder::with_constructor_args`:
/// ```
/// # use testdouble::*;
/// #[mockable(constructor = 2)]
/// trait Foo {
///     fn foo(&self);
/// }
/// let mock = MockBuilder::<dyn Foo>::new()
///     .with_constructor_args(args![100, 200])
///     .build()
///     .unwrap();
/// assert_eq!(mock.constructor_args().unwrap().len(), 2);
/// ```
#[proc_macro_attribute]
pub fn mockable(attrs: proc_macro::TokenStream,
                input: proc_macro::TokenStream) -> proc_macro::TokenStream
{
    do_mockable(attrs.into(), input.into()).into()
}
