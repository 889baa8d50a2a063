// vim: tw=80
//! Check on mock object drop if method calls are satisfied
//! and panic if there are too few or too many calls
#![deny(warnings)]

use testdouble::*;

#[mockable]
pub trait Foo {
    fn foo(&self);
}

#[test]
fn expectation_satisfied() {
    let mut foo_mock = MockFoo::default();
    foo_mock.expect_call("foo").unwrap()
        .times(1);

    foo_mock.foo();
}

#[test]
#[should_panic(expected = "MockFoo::foo: Expectation(<anything>) called 0 time(s) which is fewer than expected 1")]
fn too_few_calls() {
    let mut foo_mock = MockFoo::default();
    foo_mock.expect_call("foo").unwrap()
        .times(1);
}

#[test]
#[should_panic(expected = "MockFoo::foo: Expectation(<anything>) already called 1 time(s)")]
fn too_many_calls() {
    let mut foo_mock = MockFoo::default();
    foo_mock.expect_call("foo").unwrap()
        .times(1);

    foo_mock.foo();
    foo_mock.foo();
}

/// All violations are reported together
#[test]
#[should_panic(expected = "2 mock violation(s)")]
fn aggregate() {
    let mut foo_mock = MockFoo::default();
    foo_mock.expect_call("foo").unwrap()
        .with([1])
        .once();
    foo_mock.expect_call("foo").unwrap()
        .with([2])
        .once();
}

#[test]
fn verified_mock_is_not_checked_again() {
    let mut foo_mock = MockFoo::default();
    foo_mock.expect_call("foo").unwrap()
        .times(1);

    foo_mock.verify().unwrap_err();
}

#[test]
fn checkpoint() {
    let mut foo_mock = MockFoo::default();
    foo_mock.expect_call("foo").unwrap()
        .times(1);
    foo_mock.foo();
    foo_mock.checkpoint().unwrap();

    foo_mock.expect_call("foo").unwrap()
        .never();
}

#[test]
#[should_panic(expected = "fewer than expected 2")]
fn checkpoint_then_drop() {
    let mut foo_mock = MockFoo::default();
    foo_mock.checkpoint().unwrap();

    foo_mock.expect_call("foo").unwrap()
        .times(2);
}
