// vim: tw=80
//! Argument matching and mismatch diagnostics
#![deny(warnings)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering}
};
use testdouble::*;
use testdouble::matcher::*;

#[derive(Debug, PartialEq)]
struct Dep {
    id: u32,
}

fn mock() -> MockObject {
    MockObject::from_descriptor(InterfaceDescriptor::new("Foo")
        .method("foo", 1)
        .method("bar", 2))
}

fn mismatches(e: MockError) -> Vec<ArgumentMismatch> {
    match e {
        MockError::UnexpectedCall(UnexpectedCall {
            reason: UnexpectedReason::ArgumentMismatch(m), ..
        }) => m,
        e => panic!("Unexpected error {:?}", e)
    }
}

#[test]
fn equality() {
    let mut mock = mock();
    mock.expect_call("foo").unwrap().with(["bar"]).return_const(1);
    assert_eq!(mock.call("foo", args!["bar"]).unwrap(), Value::Int(1));
    let e = mock.call("foo", args!["baz"]).unwrap_err();
    let m = mismatches(e);
    assert_eq!(m.len(), 1);
    assert_eq!(m[0].position, Some(0));
    assert_eq!(m[0].expected, "eq(\"bar\")");
    assert_eq!(m[0].actual, "\"baz\"");
    mock.checkpoint().unwrap_err();
}

/// Each expectation explains why it rejected the call
#[test]
fn diagnose_every_expectation() {
    let mut mock = mock();
    mock.expect_call("bar").unwrap().with([eq(1), eq(2)]);
    mock.expect_call("bar").unwrap().with([ge(10), anything()]);
    let e = mock.call("bar", args![1, 3]).unwrap_err();
    let msg = e.to_string();
    assert!(msg.starts_with("MockFoo::bar: No matching expectation found"),
            "{}", msg);
    assert!(msg.contains("Expectation(eq(1), eq(2)): argument 1 expected \
                         eq(2), got 3"), "{}", msg);
    assert!(msg.contains("Expectation(ge(10), <anything>): argument 0 \
                         expected ge(10), got 1"), "{}", msg);
    assert_eq!(mismatches(e).len(), 2);
    mock.checkpoint().unwrap_err();
}

#[test]
fn identical_instance() {
    let first = Arc::new(Dep { id: 1 });
    let second = Arc::new(Dep { id: 1 });
    let mut mock = mock();
    mock.expect_call("foo").unwrap()
        .with([identical(first.clone())])
        .return_const(true);
    assert_eq!(mock.call("foo", args![first]).unwrap(), Value::Bool(true));
    mock.call("foo", args![second]).unwrap_err();
    mock.checkpoint().unwrap_err();
}

/// Equal but distinct instances match by equality
#[test]
fn equal_instances() {
    let mut mock = mock();
    mock.expect_call("foo").unwrap()
        .with([Value::object(Dep { id: 1 })]);
    mock.call("foo", args![Arc::new(Dep { id: 1 })]).unwrap();
    mock.call("foo", args![Arc::new(Dep { id: 2 })]).unwrap_err();
    mock.checkpoint().unwrap_err();
}

#[test]
fn instance_of_type() {
    let mut mock = mock();
    mock.expect_call("foo").unwrap()
        .with([instance_of::<Dep>()])
        .returning(|args| {
            let id = args[0].as_object()
                .and_then(|o| o.downcast_ref::<Dep>())
                .map(|dep| dep.id);
            Ok(Value::from(id))
        });
    assert_eq!(mock.call("foo", args![Arc::new(Dep { id: 9 })]).unwrap(),
               Value::Int(9));
    mock.call("foo", args!["Dep"]).unwrap_err();
    mock.checkpoint().unwrap_err();
}

/// A fault raised by a matcher is returned to the caller, not swallowed
#[test]
fn callback_fault() {
    let mut mock = mock();
    mock.expect_call("foo").unwrap()
        .with([try_function(|_| Err(Fault::msg("matcher failed")))]);
    let e = mock.call("foo", args![1]).unwrap_err();
    assert_eq!(e.to_string(), "matcher failed");
    assert!(e.fault().is_some());
}

#[test]
fn function_matcher() {
    let mut mock = mock();
    mock.expect_call("foo").unwrap()
        .with([function(|v| v.as_i64().map_or(false, |i| i % 2 == 0))]);
    mock.call("foo", args![4]).unwrap();
    mock.call("foo", args![5]).unwrap_err();
    mock.checkpoint().unwrap_err();
}

/// A rejected call runs each callback matcher only once
#[test]
fn function_matcher_runs_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    let mut mock = mock();
    mock.expect_call("foo").unwrap()
        .with([function(move |_| {
            c.fetch_add(1, Ordering::Relaxed);
            false
        })]);
    let m = mismatches(mock.call("foo", args![1]).unwrap_err());
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert_eq!(m[0].expected, "<function>");
    mock.checkpoint().unwrap_err();
}

#[test]
fn predicates_crate() {
    let mut mock = mock();
    mock.expect_call("foo").unwrap()
        .with([matcher::predicate(predicate::in_iter(args![1, 2, 3]))]);
    mock.call("foo", args![2]).unwrap();
    let e = mock.call("foo", args![4]).unwrap_err();
    assert!(mismatches(e)[0].tree.is_some());
    mock.checkpoint().unwrap_err();
}

#[test]
fn withf() {
    let mut mock = mock();
    mock.expect_call("bar").unwrap()
        .withf(|args| args[0] == args[1]);
    mock.call("bar", args!["a", "a"]).unwrap();
    let m = mismatches(mock.call("bar", args!["a", "b"]).unwrap_err());
    assert_eq!(m[0].position, None);
    assert_eq!(m[0].actual, "(\"a\", \"b\")");
    mock.checkpoint().unwrap_err();
}

#[test]
fn multiple_args() {
    let mut mock = mock();
    mock.expect_call("bar").unwrap()
        .once()
        .with([contains("foo"), ge(100)]);
    mock.call("bar", args!["foobar", 100.5]).unwrap();
}
