// vim: tw=80
//! Call counts and return values of expectations
#![deny(warnings)]

use testdouble::*;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("boom")]
struct Boom;

fn counter() -> MockObject {
    MockObject::from_descriptor(InterfaceDescriptor::new("Counter")
        .method("incr", 1)
        .method("get", 0))
}

mod times {
    use super::*;

    #[test]
    fn exactly() {
        let mut mock = counter();
        mock.expect_call("get").unwrap().times(2);
        mock.call("get", args![]).unwrap();
        mock.call("get", args![]).unwrap();
        mock.verify().unwrap();
    }

    /// The (n+1)th call fails immediately, and verification reports it too.
    #[test]
    fn too_many() {
        let mut mock = counter();
        mock.expect_call("get").unwrap().times(2);
        mock.call("get", args![]).unwrap();
        mock.call("get", args![]).unwrap();
        let e = mock.call("get", args![]).unwrap_err();
        assert_eq!(e.to_string(), "MockCounter::get: Expectation(<anything>) \
                   already called 2 time(s) (call #2 with ())");
        let violations = match mock.verify().unwrap_err() {
            MockError::Unsatisfied(v) => v,
            e => panic!("Unexpected error {:?}", e)
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations.unexpected().count(), 1);
    }

    #[test]
    fn too_few() {
        let mut mock = counter();
        mock.expect_call("get").unwrap().times(2);
        mock.call("get", args![]).unwrap();
        let e = mock.verify().unwrap_err();
        assert_eq!(e.to_string(), "1 mock violation(s):\n\
                   1. MockCounter::get: Expectation(<anything>) called 1 \
                   time(s) which is fewer than expected 2");
    }

    #[test]
    fn never() {
        let mut mock = counter();
        mock.expect_call("get").unwrap().never();
        let e = mock.call("get", args![]).unwrap_err();
        assert!(matches!(e, MockError::UnexpectedCall(UnexpectedCall {
            reason: UnexpectedReason::Forbidden{..}, ..
        })));
        mock.verify().unwrap_err();
    }

    #[test]
    fn never_unused() {
        let mut mock = counter();
        mock.expect_call("get").unwrap().never();
        mock.verify().unwrap();
    }

    #[test]
    fn at_least() {
        let mut mock = counter();
        mock.expect_call("get").unwrap().at_least(2);
        mock.call("get", args![]).unwrap();
        assert!(mock.verify().is_err());
        mock.call("get", args![]).unwrap();
        mock.call("get", args![]).unwrap();
        mock.verify().unwrap();
    }

    #[test]
    fn at_most() {
        let mut mock = counter();
        mock.expect_call("get").unwrap().at_most(1);
        mock.verify().unwrap();
        mock.call("get", args![]).unwrap();
        mock.call("get", args![]).unwrap_err();
        mock.checkpoint().unwrap_err();
    }

    #[test]
    fn at_least_once() {
        let mut mock = counter();
        mock.expect_call("get").unwrap().at_least_once();
        mock.checkpoint().unwrap_err();
    }

    #[test]
    fn any_number() {
        let mut mock = counter();
        mock.expect_call("get").unwrap().times_any();
        for _ in 0..5 {
            mock.call("get", args![]).unwrap();
        }
        assert_eq!(mock.call_count("get"), 5);
    }

    #[test]
    fn cardinality() {
        let mut mock = counter();
        mock.expect_call("get").unwrap().times(Cardinality::AtMost(3));
        let e = mock.expect_call("get").unwrap().times(0);
        assert_eq!(e.cardinality(), Cardinality::Never);
    }
}

mod returning {
    use super::*;

    #[test]
    fn default() {
        let mut mock = counter();
        mock.expect_call("get").unwrap().return_const(5).return_default();
        assert!(mock.call("get", args![]).unwrap().is_null());
    }

    #[test]
    fn sequence_exhausted() {
        let mut mock = counter();
        mock.expect_call("get").unwrap().return_sequence([1, 2]);
        mock.call("get", args![]).unwrap();
        mock.call("get", args![]).unwrap();
        let e = mock.call("get", args![]).unwrap_err();
        assert!(matches!(e, MockError::SequenceExhausted{len: 2, ..}));
    }

    #[test]
    fn sequence_repeat_last() {
        let mut mock = counter();
        mock.expect_call("get").unwrap()
            .return_sequence_then([1, 2], Exhaustion::RepeatLast);
        let values = (0..4)
            .map(|_| mock.call("get", args![]).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(values, args![1, 2, 2, 2]);
    }

    #[test]
    fn sequence_default() {
        let mut mock = counter();
        mock.expect_call("get").unwrap()
            .return_sequence_then(["a"], Exhaustion::Default);
        mock.call("get", args![]).unwrap();
        assert!(mock.call("get", args![]).unwrap().is_null());
    }

    /// Every call raises the same error value
    #[test]
    fn throwing_same_error() {
        let mut mock = counter();
        mock.expect_call("get").unwrap().throwing(Boom);
        let first = mock.call("get", args![]).unwrap_err();
        for _ in 0..3 {
            let e = mock.call("get", args![]).unwrap_err();
            assert!(e.fault().unwrap().ptr_eq(first.fault().unwrap()));
            assert_eq!(e.to_string(), "boom");
        }
    }

    #[test]
    fn returning_with_state() {
        let mut mock = counter();
        let mut total = 0;
        mock.expect_call("incr").unwrap()
            .returning(move |args| {
                total += args[0].as_i64().unwrap_or(0);
                Ok(Value::Int(total))
            });
        mock.call("incr", args![2]).unwrap();
        assert_eq!(mock.call("incr", args![3]).unwrap(), Value::Int(5));
    }

    #[test]
    fn returning_st() {
        use std::{cell::Cell, rc::Rc};
        let calls = Rc::new(Cell::new(0));
        let calls2 = calls.clone();
        let mut mock = counter();
        mock.expect_call("get").unwrap()
            .returning_st(move |_| {
                calls2.set(calls2.get() + 1);
                Ok(Value::Null)
            });
        mock.call("get", args![]).unwrap();
        mock.call("get", args![]).unwrap();
        assert_eq!(calls.get(), 2);
    }

    /// A callback may call back into the same mock
    #[test]
    fn reentrant_callback() {
        use std::sync::{Arc, OnceLock, Weak};
        let slot = Arc::new(OnceLock::<Weak<MockObject>>::new());
        let slot2 = slot.clone();
        let mut mock = counter();
        mock.expect_call("get").unwrap().return_const(7);
        mock.expect_call("incr").unwrap()
            .returning(move |_| {
                let mock = slot2.get()
                    .and_then(Weak::upgrade)
                    .ok_or_else(|| Fault::msg("mock is gone"))?;
                mock.call("get", args![])
                    .map_err(|e| Fault::msg(e.to_string()))
            });
        let mock = Arc::new(mock);
        slot.set(Arc::downgrade(&mock)).unwrap();
        assert_eq!(mock.call("incr", args![1]).unwrap(), Value::Int(7));
    }
}
