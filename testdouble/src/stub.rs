// vim: tw=80
use std::sync::{Arc, Mutex};

use crate::{
    MockError,
    lock,
    value::{Fault, Value}
};

/// What a [`return_sequence`](crate::Expectation::return_sequence) stub does
/// once every value has been returned.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Exhaustion {
    /// Fail the call with [`MockError::SequenceExhausted`].
    #[default]
    Fail,
    /// Keep returning the last value.
    RepeatLast,
    /// Return [`Value::Null`].
    Default,
}

pub(crate) type Callback =
    Arc<Mutex<Box<dyn FnMut(&[Value]) -> Result<Value, Fault> + Send>>>;

/// Return functions for expectations
pub(crate) enum Stub {
    /// No behavior configured: return [`Value::Null`].
    Default,
    Value(Value),
    Sequence {
        values: Vec<Value>,
        cursor: usize,
        on_exhausted: Exhaustion
    },
    Throw(Fault),
    Callback(Callback),
}

/// The outcome of advancing a stub.  Callbacks are run by the caller after the
/// stub's lock has been released.
pub(crate) enum Action {
    Done(Result<Value, MockError>),
    Call(Callback),
}

impl Stub {
    /// Produce the response for one call, advancing any sequence cursor.
    pub fn next_action(&mut self, method: &str) -> Action {
        let r = match self {
            Stub::Default => Ok(Value::Null),
            Stub::Value(v) => Ok(v.clone()),
            Stub::Sequence{values, cursor, on_exhausted} => {
                if let Some(v) = values.get(*cursor) {
                    *cursor += 1;
                    Ok(v.clone())
                } else {
                    match on_exhausted {
                        Exhaustion::Fail => Err(MockError::SequenceExhausted {
                            method: method.to_owned(),
                            len: values.len()
                        }),
                        Exhaustion::RepeatLast =>
                            Ok(values.last().cloned().unwrap_or_default()),
                        Exhaustion::Default => Ok(Value::Null),
                    }
                }
            },
            Stub::Throw(fault) => Err(MockError::Thrown(fault.clone())),
            Stub::Callback(f) => return Action::Call(f.clone()),
        };
        Action::Done(r)
    }
}

impl Action {
    pub fn run(self, args: &[Value]) -> Result<Value, MockError> {
        match self {
            Action::Done(r) => r,
            Action::Call(f) => {
                let mut guard = lock(&*f);
                let callback = &mut *guard;
                callback(args).map_err(MockError::Thrown)
            }
        }
    }
}
