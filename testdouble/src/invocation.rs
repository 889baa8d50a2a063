// vim: tw=80
use crate::value::Value;

/// One observed call to a mock object.  Immutable once recorded.
#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    seq: usize,
    method: String,
    args: Vec<Value>,
}

impl Invocation {
    pub(crate) fn new(seq: usize, method: &str, args: &[Value]) -> Self {
        Invocation {
            seq,
            method: method.to_owned(),
            args: args.to_vec()
        }
    }

    /// Position of this call among all calls made to the same mock, starting
    /// at zero.
    pub fn seq(&self) -> usize {
        self.seq
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub(crate) fn display_args(&self) -> String {
        let args = self.args.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        format!("({})", args.join(", "))
    }
}
