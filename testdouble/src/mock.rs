// vim: tw=80
//! Mock objects and call dispatch.

use std::{
    fmt::{self, Debug},
    marker::PhantomData,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering}
    },
    thread
};
use tracing::{debug, trace, warn};

use crate::{
    lock,
    builder::{MockConfig, Strictness},
    error::{MockError, Result, UnexpectedCall, UnexpectedReason},
    expectation::Expectation,
    interface::{Dynamic, Interface, InterfaceDescriptor, MethodDecl},
    invocation::Invocation,
    value::Value,
    verify::{Verifier, Violation}
};

/// Dispatch table entry for one method.
pub(crate) struct MethodSlot {
    decl: MethodDecl,
    /// False for declared methods left out of an allow-list.
    intercepted: bool,
    expectations: Vec<Expectation>,
}

impl MethodSlot {
    pub(crate) fn new(decl: MethodDecl, intercepted: bool) -> Self {
        MethodSlot { decl, intercepted, expectations: Vec::new() }
    }
}

/// A substitute for a real dependency.  It records every call and answers
/// each one according to the [`Expectation`]s registered for the method.
///
/// `I` is the mocked interface: either a type implementing [`Interface`],
/// typically `dyn Trait`, or [`Dynamic`] for mocks built from a runtime
/// [`InterfaceDescriptor`].
///
/// Unless configured otherwise, a mock verifies its expectations when it is
/// dropped, and panics if any are violated.
///
/// # Examples
/// ```
/// # use testdouble::*;
/// let desc = InterfaceDescriptor::new("ExampleService")
///     .method("example_method", 1);
/// let mut mock = MockObject::from_descriptor(desc);
/// mock.expect_call("example_method").unwrap()
///     .once()
///     .with(["bar"])
///     .return_const("foo");
///
/// let r = mock.call("example_method", args!["bar"]).unwrap();
/// assert_eq!(r, Value::from("foo"));
/// mock.verify().unwrap();
/// ```
pub struct MockObject<I: ?Sized = Dynamic> {
    descriptor: InterfaceDescriptor,
    config: MockConfig,
    methods: Vec<MethodSlot>,
    constructor_args: Option<Vec<Value>>,
    invocations: Mutex<Vec<Invocation>>,
    unexpected: Mutex<Vec<UnexpectedCall>>,
    verified: AtomicBool,
    _interface: PhantomData<fn() -> *const I>,
}

impl MockObject<Dynamic> {
    /// Create a loose mock of a runtime interface declaration.  Every declared
    /// method is intercepted and the constructor is not run.
    pub fn from_descriptor(descriptor: InterfaceDescriptor) -> Self {
        let config = MockConfig::for_interface(&descriptor);
        let slots = descriptor.methods()
            .iter()
            .map(|decl| MethodSlot::new(decl.clone(), true))
            .collect();
        MockObject::assemble(descriptor, config, slots, None)
    }
}

impl<I: Interface + ?Sized> MockObject<I> {
    /// Create a loose mock of `I`.  Every declared method is intercepted and
    /// the constructor is not run.
    pub fn new() -> Self {
        let descriptor = I::descriptor();
        let config = MockConfig::for_interface(&descriptor);
        let slots = descriptor.methods()
            .iter()
            .map(|decl| MethodSlot::new(decl.clone(), true))
            .collect();
        MockObject::assemble(descriptor, config, slots, None)
    }
}

impl<I: Interface + ?Sized> Default for MockObject<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a loose mock of `I`.
///
/// Use [`MockBuilder`](crate::MockBuilder) for anything more specific.
pub fn create_mock<I: Interface + ?Sized>() -> MockObject<I> {
    MockObject::new()
}

impl<I: ?Sized> MockObject<I> {
    pub(crate) fn assemble(descriptor: InterfaceDescriptor,
                           config: MockConfig,
                           methods: Vec<MethodSlot>,
                           constructor_args: Option<Vec<Value>>) -> Self
    {
        MockObject {
            descriptor,
            config,
            methods,
            constructor_args,
            invocations: Mutex::new(Vec::new()),
            unexpected: Mutex::new(Vec::new()),
            verified: AtomicBool::new(false),
            _interface: PhantomData
        }
    }

    fn slot(&self, method: &str) -> Option<&MethodSlot> {
        self.methods.iter().find(|s| s.decl.name() == method)
    }

    /// Call `method` on the mock.
    ///
    /// The expectations registered for the method are tried in registration
    /// order.  The first one that accepts the arguments, and has not yet been
    /// called its maximum number of times, produces the result.  Register more
    /// specific expectations before catch-alls.
    ///
    /// A method with no expectations returns [`Value::Null`], unless the mock
    /// is [strict](crate::Strictness::Strict).
    pub fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        let invocation = self.record(method, &args);

        let slot = match self.slot(method) {
            Some(slot) => slot,
            None => return Err(self.unexpected(invocation,
                                               UnexpectedReason::UnknownMethod))
        };
        if let Some(expected) = slot.decl.arity() {
            if expected != args.len() {
                return Err(self.unexpected(invocation,
                    UnexpectedReason::Arity{expected}));
            }
        }
        if !slot.intercepted {
            debug!(mock = %self.config.name, method,
                   "method is not intercepted; returning default");
            return Ok(Value::Null);
        }
        if slot.expectations.is_empty() {
            return match self.config.strictness {
                Strictness::Loose => {
                    debug!(mock = %self.config.name, method,
                           "no expectations; returning default");
                    Ok(Value::Null)
                },
                Strictness::Strict => Err(self.unexpected(invocation,
                    UnexpectedReason::NotConfigured))
            };
        }

        let mut exhausted = None;
        let mut mismatches = Vec::new();
        for e in slot.expectations.iter() {
            let rejected = e.check(&args)?;
            if !rejected.is_empty() {
                mismatches.extend(rejected);
                continue;
            }
            if e.is_never() {
                let expectation = e.describe();
                return Err(self.unexpected(invocation,
                    UnexpectedReason::Forbidden{expectation}));
            }
            if e.is_done() {
                exhausted.get_or_insert(e);
                continue;
            }
            if !e.in_turn() {
                let expectation = e.describe();
                return Err(self.unexpected(invocation,
                    UnexpectedReason::OutOfSequence{expectation}));
            }
            if e.try_call() {
                return e.respond(&args);
            }
            exhausted.get_or_insert(e);
        }

        let reason = match exhausted {
            Some(e) => UnexpectedReason::Exhausted {
                expectation: e.describe(),
                calls: e.call_count()
            },
            None => UnexpectedReason::ArgumentMismatch(mismatches)
        };
        Err(self.unexpected(invocation, reason))
    }

    fn record(&self, method: &str, args: &[Value]) -> Invocation {
        let mut invocations = lock(&self.invocations);
        let invocation = Invocation::new(invocations.len(), method, args);
        trace!(mock = %self.config.name, method,
               seq = invocation.seq(), args = %invocation.display_args(),
               "call");
        invocations.push(invocation.clone());
        invocation
    }

    fn unexpected(&self, invocation: Invocation, reason: UnexpectedReason)
        -> MockError
    {
        let uc = UnexpectedCall {
            mock: self.config.name.clone(),
            invocation,
            reason
        };
        warn!("{}", uc);
        lock(&self.unexpected).push(uc.clone());
        MockError::UnexpectedCall(uc)
    }

    /// Register a new expectation for `method` and return it for
    /// configuration.
    ///
    /// Fails if the mock has no such method, or if the method was left out of
    /// the builder's allow-list.
    pub fn expect_call(&mut self, method: &str) -> Result<&mut Expectation> {
        let name = &self.config.name;
        let slot = match self.methods.iter_mut()
            .find(|s| s.decl.name() == method)
        {
            Some(slot) => slot,
            None => return Err(MockError::construction(format!(
                "{}::{}: no such method", name, method)))
        };
        if !slot.intercepted {
            return Err(MockError::construction(format!(
                "{}::{}: method is not in the allow-list", name, method)));
        }
        slot.expectations.push(Expectation::new(method));
        let last = slot.expectations.len() - 1;
        Ok(&mut slot.expectations[last])
    }

    /// Name used in diagnostics
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn descriptor(&self) -> &InterfaceDescriptor {
        &self.descriptor
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Every call made so far, including rejected ones, in call order.
    pub fn invocations(&self) -> Vec<Invocation> {
        lock(&self.invocations).clone()
    }

    /// Every call made so far to `method`.
    pub fn invocations_of(&self, method: &str) -> Vec<Invocation> {
        lock(&self.invocations).iter()
            .filter(|i| i.method() == method)
            .cloned()
            .collect()
    }

    /// How many times `method` has been called, whether or not the calls were
    /// accepted.
    pub fn call_count(&self, method: &str) -> usize {
        lock(&self.invocations).iter()
            .filter(|i| i.method() == method)
            .count()
    }

    /// The arguments the constructor was run with, or `None` if it wasn't.
    pub fn constructor_args(&self) -> Option<&[Value]> {
        self.constructor_args.as_deref()
    }

    /// Does the mock intercept `method`?  False for unknown methods and for
    /// methods left out of an allow-list.
    pub fn is_intercepted(&self, method: &str) -> bool {
        self.slot(method).map_or(false, |s| s.intercepted)
    }

    pub(crate) fn collect_violations(&self, out: &mut Vec<Violation>) {
        for slot in self.methods.iter() {
            for e in slot.expectations.iter().filter(|e| !e.is_satisfied()) {
                out.push(Violation::Unsatisfied {
                    mock: self.config.name.clone(),
                    method: slot.decl.name().to_owned(),
                    expectation: e.describe(),
                    expected: e.cardinality(),
                    calls: e.call_count()
                });
            }
        }
        out.extend(lock(&self.unexpected).iter()
            .cloned()
            .map(Violation::Unexpected));
    }

    pub(crate) fn mark_verified(&self) {
        self.verified.store(true, Ordering::Release);
    }

    /// Check that every expectation was satisfied and that no unexpected call
    /// was made.  All violations are reported together.
    ///
    /// A verified mock is not verified again when dropped.
    pub fn verify(&self) -> Result<()> {
        Verifier::new().check(self).finish()
    }

    /// Verify the mock, then remove all of its expectations and recorded
    /// unexpected calls.  New expectations may be registered afterwards, and
    /// will be verified on drop as usual.
    pub fn checkpoint(&mut self) -> Result<()> {
        let r = self.verify();
        for slot in self.methods.iter_mut() {
            slot.expectations.clear();
        }
        lock(&self.unexpected).clear();
        self.verified.store(false, Ordering::Release);
        r
    }
}

impl<I: ?Sized> Debug for MockObject<I> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let methods = self.methods.iter()
            .map(|s| s.decl.name())
            .collect::<Vec<_>>();
        f.debug_struct("MockObject")
            .field("name", &self.config.name)
            .field("methods", &methods)
            .field("strictness", &self.config.strictness)
            .finish()
    }
}

impl<I: ?Sized> Drop for MockObject<I> {
    fn drop(&mut self) {
        if !self.config.verify_on_drop ||
            self.verified.load(Ordering::Acquire) ||
            thread::panicking()
        {
            return;
        }
        if let Err(e) = Verifier::new().check(self).finish() {
            panic!("{}", e);
        }
    }
}
