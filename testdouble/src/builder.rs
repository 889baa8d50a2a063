// vim: tw=80
//! Fine-grained mock construction.

use std::marker::PhantomData;
use tracing::debug;

use crate::{
    error::{MockError, Result},
    interface::{Dynamic, Interface, InterfaceDescriptor, MethodDecl},
    mock::{MethodSlot, MockObject},
    value::Value
};

/// What a mock does when a method with no expectations is called.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Strictness {
    /// Return [`Value::Null`].
    #[default]
    Loose,
    /// Fail with an [`UnexpectedCall`](crate::UnexpectedCall).
    Strict,
}

/// Per-mock settings.
#[derive(Clone, Debug)]
pub struct MockConfig {
    /// Used in every diagnostic.  Defaults to `Mock` + the interface name.
    pub name: String,
    pub strictness: Strictness,
    /// Verify the mock when it is dropped, unless it was already verified.
    pub verify_on_drop: bool,
}

impl MockConfig {
    pub(crate) fn for_interface(desc: &InterfaceDescriptor) -> Self {
        MockConfig {
            name: format!("Mock{}", desc.name()),
            strictness: Strictness::default(),
            verify_on_drop: true
        }
    }
}

/// Builds a [`MockObject`] with an allow-list of intercepted methods, extra
/// methods, constructor arguments, or a non-default configuration.
///
/// Invalid combinations are rejected by [`build`](#method.build), never later.
///
/// # Examples
/// ```
/// # use testdouble::*;
/// let desc = InterfaceDescriptor::new("ExampleService")
///     .method("example_method", 1)
///     .method("other_method", 0)
///     .constructor(2);
/// let mut mock = MockBuilder::from_descriptor(desc)
///     .with_constructor_args(args![100, 200])
///     .only_methods(["example_method"])
///     .add_methods(["non_existent_method"])
///     .build()
///     .unwrap();
///
/// mock.expect_call("non_existent_method").unwrap()
///     .return_const("foo");
/// assert_eq!(mock.call("non_existent_method", args![1]).unwrap(),
///            Value::from("foo"));
/// assert!(mock.call("other_method", args![]).unwrap().is_null());
/// assert!(mock.expect_call("other_method").is_err());
/// ```
pub struct MockBuilder<I: ?Sized = Dynamic> {
    descriptor: InterfaceDescriptor,
    constructor_args: Option<Vec<Value>>,
    constructor_disabled: bool,
    only_methods: Option<Vec<String>>,
    added: Vec<String>,
    config: MockConfig,
    _interface: PhantomData<fn() -> *const I>,
}

impl<I: Interface + ?Sized> MockBuilder<I> {
    pub fn new() -> Self {
        Self::with_descriptor(I::descriptor())
    }
}

impl<I: Interface + ?Sized> Default for MockBuilder<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBuilder<Dynamic> {
    pub fn from_descriptor(descriptor: InterfaceDescriptor) -> Self {
        Self::with_descriptor(descriptor)
    }
}

impl<I: ?Sized> MockBuilder<I> {
    fn with_descriptor(descriptor: InterfaceDescriptor) -> Self {
        let config = MockConfig::for_interface(&descriptor);
        MockBuilder {
            descriptor,
            constructor_args: None,
            constructor_disabled: false,
            only_methods: None,
            added: Vec::new(),
            config,
            _interface: PhantomData
        }
    }

    /// Arguments for the interface's constructor.
    pub fn with_constructor_args<A>(mut self, args: A) -> Self
        where A: IntoIterator<Item = Value>
    {
        self.constructor_args = Some(args.into_iter().collect());
        self
    }

    /// Don't run the interface's constructor.
    pub fn disable_constructor(mut self) -> Self {
        self.constructor_disabled = true;
        self
    }

    /// Intercept only these declared methods.  Every other declared method
    /// returns [`Value::Null`] and cannot be given expectations.
    pub fn only_methods<N, S>(mut self, names: N) -> Self
        where N: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.only_methods.get_or_insert_with(Vec::new)
            .extend(names_of(names));
        self
    }

    /// Add methods that the interface doesn't declare.  They accept any
    /// number of arguments and behave like declared methods otherwise.
    pub fn add_methods<N, S>(mut self, names: N) -> Self
        where N: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.added.extend(names_of(names));
        self
    }

    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.config.strictness = strictness;
        self
    }

    /// Shortcut for [`strictness(Strictness::Strict)`](#method.strictness).
    pub fn strict(self) -> Self {
        self.strictness(Strictness::Strict)
    }

    /// Name the mock in diagnostics.
    pub fn named(mut self, name: &str) -> Self {
        self.config.name = name.to_owned();
        self
    }

    pub fn verify_on_drop(mut self, verify: bool) -> Self {
        self.config.verify_on_drop = verify;
        self
    }

    pub fn build(self) -> Result<MockObject<I>> {
        let MockBuilder {
            descriptor, constructor_args, constructor_disabled, only_methods,
            added, config, ..
        } = self;
        let iface = descriptor.name().to_owned();

        if let Some(allowed) = &only_methods {
            if let Some(unknown) = allowed.iter()
                .find(|m| !descriptor.has_method(m) && !added.contains(m))
            {
                return Err(MockError::construction(format!(
                    "cannot allow-list {}::{}: no such method", iface,
                    unknown)));
            }
        }
        for (i, name) in added.iter().enumerate() {
            if descriptor.has_method(name) {
                return Err(MockError::construction(format!(
                    "cannot add {}::{}: the method already exists", iface,
                    name)));
            }
            if added[..i].contains(name) {
                return Err(MockError::construction(format!(
                    "cannot add {}::{}: the method is added twice", iface,
                    name)));
            }
        }

        let constructor_args = if constructor_disabled {
            if constructor_args.is_some() {
                return Err(MockError::construction(format!(
                    "constructor arguments given for {}, but its constructor \
                    is disabled", iface)));
            }
            None
        } else {
            match (descriptor.constructor_ref(), constructor_args) {
                (Some(ctor), args) => {
                    let args = args.unwrap_or_default();
                    ctor.run(&args).map_err(|e|
                        MockError::construction(format!("{}: {}", iface, e))
                    )?;
                    Some(args)
                },
                (None, Some(_)) => return Err(MockError::construction(
                    format!("{} has no constructor", iface))),
                (None, None) => None
            }
        };

        let declared = descriptor.methods()
            .iter()
            .map(|decl| {
                let intercepted = only_methods.as_ref()
                    .map_or(true, |allowed| allowed.iter()
                        .any(|m| m == decl.name()));
                MethodSlot::new(decl.clone(), intercepted)
            });
        let extra = added.iter()
            .map(|name| MethodSlot::new(MethodDecl::new(name, None), true));
        let slots = declared.chain(extra).collect::<Vec<_>>();

        debug!(mock = %config.name, methods = slots.len(),
               allow_list = only_methods.is_some(), "built mock");
        Ok(MockObject::assemble(descriptor, config, slots, constructor_args))
    }
}

fn names_of<N, S>(names: N) -> impl Iterator<Item = String>
    where N: IntoIterator<Item = S>,
          S: Into<String>
{
    names.into_iter().map(Into::into)
}
