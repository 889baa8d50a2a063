// vim: tw=80
//! Explicit interface declarations.
//!
//! Nothing is discovered by reflection.  A mock can only intercept the methods
//! its [`InterfaceDescriptor`] names, plus any methods added by
//! [`MockBuilder::add_methods`](crate::MockBuilder::add_methods).

use std::{
    fmt::{self, Debug},
    sync::Arc
};

use crate::value::{Fault, Value};

/// Runs when a mock is built with its constructor enabled.  It receives the
/// constructor arguments and may reject them by returning a [`Fault`].
pub type ConstructorHook =
    Arc<dyn Fn(&[Value]) -> Result<(), Fault> + Send + Sync>;

/// The constructor of a mocked type.
#[derive(Clone)]
pub struct Constructor {
    arity: usize,
    hook: Option<ConstructorHook>,
}

impl Constructor {
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Check the arguments and run the hook, if any.
    pub(crate) fn run(&self, args: &[Value]) -> Result<(), String> {
        if args.len() != self.arity {
            return Err(format!("constructor takes {} argument(s), got {}",
                               self.arity, args.len()));
        }
        if let Some(hook) = &self.hook {
            hook(args).map_err(|f| format!("constructor failed: {}", f))?;
        }
        Ok(())
    }
}

impl Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("arity", &self.arity)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// One method of an interface.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MethodDecl {
    name: String,
    /// `None` means any number of arguments.
    arity: Option<usize>,
}

impl MethodDecl {
    pub fn new(name: &str, arity: Option<usize>) -> Self {
        MethodDecl { name: name.to_owned(), arity }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }
}

/// The type descriptor a mock is created from: the interface's name, its
/// methods, and optionally a constructor.
///
/// # Examples
/// ```
/// # use testdouble::*;
/// let desc = InterfaceDescriptor::new("ExampleService")
///     .method("example_method", 1)
///     .method("other_method", 0)
///     .constructor(2);
/// assert_eq!(desc.name(), "ExampleService");
/// assert_eq!(desc.find("example_method").unwrap().arity(), Some(1));
/// assert_eq!(desc.constructor_arity(), Some(2));
/// ```
#[derive(Clone, Debug)]
pub struct InterfaceDescriptor {
    name: String,
    methods: Vec<MethodDecl>,
    constructor: Option<Constructor>,
}

impl InterfaceDescriptor {
    pub fn new(name: &str) -> Self {
        InterfaceDescriptor {
            name: name.to_owned(),
            methods: Vec::new(),
            constructor: None
        }
    }

    /// Declare a method taking exactly `arity` arguments.  Declaring the same
    /// name again replaces the earlier declaration.
    pub fn method(self, name: &str, arity: usize) -> Self {
        self.declare(MethodDecl::new(name, Some(arity)))
    }

    /// Declare a method that accepts any number of arguments.
    pub fn variadic_method(self, name: &str) -> Self {
        self.declare(MethodDecl::new(name, None))
    }

    fn declare(mut self, decl: MethodDecl) -> Self {
        match self.methods.iter_mut().find(|m| m.name == decl.name) {
            Some(m) => *m = decl,
            None => self.methods.push(decl)
        }
        self
    }

    /// Declare a constructor taking `arity` arguments.
    pub fn constructor(mut self, arity: usize) -> Self {
        self.constructor = Some(Constructor { arity, hook: None });
        self
    }

    /// Declare a constructor with a hook that validates its arguments.
    pub fn constructor_with<F>(mut self, arity: usize, hook: F) -> Self
        where F: Fn(&[Value]) -> Result<(), Fault> + Send + Sync + 'static
    {
        self.constructor = Some(Constructor {
            arity,
            hook: Some(Arc::new(hook))
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[MethodDecl] {
        &self.methods
    }

    pub fn find(&self, method: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == method)
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.find(method).is_some()
    }

    pub fn constructor_ref(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    pub fn constructor_arity(&self) -> Option<usize> {
        self.constructor.as_ref().map(Constructor::arity)
    }
}

/// A type that can describe its own interface.
///
/// Usually implemented for `dyn Trait` by the
/// [`#[mockable]`](crate::mockable) attribute, which also implements `Trait`
/// for `MockObject<dyn Trait>`.
pub trait Interface {
    fn descriptor() -> InterfaceDescriptor;
}

/// Marker for mocks built from an [`InterfaceDescriptor`] at runtime, rather
/// than from a type implementing [`Interface`].
#[derive(Clone, Copy, Debug)]
pub enum Dynamic {}
