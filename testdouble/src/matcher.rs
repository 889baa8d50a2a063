// vim: tw=80
//! Per-argument matchers.
//!
//! A [`Matcher`] decides whether one actual argument satisfies an expectation.
//! The most common matchers have constructor functions in this module, and any
//! [`Predicate`] from the `predicates` crate can be used through
//! [`predicate`](fn@predicate).
//!
//! # Examples
//! ```
//! # use testdouble::*;
//! use testdouble::matcher::*;
//!
//! assert!(contains("foo").matches(&Value::from("foobar")).unwrap());
//! assert!(ge(100).matches(&Value::from(101)).unwrap());
//! assert!(!ge(100).matches(&Value::from(99.5)).unwrap());
//! assert!(anything().matches(&Value::Null).unwrap());
//! ```

use predicates::{
    reflection::{Case, PredicateReflection, Product},
    str::ContainsPredicate,
    Predicate
};
use predicates_tree::CaseTreeExt;
use std::{
    any,
    cmp::Ordering,
    fmt::{self, Debug, Display}
};

use crate::value::{Fault, Object, ObjectRef, Value};

/// The concrete type an [`instance_of`] matcher accepts.
#[derive(Clone, Copy)]
pub struct TypeTag {
    name: &'static str,
    check: fn(&ObjectRef) -> bool,
}

impl TypeTag {
    pub fn of<T: Object>() -> Self {
        TypeTag {
            name: any::type_name::<T>(),
            check: |o| o.is::<T>()
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn accepts(&self, v: &Value) -> bool {
        v.as_object().map_or(false, self.check)
    }
}

type Callback = Box<dyn Fn(&Value) -> Result<bool, Fault> + Send + Sync>;

/// A predicate over a single argument.
pub enum Matcher {
    /// Structural equality.
    Equals(Value),
    /// Identity for objects, strict equality for everything else.
    IdenticalTo(Value),
    /// The argument is an object of the given type.
    InstanceOf(TypeTag),
    /// The argument is a string containing the given substring.
    StringContains(ContainsPredicate),
    /// The argument is a number no less than the given one.
    GreaterOrEqual(Value),
    /// Accepts every argument.
    Anything,
    /// User supplied predicate.  An error it returns propagates to the caller.
    Callback(Callback),
    /// Any predicate from the `predicates` crate.
    Predicate(Box<dyn Predicate<Value> + Send + Sync>),
}

impl Matcher {
    /// Does `v` satisfy this matcher?
    ///
    /// Only [`Matcher::Callback`] can fail.
    pub fn matches(&self, v: &Value) -> Result<bool, Fault> {
        let r = match self {
            Matcher::Equals(e) => e == v,
            Matcher::IdenticalTo(e) => is_identical(e, v),
            Matcher::InstanceOf(tag) => tag.accepts(v),
            Matcher::StringContains(p) => v.as_str().map_or(false, |s| p.eval(s)),
            Matcher::GreaterOrEqual(n) => matches!(
                compare_numbers(v, n),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            ),
            Matcher::Anything => true,
            Matcher::Callback(f) => return f(v),
            Matcher::Predicate(p) => p.eval(v),
        };
        Ok(r)
    }
}

fn is_identical(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => e.ptr_eq(a),
        (Value::List(e), Value::List(a)) => {
            e.len() == a.len() &&
                e.iter().zip(a.iter()).all(|(e, a)| is_identical(e, a))
        },
        (e, a) => e == a
    }
}

fn compare_numbers(v: &Value, n: &Value) -> Option<Ordering> {
    match (v, n) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        _ => v.as_f64()?.partial_cmp(&n.as_f64()?)
    }
}

impl Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Matcher::Equals(v) => write!(f, "eq({})", v),
            Matcher::IdenticalTo(v) => write!(f, "identical({})", v),
            Matcher::InstanceOf(tag) => write!(f, "instance_of({})", tag.name),
            Matcher::StringContains(p) => write!(f, "{}", p),
            Matcher::GreaterOrEqual(v) => write!(f, "ge({})", v),
            Matcher::Anything => f.write_str("<anything>"),
            Matcher::Callback(_) => f.write_str("<function>"),
            Matcher::Predicate(p) => write!(f, "{}", p),
        }
    }
}

impl Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Matcher({})", self)
    }
}

impl PredicateReflection for Matcher {}

impl Predicate<Value> for Matcher {
    fn eval(&self, v: &Value) -> bool {
        self.matches(v).unwrap_or(false)
    }

    fn find_case<'a>(&'a self, expected: bool, v: &Value)
        -> Option<Case<'a>>
    {
        if let Matcher::Predicate(p) = self {
            return p.find_case(expected, v);
        }
        let actual = self.eval(v);
        if actual == expected {
            Some(self.case(actual, v))
        } else {
            None
        }
    }
}

impl Matcher {
    fn case<'a>(&'a self, result: bool, v: &Value) -> Case<'a> {
        Case::new(Some(self), result)
            .add_product(Product::new("var", v.to_string()))
    }

    /// Render why `v`, already known to be rejected, failed this matcher.
    /// Only a wrapped `predicates` predicate is evaluated again, to find its
    /// failing child.
    pub(crate) fn rejection_tree(&self, v: &Value) -> Option<String> {
        let case = match self {
            Matcher::Predicate(p) => p.find_case(false, v)?,
            _ => self.case(false, v)
        };
        Some(case.tree().to_string())
    }
}

impl From<Value> for Matcher {
    fn from(v: Value) -> Self {
        Matcher::Equals(v)
    }
}

macro_rules! matcher_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Matcher {
                fn from(t: $t) -> Self {
                    Matcher::Equals(Value::from(t))
                }
            }
        )*
    }
}

matcher_from!(&str, String, bool, i32, i64, u32, u64, usize, f64, ObjectRef);

/// Accepts arguments structurally equal to `v`.
pub fn eq<V: Into<Value>>(v: V) -> Matcher {
    Matcher::Equals(v.into())
}

/// Accepts only the very same object instance as `v`.  Two distinct but equal
/// instances do not match.  Non-object values must be strictly equal.
///
/// # Examples
/// ```
/// # use testdouble::*;
/// # use std::sync::Arc;
/// #[derive(Debug, PartialEq)]
/// struct Dep(u32);
///
/// let a = Arc::new(Dep(1));
/// let b = Arc::new(Dep(1));
/// let m = matcher::identical(a.clone());
/// assert!(m.matches(&Value::from(a)).unwrap());
/// assert!(!m.matches(&Value::from(b)).unwrap());
/// ```
pub fn identical<V: Into<Value>>(v: V) -> Matcher {
    Matcher::IdenticalTo(v.into())
}

/// Accepts objects whose concrete type is `T`.
pub fn instance_of<T: Object>() -> Matcher {
    Matcher::InstanceOf(TypeTag::of::<T>())
}

/// Accepts strings containing `sub`.
pub fn contains<S: Into<String>>(sub: S) -> Matcher {
    Matcher::StringContains(predicates::str::contains(sub))
}

/// Accepts numbers greater than or equal to `n`.
pub fn ge<V: Into<Value>>(n: V) -> Matcher {
    Matcher::GreaterOrEqual(n.into())
}

/// Accepts every argument.
pub fn anything() -> Matcher {
    Matcher::Anything
}

/// Accepts arguments for which `f` returns true.
pub fn function<F>(f: F) -> Matcher
    where F: Fn(&Value) -> bool + Send + Sync + 'static
{
    Matcher::Callback(Box::new(move |v| Ok(f(v))))
}

/// Like [`function`], but the callback may raise a [`Fault`].  The fault
/// aborts the call and is returned to the caller of the mock.
pub fn try_function<F>(f: F) -> Matcher
    where F: Fn(&Value) -> Result<bool, Fault> + Send + Sync + 'static
{
    Matcher::Callback(Box::new(f))
}

/// Adapt any `predicates` predicate over [`Value`].
///
/// # Examples
/// ```
/// # use testdouble::*;
/// let m = matcher::predicate(predicate::ne(Value::Null));
/// assert!(m.matches(&Value::from(1)).unwrap());
/// assert!(!m.matches(&Value::Null).unwrap());
/// ```
pub fn predicate<P>(p: P) -> Matcher
    where P: Predicate<Value> + Send + Sync + 'static
{
    Matcher::Predicate(Box::new(p))
}
