// vim: tw=80
//! Dynamically typed values passed to and returned from mock objects.
//!
//! Mock objects dispatch calls by method name, so their arguments and return
//! values are carried as [`Value`]s.  Arbitrary user types travel as
//! [`ObjectRef`]s, which keep their identity so that
//! [`identical`](crate::matcher::identical) can tell two equal instances apart.

use downcast::{downcast, Any};
use std::{
    error::Error,
    fmt::{self, Debug, Display},
    sync::Arc
};

use crate::MockError;

/// Any user type that can be passed through a mock as an argument or return
/// value.
///
/// It is implemented for every `'static` type that is `Debug`, `PartialEq`,
/// `Send` and `Sync`.
pub trait Object: Any + Debug + Send + Sync {
    /// Structural equality against another object of any type.
    fn dyn_eq(&self, other: &dyn Object) -> bool;

    /// Name of the concrete type, for diagnostics.
    fn concrete_type(&self) -> &'static str;
}

downcast!(dyn Object);

impl<T> Object for T
    where T: Any + Debug + PartialEq + Send + Sync
{
    fn dyn_eq(&self, other: &dyn Object) -> bool {
        other.downcast_ref::<T>()
            .map_or(false, |o| self == o)
    }

    fn concrete_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A shared handle to an [`Object`].
///
/// Cloning the handle does not clone the object, so every clone is
/// [identical](ObjectRef::ptr_eq) to the original.
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn Object>);

impl ObjectRef {
    pub fn new<T: Object>(t: T) -> Self {
        ObjectRef(Arc::new(t))
    }

    /// Do both handles point to the very same instance?
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        // Compare the data pointers only.  Vtable pointers for the same type
        // are not guaranteed to be unique.
        Arc::as_ptr(&self.0) as *const () == Arc::as_ptr(&other.0) as *const ()
    }

    pub fn is<T: Object>(&self) -> bool {
        self.0.is::<T>()
    }

    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>().ok()
    }

    pub fn type_name(&self) -> &'static str {
        self.0.concrete_type()
    }
}

impl Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &ObjectRef) -> bool {
        self.ptr_eq(other) || self.0.dyn_eq(&*other.0)
    }
}

impl<T: Object> From<Arc<T>> for ObjectRef {
    fn from(t: Arc<T>) -> Self {
        ObjectRef(t)
    }
}

/// A dynamically typed argument or return value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Object(ObjectRef),
}

impl Value {
    /// Wrap an arbitrary user value.
    pub fn object<T: Object>(t: T) -> Self {
        Value::Object(ObjectRef::new(t))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None
        }
    }

    /// Numeric view of the value.  Integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            _ => None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None
        }
    }

    /// Short name of the value's variant, or the object's type name.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(o) => o.type_name(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(l) => {
                f.write_str("[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            },
            Value::Object(o) => write!(f, "{:?}", o),
        }
    }
}

macro_rules! value_from {
    ($variant:ident, $via:ty, [$($t:ty),*]) => {
        $(
            impl From<$t> for Value {
                fn from(t: $t) -> Self {
                    Value::$variant(<$via>::from(t))
                }
            }
        )*
    }
}

value_from!(Int, i64, [i8, i16, i32, i64, u8, u16, u32]);
value_from!(Float, f64, [f32, f64]);

macro_rules! value_from_wide_int {
    ($($t:ty),*) => {
        $(
            /// Integers beyond the range of `i64` become [`Value::Float`].
            impl From<$t> for Value {
                fn from(t: $t) -> Self {
                    i64::try_from(t).map_or(Value::Float(t as f64), Value::Int)
                }
            }
        )*
    }
}

value_from_wide_int!(isize, u64, usize);
value_from!(Str, String, [&str, String, &String]);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl<T: Object> From<Arc<T>> for Value {
    fn from(t: Arc<T>) -> Self {
        Value::Object(ObjectRef::from(t))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// Build an argument list for [`MockObject::call`](crate::MockObject::call).
///
/// # Examples
/// ```
/// # use testdouble::*;
/// let args = args!["foobar", 101, ()];
/// assert_eq!(args[1], Value::Int(101));
/// assert!(args[2].is_null());
/// ```
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::Value>::new() };
    ($($a:expr),+ $(,)?) => {
        ::std::vec![$( $crate::Value::from($a), )+]
    };
}

/// Conversion of a mock's dynamic return value into a typed return value.
///
/// [`Value::Null`], returned by methods without a configured response,
/// converts into the zero value of scalars, strings and lists.
pub trait FromValue: Sized {
    fn from_value(v: Value) -> Result<Self, MockError>;
}

fn mismatch<T>(expected: &'static str, v: &Value) -> Result<T, MockError> {
    Err(MockError::ReturnType {
        expected,
        actual: v.to_string()
    })
}

impl FromValue for Value {
    fn from_value(v: Value) -> Result<Self, MockError> {
        Ok(v)
    }
}

impl FromValue for () {
    fn from_value(_v: Value) -> Result<Self, MockError> {
        Ok(())
    }
}

impl FromValue for bool {
    fn from_value(v: Value) -> Result<Self, MockError> {
        match v {
            Value::Bool(b) => Ok(b),
            Value::Null => Ok(false),
            v => mismatch("bool", &v)
        }
    }
}

impl FromValue for String {
    fn from_value(v: Value) -> Result<Self, MockError> {
        match v {
            Value::Str(s) => Ok(s),
            Value::Null => Ok(String::new()),
            v => mismatch("string", &v)
        }
    }
}

impl FromValue for f64 {
    fn from_value(v: Value) -> Result<Self, MockError> {
        if v.is_null() {
            return Ok(0.0);
        }
        v.as_f64().map_or_else(|| mismatch("float", &v), Ok)
    }
}

macro_rules! int_from_value {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(v: Value) -> Result<Self, MockError> {
                    if v.is_null() {
                        return Ok(0);
                    }
                    v.as_i64()
                        .and_then(|i| <$t>::try_from(i).ok())
                        .map_or_else(|| mismatch(stringify!($t), &v), Ok)
                }
            }
        )*
    }
}

int_from_value!(i32, i64, u32, u64, usize);

impl FromValue for ObjectRef {
    fn from_value(v: Value) -> Result<Self, MockError> {
        match v {
            Value::Object(o) => Ok(o),
            v => mismatch("object", &v)
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(v: Value) -> Result<Self, MockError> {
        match v {
            Value::Null => Ok(None),
            v => T::from_value(v).map(Some)
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(v: Value) -> Result<Self, MockError> {
        match v {
            Value::List(l) => l.into_iter().map(T::from_value).collect(),
            Value::Null => Ok(Vec::new()),
            v => mismatch("list", &v)
        }
    }
}

/// An error deliberately raised by a stub or a matcher callback.
///
/// Cloning a `Fault` shares the underlying error, so a stub configured with
/// [`throwing`](crate::Expectation::throwing) raises the very same error value
/// on every call.
#[derive(Clone)]
pub struct Fault(Arc<dyn Error + Send + Sync + 'static>);

impl Fault {
    pub fn new<E>(e: E) -> Self
        where E: Error + Send + Sync + 'static
    {
        Fault(Arc::new(e))
    }

    /// A fault carrying only a message.
    pub fn msg<M: Into<String>>(m: M) -> Self {
        Fault::new(Message(m.into()))
    }

    pub fn is<E: Error + 'static>(&self) -> bool {
        self.0.is::<E>()
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    /// Is this the same error value as `other`, not merely an equal one?
    pub fn ptr_eq(&self, other: &Fault) -> bool {
        Arc::as_ptr(&self.0) as *const () == Arc::as_ptr(&other.0) as *const ()
    }
}

impl Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}

impl Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&*self.0, f)
    }
}

impl Error for Fault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

#[derive(Debug)]
struct Message(String);

impl Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for Message {}
