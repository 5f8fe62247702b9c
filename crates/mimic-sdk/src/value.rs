//! Dynamic values passed across the dispatch boundary
//!
//! Every argument, receiver and return value that crosses the bridge is a
//! `Value`. Primitives are stored inline; strings and arrays are shared
//! immutable slices; objects are reference-counted handles whose equality is
//! identity.
//!
//! ```text
//! Null | Bool | Char | Byte | Short | Int | Long | Float | Double
//! Str(Arc<str>) | Array(Arc<[Value]>) | Object(ObjectRef) | Invocation(Invocation)
//! ```

use std::any::Any;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::invocation::Invocation;

/// Dynamic value crossing the dispatch boundary.
///
/// Cloning is cheap: heap payloads are behind `Arc`.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent reference (also the result of `void` calls)
    #[default]
    Null,
    /// boolean
    Bool(bool),
    /// 16-bit code unit, widened to `char`
    Char(char),
    /// 8-bit signed integer
    Byte(i8),
    /// 16-bit signed integer
    Short(i16),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Immutable array of values
    Array(Arc<[Value]>),
    /// Object handle (identity semantics)
    Object(ObjectRef),
    /// Invocation context handed to mocks that ask for one
    Invocation(Invocation),
}

impl Value {
    /// Create a string value
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Create an array value
    pub fn array(items: impl Into<Vec<Value>>) -> Self {
        let items: Vec<Value> = items.into();
        Value::Array(Arc::from(items))
    }

    /// Create an empty array value
    pub fn empty_array() -> Self {
        Value::Array(Arc::from(Vec::<Value>::new()))
    }

    /// Check if value is null
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is a reference (null, string, array, object, invocation)
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Str(_) | Value::Array(_) | Value::Object(_) | Value::Invocation(_)
        )
    }

    /// Extract boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract char value
    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(c) => Some(*c),
            _ => None,
        }
    }

    /// Extract an int, widening byte and short
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Byte(b) => Some(*b as i32),
            Value::Short(s) => Some(*s as i32),
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract a long, widening byte, short and int
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Long(l) => Some(*l),
            other => other.as_i32().map(i64::from),
        }
    }

    /// Extract a double, widening float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Borrow string contents
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(&**s),
            _ => None,
        }
    }

    /// Borrow array elements
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(&items[..]),
            _ => None,
        }
    }

    /// Borrow the object handle
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrow the invocation context
    pub fn as_invocation(&self) -> Option<&Invocation> {
        match self {
            Value::Invocation(inv) => Some(inv),
            _ => None,
        }
    }

    /// Get type name for debugging and error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Char(_) => "char",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Invocation(_) => "invocation",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Invocation(a), Value::Invocation(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Char(c) => write!(f, "Char({:?})", c),
            Value::Byte(b) => write!(f, "Byte({})", b),
            Value::Short(s) => write!(f, "Short({})", s),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Long(l) => write!(f, "Long({})", l),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Double(x) => write!(f, "Double({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Object(obj) => write!(f, "{:?}", obj),
            Value::Invocation(inv) => write!(f, "{:?}", inv),
        }
    }
}

// ============================================================================
// Objects
// ============================================================================

struct Object {
    class: Arc<str>,
    state: Box<dyn Any + Send + Sync>,
    /// Back-reference to the real object; present only when the class declares it
    real: Option<RwLock<Value>>,
}

/// Shared handle to a class-tagged object.
///
/// Equality and hashing are by identity, never by contents.
#[derive(Clone)]
pub struct ObjectRef(Arc<Object>);

impl ObjectRef {
    /// Create an object of `class` holding `state`
    pub fn new<T: Any + Send + Sync>(class: impl Into<Arc<str>>, state: T) -> Self {
        Self::from_boxed(class, Box::new(state), false)
    }

    /// Create an object that carries a real-object back-reference slot
    pub fn with_real_slot<T: Any + Send + Sync>(class: impl Into<Arc<str>>, state: T) -> Self {
        Self::from_boxed(class, Box::new(state), true)
    }

    /// Create from already boxed state
    pub fn from_boxed(
        class: impl Into<Arc<str>>,
        state: Box<dyn Any + Send + Sync>,
        real_slot: bool,
    ) -> Self {
        ObjectRef(Arc::new(Object {
            class: class.into(),
            state,
            real: real_slot.then(|| RwLock::new(Value::Null)),
        }))
    }

    /// Canonical name of the object's class
    pub fn class_name(&self) -> &str {
        &self.0.class
    }

    /// Borrow the object's state as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.state.downcast_ref::<T>()
    }

    /// Check if the object declares a real-object slot
    pub fn has_real_slot(&self) -> bool {
        self.0.real.is_some()
    }

    /// Current real-object back-reference (None when the slot is not declared)
    pub fn real(&self) -> Option<Value> {
        self.0.real.as_ref().map(|slot| slot.read().clone())
    }

    /// Store the real object into the slot.
    ///
    /// Returns `false` (and does nothing) when the class has no slot.
    pub fn set_real(&self, value: Value) -> bool {
        match &self.0.real {
            Some(slot) => {
                *slot.write() = value;
                true
            }
            None => false,
        }
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address used as a stable identity key while the object is alive
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl std::hash::Hash for ObjectRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl std::fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Object({}@{:#x})", self.0.class, self.id())
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_default() {
        let v = Value::default();
        assert!(v.is_null());
        assert!(v.is_reference());
        assert_eq!(v.type_name(), "null");
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(Value::Byte(-3).as_i32(), Some(-3));
        assert_eq!(Value::Short(300).as_i64(), Some(300));
        assert_eq!(Value::Int(7).as_i64(), Some(7));
        assert_eq!(Value::Long(7).as_i32(), None);
        assert_eq!(Value::Float(1.5).as_f64(), Some(1.5));
    }

    #[test]
    fn test_object_identity() {
        let a = ObjectRef::new("demo.Greeter", 1u32);
        let b = ObjectRef::new("demo.Greeter", 1u32);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn test_downcast_state() {
        let obj = ObjectRef::new("demo.Counter", String::from("hello"));
        assert_eq!(obj.class_name(), "demo.Counter");
        assert_eq!(obj.downcast_ref::<String>().map(|s| s.as_str()), Some("hello"));
        assert!(obj.downcast_ref::<u32>().is_none());
    }

    #[test]
    fn test_real_slot() {
        let without = ObjectRef::new("demo.Plain", ());
        assert!(!without.has_real_slot());
        assert!(!without.set_real(Value::Int(1)));
        assert_eq!(without.real(), None);

        let with = ObjectRef::with_real_slot("demo.Tracked", ());
        assert_eq!(with.real(), Some(Value::Null));
        assert!(with.set_real(Value::string("real")));
        assert_eq!(with.real(), Some(Value::string("real")));
    }

    #[test]
    fn test_array_equality() {
        let a = Value::array(vec![Value::Int(1), Value::string("x")]);
        let b = Value::array(vec![Value::Int(1), Value::string("x")]);
        assert_eq!(a, b);
        assert_eq!(Value::empty_array().as_array().map(|s| s.len()), Some(0));
    }
}
