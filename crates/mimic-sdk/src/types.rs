//! Resolved parameter and return types
//!
//! Types appear in two forms: the compact descriptor notation used on the
//! wire (`I`, `Lstd/String;`, `[J`) and the resolved [`Type`] produced once
//! a descriptor has been parsed against a class table. Class names inside a
//! resolved `Type` are always canonical (dotted).

use std::sync::Arc;

use crate::value::Value;

/// Well-known reference types that always resolve, whatever the class table holds
pub mod builtin {
    /// Root reference type; a parameter of this type accepts any value
    pub const OBJECT: &str = "std.Object";
    /// String type
    pub const STRING: &str = "std.String";
    /// Invocation context capability type
    pub const INVOCATION: &str = "mimic.Invocation";

    /// Internal (slash-separated) form of [`OBJECT`]
    pub const OBJECT_INTERNAL: &str = "std/Object";
    /// Internal (slash-separated) form of [`STRING`]
    pub const STRING_INTERNAL: &str = "std/String";
    /// Internal (slash-separated) form of [`INVOCATION`]
    pub const INVOCATION_INTERNAL: &str = "mimic/Invocation";

    /// Check if a canonical name is one of the built-in types
    pub fn is_builtin(canonical: &str) -> bool {
        matches!(canonical, OBJECT | STRING | INVOCATION)
    }
}

/// Primitive value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `Z`
    Boolean,
    /// `C`
    Char,
    /// `B`
    Byte,
    /// `S`
    Short,
    /// `I`
    Int,
    /// `J`
    Long,
    /// `F`
    Float,
    /// `D`
    Double,
}

impl Primitive {
    /// Descriptor character
    pub const fn descriptor_char(self) -> char {
        match self {
            Primitive::Boolean => 'Z',
            Primitive::Char => 'C',
            Primitive::Byte => 'B',
            Primitive::Short => 'S',
            Primitive::Int => 'I',
            Primitive::Long => 'J',
            Primitive::Float => 'F',
            Primitive::Double => 'D',
        }
    }

    /// Decode a descriptor character
    pub const fn from_descriptor_char(c: char) -> Option<Self> {
        match c {
            'Z' => Some(Primitive::Boolean),
            'C' => Some(Primitive::Char),
            'B' => Some(Primitive::Byte),
            'S' => Some(Primitive::Short),
            'I' => Some(Primitive::Int),
            'J' => Some(Primitive::Long),
            'F' => Some(Primitive::Float),
            'D' => Some(Primitive::Double),
            _ => None,
        }
    }

    /// Zero value of this primitive
    pub fn zero(self) -> Value {
        match self {
            Primitive::Boolean => Value::Bool(false),
            Primitive::Char => Value::Char('\0'),
            Primitive::Byte => Value::Byte(0),
            Primitive::Short => Value::Short(0),
            Primitive::Int => Value::Int(0),
            Primitive::Long => Value::Long(0),
            Primitive::Float => Value::Float(0.0),
            Primitive::Double => Value::Double(0.0),
        }
    }

    /// Check if a value can be passed where this primitive is declared
    /// (exact match or widening conversion)
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (Primitive::Boolean, Value::Bool(_)) => true,
            (Primitive::Char, Value::Char(_)) => true,
            (Primitive::Byte, Value::Byte(_)) => true,
            (Primitive::Short, Value::Byte(_) | Value::Short(_)) => true,
            (Primitive::Int, Value::Byte(_) | Value::Short(_) | Value::Char(_) | Value::Int(_)) => {
                true
            }
            (
                Primitive::Long,
                Value::Byte(_) | Value::Short(_) | Value::Char(_) | Value::Int(_) | Value::Long(_),
            ) => true,
            (
                Primitive::Float,
                Value::Byte(_)
                | Value::Short(_)
                | Value::Char(_)
                | Value::Int(_)
                | Value::Long(_)
                | Value::Float(_),
            ) => true,
            (
                Primitive::Double,
                Value::Byte(_)
                | Value::Short(_)
                | Value::Char(_)
                | Value::Int(_)
                | Value::Long(_)
                | Value::Float(_)
                | Value::Double(_),
            ) => true,
            _ => false,
        }
    }
}

/// A resolved type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// `V` (return position only)
    Void,
    /// Primitive type
    Primitive(Primitive),
    /// Reference type by canonical class name
    Class(Arc<str>),
    /// Array of the element type
    Array(Box<Type>),
}

impl Type {
    /// Reference type from a canonical name
    pub fn class(canonical: impl AsRef<str>) -> Self {
        Type::Class(Arc::from(canonical.as_ref()))
    }

    /// Array of `element`
    pub fn array_of(element: Type) -> Self {
        Type::Array(Box::new(element))
    }

    /// The root reference type
    pub fn object() -> Self {
        Type::class(builtin::OBJECT)
    }

    /// The string type
    pub fn string() -> Self {
        Type::class(builtin::STRING)
    }

    /// The invocation context capability type
    pub fn invocation() -> Self {
        Type::class(builtin::INVOCATION)
    }

    /// Check if this is the invocation context capability type
    pub fn is_invocation(&self) -> bool {
        matches!(self, Type::Class(name) if &**name == builtin::INVOCATION)
    }

    /// Check if this is a reference type
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Class(_) | Type::Array(_))
    }

    /// Encode in descriptor notation
    pub fn descriptor(&self) -> String {
        let mut out = String::new();
        self.write_descriptor(&mut out);
        out
    }

    /// Append descriptor notation to `out`
    pub fn write_descriptor(&self, out: &mut String) {
        match self {
            Type::Void => out.push('V'),
            Type::Primitive(p) => out.push(p.descriptor_char()),
            Type::Class(name) => {
                out.push('L');
                out.extend(name.chars().map(|c| if c == '.' { '/' } else { c }));
                out.push(';');
            }
            Type::Array(element) => {
                out.push('[');
                element.write_descriptor(out);
            }
        }
    }

    /// Check if `value` can be passed where this type is declared.
    ///
    /// Class checks are shallow: any object is accepted for a user class,
    /// since the hierarchy lives in the class table.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Type::Void => false,
            Type::Primitive(p) => p.accepts(value),
            Type::Class(name) => match &**name {
                builtin::OBJECT => true,
                builtin::STRING => matches!(value, Value::Null | Value::Str(_)),
                builtin::INVOCATION => matches!(value, Value::Null | Value::Invocation(_)),
                _ => matches!(value, Value::Null | Value::Object(_)),
            },
            Type::Array(element) => match value {
                Value::Null => true,
                Value::Array(items) => items.iter().all(|item| element.accepts(item)),
                _ => false,
            },
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Primitive(p) => write!(f, "{}", format!("{:?}", p).to_lowercase()),
            Type::Class(name) => write!(f, "{}", name),
            Type::Array(element) => write!(f, "{}[]", element),
        }
    }
}

/// Encode a parameter list as `(...)` descriptor notation (no return type)
pub fn params_descriptor(params: &[Type]) -> String {
    let mut out = String::from("(");
    for param in params {
        param.write_descriptor(&mut out);
    }
    out.push(')');
    out
}
