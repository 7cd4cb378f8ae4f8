#![forbid(unsafe_code)]

//! Field payloads.
//!
//! The binding never looks inside a [`Value`]; it only stores, clones, and
//! hands values back. Scalars get convenient accessors and a natural
//! `Display`. Anything else rides along as [`Value::Opaque`], which clones by
//! reference count and compares by identity.

use std::any::Any;
use std::rc::Rc;

/// A state field value.
#[derive(Clone, Default)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Arbitrary payload, compared by pointer identity.
    Opaque(Rc<dyn Any>),
}

impl Value {
    /// Wrap an arbitrary payload.
    #[must_use]
    pub fn opaque<T: Any>(payload: T) -> Self {
        Self::Opaque(Rc::new(payload))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value. Floats are not converted.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value, widening integers.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow an opaque payload as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Opaque(payload) => payload.downcast_ref(),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Opaque(_) => "opaque",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Self::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Opaque(_) => f.debug_tuple("Opaque").finish_non_exhaustive(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Opaque(_) => f.write_str("[opaque]"),
        }
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_display() {
        assert_eq!(Value::from(1000).to_string(), "1000");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from(1000.0).to_string(), "1000");
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::from(7).as_int(), Some(7));
        assert_eq!(Value::from(7).as_float(), Some(7.0));
        assert_eq!(Value::from(7.5).as_int(), None);
        assert_eq!(Value::from("x").as_text(), Some("x"));
        assert_eq!(Value::from(false).as_bool(), Some(false));
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::from(3).kind(), "int");
    }

    #[test]
    fn opaque_identity_equality() {
        let a = Value::opaque(vec![1, 2, 3]);
        let b = a.clone();
        let c = Value::opaque(vec![1, 2, 3]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "[opaque]");
    }

    #[test]
    fn opaque_downcast() {
        let v = Value::opaque(String::from("payload"));
        assert_eq!(v.downcast_ref::<String>().map(String::as_str), Some("payload"));
        assert!(v.downcast_ref::<i32>().is_none());
        assert!(Value::from(1).downcast_ref::<i64>().is_none());
    }

    #[test]
    fn mixed_variants_unequal() {
        assert_ne!(Value::from(1), Value::from(1.0));
        assert_ne!(Value::Null, Value::from(false));
    }
}
