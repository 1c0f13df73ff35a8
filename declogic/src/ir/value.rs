//! Constant values and return literals

use std::fmt;

use serde::{Deserialize, Serialize};

/// A constant the restricted interpreter can compute with
///
/// Serialized untagged, so JSON carries `null`, booleans, integers and
/// strings directly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Value {
    /// Python truthiness: `None`, `False`, `0` and `""` are false
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Str(s) => !s.is_empty(),
        }
    }

    /// Numeric view with bool-to-int coercion
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "str",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

/// What a rule returns
///
/// Returns that are not constants keep their source text as `Opaque`; they
/// are compared by that text and never evaluated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Value(Value),
    Opaque(String),
}

impl Literal {
    pub fn none() -> Self {
        Literal::Value(Value::None)
    }

    pub fn int(n: i64) -> Self {
        Literal::Value(Value::Int(n))
    }

    pub fn bool(b: bool) -> Self {
        Literal::Value(Value::Bool(b))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Literal::Value(Value::Str(s.into()))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Literal::Value(v) => Some(v),
            Literal::Opaque(_) => None,
        }
    }
}

impl From<Value> for Literal {
    fn from(v: Value) -> Self {
        Literal::Value(v)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Value(v) => write!(f, "{v}"),
            Literal::Opaque(text) => write!(f, "{text}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.truthy());
        assert!(!Value::Bool(false).truthy());
        assert!(!Value::Int(0).truthy());
        assert!(!Value::Str(String::new()).truthy());
        assert!(Value::Int(-3).truthy());
        assert!(Value::from("x").truthy());
    }

    #[test]
    fn test_bool_coerces_to_int() {
        assert_eq!(Value::Bool(true).as_int(), Some(1));
        assert_eq!(Value::Bool(false).as_int(), Some(0));
        assert_eq!(Value::None.as_int(), None);
    }

    #[test]
    fn test_display_is_python_like() {
        assert_eq!(Value::None.to_string(), "None");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Str("hi".into()).to_string(), "\"hi\"");
        assert_eq!(Literal::Opaque("compute(x)".into()).to_string(), "compute(x)");
    }

    #[test]
    fn test_json_shapes() {
        assert_eq!(serde_json::to_string(&Value::None).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Literal::int(3)).unwrap(), r#"{"value":3}"#);
        assert_eq!(
            serde_json::to_string(&Literal::Opaque("f()".into())).unwrap(),
            r#"{"opaque":"f()"}"#
        );
        let back: Literal = serde_json::from_str(r#"{"value":"ok"}"#).unwrap();
        assert_eq!(back, Literal::str("ok"));
    }
}
