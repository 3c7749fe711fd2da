//! Value types that flow through node ports and parameters.
//!
//! The set of port types is closed, so values are an enum. Typed access goes
//! through [`PortValue`], which maps a Rust type onto exactly one variant.

use crate::imgproc::Mat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value bound to a port or parameter slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    /// Image buffer
    Image(Mat),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Boolean value
    Boolean(bool),
}

/// Declared type of a port or parameter.
///
/// Matching is exact: an `Integer` value does not satisfy a `Float` port.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PortType {
    Image,
    Integer,
    Float,
    String,
    Boolean,
}

impl Value {
    /// Get the port type of this value.
    pub fn get_type(&self) -> PortType {
        match self {
            Value::Image(_) => PortType::Image,
            Value::Integer(_) => PortType::Integer,
            Value::Float(_) => PortType::Float,
            Value::String(_) => PortType::String,
            Value::Boolean(_) => PortType::Boolean,
        }
    }

    /// Try to get this value as an image reference.
    pub fn as_image(&self) -> Option<&Mat> {
        if let Value::Image(img) = self {
            Some(img)
        } else {
            None
        }
    }

    /// Try to get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    /// Try to get this value as a float. Integers are not widened.
    pub fn as_float(&self) -> Option<f64> {
        if let Value::Float(f) = self {
            Some(*f)
        } else {
            None
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_string(&self) -> Option<&str> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// Convert a JSON scalar into a value.
    ///
    /// Numbers written as integers become `Integer` and all other numbers
    /// (including `3.0`) become `Float`. Arrays, objects and null have no counterpart.
    pub fn from_json(json: &serde_json::Value) -> Option<Value> {
        match json {
            serde_json::Value::Bool(b) => Some(Value::Boolean(*b)),
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Integer)
                .or_else(|| n.as_f64().map(Value::Float)),
            _ => None,
        }
    }

    /// Parse a command-line literal: integer, then float, then boolean,
    /// falling back to a string.
    pub fn parse_literal(text: &str) -> Value {
        if let Ok(i) = text.parse::<i64>() {
            Value::Integer(i)
        } else if let Ok(f) = text.parse::<f64>() {
            Value::Float(f)
        } else if let Ok(b) = text.parse::<bool>() {
            Value::Boolean(b)
        } else {
            Value::String(text.to_string())
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Image(img) => write!(f, "{}", img),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{:.4}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl PortType {
    /// Check if a value matches this port type.
    pub fn matches(&self, value: &Value) -> bool {
        *self == value.get_type()
    }

    /// Get a human-readable name for this type.
    pub fn display_name(&self) -> &'static str {
        match self {
            PortType::Image => "Image",
            PortType::Integer => "Integer",
            PortType::Float => "Float",
            PortType::String => "String",
            PortType::Boolean => "Boolean",
        }
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Rust types that can be stored in a port slot.
///
/// Each implementor corresponds to exactly one [`PortType`], which is what
/// [`crate::core::context::PortSet::get`] checks against.
pub trait PortValue: Clone + Send + Sync + 'static {
    /// The port type this Rust type maps to.
    const PORT_TYPE: PortType;

    /// Borrow the payload if `value` has the right variant.
    fn from_value(value: &Value) -> Option<&Self>;

    /// Wrap into a [`Value`].
    fn into_value(self) -> Value;
}

macro_rules! impl_port_value {
    ($ty:ty, $variant:ident) => {
        impl PortValue for $ty {
            const PORT_TYPE: PortType = PortType::$variant;

            fn from_value(value: &Value) -> Option<&Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }
    };
}

impl_port_value!(Mat, Image);
impl_port_value!(i64, Integer);
impl_port_value!(f64, Float);
impl_port_value!(String, String);
impl_port_value!(bool, Boolean);
