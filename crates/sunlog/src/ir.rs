use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Decoded key/value pairs of one log line, in the order they were written.
pub type Payload = IndexMap<String, Value>;

/// A nested record: string keys mapped to scalars, arrays, sub-records or lists of records.
pub type Dict = IndexMap<String, Node>;

/// A scalar or array value decoded from a payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    /// NaN and infinities have no JSON number form; they serialize as text.
    Float(#[serde(serialize_with = "serialize_float")] f64),
    String(String),
    Array(Vec<Value>),
}

impl Value {
    /// Decodes one scalar literal: integer first, then float, otherwise the text itself.
    pub fn from_literal(text: &str) -> Self {
        let text = text.trim();
        if let Ok(int) = text.parse::<i64>() {
            Value::Int(int)
        } else if let Ok(float) = text.parse::<f64>() {
            Value::Float(float)
        } else {
            Value::String(text.to_string())
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            // Debug keeps a decimal point or exponent, so the text decodes back to a float.
            Value::Float(v) => write!(f, "{v:?}"),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

fn serialize_float<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.collect_str(&Value::Float(*value))
    }
}

/// An entry of a [`Dict`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Value(Value),
    Dict(Dict),
    List(Vec<Dict>),
}

impl Node {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Node::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Dict]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::Value(value)
    }
}

/// One structured log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    #[serde(rename = "loglvl")]
    pub level: String,
    pub rank: i64,
    pub scope: String,
    pub label: String,
    pub payload: Payload,
}

/// Everything recovered from one log: the step records plus any fields
/// that were logged outside of a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogDocument {
    pub globals: Dict,
    pub steps: Vec<Dict>,
}
