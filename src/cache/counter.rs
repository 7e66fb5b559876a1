//! Counter Module
//!
//! Typed contract for values that can back `increment`/`decrement`, plus a
//! tagged `Value` for caches that mix counters with other data.

use serde::{Deserialize, Serialize};

/// A value type usable as a counter.
///
/// `count` returns `None` when the value does not hold an integer; the
/// counter operations then start again from zero and overwrite it.
pub trait Counter: Sized {
    fn count(&self) -> Option<i64>;
    fn from_count(count: i64) -> Self;
}

impl Counter for i64 {
    fn count(&self) -> Option<i64> {
        Some(*self)
    }

    fn from_count(count: i64) -> Self {
        count
    }
}

// == Value ==
/// A tagged value for heterogeneous caches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Counter for Value {
    fn count(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    fn from_count(count: i64) -> Self {
        Value::Int(count)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}
