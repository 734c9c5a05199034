//! Domain values of discrete variables.
//!
//! Every variable ranges over a finite, totally ordered domain.
//! Boolean domains are the common case, with `false < true`.
//! Integer-labelled domains are supported for multi-valued variables.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single value from a variable's domain.
///
/// The derived order is the natural one within each kind
/// (`false < true`, integers ascending), which is the order
/// [`sumout`][crate::factor::Factor::sumout] emits its rows in.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
}

impl Value {
    pub const FALSE: Value = Value::Bool(false);
    pub const TRUE: Value = Value::Bool(true);
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
        }
    }
}

impl std::str::FromStr for Value {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "true" | "t" => Ok(Value::TRUE),
            "false" | "f" => Ok(Value::FALSE),
            other => other
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("not a domain value: {}", s)),
        }
    }
}
