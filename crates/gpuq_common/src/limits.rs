//! Device limits as reported, with typed accessors.
//!
//! Reports mix several encodings in one map: plain numbers, fixed-length
//! tuples (`maxComputeWorkGroupSize`), booleans written as `0`/`1` or
//! `true`/`false`, and device sizes written as radix-prefixed strings
//! (`"0x100"`). Accessors return `None` when a limit is absent or does not
//! have the requested shape.

use crate::literal::parse_int_literal;
use serde::Deserialize;
use serde_json::Number;
use std::collections::BTreeMap;

/// One limit value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LimitValue {
    Bool(bool),
    Number(Number),
    Tuple(Vec<Number>),
    Text(String),
    Other(serde_json::Value),
}

impl LimitValue {
    /// Numeric value of a scalar limit. Booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LimitValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            LimitValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Unsigned integer value, for flag limits such as sample counts.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            LimitValue::Bool(b) => Some(u64::from(*b)),
            LimitValue::Number(n) => n.as_u64(),
            LimitValue::Text(s) => parse_int_literal(s).and_then(|v| u64::try_from(v).ok()),
            _ => None,
        }
    }

    /// Integer value of a radix-prefixed string (`"0x100"`).
    /// Integer numbers are accepted as-is.
    pub fn as_literal(&self) -> Option<i64> {
        match self {
            LimitValue::Text(s) => parse_int_literal(s),
            LimitValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Component `index` of a tuple limit.
    pub fn component(&self, index: usize) -> Option<f64> {
        match self {
            LimitValue::Tuple(values) => values.get(index).and_then(Number::as_f64),
            _ => None,
        }
    }
}

/// Limits map, keyed by limit name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Limits(BTreeMap<String, LimitValue>);

impl Limits {
    pub fn get(&self, name: &str) -> Option<&LimitValue> {
        self.0.get(name)
    }

    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(LimitValue::as_f64)
    }

    pub fn flags(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(LimitValue::as_u64)
    }

    pub fn literal(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(LimitValue::as_literal)
    }

    pub fn component(&self, name: &str, index: usize) -> Option<f64> {
        self.get(name).and_then(|v| v.component(index))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, LimitValue)> for Limits {
    fn from_iter<T: IntoIterator<Item = (String, LimitValue)>>(iter: T) -> Self {
        Limits(iter.into_iter().collect())
    }
}
