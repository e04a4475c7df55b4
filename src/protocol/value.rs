//! Value conversion
//!
//! Maps decoded `(tag, raw)` items onto typed values and applies the
//! arity collapse that shapes a query result.

use std::fmt;

use crate::error::{ClientError, Result};
use super::{RawItem, ResponseCode, ResponseGroup, Tag};

/// A converted response item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Integer(i64),
    ResponseCode(ResponseCode),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_response_code(&self) -> Option<ResponseCode> {
        match self {
            Value::ResponseCode(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Integer(n) => write!(f, "(integer) {}", n),
            Value::ResponseCode(code) => write!(f, "(code) {}", code),
        }
    }
}

/// Outcome of a query batch
///
/// `Single` whenever the whole response converts to exactly one value,
/// regardless of how many queries were sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    Single(Value),
    Groups(Vec<Vec<Value>>),
}

impl QueryResult {
    /// Collapse per-group values by total arity
    pub fn collapse(mut groups: Vec<Vec<Value>>) -> Self {
        let total: usize = groups.iter().map(Vec::len).sum();
        if total == 1 {
            if let Some(value) = groups.iter_mut().find_map(Vec::pop) {
                return QueryResult::Single(value);
            }
        }
        QueryResult::Groups(groups)
    }

    pub fn single(&self) -> Option<&Value> {
        match self {
            QueryResult::Single(value) => Some(value),
            QueryResult::Groups(_) => None,
        }
    }

    pub fn into_single(self) -> Option<Value> {
        match self {
            QueryResult::Single(value) => Some(value),
            QueryResult::Groups(_) => None,
        }
    }

    /// All values, flattened in response order
    pub fn into_values(self) -> Vec<Value> {
        match self {
            QueryResult::Single(value) => vec![value],
            QueryResult::Groups(groups) => groups.into_iter().flatten().collect(),
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Single(value) => write!(f, "{}", value),
            QueryResult::Groups(groups) => {
                for (i, group) in groups.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{})", i + 1)?;
                    for value in group {
                        write!(f, " {}", value)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Convert one raw item
///
/// Only strings, response codes and integers are implemented. The other
/// declared tags are rejected with `UnsupportedType`.
pub fn convert(tag: Tag, raw: &str) -> Result<Value> {
    match tag {
        Tag::String => Ok(Value::String(raw.to_owned())),
        Tag::ResponseCode => parse_decimal(tag, raw).map(|code| {
            Value::ResponseCode(ResponseCode::from_code(code))
        }),
        Tag::Int => parse_decimal(tag, raw).map(Value::Integer),
        Tag::Json
        | Tag::SmallInt
        | Tag::SmallIntSigned
        | Tag::IntSigned
        | Tag::Float
        | Tag::Binary => Err(ClientError::UnsupportedType(tag)),
    }
}

/// Convert a raw item in place
pub fn convert_item(item: &RawItem) -> Result<Value> {
    convert(item.tag, &item.value)
}

/// Convert every group, failing the whole batch on the first bad item
pub fn convert_groups(groups: &[ResponseGroup]) -> Result<Vec<Vec<Value>>> {
    groups
        .iter()
        .map(|group| group.iter().map(convert_item).collect())
        .collect()
}

fn parse_decimal(tag: Tag, raw: &str) -> Result<i64> {
    raw.parse::<i64>().map_err(|e| {
        ClientError::corruption(format!("'{}' item is not a decimal ({:?}): {}", tag, raw, e))
    })
}
