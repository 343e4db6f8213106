//! Array grammar codec for filter expressions
//!
//! Grammar (JSON):
//! ```text
//! expr  := leaf | not | group
//! leaf  := [field, op, value] | [field, value]      (two-element form means "=")
//! not   := ["!", expr]
//! group := [] | [item, item, ...]                   (first item is an array)
//! item  := expr | "and" | "or"
//! op    := "=" | "<>" | "<" | "<=" | ">" | ">=" | "contains" | "notcontains"
//!        | "startswith" | "endswith"
//! ```
//!
//! This is the persisted form of a selection, so encoding is exact: a
//! decoded tree encodes back to the same array (two-element leaves are the
//! only exception and come back in three-element form).

use crate::error::GrammarError;
use crate::expr::{ComparisonOp, FilterExpr, FilterItem, LogicalOp};
use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

const NOT_TOKEN: &str = "!";

impl FilterExpr {
    /// Decode an expression from its JSON array form
    pub fn from_json(value: &Value) -> Result<Self, GrammarError> {
        let items = value
            .as_array()
            .ok_or_else(|| GrammarError::NotAnArray(value.to_string()))?;

        match items.first() {
            None => Ok(FilterExpr::empty()),
            Some(Value::String(head)) => predicate(head, &items[1..]),
            Some(Value::Array(_)) => group(items),
            Some(other) => Err(GrammarError::InvalidPredicate(format!(
                "unexpected leading element {}",
                other
            ))),
        }
    }

    /// Encode the expression as its JSON array form
    pub fn to_json(&self) -> Value {
        match self {
            FilterExpr::Leaf { field, op, value } => Value::Array(vec![
                Value::String(field.clone()),
                Value::String(op.as_str().to_string()),
                value.clone(),
            ]),
            FilterExpr::Not(inner) => {
                Value::Array(vec![Value::String(NOT_TOKEN.to_string()), inner.to_json()])
            }
            FilterExpr::Group(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        FilterItem::Expr(expr) => expr.to_json(),
                        FilterItem::Op(op) => Value::String(op.as_str().to_string()),
                    })
                    .collect(),
            ),
        }
    }

    /// Parse an expression from a JSON string
    pub fn parse(input: &str) -> Result<Self, GrammarError> {
        let value: Value = serde_json::from_str(input.trim())
            .map_err(|e| GrammarError::InvalidJson(e.to_string()))?;
        Self::from_json(&value)
    }
}

/// Decode an array that starts with a string: a negation or a leaf
fn predicate(head: &str, rest: &[Value]) -> Result<FilterExpr, GrammarError> {
    if head == NOT_TOKEN {
        return match rest {
            [inner] => Ok(FilterExpr::not(FilterExpr::from_json(inner)?)),
            _ => Err(GrammarError::InvalidPredicate(format!(
                "negation takes one operand, found {}",
                rest.len()
            ))),
        };
    }

    match rest {
        [value] => Ok(FilterExpr::eq(head, value.clone())),
        [Value::String(op), value] => {
            let op = ComparisonOp::from_token(op)
                .ok_or_else(|| GrammarError::UnknownComparison(op.clone()))?;
            Ok(FilterExpr::compare(head, op, value.clone()))
        }
        [op, _] => Err(GrammarError::UnknownComparison(op.to_string())),
        _ => Err(GrammarError::InvalidPredicate(format!(
            "predicate on '{}' has {} operands",
            head,
            rest.len()
        ))),
    }
}

/// Decode an array of sub-expressions and operator tokens
fn group(items: &[Value]) -> Result<FilterExpr, GrammarError> {
    let items = items
        .iter()
        .map(|item| match item {
            Value::Array(_) => FilterExpr::from_json(item).map(FilterItem::Expr),
            Value::String(token) => LogicalOp::from_token(token)
                .map(FilterItem::Op)
                .ok_or_else(|| GrammarError::UnknownLogical(token.clone())),
            other => Err(GrammarError::InvalidPredicate(format!(
                "unexpected group element {}",
                other
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FilterExpr::Group(items))
}

impl Serialize for FilterExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterExpr::Leaf { field, op, value } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(field)?;
                seq.serialize_element(op.as_str())?;
                seq.serialize_element(value)?;
                seq.end()
            }
            FilterExpr::Not(inner) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(NOT_TOKEN)?;
                seq.serialize_element(inner.as_ref())?;
                seq.end()
            }
            FilterExpr::Group(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    match item {
                        FilterItem::Expr(expr) => seq.serialize_element(expr)?,
                        FilterItem::Op(op) => seq.serialize_element(op.as_str())?,
                    }
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for FilterExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FilterExpr::from_json(&value).map_err(D::Error::custom)
    }
}
