//! Expression evaluation for selection filters
//!
//! Evaluates filter expressions against JSON rows.

use crate::expr::*;
use serde_json::Value;
use std::cmp::Ordering;

/// Tests rows against filter expressions
pub trait FilterEvaluator: Send + Sync {
    /// Check whether a single row matches the filter
    fn matches(&self, filter: &FilterExpr, row: &Value) -> bool;

    /// Keep the rows matching the filter; `None` keeps every row
    fn filter_rows(&self, filter: Option<&FilterExpr>, rows: &[Value]) -> Vec<Value> {
        match filter {
            None => rows.to_vec(),
            Some(filter) => rows
                .iter()
                .filter(|row| self.matches(filter, row))
                .cloned()
                .collect(),
        }
    }
}

/// Evaluator over `serde_json` object rows.
///
/// Field names may be dotted paths (`"address.city"`). A missing field
/// evaluates as `null`. Inside a group, operators apply left to right
/// without precedence, and adjacent sub-expressions with no operator token
/// between them are joined with `and`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEvaluator;

impl JsonEvaluator {
    /// Create a new evaluator
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a group of items left to right
    fn evaluate_group(&self, items: &[FilterItem], row: &Value) -> bool {
        let mut result: Option<bool> = None;
        let mut pending = None;

        for item in items {
            match item {
                FilterItem::Op(op) => pending = Some(*op),
                FilterItem::Expr(expr) => {
                    let value = self.matches(expr, row);
                    result = Some(match result {
                        None => value,
                        Some(acc) => pending.unwrap_or(LogicalOp::And).apply(acc, value),
                    });
                    pending = None;
                }
            }
        }

        result.unwrap_or(false)
    }

    /// Evaluate a leaf comparison
    fn evaluate_comparison(&self, op: ComparisonOp, actual: &Value, expected: &Value) -> bool {
        match op {
            ComparisonOp::Eq => values_equal(actual, expected),
            ComparisonOp::Ne => !values_equal(actual, expected),
            ComparisonOp::Lt => compare(actual, expected) == Some(Ordering::Less),
            ComparisonOp::Le => matches!(
                compare(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
            ComparisonOp::Gt => compare(actual, expected) == Some(Ordering::Greater),
            ComparisonOp::Ge => matches!(
                compare(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            ComparisonOp::Contains => text_match(actual, expected, |a, b| a.contains(b)),
            ComparisonOp::NotContains => !text_match(actual, expected, |a, b| a.contains(b)),
            ComparisonOp::StartsWith => text_match(actual, expected, |a, b| a.starts_with(b)),
            ComparisonOp::EndsWith => text_match(actual, expected, |a, b| a.ends_with(b)),
        }
    }
}

impl FilterEvaluator for JsonEvaluator {
    fn matches(&self, filter: &FilterExpr, row: &Value) -> bool {
        match filter {
            FilterExpr::Leaf { field, op, value } => {
                let actual = field_value(row, field).unwrap_or(&Value::Null);
                self.evaluate_comparison(*op, actual, value)
            }
            FilterExpr::Not(inner) => !self.matches(inner, row),
            FilterExpr::Group(items) => self.evaluate_group(items, row),
        }
    }
}

/// Look up a possibly dotted field path in a row
pub fn field_value<'a>(row: &'a Value, path: &str) -> Option<&'a Value> {
    if let Some(value) = row.get(path) {
        return Some(value);
    }
    path.split('.')
        .try_fold(row, |current, segment| current.get(segment))
}

/// Order two scalar values of the same kind
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Case-insensitive string test; non-string operands never match
fn text_match(actual: &Value, expected: &Value, test: impl Fn(&str, &str) -> bool) -> bool {
    match (actual, expected) {
        (Value::String(a), Value::String(b)) => test(&a.to_lowercase(), &b.to_lowercase()),
        _ => false,
    }
}

/// Count the rows matching a filter
pub fn count_matching(
    evaluator: &dyn FilterEvaluator,
    filter: &FilterExpr,
    rows: &[Value],
) -> usize {
    rows.iter().filter(|row| evaluator.matches(filter, row)).count()
}
