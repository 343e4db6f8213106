//! Filter expression tree for deferred selection
//!
//! A selection is stored as a boolean expression over row predicates rather
//! than as an explicit key set. The tree mirrors the array grammar used on
//! the wire (see [`crate::grammar`]):
//!
//! - `[field, op, value]` is a [`FilterExpr::Leaf`]
//! - `["!", expr]` is a [`FilterExpr::Not`]
//! - `[expr, "and", expr, "or", expr, ...]` is a [`FilterExpr::Group`]
//!
//! Groups keep their items in order, operator tokens included, so a tree
//! always serializes back to the exact sequence it was built from.

use serde_json::Value;

/// Logical operator token inside a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    /// Get the token used in the array grammar
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        }
    }

    /// Parse a grammar token (case-insensitive)
    pub fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("and") {
            Some(LogicalOp::And)
        } else if token.eq_ignore_ascii_case("or") {
            Some(LogicalOp::Or)
        } else {
            None
        }
    }

    /// Apply the operator to two already-evaluated operands
    pub fn apply(&self, lhs: bool, rhs: bool) -> bool {
        match self {
            LogicalOp::And => lhs && rhs,
            LogicalOp::Or => lhs || rhs,
        }
    }
}

/// Comparison operators allowed in a leaf predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Ne,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Substring match
    Contains,
    /// Negated substring match
    NotContains,
    /// Prefix match
    StartsWith,
    /// Suffix match
    EndsWith,
}

impl ComparisonOp {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Contains => "contains",
            ComparisonOp::NotContains => "notcontains",
            ComparisonOp::StartsWith => "startswith",
            ComparisonOp::EndsWith => "endswith",
        }
    }

    /// Parse an operator token
    pub fn from_token(token: &str) -> Option<Self> {
        let op = match token.to_ascii_lowercase().as_str() {
            "=" | "==" => ComparisonOp::Eq,
            "<>" | "!=" => ComparisonOp::Ne,
            "<" => ComparisonOp::Lt,
            "<=" => ComparisonOp::Le,
            ">" => ComparisonOp::Gt,
            ">=" => ComparisonOp::Ge,
            "contains" => ComparisonOp::Contains,
            "notcontains" => ComparisonOp::NotContains,
            "startswith" => ComparisonOp::StartsWith,
            "endswith" => ComparisonOp::EndsWith,
            _ => return None,
        };
        Some(op)
    }
}

/// One entry of a group: either a sub-expression or an operator token
#[derive(Debug, Clone, PartialEq)]
pub enum FilterItem {
    Expr(FilterExpr),
    Op(LogicalOp),
}

impl FilterItem {
    /// The sub-expression, if this item is one
    pub fn as_expr(&self) -> Option<&FilterExpr> {
        match self {
            FilterItem::Expr(expr) => Some(expr),
            FilterItem::Op(_) => None,
        }
    }
}

/// A filter expression
#[derive(Debug, Clone)]
pub enum FilterExpr {
    /// A single field comparison
    Leaf {
        field: String,
        op: ComparisonOp,
        value: Value,
    },

    /// Logical NOT of an expression
    Not(Box<FilterExpr>),

    /// Ordered sequence of sub-expressions and operator tokens.
    /// An empty group matches nothing.
    Group(Vec<FilterItem>),
}

impl FilterExpr {
    /// Create a `[field, "=", value]` predicate
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Leaf {
            field: field.into(),
            op: ComparisonOp::Eq,
            value: value.into(),
        }
    }

    /// Create a leaf predicate with an arbitrary operator
    pub fn compare(field: impl Into<String>, op: ComparisonOp, value: impl Into<Value>) -> Self {
        FilterExpr::Leaf {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Create a NOT expression
    pub fn not(expr: FilterExpr) -> Self {
        FilterExpr::Not(Box::new(expr))
    }

    /// The empty group, i.e. "nothing selected"
    pub fn empty() -> Self {
        FilterExpr::Group(Vec::new())
    }

    /// Join expressions with a single operator: `[a, op, b, op, c]`
    pub fn joined(op: LogicalOp, exprs: impl IntoIterator<Item = FilterExpr>) -> Self {
        let mut items = Vec::new();
        for expr in exprs {
            if !items.is_empty() {
                items.push(FilterItem::Op(op));
            }
            items.push(FilterItem::Expr(expr));
        }
        FilterExpr::Group(items)
    }

    /// Check if this is the empty group
    pub fn is_empty_group(&self) -> bool {
        matches!(self, FilterExpr::Group(items) if items.is_empty())
    }

    /// View this expression as a sequence.
    ///
    /// Leaves and negations become a one-element sequence; groups are
    /// returned as they are.
    pub fn denormalize(self) -> Vec<FilterItem> {
        match self {
            FilterExpr::Group(items) => items,
            other => vec![FilterItem::Expr(other)],
        }
    }

    /// Build an expression back from a sequence, collapsing a one-element
    /// sequence to its sole expression.
    pub fn normalize(mut items: Vec<FilterItem>) -> Self {
        if items.len() == 1 {
            if let Some(FilterItem::Expr(_)) = items.first() {
                if let Some(FilterItem::Expr(expr)) = items.pop() {
                    return expr;
                }
            }
        }
        FilterExpr::Group(items)
    }
}

impl PartialEq for FilterExpr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                FilterExpr::Leaf {
                    field: f1,
                    op: o1,
                    value: v1,
                },
                FilterExpr::Leaf {
                    field: f2,
                    op: o2,
                    value: v2,
                },
            ) => f1 == f2 && o1 == o2 && values_equal(v1, v2),
            (FilterExpr::Not(a), FilterExpr::Not(b)) => a == b,
            (FilterExpr::Group(a), FilterExpr::Group(b)) => a == b,
            _ => false,
        }
    }
}

/// Deep value equality where numbers compare by magnitude.
///
/// `1` and `1.0` are the same key; arrays are order-sensitive, objects are
/// compared field by field regardless of insertion order.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x == y;
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}
