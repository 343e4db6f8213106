//! Row keys and the predicates built from them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::eval::field_value;
use crate::expr::{FilterExpr, LogicalOp};

/// Field (or ordered fields) that identify a row uniquely.
///
/// Serialized as a plain string for a single field and as an array of
/// strings for a compound key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyExpr {
    Single(String),
    Compound(Vec<String>),
}

impl KeyExpr {
    /// Fields a retrieval must load to rebuild keys
    pub fn fields(&self) -> Vec<String> {
        match self {
            KeyExpr::Single(field) => vec![field.clone()],
            KeyExpr::Compound(fields) => fields.clone(),
        }
    }

    /// Build the predicate matching exactly the row with `key`.
    ///
    /// A single field gives `[field, "=", key]`. A compound key gives the
    /// per-field equalities joined with `"and"`, reading each field from
    /// the key object; a field absent from the key compares against `null`.
    pub fn predicate(&self, key: &Value) -> FilterExpr {
        match self {
            KeyExpr::Single(field) => FilterExpr::eq(field.as_str(), key.clone()),
            KeyExpr::Compound(fields) => FilterExpr::joined(
                LogicalOp::And,
                fields.iter().map(|field| {
                    let part = key.get(field).cloned().unwrap_or(Value::Null);
                    FilterExpr::eq(field.as_str(), part)
                }),
            ),
        }
    }

    /// Extract the key of a row
    pub fn key_of(&self, row: &Value) -> Value {
        match self {
            KeyExpr::Single(field) => field_value(row, field).cloned().unwrap_or(Value::Null),
            KeyExpr::Compound(fields) => {
                let mut key = Map::new();
                for field in fields {
                    let part = field_value(row, field).cloned().unwrap_or(Value::Null);
                    key.insert(field.clone(), part);
                }
                Value::Object(key)
            }
        }
    }

    /// Build the smallest row carrying `key`, for evaluating a filter
    /// against a key alone.
    pub fn row_from_key(&self, key: &Value) -> Value {
        match self {
            KeyExpr::Single(field) => {
                let mut row = Map::new();
                row.insert(field.clone(), key.clone());
                Value::Object(row)
            }
            KeyExpr::Compound(_) => key.clone(),
        }
    }
}

impl From<&str> for KeyExpr {
    fn from(field: &str) -> Self {
        KeyExpr::Single(field.to_string())
    }
}

impl From<Vec<&str>> for KeyExpr {
    fn from(fields: Vec<&str>) -> Self {
        KeyExpr::Compound(fields.into_iter().map(String::from).collect())
    }
}
