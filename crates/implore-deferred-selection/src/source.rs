//! Data source seam for deferred selection.
//!
//! The engine never owns rows. It asks a [`DataSource`] for the key
//! accessor and the base (display) filter, and loads rows through it only
//! when the selected rows or keys have to be materialized.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::SelectionConfig;
use crate::error::DataSourceError;
use crate::eval::{field_value, FilterEvaluator, JsonEvaluator};
use crate::expr::FilterExpr;
use crate::key::KeyExpr;

/// Parameters for a single load request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOptions {
    /// Rows must match this filter; `None` loads every row
    pub filter: Option<FilterExpr>,
    /// Project each row onto these fields; `None` returns whole rows
    pub select: Option<Vec<String>>,
}

impl LoadOptions {
    /// Load whole rows matching `filter`
    pub fn filtered(filter: Option<FilterExpr>) -> Self {
        Self {
            filter,
            select: None,
        }
    }
}

/// Backing store of a grid, as seen by the selection engine
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Key accessor: the field(s) identifying a row, if known
    fn key(&self) -> Option<KeyExpr>;

    /// Base filter currently applied to the displayed data
    fn filter(&self) -> Option<FilterExpr> {
        None
    }

    /// Key of a loaded row; the whole row when no key is configured
    fn key_of(&self, row: &Value) -> Value {
        match self.key() {
            Some(key) => key.key_of(row),
            None => row.clone(),
        }
    }

    /// Load the rows described by `options`
    async fn load(&self, options: LoadOptions) -> Result<Vec<Value>, DataSourceError>;
}

/// In-memory data source over a vector of JSON rows
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    rows: Vec<Value>,
    key: Option<KeyExpr>,
    filter: Option<FilterExpr>,
    evaluator: JsonEvaluator,
}

impl MemorySource {
    /// Create a source over `rows` with no key and no base filter
    pub fn new(rows: Vec<Value>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Create a source taking its key and base filter from a config
    pub fn from_config(rows: Vec<Value>, config: &SelectionConfig) -> Self {
        Self {
            rows,
            key: config.key.clone(),
            filter: config.filter.clone(),
            evaluator: JsonEvaluator,
        }
    }

    /// Set the key accessor
    pub fn with_key(mut self, key: impl Into<KeyExpr>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the base filter
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }
}

#[async_trait]
impl DataSource for MemorySource {
    fn key(&self) -> Option<KeyExpr> {
        self.key.clone()
    }

    fn filter(&self) -> Option<FilterExpr> {
        self.filter.clone()
    }

    async fn load(&self, options: LoadOptions) -> Result<Vec<Value>, DataSourceError> {
        let rows = self.evaluator.filter_rows(options.filter.as_ref(), &self.rows);
        tracing::trace!("Loaded {} of {} rows", rows.len(), self.rows.len());

        match options.select {
            None => Ok(rows),
            Some(fields) => Ok(rows.iter().map(|row| project(row, &fields)).collect()),
        }
    }
}

/// Keep only `fields` of a row; a missing field reads as `null`
fn project(row: &Value, fields: &[String]) -> Value {
    let projected: Map<String, Value> = fields
        .iter()
        .map(|field| {
            let value = field_value(row, field).cloned().unwrap_or(Value::Null);
            (field.clone(), value)
        })
        .collect();
    Value::Object(projected)
}
