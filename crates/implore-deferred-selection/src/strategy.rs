//! Deferred selection engine
//!
//! [`DeferredSelection`] owns the selection filter of a grid and keeps it in
//! minimal form while rows are selected and deselected one by one or all at
//! once. Selected rows are never enumerated up front: the filter is only
//! evaluated for a single row, or handed to the data source when the caller
//! asks for the selected rows or keys.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::config::SelectionConfig;
use crate::error::{Result, SelectionError};
use crate::eval::{FilterEvaluator, JsonEvaluator};
use crate::expr::FilterExpr;
use crate::key::KeyExpr;
use crate::merge::{merge_selection_filter, select_all_state, Merge};
use crate::source::{DataSource, LoadOptions};

/// Receives selection notifications
pub trait SelectionListener: Send {
    /// The stored selection filter was replaced
    fn selection_filter_changed(&mut self, _filter: Option<&FilterExpr>) {}

    /// A selection operation completed
    fn selection_changed(&mut self) {}
}

/// Filter-based selection over a data source
pub struct DeferredSelection {
    source: Arc<dyn DataSource>,
    evaluator: Arc<dyn FilterEvaluator>,
    selection_filter: Option<FilterExpr>,
    listeners: Vec<Box<dyn SelectionListener>>,
}

impl DeferredSelection {
    /// Create an engine with everything selected
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            evaluator: Arc::new(JsonEvaluator),
            selection_filter: None,
            listeners: Vec::new(),
        }
    }

    /// Create an engine restoring the configured selection filter
    pub fn from_config(source: Arc<dyn DataSource>, config: &SelectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(source).with_selection_filter(config.selection_filter.clone()))
    }

    /// Use a custom evaluator for single-row checks
    pub fn with_evaluator(mut self, evaluator: Arc<dyn FilterEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Start from the given selection filter
    pub fn with_selection_filter(mut self, filter: Option<FilterExpr>) -> Self {
        self.selection_filter = filter;
        self
    }

    /// Register a listener for selection notifications
    pub fn subscribe(&mut self, listener: Box<dyn SelectionListener>) {
        self.listeners.push(listener);
    }

    /// The stored selection filter; `None` means everything is selected
    pub fn selection_filter(&self) -> Option<&FilterExpr> {
        self.selection_filter.as_ref()
    }

    /// The stored selection filter in its persisted JSON form
    pub fn selection_state_json(&self) -> Value {
        self.selection_filter
            .as_ref()
            .map(FilterExpr::to_json)
            .unwrap_or(Value::Null)
    }

    /// Restore a selection persisted with [`Self::selection_state_json`].
    ///
    /// `null` restores "everything selected". Listeners are notified as for
    /// any other selection change.
    pub fn restore_selection_state(&mut self, state: &Value) -> Result<()> {
        let filter = match state {
            Value::Null => None,
            other => Some(FilterExpr::from_json(other)?),
        };
        self.set_selection_filter(filter);
        self.notify_selection_changed();
        Ok(())
    }

    /// Replace the stored selection filter and notify listeners.
    ///
    /// All mutations go through here; the previous value is dropped, never
    /// edited in place.
    pub fn set_selection_filter(&mut self, filter: Option<FilterExpr>) {
        self.selection_filter = filter;
        debug!("Selection filter set to {}", self.selection_state_json());

        let filter = self.selection_filter.as_ref();
        for listener in self.listeners.iter_mut() {
            listener.selection_filter_changed(filter);
        }
    }

    /// Check the data source exposes a key
    pub fn validate(&self) -> Result<()> {
        if self.source.key().is_none() {
            warn!("Deferred selection has no data source key");
            return Err(SelectionError::MissingKey);
        }
        Ok(())
    }

    /// Check whether the row with `key` is selected
    pub fn is_item_key_selected(&self, key: &Value) -> Result<bool> {
        let Some(filter) = &self.selection_filter else {
            return Ok(true);
        };
        let row = self.key()?.row_from_key(key);
        Ok(self.evaluator.matches(filter, &row))
    }

    /// Check whether a loaded row is selected
    pub fn is_item_data_selected(&self, row: &Value) -> bool {
        match &self.selection_filter {
            None => true,
            Some(filter) => self.evaluator.matches(filter, row),
        }
    }

    /// Select the row with `key`
    pub fn add_selected(&mut self, key: &Value) -> Result<()> {
        let key_expr = self.key()?;
        if self.toggle(&key_expr, key, false) {
            self.notify_selection_changed();
        }
        Ok(())
    }

    /// Deselect the row with `key`
    pub fn remove_selected(&mut self, key: &Value) -> Result<()> {
        let key_expr = self.key()?;
        if self.toggle(&key_expr, key, true) {
            self.notify_selection_changed();
        }
        Ok(())
    }

    /// Select exactly `keys`.
    ///
    /// The filter is first reset to "everything selected" and then every key
    /// is added. With no keys the result is therefore everything selected.
    pub fn set_exact_selection(&mut self, keys: &[Value]) -> Result<()> {
        let key_expr = self.key()?;
        self.set_selection_filter(None);
        for key in keys {
            self.toggle(&key_expr, key, false);
        }
        self.notify_selection_changed();
        Ok(())
    }

    /// Select or deselect many keys, or everything the base filter shows.
    ///
    /// - `is_select_all`: with no base filter, store "everything" or
    ///   "nothing"; otherwise merge the base filter (or its negation) into
    ///   the selection. `keys` and `preserve` are ignored.
    /// - otherwise: unless `preserve`, start from "nothing selected", then
    ///   add or remove each key.
    ///
    /// Listeners are always notified once at the end.
    pub fn apply_bulk_selection(
        &mut self,
        keys: &[Value],
        preserve: bool,
        is_deselect: bool,
        is_select_all: bool,
    ) -> Result<()> {
        if is_select_all {
            match self.source.filter() {
                None => {
                    let filter = if is_deselect {
                        Some(FilterExpr::empty())
                    } else {
                        None
                    };
                    self.set_selection_filter(filter);
                }
                Some(base) => {
                    self.merge(base, is_deselect, false);
                }
            }
        } else {
            let key_expr = match keys {
                [] => None,
                _ => Some(self.key()?),
            };
            if !preserve {
                self.set_selection_filter(Some(FilterExpr::empty()));
            }
            if let Some(key_expr) = key_expr {
                for key in keys {
                    self.toggle(&key_expr, key, is_deselect);
                }
            }
        }

        self.notify_selection_changed();
        Ok(())
    }

    /// Tri-state "select all": `Some(true)` when all rows of the base filter
    /// are selected, `Some(false)` when none are, `None` otherwise.
    pub fn select_all_state(&self) -> Option<bool> {
        let base = self.source.filter();
        select_all_state(self.selection_filter.as_ref(), base.as_ref())
    }

    /// Load the selected rows.
    ///
    /// The filter is captured when this is called; later selection changes
    /// do not affect a request already issued.
    pub fn get_selected_items(
        &self,
    ) -> impl Future<Output = Result<Vec<Value>>> + Send + 'static {
        let source = Arc::clone(&self.source);
        let options = LoadOptions::filtered(self.selection_filter.clone());

        async move { source.load(options).await.map_err(SelectionError::from) }
    }

    /// Load the keys of the selected rows, loading only the key fields
    pub fn get_selected_item_keys(
        &self,
    ) -> impl Future<Output = Result<Vec<Value>>> + Send + 'static {
        let source = Arc::clone(&self.source);
        let options = LoadOptions {
            filter: self.selection_filter.clone(),
            select: source.key().map(|key| key.fields()),
        };

        async move {
            source
                .load(options)
                .await
                .map(|rows| rows.iter().map(|row| source.key_of(row)).collect::<Vec<_>>())
                .map_err(SelectionError::from)
        }
    }

    fn key(&self) -> Result<KeyExpr> {
        self.source.key().ok_or(SelectionError::MissingKey)
    }

    /// Merge the predicate for one key; returns whether the filter changed
    fn toggle(&mut self, key_expr: &KeyExpr, key: &Value, is_deselect: bool) -> bool {
        self.merge(key_expr.predicate(key), is_deselect, true)
    }

    fn merge(&mut self, predicate: FilterExpr, is_deselect: bool, is_unique: bool) -> bool {
        match merge_selection_filter(
            self.selection_filter.as_ref(),
            predicate,
            is_deselect,
            is_unique,
        ) {
            Merge::Unchanged => {
                trace!("Selection filter unchanged");
                false
            }
            Merge::Replace(filter) => {
                self.set_selection_filter(filter);
                true
            }
        }
    }

    fn notify_selection_changed(&mut self) {
        for listener in self.listeners.iter_mut() {
            listener.selection_changed();
        }
    }
}
