//! implore-deferred-selection - Filter-based row selection
//!
//! Grid selection for data sets too large to enumerate: instead of a key
//! set, the selection is a boolean filter expression that is rewritten in
//! place as rows are toggled, selected all at once, or deselected.
//!
//! # Filter Grammar
//!
//! - **Predicates**: `["id", "=", 5]`
//! - **Compound keys**: `[["region", "=", "eu"], "and", ["id", "=", 5]]`
//! - **Negation**: `["!", ["id", "=", 5]]`
//! - **Groups**: `[[...], "or", [...], "or", [...]]`
//! - **Everything / nothing**: no filter (`null`) / `[]`
//!
//! # Examples
//!
//! ```ignore
//! use implore_deferred_selection::{DeferredSelection, MemorySource};
//!
//! let source = MemorySource::new(rows).with_key("id");
//! let mut selection = DeferredSelection::new(Arc::new(source));
//! selection.apply_bulk_selection(&[json!(1), json!(2)], false, false, false)?;
//! selection.remove_selected(&json!(2))?;
//! let keys = selection.get_selected_item_keys().await?;
//! ```

pub mod config;
pub mod error;
pub mod eval;
pub mod expr;
pub mod grammar;
pub mod key;
pub mod merge;
pub mod source;
pub mod strategy;

pub use config::*;
pub use error::*;
pub use eval::*;
pub use expr::*;
pub use key::*;
pub use merge::*;
pub use source::*;
pub use strategy::*;
