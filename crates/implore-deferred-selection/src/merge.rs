//! Incremental rewrite rules for the selection filter
//!
//! The stored selection filter is kept minimal under single-key toggles and
//! select-all/deselect-all: a toggle that undoes an earlier one removes the
//! earlier predicate instead of stacking a double negation, so the filter
//! grows with the number of effective toggles rather than with the size of
//! the data set.
//!
//! Every function here works on owned copies; the caller commits the result
//! wholesale.

use crate::expr::{FilterExpr, FilterItem, LogicalOp};

/// Outcome of merging a predicate into the selection filter
#[derive(Debug, Clone, PartialEq)]
pub enum Merge {
    /// The predicate is already in effect
    Unchanged,
    /// Replace the stored filter (`None` selects everything)
    Replace(Option<FilterExpr>),
}

/// Merge a key predicate (or a base filter) into the stored selection filter.
///
/// - `is_deselect` appends `["!", predicate]` joined with `"and"`, otherwise
///   `predicate` joined with `"or"`.
/// - `is_unique` is true for single-key toggles: when the inverse of the
///   new term is found and removed, nothing else is appended.
pub fn merge_selection_filter(
    stored: Option<&FilterExpr>,
    predicate: FilterExpr,
    is_deselect: bool,
    is_unique: bool,
) -> Merge {
    let (current, inverse) = if is_deselect {
        (FilterExpr::not(predicate.clone()), predicate)
    } else {
        (predicate.clone(), FilterExpr::not(predicate))
    };

    // a compound predicate stored on its own is a group; compare it whole
    if stored == Some(&current) {
        return Merge::Unchanged;
    }

    let mut items = stored.cloned().unwrap_or_else(FilterExpr::empty).denormalize();
    let mut need_add = true;

    if !items.is_empty() {
        if find_sub_filter(&items, &current).is_some() {
            return Merge::Unchanged;
        }

        if remove_inverted_filter(&mut items, &inverse) {
            need_add = !is_unique;
        }

        if need_add {
            let op = if is_deselect { LogicalOp::And } else { LogicalOp::Or };
            add_filter_operator(&mut items, op);
        }
    }

    if need_add {
        items.push(FilterItem::Expr(current));
    }

    let filter = FilterExpr::normalize(items);
    if !is_deselect && filter.is_empty_group() {
        Merge::Replace(None)
    } else {
        Merge::Replace(Some(filter))
    }
}

/// Tri-state "select all" value relative to the base filter.
///
/// `Some(true)` when everything the base filter shows is selected,
/// `Some(false)` when nothing is, `None` for a partial selection.
pub fn select_all_state(
    selection: Option<&FilterExpr>,
    base: Option<&FilterExpr>,
) -> Option<bool> {
    let selection = match selection {
        None => return Some(true),
        Some(selection) if selection.is_empty_group() => return Some(false),
        Some(selection) => selection,
    };

    let base = match base {
        Some(base) if !base.is_empty_group() => base,
        _ => return None,
    };

    if selection == base {
        return Some(true);
    }

    let items = selection.clone().denormalize();

    if is_last_sub_filter(&items, base) {
        return Some(true);
    }

    if is_last_sub_filter(&items, &FilterExpr::not(base.clone())) {
        return Some(false);
    }

    None
}

/// Index of the first top-level sub-expression equal to `filter`
pub fn find_sub_filter(items: &[FilterItem], filter: &FilterExpr) -> Option<usize> {
    items.iter().position(|item| item.as_expr() == Some(filter))
}

/// Check that the first occurrence of `filter` is the last item
fn is_last_sub_filter(items: &[FilterItem], filter: &FilterExpr) -> bool {
    find_sub_filter(items, filter).is_some_and(|index| index + 1 == items.len())
}

/// Remove `inverse` from the sequence, returning whether anything was removed.
///
/// A sequence that as a whole equals `inverse` is cleared. Otherwise the
/// first matching sub-expression is removed together with the operator
/// before it, or the one after it when it is the first item.
fn remove_inverted_filter(items: &mut Vec<FilterItem>, inverse: &FilterExpr) -> bool {
    if matches!(inverse, FilterExpr::Group(whole) if *whole == *items) {
        items.clear();
        return true;
    }

    match find_sub_filter(items, inverse) {
        Some(0) => {
            let end = items.len().min(2);
            items.drain(0..end);
            true
        }
        Some(index) => {
            items.drain(index - 1..=index);
            true
        }
        None => false,
    }
}

/// Append an operator token, first nesting the existing sequence when it
/// is joined with a different operator.
fn add_filter_operator(items: &mut Vec<FilterItem>, op: LogicalOp) {
    let mixed = items.len() > 1 && matches!(items[1], FilterItem::Op(existing) if existing != op);
    if mixed {
        let nested = std::mem::take(items);
        items.push(FilterItem::Expr(FilterExpr::Group(nested)));
    }

    if !items.is_empty() {
        items.push(FilterItem::Op(op));
    }
}
