//! End-to-end selection behavior through `DeferredSelection`.

use std::sync::Arc;

use implore_deferred_selection::{
    DataSource, DataSourceError, DeferredSelection, FilterExpr, KeyExpr, LoadOptions,
    MemorySource, SelectionConfig, SelectionError,
};
use proptest::prelude::*;
use rstest::rstest;
use serde_json::{json, Value};

fn tickets() -> Vec<Value> {
    vec![
        json!({"id": 1, "status": "open", "region": "eu"}),
        json!({"id": 2, "status": "open", "region": "us"}),
        json!({"id": 3, "status": "closed", "region": "eu"}),
        json!({"id": 4, "status": "open", "region": "eu"}),
    ]
}

fn open_filter() -> FilterExpr {
    FilterExpr::eq("status", "open")
}

fn selection(base_filter: bool) -> DeferredSelection {
    let mut source = MemorySource::new(tickets()).with_key("id");
    if base_filter {
        source = source.with_filter(open_filter());
    }
    DeferredSelection::new(Arc::new(source))
}

#[test]
fn deselect_then_reselect_restores_unrestricted() {
    let mut selection = selection(false);
    selection.remove_selected(&json!(2)).unwrap();
    assert_eq!(selection.selection_state_json(), json!(["!", ["id", "=", 2]]));

    selection.add_selected(&json!(2)).unwrap();
    assert_eq!(selection.selection_state_json(), Value::Null);
}

#[test]
fn select_all_tri_state_follows_base_filter() {
    let mut selection = selection(true);
    assert_eq!(selection.select_all_state(), Some(true));

    selection.apply_bulk_selection(&[], false, true, true).unwrap();
    assert_eq!(selection.select_all_state(), Some(false));
    assert_eq!(
        selection.selection_state_json(),
        json!(["!", ["status", "=", "open"]])
    );

    selection.apply_bulk_selection(&[], false, false, true).unwrap();
    assert_eq!(selection.select_all_state(), Some(true));

    selection.remove_selected(&json!(1)).unwrap();
    assert_eq!(selection.select_all_state(), None);
    assert_eq!(
        selection.selection_state_json(),
        json!([["status", "=", "open"], "and", ["!", ["id", "=", 1]]])
    );
}

#[test]
fn select_all_without_base_filter() {
    let mut selection = selection(false);
    selection.apply_bulk_selection(&[], false, true, true).unwrap();
    assert_eq!(selection.selection_state_json(), json!([]));
    assert_eq!(selection.select_all_state(), Some(false));

    selection.add_selected(&json!(1)).unwrap();
    assert_eq!(selection.select_all_state(), None);

    selection.apply_bulk_selection(&[], false, false, true).unwrap();
    assert_eq!(selection.selection_state_json(), Value::Null);
    assert_eq!(selection.select_all_state(), Some(true));
}

#[test]
fn mixed_operators_are_nested() {
    let mut selection = selection(false);
    selection
        .apply_bulk_selection(&[json!(1), json!(2)], false, false, false)
        .unwrap();
    selection.remove_selected(&json!(3)).unwrap();

    assert_eq!(
        selection.selection_state_json(),
        json!([
            [["id", "=", 1], "or", ["id", "=", 2]],
            "and",
            ["!", ["id", "=", 3]]
        ])
    );
}

#[rstest]
#[case::select(false)]
#[case::deselect(true)]
fn repeated_toggle_is_idempotent(#[case] deselect: bool) {
    let mut selection = selection(true);
    selection.apply_bulk_selection(&[], false, false, true).unwrap();

    let toggle = |selection: &mut DeferredSelection| {
        if deselect {
            selection.remove_selected(&json!(4)).unwrap();
        } else {
            selection.add_selected(&json!(4)).unwrap();
        }
    };

    toggle(&mut selection);
    let once = selection.selection_state_json();
    toggle(&mut selection);
    assert_eq!(selection.selection_state_json(), once);
}

#[rstest]
#[case(json!(1), true)]
#[case(json!(2), false)]
#[case(json!(3), true)]
#[case(json!(4), true)]
fn key_membership_after_bulk_changes(#[case] key: Value, #[case] expected: bool) {
    let mut selection = selection(false);
    selection
        .apply_bulk_selection(&[json!(2)], true, true, false)
        .unwrap();
    assert_eq!(selection.is_item_key_selected(&key).unwrap(), expected);
}

#[test]
fn compound_key_selection() {
    let source = MemorySource::new(tickets()).with_key(vec!["region", "id"]);
    let mut selection = DeferredSelection::new(Arc::new(source));
    selection.validate().unwrap();

    let key = json!({"region": "eu", "id": 3});
    selection
        .apply_bulk_selection(&[key.clone()], false, false, false)
        .unwrap();
    assert_eq!(
        selection.selection_state_json(),
        json!([["region", "=", "eu"], "and", ["id", "=", 3]])
    );
    assert!(selection.is_item_key_selected(&key).unwrap());
    assert!(!selection.is_item_key_selected(&json!({"region": "eu", "id": 1})).unwrap());

    selection.remove_selected(&key).unwrap();
    assert_eq!(selection.selection_state_json(), json!([]));
}

#[test]
fn compound_key_selected_twice_is_unchanged() {
    let source = MemorySource::new(tickets()).with_key(vec!["region", "id"]);
    let mut selection = DeferredSelection::new(Arc::new(source));
    selection.apply_bulk_selection(&[], false, false, false).unwrap();

    let key = json!({"region": "eu", "id": 1});
    selection.add_selected(&key).unwrap();
    let once = selection.selection_state_json();
    selection.add_selected(&key).unwrap();
    assert_eq!(selection.selection_state_json(), once);
    assert_eq!(once, json!([["region", "=", "eu"], "and", ["id", "=", 1]]));
}

#[test]
fn select_all_tri_state_with_compound_base_filter() {
    let base = FilterExpr::parse(r#"[["status", "=", "open"], "and", ["region", "=", "eu"]]"#)
        .unwrap();
    let source = MemorySource::new(tickets()).with_key("id").with_filter(base.clone());
    let mut selection = DeferredSelection::new(Arc::new(source));

    selection.apply_bulk_selection(&[], false, true, true).unwrap();
    assert_eq!(selection.select_all_state(), Some(false));

    selection.apply_bulk_selection(&[], false, false, true).unwrap();
    assert_eq!(selection.selection_filter(), Some(&base));
    assert_eq!(selection.select_all_state(), Some(true));

    selection.remove_selected(&json!(4)).unwrap();
    assert_eq!(selection.select_all_state(), None);
}

#[tokio::test]
async fn compound_keys_are_loaded_as_objects() {
    let source = MemorySource::new(tickets()).with_key(vec!["region", "id"]);
    let mut selection = DeferredSelection::new(Arc::new(source));
    selection
        .apply_bulk_selection(
            &[json!({"region": "eu", "id": 1}), json!({"region": "us", "id": 2})],
            false,
            false,
            false,
        )
        .unwrap();

    let keys = selection.get_selected_item_keys().await.unwrap();
    assert_eq!(
        keys,
        vec![json!({"region": "eu", "id": 1}), json!({"region": "us", "id": 2})]
    );
}

#[tokio::test]
async fn selected_items_respect_base_filter_exclusions() {
    let mut selection = selection(true);
    selection.apply_bulk_selection(&[], false, false, true).unwrap();
    selection.remove_selected(&json!(2)).unwrap();

    let items = selection.get_selected_items().await.unwrap();
    let ids: Vec<Value> = items.iter().map(|row| row["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(4)]);
}

#[tokio::test]
async fn selected_rows_without_key_field_yield_null_keys() {
    let rows = vec![json!({"id": 1, "status": "open"}), json!({"status": "open"})];
    let source = MemorySource::new(rows).with_key("id");
    let selection = DeferredSelection::new(Arc::new(source));

    let keys = selection.get_selected_item_keys().await.unwrap();
    assert_eq!(keys, vec![json!(1), Value::Null]);
}

struct FailingSource;

#[async_trait::async_trait]
impl DataSource for FailingSource {
    fn key(&self) -> Option<KeyExpr> {
        Some(KeyExpr::from("id"))
    }

    async fn load(&self, _options: LoadOptions) -> Result<Vec<Value>, DataSourceError> {
        Err(DataSourceError::Load("connection reset".into()))
    }
}

#[tokio::test]
async fn retrieval_failures_propagate() {
    let selection = DeferredSelection::new(Arc::new(FailingSource));
    let err = selection.get_selected_items().await.unwrap_err();
    assert!(matches!(
        err,
        SelectionError::DataSource(DataSourceError::Load(ref msg)) if msg == "connection reset"
    ));
    assert!(selection.get_selected_item_keys().await.is_err());
}

#[test]
fn restores_persisted_selection_from_config() {
    let config = SelectionConfig::from_toml(
        r#"
key = "id"
filter = ["status", "=", "open"]
selection_filter = [["status", "=", "open"], "and", ["!", ["id", "=", 4]]]
"#,
    )
    .unwrap();

    let source = MemorySource::from_config(tickets(), &config);
    let mut selection = DeferredSelection::from_config(Arc::new(source), &config).unwrap();
    assert_eq!(selection.select_all_state(), None);

    selection.add_selected(&json!(4)).unwrap();
    assert_eq!(selection.select_all_state(), Some(true));
    assert_eq!(selection.selection_state_json(), json!(["status", "=", "open"]));
}

#[test]
fn invalid_config_is_rejected() {
    let config = SelectionConfig {
        key: Some(KeyExpr::Compound(Vec::new())),
        ..SelectionConfig::default()
    };
    let source = MemorySource::from_config(tickets(), &config);
    assert!(matches!(
        DeferredSelection::from_config(Arc::new(source), &config),
        Err(SelectionError::Config(_))
    ));
}

/// Apply `ops` (true = select) to distinct keys, then undo them in reverse.
fn round_trip(
    initial: Option<FilterExpr>,
    ops: &[bool],
) -> (Option<FilterExpr>, Option<FilterExpr>) {
    let source = MemorySource::new(Vec::new()).with_key("id");
    let mut selection =
        DeferredSelection::new(Arc::new(source)).with_selection_filter(initial.clone());

    for (index, &select) in ops.iter().enumerate() {
        let key = json!(index + 100);
        if select {
            selection.add_selected(&key).unwrap();
        } else {
            selection.remove_selected(&key).unwrap();
        }
    }

    for (index, &select) in ops.iter().enumerate().rev() {
        let key = json!(index + 100);
        if select {
            selection.remove_selected(&key).unwrap();
        } else {
            selection.add_selected(&key).unwrap();
        }
    }

    (initial, selection.selection_filter().cloned())
}

proptest! {
    #[test]
    fn inverse_operations_restore_base_filter_selection(
        ops in prop::collection::vec(any::<bool>(), 0..12)
    ) {
        let (initial, last) = round_trip(Some(open_filter()), &ops);
        prop_assert_eq!(last, initial);
    }

    #[test]
    fn inverse_operations_restore_unrestricted_selection(
        ops in prop::collection::vec(any::<bool>(), 0..12)
    ) {
        let mut ops = ops;
        ops.insert(0, false);
        let (initial, last) = round_trip(None, &ops);
        prop_assert_eq!(last, initial);
    }

    #[test]
    fn inverse_operations_restore_empty_selection(
        ops in prop::collection::vec(any::<bool>(), 0..12)
    ) {
        let mut ops = ops;
        ops.insert(0, true);
        let (initial, last) = round_trip(Some(FilterExpr::empty()), &ops);
        prop_assert_eq!(last, initial);
    }
}
