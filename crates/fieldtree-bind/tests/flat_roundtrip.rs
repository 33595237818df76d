//! Integration test: populating forms from flat mappings and flattening
//! them back, with binding options loaded from configuration documents.

use std::sync::Arc;

use fieldtree_bind::{stock, Form, SchemaNode};
use fieldtree_core::{BindConfig, BindError, FlatMap, FlattenOptions, FromFlatOptions};
use proptest::prelude::*;
use serde_json::{json, Value};

/// `{ a, b: { c }, tags: [leaf], rows: [{ qty: int }] }`
fn order_schema() -> Arc<SchemaNode> {
    let leaf = SchemaNode::field("Leaf");
    let inner = SchemaNode::builder("Inner").child("c", &leaf).build().unwrap();
    let tags = SchemaNode::list_of(&leaf).build().unwrap();
    let qty = SchemaNode::builder("Qty")
        .converter(stock::integer())
        .adapter(stock::display())
        .build()
        .unwrap();
    let row = SchemaNode::builder("Row").child("qty", &qty).build().unwrap();
    let rows = SchemaNode::list_of(&row).build().unwrap();
    SchemaNode::builder("Order")
        .child("a", &leaf)
        .child("b", &inner)
        .child("tags", &tags)
        .child("rows", &rows)
        .build()
        .unwrap()
}

fn flat(pairs: &[(&str, Value)]) -> FlatMap {
    pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
}

#[test]
fn test_round_trip_drops_undeclared_keys() {
    let schema = order_schema();
    let input = flat(&[
        ("a", json!("x")),
        ("b.c", json!("y")),
        ("b.d", json!("undeclared")),
        ("tags-0", json!("red")),
        ("tags-1", json!("blue")),
        ("rows-0.qty", json!("3")),
        ("other", json!(1)),
    ]);
    let mut form = Form::from_flat(&schema, &input, FromFlatOptions::default()).unwrap();
    let out = form.flatten(FlattenOptions::default()).unwrap();
    assert_eq!(
        out,
        flat(&[
            ("a", json!("x")),
            ("b.c", json!("y")),
            ("tags-0", json!("red")),
            ("tags-1", json!("blue")),
            ("rows-0.qty", json!("3")),
        ])
    );
}

#[test]
fn test_list_unflattens_in_index_order() {
    let list = SchemaNode::list_of(&SchemaNode::field("Leaf")).build().unwrap();
    let schema = SchemaNode::builder("Root").child("list", &list).build().unwrap();
    let input = flat(&[("list-0", json!(10)), ("list-2", json!(11)), ("list-1", json!(12))]);
    let form = Form::from_flat(&schema, &input, FromFlatOptions::default()).unwrap();

    let list = form.cached_child(form.root(), "list").unwrap();
    let values: Vec<_> = form.items(list).iter().filter_map(|&i| form.value(i)).collect();
    assert_eq!(values, vec![&json!(10), &json!(12), &json!(11)]);
}

#[test]
fn test_sparse_indices_are_compacted() {
    let schema = order_schema();
    let input = flat(&[("rows-7.qty", json!("1")), ("rows-30.qty", json!("2"))]);
    let mut form = Form::from_flat(&schema, &input, FromFlatOptions::default()).unwrap();
    assert_eq!(
        form.flatten(FlattenOptions::default()).unwrap(),
        flat(&[("rows-0.qty", json!("1")), ("rows-1.qty", json!("2"))])
    );
}

#[test]
fn test_nested_lists_need_a_named_field() {
    let leaf = SchemaNode::field("Leaf");
    let cells = SchemaNode::list_of(&leaf).build().unwrap();
    assert!(matches!(
        SchemaNode::list_of(&cells).build(),
        Err(BindError::InvalidArguments(_))
    ));

    let row = SchemaNode::builder("Row").child("cells", &cells).build().unwrap();
    let matrix = SchemaNode::list_of(&row).build().unwrap();
    let schema = SchemaNode::builder("Grid").child("m", &matrix).build().unwrap();

    let mut form = Form::new(&schema);
    let root = form.root();
    let m = form.child(root, "m").unwrap();
    let first_row = form.push_item(m).unwrap();
    let row_cells = form.child(first_row, "cells").unwrap();
    let cell = form.push_item(row_cells).unwrap();
    form.set_value(cell, Some(json!("x")));

    let out = form.flatten(FlattenOptions::default()).unwrap();
    assert_eq!(out, flat(&[("m-0.cells-0", json!("x"))]));
    let mut reloaded = Form::from_flat(&schema, &out, FromFlatOptions::default()).unwrap();
    assert_eq!(reloaded.flatten(FlattenOptions::default()).unwrap(), out);
}

#[test]
fn test_strict_and_lenient_conversion() {
    let schema = SchemaNode::builder("Int").converter(stock::integer()).build().unwrap();
    let input = flat(&[("", json!("a"))]);

    let err = Form::from_flat(&schema, &input, FromFlatOptions::strict()).unwrap_err();
    assert!(err.is_hook_failure());
    assert!(matches!(err, BindError::Conversion { .. }));

    let form = Form::from_flat(&schema, &input, FromFlatOptions::default()).unwrap();
    let root = form.root();
    assert!(form.value(root).is_none());
    assert!(form.conversion_error(root).is_some());
}

#[test]
fn test_lenient_errors_appear_in_report() {
    let schema = order_schema();
    let input = flat(&[("rows-0.qty", json!("1")), ("rows-1.qty", json!("many"))]);
    let form = Form::from_flat(&schema, &input, FromFlatOptions::default()).unwrap();
    let report = form.report(form.root());
    assert_eq!(report.len(), 1);
    assert_eq!(report.entries()[0].path(), "rows-1.qty");
}

#[test]
fn test_options_from_yaml_config() {
    let config = BindConfig::from_yaml_str(
        "unflatten:\n  strict: true\nflatten:\n  include_empty: true\n",
    )
    .unwrap();
    assert!(config.unflatten.convert);

    let schema = order_schema();
    let bad = flat(&[("rows-0.qty", json!("x"))]);
    assert!(Form::from_flat(&schema, &bad, config.unflatten).is_err());

    let mut form = Form::from_flat(&schema, &flat(&[("a", json!("x"))]), config.unflatten).unwrap();
    let out = form.flatten(config.flatten).unwrap();
    assert_eq!(out.get("a"), Some(&json!("x")));
    assert_eq!(out.get("b.c"), Some(&Value::Null));
    assert_eq!(out.get("tags"), Some(&Value::Null));
}

#[test]
fn test_flat_map_from_json_document() {
    let document: FlatMap = serde_json::from_value(json!({
        "a": "x",
        "tags-0": "t",
    }))
    .unwrap();
    let mut form = Form::from_flat(&order_schema(), &document, FromFlatOptions::default()).unwrap();
    assert_eq!(form.flatten(FlattenOptions::default()).unwrap(), document);
}

#[test]
fn test_copied_form_flattens_independently() {
    let schema = order_schema();
    let input = flat(&[("a", json!("x")), ("tags-0", json!("t"))]);
    let form = Form::from_flat(&schema, &input, FromFlatOptions::default()).unwrap();

    let mut copy = form.copy(form.root());
    let a = copy.child(copy.root(), "a").unwrap();
    copy.set_value(a, Some(json!("changed")));

    let mut original = form;
    assert_eq!(original.flatten(FlattenOptions::default()).unwrap(), input);
    assert_eq!(
        copy.flatten(FlattenOptions::default()).unwrap(),
        flat(&[("a", json!("changed")), ("tags-0", json!("t"))])
    );
}

// ─── Property tests ──────────────────────────────────────────────────

fn leaf_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z0-9 ]{0,8}".prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

proptest! {
    #[test]
    fn test_flatten_reproduces_declared_subset(
        a in proptest::option::of(leaf_value()),
        c in proptest::option::of(leaf_value()),
        tags in proptest::collection::vec(leaf_value(), 0..6),
        qtys in proptest::collection::vec(0u32..10_000, 0..4),
        noise in proptest::collection::btree_map("[a-z]{1,3}\\.[a-z]{4,6}", leaf_value(), 0..4),
    ) {
        let mut declared = FlatMap::new();
        if let Some(a) = a {
            declared.insert("a", a);
        }
        if let Some(c) = c {
            declared.insert("b.c", c);
        }
        for (i, tag) in tags.into_iter().enumerate() {
            declared.insert(format!("tags-{i}"), tag);
        }
        for (i, qty) in qtys.into_iter().enumerate() {
            declared.insert(format!("rows-{i}.qty"), qty.to_string());
        }

        // Noise keys like "ab.wxyz" never address a declared path.
        let mut input = declared.clone();
        input.extend(noise.into_iter().filter(|(k, _)| !declared.contains_key(k)));

        let mut form = Form::from_flat(&order_schema(), &input, FromFlatOptions::default()).unwrap();
        prop_assert_eq!(form.flatten(FlattenOptions::default()).unwrap(), declared);
    }
}
