//! Integration test: schema composition, overrides, and binding paths
//! through the public API.

use std::sync::Arc;

use fieldtree_bind::{stock, Form, Overrides, SchemaNode};
use fieldtree_core::{BindError, FlatMap, FromFlatOptions};
use serde_json::json;

fn leaf(type_name: &str) -> Arc<SchemaNode> {
    SchemaNode::field(type_name)
}

#[test]
fn test_composed_child_comes_from_first_base() {
    let a_x = leaf("AX");
    let b_x = leaf("BX");
    let a = SchemaNode::builder("A").child("x", &a_x).build().unwrap();
    let b = SchemaNode::builder("B").child("x", &b_x).build().unwrap();
    let c = SchemaNode::builder("C").extends(&a).extends(&b).build().unwrap();

    let x = c.child("x").unwrap();
    assert!(x.derives_from(&a_x));
    assert!(!x.derives_from(&b_x));
    assert!(c.derives_from(&a));
    assert!(c.derives_from(&b));
}

#[test]
fn test_declared_child_hides_inherited_one() {
    let base = SchemaNode::builder("Base")
        .child("x", &leaf("Old"))
        .child("y", &leaf("Y"))
        .build()
        .unwrap();
    let new_x = leaf("New");
    let derived = SchemaNode::builder("Derived")
        .extends(&base)
        .child("x", &new_x)
        .build()
        .unwrap();

    assert!(derived.child("x").unwrap().derives_from(&new_x));
    assert_eq!(derived.child_names().collect::<Vec<_>>(), vec!["x", "y"]);
    assert_eq!(derived.declared_names().collect::<Vec<_>>(), vec!["x"]);
}

#[test]
fn test_diamond_composition_lists_each_name_once() {
    let shared = SchemaNode::builder("Shared").child("id", &leaf("Id")).build().unwrap();
    let left = SchemaNode::builder("Left")
        .extends(&shared)
        .child("l", &leaf("L"))
        .build()
        .unwrap();
    let right = SchemaNode::builder("Right")
        .extends(&shared)
        .child("r", &leaf("R"))
        .build()
        .unwrap();
    let both = SchemaNode::builder("Both").extends(&left).extends(&right).build().unwrap();

    assert_eq!(both.child_names().collect::<Vec<_>>(), vec!["l", "id", "r"]);
}

#[test]
fn test_with_attrs_leaves_base_untouched() {
    let base = SchemaNode::builder("Field").name("original").build().unwrap();
    let renamed = base.with_attrs(Overrides::new().name("x")).unwrap();
    assert_eq!(base.name(), Some("original"));
    assert_eq!(renamed.name(), Some("x"));
    assert_eq!(renamed.type_name(), "Field");
    assert!(renamed.derives_from(&base));

    let err = base.with_attrs(Overrides::new()).unwrap_err();
    assert!(matches!(err, BindError::InvalidArguments(_)));
}

#[test]
fn test_overridden_views_coexist() {
    let age = SchemaNode::builder("Age").converter(stock::integer()).build().unwrap();
    let lenient = age.with_attrs(Overrides::new().without_converter()).unwrap();
    let schema = SchemaNode::builder("Pair")
        .child("strict", &age)
        .child("loose", &lenient)
        .build()
        .unwrap();

    let flat: FlatMap = [("strict", json!("7")), ("loose", json!("7"))].into_iter().collect();
    let mut form = Form::from_flat(&schema, &flat, FromFlatOptions::default()).unwrap();
    let root = form.root();
    let strict = form.child(root, "strict").unwrap();
    let loose = form.child(root, "loose").unwrap();
    assert_eq!(form.value(strict), Some(&json!(7)));
    assert_eq!(form.value(loose), Some(&json!("7")));
    assert!(age.converter().is_some());
}

#[test]
fn test_binding_paths_follow_resolution_chain() {
    let street = leaf("Street");
    let address = SchemaNode::builder("Address").child("street", &street).build().unwrap();
    let person = SchemaNode::builder("Person").child("home", &address).build().unwrap();

    let root = person.bind();
    let home = root.resolve("home").unwrap();
    let street = home.resolve("street").unwrap();
    assert_eq!(street.path(), "home.street");
    assert!(matches!(
        home.resolve("city"),
        Err(BindError::NotFound { ref schema, ref name }) if schema == "Address" && name == "city"
    ));
}

#[test]
fn test_form_paths_match_binding_paths() {
    let address = SchemaNode::builder("Address").child("zip", &leaf("Zip")).build().unwrap();
    let person = SchemaNode::builder("Person")
        .name("person")
        .child("home", &address)
        .build()
        .unwrap();

    let bound = person.bind();
    let bound_home = bound.resolve("home").unwrap();
    let bound_zip = bound_home.resolve("zip").unwrap();

    let mut form = Form::new(&person);
    let root = form.root();
    let home = form.child(root, "home").unwrap();
    let zip = form.child(home, "zip").unwrap();
    assert_eq!(form.path(zip), bound_zip.path());
    assert_eq!(form.path(zip), "person.home.zip");
}
