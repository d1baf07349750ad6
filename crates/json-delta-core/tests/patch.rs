use json_delta_core::{apply, diff, Delta, DeltaError, DiffOptions, Value};
use proptest::prop_assert_eq;

fn value(text: &str) -> Value {
    Value::from_json_str(text).unwrap()
}

#[test]
fn apply_patch_replaces_scalar() {
    let base = value("1");
    let target = value("2");
    let delta = diff(&base, &target, &DiffOptions::default()).unwrap();
    assert_eq!(delta.to_json_string(), "[[[],2]]");
    assert_eq!(base.apply_patch(&delta).unwrap(), target);
}

#[test]
fn apply_patch_handles_member_insertion() {
    let base = value("{\"a\":1}");
    let target = value("{\"a\":1,\"b\":2}");
    let delta = base.diff(&target, &DiffOptions::default()).unwrap();
    assert_eq!(delta.to_json_string(), "[[[\"b\"],2]]");
    assert_eq!(base.apply_patch(&delta).unwrap(), target);
}

#[test]
fn stale_array_delta_reports_the_missing_index() {
    let delta = Delta::from_json_str("[[[2]],[[1]]]").unwrap();
    assert_eq!(apply(&value("[1,2,3]"), &delta).unwrap(), value("[1]"));
    let shorter = value("[1,2]");
    let err = apply(&shorter, &delta).expect_err("deletions run from the highest index");
    assert_eq!(err.to_string(), "path not found: [2]");
}

#[test]
fn faults_render_the_offending_keypath() {
    let struc = value("{\"a\":[1]}");
    let delta = Delta::from_json_str("[[[\"a\",\"x\"],1]]").unwrap();
    let err = apply(&struc, &delta).unwrap_err();
    assert_eq!(err.to_string(), "type mismatch at [\"a\"]: expected object, found array");

    let delta = Delta::from_json_str("[[[\"missing\",0]]]").unwrap();
    let err = apply(&struc, &delta).unwrap_err();
    assert!(matches!(err, DeltaError::PathNotFound { .. }));
    assert_eq!(err.to_string(), "path not found: [\"missing\", 0]");
}

#[test]
fn insert_stanza_into_an_object_is_rejected() {
    let struc = value("{\"a\":1}");
    let delta = Delta::from_json_str("[[[\"b\"],2,\"i\"]]").unwrap();
    let err = apply(&struc, &delta).unwrap_err();
    assert_eq!(err.to_string(), "type mismatch at []: expected array, found object");
}

fn arb_json_value() -> impl proptest::strategy::Strategy<Value = serde_json::Value> {
    use proptest::{collection::btree_map, collection::vec, prelude::*, string::string_regex};

    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::Bool),
        (-1000i64..1000).prop_map(|n| serde_json::Value::Number(n.into())),
        string_regex("[a-zA-Z0-9]{0,6}").unwrap().prop_map(serde_json::Value::String),
    ];

    leaf.prop_recursive(3, 6, 4, move |inner| {
        prop_oneof![
            vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
            btree_map(string_regex("[a-zA-Z0-9]{1,6}").unwrap(), inner, 0..4)
                .prop_map(|map| serde_json::Value::Object(map.into_iter().collect())),
        ]
    })
}

proptest::proptest! {
    #[test]
    fn diff_and_patch_roundtrip(a_json in arb_json_value(), b_json in arb_json_value()) {
        let a = Value::from_json_value(a_json).unwrap();
        let b = Value::from_json_value(b_json).unwrap();
        let opts = DiffOptions::default();
        let delta = a.diff(&b, &opts).unwrap();
        prop_assert_eq!(a.apply_patch(&delta).unwrap(), b.clone());

        let reverse = b.diff(&a, &opts).unwrap();
        prop_assert_eq!(b.apply_patch(&reverse).unwrap(), a);
    }

    #[test]
    fn empty_delta_is_idempotent(a_json in arb_json_value()) {
        let struc = Value::from_json_value(a_json).unwrap();
        let delta = Delta::empty();
        let once = struc.apply_patch(&delta).unwrap();
        prop_assert_eq!(&once, &struc);
        let twice = once.apply_patch(&delta).unwrap();
        prop_assert_eq!(twice, struc);
    }
}
