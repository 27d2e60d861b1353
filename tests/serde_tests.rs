//! JSON shape of the schema tree under the `serde` feature.
#![cfg(feature = "serde")]

use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_option_values_serialize_untagged() {
    let schema = protoschema::parse(
        r#"
        option java_multiple_files = true;
        option (meta) = { owner: "core" rule { a: 1 } rule { a: 2 } };
        "#,
    )
    .unwrap();
    let value = serde_json::to_value(&schema.options).unwrap();
    assert_eq!(
        value,
        json!({
            "java_multiple_files": true,
            "meta": {
                "owner": "core",
                "rule": [{ "a": "1" }, { "a": "2" }],
            },
        })
    );
}

#[test]
fn test_field_serialization() {
    let schema =
        protoschema::parse("message M { map<string, int32> counts = 1; Other o = 2; }").unwrap();
    let fields = serde_json::to_value(&schema.messages[0].fields).unwrap();
    assert_eq!(
        fields[0]["field_type"],
        json!({ "Map": { "key": "string", "value": "int32" } })
    );
    assert_eq!(fields[1]["field_type"], json!({ "MessageRef": "Other" }));
    assert_eq!(fields[1]["tag"], json!(2));
    assert_eq!(fields[1]["oneof"], json!(null));
}

#[test]
fn test_schema_top_level_keys() {
    let schema = protoschema::parse("syntax = \"proto2\"; package p;").unwrap();
    let value = serde_json::to_value(&schema).unwrap();
    assert_eq!(value["syntax"], json!("Proto2"));
    assert_eq!(value["package"], json!("p"));
    assert_eq!(value["messages"], json!([]));
    assert_eq!(value["options"], json!({}));
}
