#![cfg(feature = "serde")]

use cbor_collate::{JsonPointer, Value};

#[test]
fn value_serializes_like_json() {
    let v = Value::map([
        ("a", Value::Array(vec![Value::Int(1), Value::Float64(2.5)])),
        ("b", Value::Null),
        ("c", Value::from("x")),
    ]);
    let text = serde_json::to_string(&v).unwrap();
    assert_eq!(text, r#"{"a":[1,2.5],"b":null,"c":"x"}"#);
}

#[test]
fn value_deserializes_from_json() {
    let v: Value = serde_json::from_str(r#"{"k":[true,-3,18446744073709551615,0.5]}"#).unwrap();
    assert_eq!(
        v,
        Value::map([(
            "k",
            Value::Array(vec![
                Value::Bool(true),
                Value::Int(-3),
                Value::Uint(u64::MAX),
                Value::Float64(0.5),
            ])
        )])
    );
}

#[test]
fn values_without_serde_form_fail() {
    assert!(serde_json::to_string(&Value::Simple(16)).is_err());
    assert!(serde_json::to_string(&Value::Break).is_err());
}

#[test]
fn pointer_uses_its_text() {
    let p = JsonPointer::parse("/a~1b/0").unwrap();
    let text = serde_json::to_string(&p).unwrap();
    assert_eq!(text, r#""/a~1b/0""#);
    let back: JsonPointer = serde_json::from_str(&text).unwrap();
    assert_eq!(back, p);
    assert!(serde_json::from_str::<JsonPointer>(r#""nope""#).is_err());
}
