use cbor_collate::{
    append_ptr, delete_ptr, get_ptr, prepend_ptr, set_ptr, ErrorCode, JsonPointer, Value,
};

fn doc() -> Value {
    Value::map([
        ("a", Value::Int(10)),
        ("arr", Value::Array(vec![Value::Int(1), Value::Int(2)])),
        (
            "dict",
            Value::map([("a", Value::Int(10)), ("b/c", Value::Int(20))]),
        ),
    ])
}

#[test]
fn get_follows_segments() {
    let d = doc();
    assert_eq!(get_ptr(&d, "/arr/1").unwrap(), &Value::Int(2));
    assert_eq!(get_ptr(&d, "/arr/-").unwrap(), &Value::Int(2));
    assert_eq!(get_ptr(&d, "/dict/b~1c").unwrap(), &Value::Int(20));
    assert_eq!(get_ptr(&d, "").unwrap(), &d);

    let p = JsonPointer::parse("/dict/a").unwrap();
    assert_eq!(get_ptr(&d, &p).unwrap(), &Value::Int(10));
    assert_eq!(get_ptr(&d, &String::from("/a")).unwrap(), &Value::Int(10));
}

#[test]
fn get_reports_errors() {
    let d = doc();
    let cases = [
        ("/zz", ErrorCode::KeyNotFound),
        ("/arr/2", ErrorCode::IndexOutOfRange),
        ("/arr/x", ErrorCode::BadIndex),
        ("/a/0", ErrorCode::NotAContainer),
        ("a", ErrorCode::PointerSyntax),
    ];
    for (text, code) in cases {
        assert_eq!(get_ptr(&d, text).unwrap_err().code, code, "{text}");
    }

    let empty = Value::Array(Vec::new());
    assert_eq!(
        get_ptr(&empty, "/-").unwrap_err().code,
        ErrorCode::IndexOutOfRange
    );
}

#[test]
fn self_describe_is_transparent() {
    let d = Value::CborPrefix(Box::new(doc()));
    assert_eq!(get_ptr(&d, "/arr/0").unwrap(), &Value::Int(1));
}

#[test]
fn set_replaces_or_inserts() {
    let mut d = doc();
    let old = set_ptr(&mut d, "/arr/0", Value::from("x")).unwrap();
    assert_eq!(old, Some(Value::Int(1)));
    assert_eq!(get_ptr(&d, "/arr/0").unwrap(), &Value::from("x"));

    assert_eq!(set_ptr(&mut d, "/dict/new", Value::Null).unwrap(), None);
    let Value::Map(entries) = get_ptr(&d, "/dict").unwrap() else {
        panic!("dict is a map");
    };
    assert_eq!(entries.last(), Some(&(String::from("new"), Value::Null)));

    let old = set_ptr(&mut d, "", Value::Bool(true)).unwrap();
    assert!(matches!(old, Some(Value::Map(_))));
    assert_eq!(d, Value::Bool(true));
}

#[test]
fn set_needs_existing_parents() {
    let mut d = doc();
    let e = set_ptr(&mut d, "/x/y", Value::Null).unwrap_err();
    assert_eq!(e.code, ErrorCode::KeyNotFound);
    let e = set_ptr(&mut d, "/arr/9", Value::Null).unwrap_err();
    assert_eq!(e.code, ErrorCode::IndexOutOfRange);
    let e = set_ptr(&mut d, "/a/b", Value::Null).unwrap_err();
    assert_eq!(e.code, ErrorCode::NotAContainer);
    assert_eq!(d, doc());
}

#[test]
fn delete_removes_entries() {
    let mut d = doc();
    assert_eq!(delete_ptr(&mut d, "/arr/0").unwrap(), Value::Int(1));
    assert_eq!(get_ptr(&d, "/arr").unwrap(), &Value::Array(vec![Value::Int(2)]));
    assert_eq!(delete_ptr(&mut d, "/dict/a").unwrap(), Value::Int(10));
    assert_eq!(
        get_ptr(&d, "/dict/a").unwrap_err().code,
        ErrorCode::KeyNotFound
    );
    assert_eq!(delete_ptr(&mut d, "/arr/-").unwrap(), Value::Int(2));

    let e = delete_ptr(&mut d, "").unwrap_err();
    assert_eq!(e.code, ErrorCode::PointerSyntax);
    let e = delete_ptr(&mut d, "/arr/0").unwrap_err();
    assert_eq!(e.code, ErrorCode::IndexOutOfRange);
}

#[test]
fn prepend_and_append() {
    let mut d = doc();
    prepend_ptr(&mut d, "/arr", Value::Int(0)).unwrap();
    append_ptr(&mut d, "/arr", Value::Int(3)).unwrap();
    assert_eq!(
        get_ptr(&d, "/arr").unwrap(),
        &Value::Array((0..4).map(Value::Int).collect())
    );

    let e = append_ptr(&mut d, "/dict", Value::Null).unwrap_err();
    assert_eq!(e.code, ErrorCode::NotAnArray);
    let e = prepend_ptr(&mut d, "/a", Value::Null).unwrap_err();
    assert_eq!(e.code, ErrorCode::NotAContainer);

    let mut root = Value::Array(Vec::new());
    append_ptr(&mut root, "", Value::Null).unwrap();
    assert_eq!(root, Value::Array(vec![Value::Null]));
}
