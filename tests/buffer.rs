use cbor_collate::{Cbor, Config, ErrorCode, Json, NumberKind, Value};

fn smart() -> Config {
    Config::new().with_number_kind(NumberKind::SmartNumber)
}

#[test]
fn json_cbor_collate_cycle() {
    let config = smart();
    let json = Json::from_bytes(br#"{"b":[1,2],"a":"x"}"#, config);

    let mut cbor = config.new_cbor(64);
    json.to_cbor(&mut cbor).unwrap();
    assert_eq!(cbor.bytes()[0], 0xa2);

    let mut code = config.new_collate(64);
    json.to_collate(&mut code).unwrap();
    let mut via_cbor = config.new_collate(64);
    cbor.to_collate(&mut via_cbor).unwrap();
    assert_eq!(code, via_cbor);

    let mut back = config.new_json(64);
    code.to_json(&mut back).unwrap();
    assert_eq!(back.bytes(), br#"{"a":"x","b":[1,2]}"#);

    let mut text = config.new_json(64);
    cbor.to_json(&mut text).unwrap();
    assert_eq!(text.bytes(), br#"{"b":[1,2],"a":"x"}"#);

    let mut plain = config.new_cbor(64);
    code.to_cbor(&mut plain).unwrap();
    // collation sorts members, so both decode in key order
    assert_eq!(plain.to_value().unwrap(), code.to_value().unwrap());
    assert_eq!(
        code.to_value().unwrap(),
        Value::map([
            ("a", Value::from("x")),
            ("b", Value::Array(vec![Value::Int(1), Value::Int(2)])),
        ])
    );
}

#[test]
fn values_in_and_out() {
    let config = smart();
    let v = Value::map([("k", Value::Array(vec![Value::Int(-1), Value::Bool(true)]))]);

    let mut json = config.new_json(64);
    json.from_value(&v).unwrap();
    assert_eq!(json.bytes(), br#"{"k":[-1,true]}"#);
    assert_eq!(json.to_value().unwrap(), v);

    let mut cbor = config.new_cbor(64);
    cbor.from_value(&v).unwrap();
    assert_eq!(cbor.bytes(), &[0xa1, 0x61, b'k', 0x82, 0x20, 0xf5]);
    assert_eq!(cbor.to_value().unwrap(), v);

    let mut code = config.new_collate(64);
    code.from_value(&v).unwrap();
    assert_eq!(code.to_value().unwrap(), v);
}

#[test]
fn trailing_text_is_rejected() {
    let config = smart();
    let json = Json::from_bytes(b"[1] [2]", config);
    let mut cbor = config.new_cbor(64);
    let e = json.to_cbor(&mut cbor).unwrap_err();
    assert_eq!((e.code, e.offset), (ErrorCode::TrailingBytes, 4));
    assert!(cbor.is_empty());

    let mut code = config.new_collate(64);
    assert_eq!(
        json.to_collate(&mut code).unwrap_err().code,
        ErrorCode::TrailingBytes
    );
    assert_eq!(json.to_value().unwrap_err().code, ErrorCode::TrailingBytes);

    let ok = Json::from_bytes(b" [1] \n", config);
    ok.to_cbor(&mut cbor).unwrap();
    assert_eq!(cbor.bytes(), &[0x81, 0x01]);
}

#[test]
fn failures_leave_length_alone() {
    let config = smart();
    let mut cbor = config.new_cbor(4);
    cbor.extend_from_slice(&[0x01]).unwrap();

    let json = Json::from_bytes(b"[1,2,3,4]", config);
    let e = json.to_cbor(&mut cbor).unwrap_err();
    assert_eq!(e.code, ErrorCode::BufferFull);
    assert_eq!(cbor.bytes(), &[0x01]);

    assert_eq!(
        cbor.extend_from_slice(&[0; 4]).unwrap_err().code,
        ErrorCode::BufferFull
    );
    assert_eq!(cbor.len(), 1);
    assert_eq!(cbor.capacity(), 4);

    cbor.reset();
    assert!(cbor.is_empty());
    assert_eq!(cbor.as_ref(), &[] as &[u8]);
}

#[test]
fn conversions_append() {
    let config = smart();
    let mut cbor = config.new_cbor(16);
    Json::from_bytes(b"1", config).to_cbor(&mut cbor).unwrap();
    Json::from_bytes(b"2", config).to_cbor(&mut cbor).unwrap();
    assert_eq!(cbor.bytes(), &[0x01, 0x02]);
}

#[test]
fn pointer_operations() {
    let config = smart();
    let mut doc = config.new_cbor(64);
    Json::from_bytes(br#"{"arr":[1,2]}"#, config)
        .to_cbor(&mut doc)
        .unwrap();

    let ptr = config.new_json_pointer("/arr/0").unwrap();
    let mut cptr = config.new_cbor(32);
    cptr.from_pointer(&ptr).unwrap();

    let mut item = config.new_cbor(16);
    doc.get(cptr.bytes(), &mut item).unwrap();
    assert_eq!(item.bytes(), &[0x01]);

    let new_item = Cbor::from_bytes(&[0x07], config);
    let mut newdoc = config.new_cbor(64);
    let mut old = config.new_cbor(16);
    doc.set(cptr.bytes(), &new_item, &mut newdoc, &mut old).unwrap();
    assert_eq!(old.bytes(), &[0x01]);
    let mut text = config.new_json(64);
    newdoc.to_json(&mut text).unwrap();
    assert_eq!(text.bytes(), br#"{"arr":[7,2]}"#);

    let mut newdoc = config.new_cbor(64);
    let mut removed = config.new_cbor(16);
    doc.delete(cptr.bytes(), &mut newdoc, &mut removed).unwrap();
    assert_eq!(removed.bytes(), &[0x01]);

    let mut arr = config.new_cbor(32);
    arr.from_pointer(&config.new_json_pointer("/arr").unwrap())
        .unwrap();
    let mut newdoc = config.new_cbor(64);
    doc.prepend(arr.bytes(), &new_item, &mut newdoc).unwrap();
    let mut text = config.new_json(64);
    newdoc.to_json(&mut text).unwrap();
    assert_eq!(text.bytes(), br#"{"arr":[7,1,2]}"#);

    let mut newdoc = config.new_cbor(64);
    doc.append(arr.bytes(), &new_item, &mut newdoc).unwrap();
    let mut text = config.new_json(64);
    newdoc.to_json(&mut text).unwrap();
    assert_eq!(text.bytes(), br#"{"arr":[1,2,7]}"#);

    let mut small = config.new_cbor(4);
    let e = doc.set(cptr.bytes(), &new_item, &mut small, &mut old).unwrap_err();
    assert_eq!(e.code, ErrorCode::BufferFull);
    assert!(small.is_empty());
}

#[test]
fn pointer_text_buffer() {
    let config = Config::new();
    let mut json = config.new_json(16);
    json.from_pointer(&config.new_json_pointer("/a~1b/0").unwrap())
        .unwrap();
    assert_eq!(json.bytes(), b"/a~1b/0");
    assert_eq!(json.config(), &config);

    let e = config.new_json_pointer("nope").unwrap_err();
    assert_eq!(e.code, ErrorCode::PointerSyntax);
}
