use cbor_collate::numeric::{
    decode_float, decode_int, decode_small_decimal, encode_float, encode_int,
    encode_small_decimal,
};
use cbor_collate::{
    cbor_to_collate, collate_to_cbor, collate_to_json, collate_to_value, json_to_cbor,
    json_to_collate, value_to_collate, Config, ContainerEncoding, ErrorCode, ErrorKind, NumberKind,
    Value,
};

fn smart() -> Config {
    Config::new().with_number_kind(NumberKind::SmartNumber)
}

fn key(text: &str, config: &Config) -> Vec<u8> {
    let mut out = [0u8; 1024];
    let (read, n) = json_to_collate(text.as_bytes(), &mut out, config).unwrap();
    assert_eq!(read, text.len());
    out[..n].to_vec()
}

fn back(code: &[u8], config: &Config) -> String {
    let mut out = [0u8; 1024];
    let (read, n) = collate_to_json(code, &mut out, config).unwrap();
    assert_eq!(read, code.len());
    String::from_utf8(out[..n].to_vec()).unwrap()
}

fn int_code(text: &str) -> String {
    let mut out = [0u8; 64];
    let n = encode_int(text.as_bytes(), &mut out).unwrap();
    String::from_utf8(out[..n].to_vec()).unwrap()
}

fn float_code(v: f64) -> String {
    let mut out = [0u8; 64];
    let n = encode_float(v, &mut out).unwrap();
    String::from_utf8(out[..n].to_vec()).unwrap()
}

#[test]
fn integer_layout_vectors() {
    assert_eq!(int_code("0"), "0");
    assert_eq!(int_code("7"), ">7");
    assert_eq!(int_code("10"), ">>210");
    assert_eq!(int_code("-1"), "-8");
    assert_eq!(int_code("-10"), "--789");
    assert_eq!(int_code("007"), ">7");

    let mut out = [0u8; 64];
    for text in ["0", "7", "10", "-1", "-10", "123456789012345678901234567890"] {
        let code = int_code(text);
        let n = decode_int(code.as_bytes(), &mut out).unwrap();
        assert_eq!(&out[..n], text.as_bytes());
    }

    let err = encode_int(b"1.5", &mut out).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidNumber);
}

#[test]
fn integer_layout_orders_numerically() {
    let values = [
        "-123456789012",
        "-1000",
        "-999",
        "-10",
        "-9",
        "-1",
        "0",
        "1",
        "9",
        "10",
        "999",
        "1000",
        "123456789012",
    ];
    for pair in values.windows(2) {
        assert!(int_code(pair[0]) < int_code(pair[1]), "{pair:?}");
    }
}

#[test]
fn float_layout_vectors() {
    assert_eq!(float_code(0.0), "0");
    assert_eq!(float_code(1.5), ">015");
    assert_eq!(float_code(20.0), ">>12");
    assert_eq!(float_code(0.5), ">-85");
    assert_eq!(float_code(-1.5), "-984>");

    for v in [0.0, 1.5, 20.0, 0.5, -1.5, 1e300, -2.5e-300] {
        assert_eq!(decode_float(float_code(v).as_bytes()).unwrap(), v);
    }

    let mut out = [0u8; 8];
    let err = encode_float(f64::INFINITY, &mut out).unwrap_err();
    assert_eq!(err.code, ErrorCode::NonFiniteNumber);
}

#[test]
fn float_layout_orders_numerically() {
    let values = [
        -1e300, -1e10, -20.0, -1.5, -1.0, -0.5, -1e-5, 0.0, 1e-5, 0.5, 1.0, 1.5, 9.0, 10.0,
        11.0, 1e10, 1e300,
    ];
    for pair in values.windows(2) {
        assert!(float_code(pair[0]) < float_code(pair[1]), "{pair:?}");
    }
}

#[test]
fn small_decimal_layout() {
    let mut out = [0u8; 32];
    let n = encode_small_decimal(0.25, &mut out).unwrap();
    assert_eq!(&out[..n], b">25");
    let n = encode_small_decimal(-0.25, &mut out).unwrap();
    assert_eq!(&out[..n], b"-74>");
    let n = encode_small_decimal(0.05, &mut out).unwrap();
    assert_eq!(&out[..n], b">05");
    let n = encode_small_decimal(0.0, &mut out).unwrap();
    assert_eq!(&out[..n], b"0");

    assert_eq!(decode_small_decimal(b">25").unwrap(), 0.25);
    assert_eq!(decode_small_decimal(b"-74>").unwrap(), -0.25);
    assert_eq!(decode_small_decimal(b"0").unwrap(), 0.0);

    let err = encode_small_decimal(1.0, &mut out).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidNumber);
}

#[test]
fn smart_integers_collate_in_order() {
    let c = smart();
    assert!(key("9", &c) < key("10", &c));
    assert!(key("10", &c) < key("11", &c));
    assert_eq!(key("10", &c), vec![0x05, b'>', b'>', b'1', b'1', 0x00]);
}

#[test]
fn shorter_strings_sort_first() {
    let c = Config::new();
    assert!(key(r#""ab""#, &c) < key(r#""abc""#, &c));
    assert!(key(r#""abc""#, &c) < key(r#""b""#, &c));
    assert_eq!(key(r#""a""#, &c), vec![0x06, b'a', 0x00]);
}

#[test]
fn control_bytes_are_suffix_encoded() {
    let c = Config::new();
    assert_eq!(
        key(r#""a\u0000\u0001""#, &c),
        vec![0x06, b'a', 0x01, 0x01, 0x01, 0x02, 0x00]
    );
    assert!(key(r#""a""#, &c) < key(r#""a\u0000""#, &c));
    assert_eq!(back(&key(r#""a\u0000""#, &c), &c), r#""a\u0000""#);
}

#[test]
fn missing_literal_sorts_below_null() {
    let c = Config::new();
    let missing = key(r#""~[]{}falsenilNA~""#, &c);
    assert_eq!(missing, vec![0x01, 0x00]);
    assert_eq!(key("null", &c), vec![0x02, 0x00]);
    assert!(missing < key("null", &c));

    let literal = key(r#""~[]{}falsenilNA~""#, &c.with_do_missing(false));
    assert_eq!(literal[0], 0x06);

    let (v, _) = collate_to_value(&missing, &c).unwrap();
    assert_eq!(v, Value::Missing);
}

#[test]
fn kinds_sort_in_document_order() {
    let c = Config::new();
    let docs = [
        r#""~[]{}falsenilNA~""#,
        "null",
        "false",
        "true",
        "-5",
        "0",
        "3",
        r#""""#,
        r#""a""#,
        "[]",
        "[1]",
        "{}",
        r#"{"a":1}"#,
    ];
    for pair in docs.windows(2) {
        assert!(key(pair[0], &c) < key(pair[1], &c), "{pair:?}");
    }
}

#[test]
fn containers_layout() {
    let c = Config::new();
    assert_eq!(key("[]", &c), vec![0x08, 0x00]);
    assert_eq!(key("[true]", &c), vec![0x08, 0x04, 0x00, 0x00]);
    assert_eq!(key("{}", &c), vec![0x09, 0x07, b'0', 0x00, 0x00]);

    let prefixed = c.with_array_len_prefix(true);
    assert_eq!(
        key("[null]", &prefixed),
        vec![0x08, 0x07, b'>', b'1', 0x00, 0x02, 0x00, 0x00]
    );
    // shorter arrays first, regardless of content
    assert!(key("[9]", &prefixed) < key("[1,1]", &prefixed));
    assert!(key("[9]", &c) > key("[1,1]", &c));
}

#[test]
fn map_members_are_sorted() {
    let c = Config::new();
    assert_eq!(key(r#"{"b":1,"a":2}"#, &c), key(r#"{"a":2,"b":1}"#, &c));
    assert_eq!(
        back(&key(r#"{"b":1,"a":[true,null]}"#, &c), &c),
        r#"{"a":[true,null],"b":1}"#
    );
}

#[test]
fn exact_integers_equal_floats_under_smart() {
    let c = smart();
    let mut a = [0u8; 32];
    let mut b = [0u8; 32];
    let n = value_to_collate(&Value::Float64(3.0), &mut a, &c).unwrap();
    let m = value_to_collate(&Value::Int(3), &mut b, &c).unwrap();
    assert_eq!(&a[..n], &b[..m]);
    assert!(key("2.5", &c) < key("3", &c));
    assert!(key("3", &c) < key("3.5", &c));

    let j = Config::new().with_number_kind(NumberKind::JsonNumber);
    assert_eq!(key("3.0", &j), key("3", &j));
    assert_eq!(key("30e-1", &j), key("3", &j));
}

#[test]
fn json_number_keeps_every_digit() {
    let j = Config::new().with_number_kind(NumberKind::JsonNumber);
    let big = "12345678901234567890.5";
    assert_eq!(back(&key(big, &j), &j), big);
    assert!(key("12345678901234567890", &j) < key(big, &j));
}

#[test]
fn extreme_exponents_collate_in_order() {
    let c = smart();
    let top = "1e9223372036854775807";
    assert!(key("1e9223372036854775806", &c) < key(top, &c));
    assert!(key("-1e9223372036854775807", &c) < key("-1e9223372036854775806", &c));

    let mut data = vec![0xd8, 0x26, 0x75];
    data.extend_from_slice(top.as_bytes());
    let mut out = [0u8; 64];
    let (read, n) = cbor_to_collate(&data, &mut out, &c).unwrap();
    assert_eq!(read, data.len());
    assert_eq!(&out[..n], key(top, &c).as_slice());

    let j = Config::new().with_number_kind(NumberKind::JsonNumber);
    assert_eq!(back(&key(top, &j), &j), top);
    assert!(key("1e-9223372036854775807", &j) < key("1e-9223372036854775806", &j));
    let e = collate_to_value(&key(top, &j), &j).unwrap_err();
    assert_eq!(e.code, ErrorCode::NonFiniteNumber);

    for text in ["1e9223372036854775808", "10e9223372036854775807", "1e99999999999999999999"] {
        let e = json_to_collate(text.as_bytes(), &mut out, &c).unwrap_err();
        assert_eq!(e.code, ErrorCode::ExponentOverflow, "{text}");
        assert_eq!(e.kind(), ErrorKind::NumberOutOfRange);
    }
}

#[test]
fn int_number_uses_integer_layout() {
    let c = Config::new().with_number_kind(NumberKind::IntNumber);
    assert_eq!(key("10", &c), vec![0x05, b'>', b'>', b'2', b'1', b'0', 0x00]);
    assert_eq!(key("-1", &c), vec![0x05, b'-', b'8', 0x00]);

    let mut out = [0u8; 32];
    let err = json_to_collate(b"1.5", &mut out, &c).unwrap_err();
    assert_eq!(err.code, ErrorCode::FractionalInteger);

    let (v, _) = collate_to_value(&key("-10", &c), &c).unwrap();
    assert_eq!(v, Value::Int(-10));
}

#[test]
fn decode_numbers_per_kind() {
    let code = key("[1,2.5]", &Config::new());
    let (v, used) = collate_to_value(&code, &Config::new()).unwrap();
    assert_eq!(used, code.len());
    assert_eq!(v, Value::Array(vec![Value::Float64(1.0), Value::Float64(2.5)]));

    let (v, _) = collate_to_value(&code, &smart()).unwrap();
    assert_eq!(v, Value::Array(vec![Value::Int(1), Value::Float64(2.5)]));
}

#[test]
fn value_collation_matches_json_collation() {
    let c = Config::new();
    let v = Value::map([
        ("z", Value::Array(vec![Value::Null, Value::Bool(false)])),
        ("a", Value::from("x")),
    ]);
    let mut out = [0u8; 128];
    let n = value_to_collate(&v, &mut out, &c).unwrap();
    assert_eq!(&out[..n], key(r#"{"z":[null,false],"a":"x"}"#, &c).as_slice());

    let n = value_to_collate(&Value::Bytes(vec![0x00, 0xff]), &mut out, &c).unwrap();
    assert_eq!(&out[..n], &[0x0a, 0x01, 0x01, 0xff, 0x00]);
}

#[test]
fn uncollatable_values_are_rejected() {
    let mut out = [0u8; 32];
    let c = Config::new();
    let err = value_to_collate(&Value::Undefined, &mut out, &c).unwrap_err();
    assert_eq!(err.code, ErrorCode::NotCollatable);
    let err = value_to_collate(&Value::Simple(5), &mut out, &c).unwrap_err();
    assert_eq!(err.code, ErrorCode::NotCollatable);
    let err = value_to_collate(&Value::Float64(f64::NAN), &mut out, &c).unwrap_err();
    assert_eq!(err.code, ErrorCode::NonFiniteNumber);
    let err = value_to_collate(&Value::Break, &mut out, &c).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnexpectedMarker);
}

#[test]
fn max_keys_is_enforced() {
    let c = Config::new().with_max_keys(2);
    let mut out = [0u8; 128];
    assert!(json_to_collate(br#"{"a":1,"b":2}"#, &mut out, &c).is_ok());
    let err = json_to_collate(br#"{"a":1,"b":2,"c":3}"#, &mut out, &c).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooManyKeys);
}

#[test]
fn malformed_collation_is_rejected() {
    let c = Config::new();
    let err = collate_to_value(&[0x0b, 0x00], &c).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownCollationType);
    assert_eq!(err.offset, 0);

    let err = collate_to_value(&[0x06, b'a'], &c).unwrap_err();
    assert_eq!(err.code, ErrorCode::Unterminated);

    let err = collate_to_value(&[0x08, 0x02, 0x00], &c).unwrap_err();
    assert_eq!(err.code, ErrorCode::Unterminated);

    let err = collate_to_value(&[0x00], &c).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnexpectedTerminator);

    // length prefix says 3, one element follows
    let lying = [0x08, 0x07, b'>', b'3', 0x00, 0x02, 0x00, 0x00];
    let err = collate_to_value(&lying, &c).unwrap_err();
    assert_eq!(err.code, ErrorCode::LengthPrefixMismatch);
    assert!(collate_to_value(&lying, &c.with_strict(false)).is_ok());

    let mut out = [0u8; 32];
    let err = collate_to_json(&[0x0a, 0x61, 0x00], &mut out, &c).unwrap_err();
    assert_eq!(err.code, ErrorCode::NotJsonRepresentable);
}

#[test]
fn cbor_collation_matches_json_collation() {
    let c = smart();
    let text = br#"{"name":"x\ty","tags":[1,2.5,null],"ok":true}"#;
    let mut cbor = [0u8; 128];
    let (_, n) = json_to_cbor(text, &mut cbor, &c).unwrap();

    let mut out = [0u8; 256];
    let (read, m) = cbor_to_collate(&cbor[..n], &mut out, &c).unwrap();
    assert_eq!(read, n);
    assert_eq!(&out[..m], key(std::str::from_utf8(text).unwrap(), &c).as_slice());

    // plain CBOR text keys collate like tag-37 keys
    let plain = [0xa1, 0x61, b'k', 0x01];
    let tagged = [0xa1, 0xd8, 0x25, 0x41, b'k', 0x01];
    let mut a = [0u8; 64];
    let mut b = [0u8; 64];
    let (_, x) = cbor_to_collate(&plain, &mut a, &c).unwrap();
    let (_, y) = cbor_to_collate(&tagged, &mut b, &c).unwrap();
    assert_eq!(&a[..x], &b[..y]);
}

#[test]
fn collation_decodes_to_cbor() {
    let c = smart();
    let code = key(r#"{"b":[1,"x"],"a":false}"#, &c);
    let mut out = [0u8; 64];
    let (read, n) = collate_to_cbor(&code, &mut out, &c).unwrap();
    assert_eq!(read, code.len());
    assert_eq!(
        &out[..n],
        &[0xa2, 0x61, b'a', 0xf4, 0x61, b'b', 0x82, 0x01, 0x61, b'x']
    );

    let stream = c.with_container_encoding(ContainerEncoding::Stream);
    let (_, n) = collate_to_cbor(&key("[1]", &c), &mut out, &stream).unwrap();
    assert_eq!(&out[..n], &[0x9f, 0x01, 0xff]);

    let j = Config::new().with_number_kind(NumberKind::JsonNumber);
    let (_, n) = collate_to_cbor(&key("2.50", &j), &mut out, &j).unwrap();
    assert_eq!(&out[..n], &[0xd8, 0x26, 0x63, b'2', b'.', b'5']);

    let (_, n) = collate_to_cbor(&[0x01, 0x00], &mut out, &c).unwrap();
    assert_eq!(out[0], 0x70);
    assert_eq!(&out[1..n], b"~[]{}falsenilNA~");
}

#[test]
fn cbor_collation_rejects_uncollatable_items() {
    let c = Config::new();
    let mut out = [0u8; 32];
    let err = cbor_to_collate(&[0xf7], &mut out, &c).unwrap_err();
    assert_eq!(err.code, ErrorCode::NotCollatable);
    let err = cbor_to_collate(&[0xd8, 0x63, 0x01], &mut out, &c).unwrap_err();
    assert_eq!(err.code, ErrorCode::NotCollatable);
}
