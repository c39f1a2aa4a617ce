use cbor_collate::{cbor_to_json_pointer, json_to_cbor_pointer, ErrorCode, JsonPointer};

fn to_cbor(text: &str) -> Vec<u8> {
    let mut out = [0u8; 128];
    let n = json_to_cbor_pointer(text.as_bytes(), &mut out).unwrap();
    out[..n].to_vec()
}

fn to_text(data: &[u8]) -> String {
    let mut out = [0u8; 128];
    let (read, n) = cbor_to_json_pointer(data, &mut out).unwrap();
    assert_eq!(read, data.len());
    String::from_utf8(out[..n].to_vec()).unwrap()
}

#[test]
fn parse_pointer_text() {
    let p = JsonPointer::parse("/a~1b/~0/0").unwrap();
    assert_eq!(p.segments(), ["a/b", "~", "0"]);
    assert_eq!(p.to_string(), "/a~1b/~0/0");

    assert!(JsonPointer::parse("").unwrap().is_root());
    assert_eq!(JsonPointer::parse("/").unwrap().segments(), [""]);
    assert_eq!("//x".parse::<JsonPointer>().unwrap().segments(), ["", "x"]);

    let e = JsonPointer::parse("a").unwrap_err();
    assert_eq!((e.code, e.offset), (ErrorCode::PointerSyntax, 0));
    let e = JsonPointer::parse("/a~2").unwrap_err();
    assert_eq!((e.code, e.offset), (ErrorCode::PointerSyntax, 2));
    let e = JsonPointer::parse("/a~").unwrap_err();
    assert_eq!((e.code, e.offset), (ErrorCode::PointerSyntax, 2));
}

#[test]
fn push_and_pop() {
    let mut p = JsonPointer::root();
    assert_eq!(p, JsonPointer::default());
    p.push("a/b");
    p.push(String::from("0"));
    assert_eq!(p.to_string(), "/a~1b/0");
    assert_eq!(p.pop().as_deref(), Some("0"));
    assert_eq!(p.pop().as_deref(), Some("a/b"));
    assert_eq!(p.pop(), None);
    assert!(p.is_root());
}

#[test]
fn text_to_cbor_pointer() {
    assert_eq!(
        to_cbor("/arr/1"),
        vec![0x9f, 0xd8, 0x25, 0x43, b'a', b'r', b'r', 0xd8, 0x25, 0x41, b'1', 0xff]
    );
    assert_eq!(to_cbor(""), vec![0x9f, 0xff]);
    assert_eq!(to_cbor("/"), vec![0x9f, 0xd8, 0x25, 0x40, 0xff]);
    assert_eq!(
        to_cbor("/a~1b"),
        vec![0x9f, 0xd8, 0x25, 0x43, b'a', b'/', b'b', 0xff]
    );
    // segments are JSON-escaped inside tag 37
    assert_eq!(
        to_cbor(r#"/a"b"#),
        vec![0x9f, 0xd8, 0x25, 0x44, b'a', b'\\', b'"', b'b', 0xff]
    );

    let mut out = [0u8; 128];
    let e = json_to_cbor_pointer(b"x", &mut out).unwrap_err();
    assert_eq!(e.code, ErrorCode::PointerSyntax);
    let mut small = [0u8; 4];
    let e = json_to_cbor_pointer(b"/arr", &mut small).unwrap_err();
    assert_eq!(e.code, ErrorCode::BufferFull);
}

#[test]
fn cbor_pointer_to_text() {
    for text in ["", "/", "/arr/1", "/a~1b/~0", r#"/a"b/\"#, "/\u{e9}t\u{e9}"] {
        assert_eq!(to_text(&to_cbor(text)), text);
    }

    // definite framing and plain text segments are accepted
    assert_eq!(to_text(&[0x82, 0x61, b'a', 0x61, b'/']), "/a/~1");
    assert_eq!(to_text(&[0x80]), "");

    let mut out = [0u8; 64];
    let (read, n) = cbor_to_json_pointer(&[0x81, 0x61, b'k', 0x00], &mut out).unwrap();
    assert_eq!((read, &out[..n]), (3, &b"/k"[..]));
}

#[test]
fn cbor_pointer_rejects_other_items() {
    let mut out = [0u8; 64];
    let cases: &[(&[u8], usize)] = &[
        (&[0x01], 0),
        (&[0xa0], 0),
        (&[0x81, 0x01], 1),
        (&[0x81, 0xd8, 0x26, 0x41, b'1'], 1),
        (&[0x81, 0x41, b'1'], 1),
    ];
    for (data, offset) in cases {
        let e = cbor_to_json_pointer(data, &mut out).unwrap_err();
        assert_eq!((e.code, e.offset), (ErrorCode::PointerSyntax, *offset), "{data:02x?}");
    }
    let e = cbor_to_json_pointer(&[0x9f, 0x61, b'k'], &mut out).unwrap_err();
    assert_eq!(e.code, ErrorCode::PointerSyntax);
}

#[test]
fn pointer_cbor_form() {
    let p = JsonPointer::parse("/x/y~0/a\"b").unwrap();
    let mut out = [0u8; 64];
    let n = p.to_cbor(&mut out).unwrap();
    assert_eq!(&out[..n], to_cbor("/x/y~0/a\"b").as_slice());

    let (back, used) = JsonPointer::from_cbor(&out[..n]).unwrap();
    assert_eq!(used, n);
    assert_eq!(back, p);
}
