// Property-based checks for the transcoders, the collation order and pointers.
//
// Sizes stay small so the suite runs quickly.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use cbor_collate::{
    cbor_append, cbor_delete, cbor_get, cbor_set, cbor_to_json, cbor_to_json_pointer,
    cbor_to_value, collate_to_value, json_to_cbor, json_to_cbor_pointer, json_to_collate,
    value_to_cbor, value_to_collate, value_to_json, Config, ContainerEncoding, ErrorKind,
    JsonPointer, NumberKind, Value,
};

fn arb_key() -> impl Strategy<Value = String> {
    proptest::collection::vec(proptest::char::range('a', 'z'), 0..8)
        .prop_map(|chars| chars.into_iter().collect())
}

fn arb_text() -> impl Strategy<Value = String> {
    // control characters exercise escaping and the collation suffix
    proptest::collection::vec(
        prop_oneof![
            proptest::char::range('\u{0}', '\u{1f}'),
            proptest::char::range(' ', '~'),
            proptest::char::range('\u{e0}', '\u{ff}'),
        ],
        0..16,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

fn arb_float() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("finite", |f| f.is_finite())
}

fn arb_map(inner: impl Strategy<Value = Value>) -> impl Strategy<Value = Value> {
    proptest::collection::vec((arb_key(), inner), 0..6).prop_map(|pairs| {
        let m: BTreeMap<String, Value> = pairs.into_iter().collect();
        Value::Map(m.into_iter().collect())
    })
}

/// Values whose collation decodes back to an equal value under `SmartNumber`.
fn arb_json_like() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        arb_text().prop_map(Value::Text),
    ];
    leaf.prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            arb_map(inner),
        ]
    })
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<u64>().prop_map(Value::from),
        arb_float().prop_map(Value::Float64),
        arb_text().prop_map(Value::Text),
        proptest::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
    ];
    leaf.prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            arb_map(inner),
        ]
    })
}

fn collate(v: &Value, config: &Config) -> Vec<u8> {
    let mut out = vec![0u8; 1 << 16];
    let n = value_to_collate(v, &mut out, config).unwrap();
    out.truncate(n);
    out
}

/// Integers near and far from zero, so equal and neighbouring pairs come up.
fn arb_int() -> impl Strategy<Value = i64> {
    prop_oneof![any::<i64>(), any::<i32>().prop_map(i64::from), -4i64..4]
}

/// Doubles below 2^53 in magnitude, where the shortest decimal of a value lies on the
/// same side of every integer as the value itself.
fn arb_exact_float() -> impl Strategy<Value = f64> {
    let limit = 9_007_199_254_740_992.0;
    prop_oneof![
        -limit..limit,
        (any::<i32>(), 0u8..4).prop_map(|(i, q)| f64::from(i) + f64::from(q) * 0.25),
    ]
}

fn cmp_int_float(a: i64, b: f64) -> Ordering {
    #[allow(clippy::cast_possible_truncation)]
    let whole = b.trunc() as i64;
    a.cmp(&whole).then_with(|| 0f64.partial_cmp(&b.fract()).unwrap())
}

fn collate_json(text: &str, config: &Config) -> Vec<u8> {
    let mut out = vec![0u8; 256];
    let (read, n) = json_to_collate(text.as_bytes(), &mut out, config).unwrap();
    assert_eq!(read, text.len());
    out.truncate(n);
    out
}

fn cbor(v: &Value, config: &Config) -> Vec<u8> {
    let mut out = vec![0u8; 1 << 16];
    let n = value_to_cbor(v, &mut out, config).unwrap();
    out.truncate(n);
    out
}

fn cptr(ptr: &JsonPointer) -> Vec<u8> {
    let mut out = vec![0u8; 1 << 12];
    let n = ptr.to_cbor(&mut out).unwrap();
    out.truncate(n);
    out
}

proptest! {
    #[test]
    fn value_cbor_value(v in arb_value()) {
        let mut out = vec![0u8; 1 << 16];
        for encoding in [ContainerEncoding::LengthPrefix, ContainerEncoding::Stream] {
            let config = Config::new().with_container_encoding(encoding);
            let n = value_to_cbor(&v, &mut out, &config).unwrap();
            let (back, read) = cbor_to_value(&out[..n], &config).unwrap();
            prop_assert_eq!(read, n);
            prop_assert_eq!(&back, &v);
        }
    }

    #[test]
    fn json_cbor_json_is_exact(v in arb_json_like()) {
        let config = Config::new().with_number_kind(NumberKind::JsonNumber);
        let mut text = vec![0u8; 1 << 16];
        let t = value_to_json(&v, &mut text, &config).unwrap();

        let mut cbor = vec![0u8; 1 << 16];
        let (read, n) = json_to_cbor(&text[..t], &mut cbor, &config).unwrap();
        prop_assert_eq!(read, t);

        let mut back = vec![0u8; 1 << 16];
        let (used, m) = cbor_to_json(&cbor[..n], &mut back, &config).unwrap();
        prop_assert_eq!(used, n);
        prop_assert_eq!(&back[..m], &text[..t]);
    }

    #[test]
    fn value_collate_value(v in arb_json_like()) {
        let config = Config::new().with_number_kind(NumberKind::SmartNumber);
        let code = collate(&v, &config);
        let (back, read) = collate_to_value(&code, &config).unwrap();
        prop_assert_eq!(read, code.len());
        prop_assert_eq!(back, v);
    }

    #[test]
    fn integers_collate_in_order(a in any::<i64>(), b in any::<i64>()) {
        let config = Config::new().with_number_kind(NumberKind::SmartNumber);
        let ka = collate(&Value::Int(a), &config);
        let kb = collate(&Value::Int(b), &config);
        prop_assert_eq!(ka.cmp(&kb), a.cmp(&b));
    }

    #[test]
    fn floats_collate_in_order(a in arb_float(), b in arb_float()) {
        let config = Config::new();
        let ka = collate(&Value::Float64(a), &config);
        let kb = collate(&Value::Float64(b), &config);
        prop_assert_eq!(Some(ka.cmp(&kb)), a.partial_cmp(&b));
    }

    #[test]
    fn strings_collate_in_order(a in arb_text(), b in arb_text()) {
        let config = Config::new().with_do_missing(false);
        let ka = collate(&Value::Text(a.clone()), &config);
        let kb = collate(&Value::Text(b.clone()), &config);
        prop_assert_eq!(ka.cmp(&kb), a.cmp(&b));
    }

    #[test]
    fn numbers_sort_before_strings(n in any::<i64>(), s in arb_text()) {
        let config = Config::new().with_number_kind(NumberKind::SmartNumber);
        let kn = collate(&Value::Int(n), &config);
        let ks = collate(&Value::Text(s), &config);
        prop_assert_eq!(kn.cmp(&ks), Ordering::Less);
    }

    #[test]
    fn pointer_text_and_cbor_agree(segs in proptest::collection::vec(any::<String>(), 0..5)) {
        let mut ptr = JsonPointer::root();
        for seg in &segs {
            ptr.push(seg.as_str());
        }
        let text = ptr.to_string();
        prop_assert_eq!(&JsonPointer::parse(&text).unwrap(), &ptr);

        let mut cptr = vec![0u8; 1 << 16];
        let n = json_to_cbor_pointer(text.as_bytes(), &mut cptr).unwrap();
        let (from, used) = JsonPointer::from_cbor(&cptr[..n]).unwrap();
        prop_assert_eq!(used, n);
        prop_assert_eq!(&from, &ptr);

        let mut back = vec![0u8; 1 << 16];
        let (read, m) = cbor_to_json_pointer(&cptr[..n], &mut back).unwrap();
        prop_assert_eq!(read, n);
        prop_assert_eq!(&back[..m], text.as_bytes());
    }

    #[test]
    fn set_then_get_returns_the_item(
        v in arb_map(arb_json_like()),
        pick in any::<proptest::sample::Index>(),
        item in arb_json_like(),
    ) {
        let Value::Map(entries) = &v else { unreachable!() };
        prop_assume!(!entries.is_empty());
        let key = entries[pick.index(entries.len())].0.clone();

        let config = Config::new();
        let doc = cbor(&v, &config);
        let item = cbor(&item, &config);
        let mut ptr = JsonPointer::root();
        ptr.push(key.as_str());
        let p = cptr(&ptr);

        let mut newdoc = vec![0u8; 1 << 17];
        let mut old = vec![0u8; 1 << 16];
        let (n, _) = cbor_set(&doc, &p, &item, &mut newdoc, &mut old).unwrap();
        let mut got = vec![0u8; 1 << 16];
        let g = cbor_get(&newdoc[..n], &p, &mut got).unwrap();
        prop_assert_eq!(&got[..g], item.as_slice());

        let (n, _) = cbor_delete(&doc, &p, &mut newdoc, &mut old).unwrap();
        let e = cbor_get(&newdoc[..n], &p, &mut got).unwrap_err();
        prop_assert_eq!(e.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn append_grows_the_array_by_one(
        items in proptest::collection::vec(arb_json_like(), 0..6),
        item in arb_json_like(),
        stream in any::<bool>(),
    ) {
        let encoding = if stream {
            ContainerEncoding::Stream
        } else {
            ContainerEncoding::LengthPrefix
        };
        let config = Config::new().with_container_encoding(encoding);
        let len = items.len();
        let doc = cbor(&Value::Array(items), &config);
        let item_bytes = cbor(&item, &config);

        let mut newdoc = vec![0u8; 1 << 17];
        let n = cbor_append(&doc, &cptr(&JsonPointer::root()), &item_bytes, &mut newdoc).unwrap();
        let (back, _) = cbor_to_value(&newdoc[..n], &config).unwrap();
        let Value::Array(grown) = back else { unreachable!() };
        prop_assert_eq!(grown.len(), len + 1);

        let last = cptr(&JsonPointer::parse("/-").unwrap());
        let mut got = vec![0u8; 1 << 16];
        let g = cbor_get(&newdoc[..n], &last, &mut got).unwrap();
        prop_assert_eq!(&got[..g], item_bytes.as_slice());
    }

    #[test]
    fn integers_and_floats_collate_together(a in arb_int(), b in arb_exact_float()) {
        let config = Config::new().with_number_kind(NumberKind::SmartNumber);
        let ka = collate(&Value::Int(a), &config);
        let kb = collate(&Value::Float64(b), &config);
        prop_assert_eq!(ka.cmp(&kb), cmp_int_float(a, b));
    }

    #[test]
    fn integer_text_and_fraction_text_collate_together(
        a in arb_int(),
        negative in any::<bool>(),
        whole in 0u32..(1 << 31),
        frac in 1u32..10_000,
    ) {
        let config = Config::new().with_number_kind(NumberKind::SmartNumber);
        let sign = if negative { "-" } else { "" };
        let fraction = format!("{sign}{whole}.{frac:04}");
        let ka = collate_json(&a.to_string(), &config);
        let kb = collate_json(&fraction, &config);

        let scaled = i128::from(whole) * 10_000 + i128::from(frac);
        let scaled = if negative { -scaled } else { scaled };
        prop_assert_eq!(ka.cmp(&kb), (i128::from(a) * 10_000).cmp(&scaled));
    }
}
