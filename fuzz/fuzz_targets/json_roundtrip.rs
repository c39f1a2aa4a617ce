#![no_main]

use libfuzzer_sys::fuzz_target;

use cbor_collate::{cbor_to_json, json_to_cbor, Config, NumberKind};

fuzz_target!(|data: &[u8]| {
    let config = Config::new()
        .with_number_kind(NumberKind::JsonNumber)
        .with_max_depth(64);
    let mut cbor = vec![0u8; data.len() * 2 + 64];
    let Ok((_, n)) = json_to_cbor(data, &mut cbor, &config) else {
        return;
    };

    // Exact numbers and raw strings reproduce the text minus whitespace; a second pass
    // through CBOR must therefore be a fixed point.
    let mut text = vec![0u8; data.len() + 64];
    let (_, t) = cbor_to_json(&cbor[..n], &mut text, &config).expect("render parsed json");
    let mut again = vec![0u8; data.len() * 2 + 64];
    let (_, m) = json_to_cbor(&text[..t], &mut again, &config).expect("reparse rendered json");
    assert_eq!(&again[..m], &cbor[..n]);
});
