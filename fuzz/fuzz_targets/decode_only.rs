#![no_main]

use libfuzzer_sys::fuzz_target;

use cbor_collate::{cbor_to_json, cbor_to_value, item_end, Config};

fuzz_target!(|data: &[u8]| {
    let config = Config::new().with_max_depth(64);
    let mut out = vec![0u8; data.len() * 8 + 64];
    let _ = cbor_to_value(data, &config);
    let _ = cbor_to_json(data, &mut out, &config);

    // Whatever decodes must also be skippable.
    if let Ok((_, read)) = cbor_to_value(data, &config) {
        assert_eq!(item_end(data, 0).expect("skip decoded item"), read);
    }
});
