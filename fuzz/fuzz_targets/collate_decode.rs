#![no_main]

use libfuzzer_sys::fuzz_target;

use cbor_collate::{collate_to_value, value_to_collate, Config, NumberKind};

fuzz_target!(|data: &[u8]| {
    let config = Config::new()
        .with_number_kind(NumberKind::JsonNumber)
        .with_strict(true)
        .with_max_depth(64);
    let Ok((v, read)) = collate_to_value(data, &config) else {
        return;
    };

    let mut out = vec![0u8; read * 4 + 64];
    let _ = value_to_collate(&v, &mut out, &config);
});
