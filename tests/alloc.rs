// Pointer operations and transcoders draw their scratch from thread-local pools, so
// once a pool is warm a repeated call performs no heap allocation.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use cbor_collate::{
    cbor_append, cbor_delete, cbor_get, cbor_set, cbor_to_json_pointer, json_to_cbor,
    json_to_cbor_pointer, json_to_collate, Config,
};

thread_local! {
    static ALLOCS: Cell<usize> = const { Cell::new(0) };
}

struct Counting;

fn bump() {
    let _ = ALLOCS.try_with(|c| c.set(c.get() + 1));
}

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        bump();
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        bump();
        System.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static GLOBAL: Counting = Counting;

/// Run `f` twice and count the allocations made by the second run on this thread.
fn warm_allocations(mut f: impl FnMut()) -> usize {
    f();
    let before = ALLOCS.with(Cell::get);
    f();
    ALLOCS.with(Cell::get) - before
}

const DOC: &[u8] = br#"{"a":10,"arr":[1,2],"dict":{"a~b":10,"b/c":20}}"#;

fn fixtures() -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let mut out = [0u8; 128];
    let (_, n) = json_to_cbor(DOC, &mut out, &Config::new()).unwrap();
    let doc = out[..n].to_vec();
    let n = json_to_cbor_pointer(b"/dict/b~1c", &mut out).unwrap();
    let key = out[..n].to_vec();
    let n = json_to_cbor_pointer(b"/arr", &mut out).unwrap();
    let arr = out[..n].to_vec();
    (doc, key, arr)
}

#[test]
fn pointer_operations_reuse_pooled_scratch() {
    let (doc, key, arr) = fixtures();
    let mut item = [0u8; 64];
    let mut newdoc = [0u8; 128];
    let mut old = [0u8; 64];

    assert_eq!(
        warm_allocations(|| {
            cbor_get(&doc, &key, &mut item).unwrap();
        }),
        0
    );
    assert_eq!(
        warm_allocations(|| {
            cbor_set(&doc, &key, &[0x01], &mut newdoc, &mut old).unwrap();
        }),
        0
    );
    assert_eq!(
        warm_allocations(|| {
            cbor_delete(&doc, &key, &mut newdoc, &mut old).unwrap();
        }),
        0
    );
    assert_eq!(
        warm_allocations(|| {
            cbor_append(&doc, &arr, &[0x03], &mut newdoc).unwrap();
        }),
        0
    );
}

#[test]
fn pointer_conversion_reuses_pooled_scratch() {
    let (_, key, _) = fixtures();
    let mut text = [0u8; 64];
    let mut cptr = [0u8; 64];
    assert_eq!(
        warm_allocations(|| {
            cbor_to_json_pointer(&key, &mut text).unwrap();
        }),
        0
    );
    assert_eq!(
        warm_allocations(|| {
            json_to_cbor_pointer(b"/dict/a~0b", &mut cptr).unwrap();
        }),
        0
    );
}

#[test]
fn collation_reuses_pooled_scratch() {
    let mut out = [0u8; 256];
    assert_eq!(
        warm_allocations(|| {
            json_to_collate(DOC, &mut out, &Config::new()).unwrap();
        }),
        0
    );
}
