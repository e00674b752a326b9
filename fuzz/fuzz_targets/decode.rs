#![no_main]
use bson_lite::{from_reader, from_slice, to_vec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut cursor = 0;
    let from_buf = from_slice(data, &mut cursor);
    let from_stream = from_reader(data);
    assert_eq!(from_buf.is_ok(), from_stream.is_ok());
    if let (Ok(a), Ok(b)) = (from_buf, from_stream) {
        // Compare encodings rather than values, since NaN payloads never compare equal
        // Declared content-lengths are trusted, so reservation can fail on lying input
        if let (Ok(x), Ok(y)) = (to_vec(&a), to_vec(&b)) {
            assert_eq!(x, y);
            let mut cursor = 0;
            let again = from_slice(&x, &mut cursor).unwrap();
            assert_eq!(to_vec(&again).unwrap(), x);
        }
    }
});
