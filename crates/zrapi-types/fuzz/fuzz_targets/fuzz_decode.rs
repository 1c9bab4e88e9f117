#![no_main]

use libfuzzer_sys::fuzz_target;
use zrapi_types::{CborCodec, Codec};

fuzz_target!(|data: &[u8]| {
    // Reply bytes come straight off the wire.
    // Decoding should never panic - only return Ok or Err
    let codec = CborCodec::new();
    if let Ok(value) = codec.decode(data) {
        // Anything that decodes must encode again
        let _ = codec.encode(&value).expect("decoded value re-encodes");
    }
});
