#![no_main]
use catalog_core::codec;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decode or fail cleanly, never panic
    let _ = codec::encoded_len(data);

    if let Ok(entry) = codec::decode(data) {
        // Anything accepted re-encodes canonically and decodes to the same entry
        let bytes = codec::encode(&entry).expect("Decoded entry must re-encode");
        let again = codec::decode(&bytes).expect("Canonical frame must decode");
        assert_eq!(again, entry);
    }

    // Bridge path logs and returns an error instead of panicking
    let _ = catalog_core::bridge::decode_entry_json(data);
});
