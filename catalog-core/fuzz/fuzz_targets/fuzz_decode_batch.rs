#![no_main]
use catalog_core::LwwRegisterMap;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = catalog_core::codec::decode_batch(data);

    // A snapshot that imports must export to one that imports to the same state
    if let Ok(map) = LwwRegisterMap::from_bytes(data) {
        let bytes = map.to_bytes().expect("Imported map must export");
        let again = LwwRegisterMap::from_bytes(&bytes).expect("Exported snapshot must import");
        assert_eq!(again, map);
        assert_eq!(again.state_hash(), map.state_hash());
    }
});
