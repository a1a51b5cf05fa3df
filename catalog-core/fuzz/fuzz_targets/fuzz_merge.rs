#![no_main]
use arbitrary::Arbitrary;
use catalog_core::{Crdt, Entry, LwwRegisterMap};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Write {
    key: u8,
    timestamp: i16,
    by: u8,
}

impl Write {
    // Payload is a function of (key, timestamp) so equal timestamps carry equal
    // entries and merge order cannot matter.
    fn entry(&self) -> Entry {
        let key = self.key % 8;
        Entry::new(format!("https://forum.example/t/k{key}/1"), format!("m{key}:{}", self.timestamp), self.timestamp as i64)
            .with_added_by(format!("peer{}", (key as i16 ^ self.timestamp) & 3))
    }
}

#[derive(Arbitrary, Debug)]
struct Input {
    a: Vec<Write>,
    b: Vec<Write>,
    c: Vec<Write>,
}

fn build(writes: &[Write]) -> LwwRegisterMap {
    writes.iter().map(Write::entry).collect()
}

fn merged(x: &LwwRegisterMap, y: &LwwRegisterMap) -> LwwRegisterMap {
    let mut out = x.clone();
    out.merge(y);
    out
}

fuzz_target!(|input: Input| {
    let a = build(&input.a);
    let b = build(&input.b);
    let c = build(&input.c);

    // Commutative
    assert_eq!(merged(&a, &b), merged(&b, &a));
    // Associative
    assert_eq!(merged(&merged(&a, &b), &c), merged(&a, &merged(&b, &c)));
    // Idempotent
    let ab = merged(&a, &b);
    assert_eq!(merged(&ab, &b), ab);
    // Monotonic count
    assert!(ab.count() >= a.count().max(b.count()));
});
