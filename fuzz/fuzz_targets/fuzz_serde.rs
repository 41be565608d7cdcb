#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate lazy_set;

fuzz_target!(|data: Vec<u64>| {
    let set = lazy_set::ConcurrentSet::<_, 4>::default();

    for item in data {
        set.insert(item);
    }

    let serialized = bincode::serialize(&set).unwrap();
    let deserialized: lazy_set::ConcurrentSet<u64, 4> = bincode::deserialize(&serialized).unwrap();
    assert_eq!(set, deserialized);
    assert_eq!(set.len(), deserialized.len());
});
