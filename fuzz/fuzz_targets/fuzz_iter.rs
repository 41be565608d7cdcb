#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate lazy_set;

fuzz_target!(|data: Vec<(bool, i16)>| {
    let mut model = std::collections::BTreeSet::default();
    let set = lazy_set::ConcurrentSet::<i16, 1>::default();

    for (insert, item) in &data {
        if *insert {
            set.insert(*item);
            model.insert(*item);
        } else {
            set.delete(item);
            model.remove(item);
        }
    }

    let model_iter: Vec<_> = model.into_iter().collect();

    let self_iter: Vec<_> = set.iter().collect();
    assert_eq!(self_iter, model_iter);

    let mut ranged = vec![];
    set.range(|key| {
        ranged.push(key);
        true
    });
    assert_eq!(ranged, model_iter);

    assert_eq!(set.first(), model_iter.first().copied());
});
