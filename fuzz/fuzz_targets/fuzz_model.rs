#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate arbitrary;
extern crate lazy_set;

use arbitrary::Arbitrary;

const KEYSPACE: u64 = 128;

#[derive(Debug)]
enum Op {
    Insert { key: u64 },
    Delete { key: u64 },
    Contains { key: u64 },
    Range { limit: usize },
}

impl<'a> Arbitrary<'a> for Op {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(if u.ratio(1, 2)? {
            Op::Insert {
                key: u.int_in_range(0..=KEYSPACE)?,
            }
        } else if u.ratio(1, 2)? {
            Op::Delete {
                key: u.int_in_range(0..=KEYSPACE)?,
            }
        } else if u.ratio(1, 2)? {
            Op::Contains {
                key: u.int_in_range(0..=KEYSPACE)?,
            }
        } else {
            Op::Range {
                limit: u.int_in_range(1..=KEYSPACE as usize)?,
            }
        })
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let set = lazy_set::ConcurrentSet::<u64, 4>::default();
    let mut model = std::collections::BTreeSet::new();

    for op in ops {
        match op {
            Op::Insert { key } => {
                assert_eq!(set.insert(key), model.insert(key));
            }
            Op::Delete { key } => {
                assert_eq!(set.delete(&key), model.remove(&key));
            }
            Op::Contains { key } => {
                assert_eq!(set.contains(&key), model.contains(&key));
            }
            Op::Range { limit } => {
                let mut visited = vec![];
                set.range(|key| {
                    visited.push(key);
                    visited.len() < limit
                });

                let expected: Vec<u64> = model.iter().copied().take(limit).collect();
                assert_eq!(visited, expected);
            }
        };

        assert_eq!(set.len(), model.len());
    }

    let mut model_iter = model.iter();
    let mut set_iter = set.iter();

    for k1 in &mut model_iter {
        let k2 = set_iter.next().unwrap();
        assert_eq!(*k1, k2);
    }

    assert_eq!(set_iter.next(), None);
});
