use std::thread::scope;
use std::time::Instant;

use lazy_set::ConcurrentSet;

const PRODUCERS: usize = 8;
const CONSUMERS: usize = 8;
const N: usize = 16 * 1024;
const PRODUCER_N: usize = N / PRODUCERS;
const CONSUMER_N: usize = N / CONSUMERS;

fn producer(set: ConcurrentSet<usize>, min: usize, max: usize) {
    for i in (min..max).rev() {
        assert!(set.insert(i));
    }
}

fn consumer(set: ConcurrentSet<usize>, n: usize) {
    let mut deleted = 0;
    while deleted < n {
        if let Some(key) = set.first() {
            if set.delete(&key) {
                deleted += 1;
            }
        }
    }
}

fn main() {
    let set = ConcurrentSet::default();

    let before = Instant::now();
    scope(|s| {
        let mut handles = vec![];

        for i in 0..PRODUCERS {
            let min = i * PRODUCER_N;
            let max = (i + 1) * PRODUCER_N;
            let set = set.clone();
            let handle = s.spawn(move || producer(set, min, max));
            handles.push(handle);
        }

        for _ in 0..CONSUMERS {
            let set = set.clone();
            let handle = s.spawn(move || consumer(set, CONSUMER_N));
            handles.push(handle);
        }

        for handle in handles.into_iter() {
            handle.join().unwrap()
        }
    });

    let elapsed = before.elapsed();

    let per_second = N as u128 * 1000 / elapsed.as_millis().max(1);

    assert!(set.is_empty());

    println!(
        "with {} producers and {} consumers, took {:?} to churn {} keys ({} per second)",
        PRODUCERS, CONSUMERS, elapsed, N, per_second
    );
}
