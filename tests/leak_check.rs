use std::time::Instant;

use lazy_set::ConcurrentSet;

mod alloc {
    use std::alloc::{Layout, System};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[global_allocator]
    static ALLOCATOR: Alloc = Alloc;

    static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    static FREED: AtomicUsize = AtomicUsize::new(0);
    static RESIDENT: AtomicUsize = AtomicUsize::new(0);

    // all counts are exact byte totals

    pub fn allocated() -> usize {
        ALLOCATED.swap(0, Ordering::Relaxed)
    }

    pub fn freed() -> usize {
        FREED.swap(0, Ordering::Relaxed)
    }

    pub fn resident() -> usize {
        RESIDENT.load(Ordering::Relaxed)
    }

    #[derive(Default, Debug, Clone, Copy)]
    struct Alloc;

    unsafe impl std::alloc::GlobalAlloc for Alloc {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ret = System.alloc(layout);
            assert_ne!(
                ret,
                std::ptr::null_mut(),
                "alloc returned null pointer for layout {layout:?}"
            );
            ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed);
            RESIDENT.fetch_add(layout.size(), Ordering::Relaxed);
            std::ptr::write_bytes(ret, 0xa1, layout.size());
            ret
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            std::ptr::write_bytes(ptr, 0xde, layout.size());
            FREED.fetch_add(layout.size(), Ordering::Relaxed);
            RESIDENT.fetch_sub(layout.size(), Ordering::Relaxed);
            System.dealloc(ptr, layout)
        }
    }
}

fn concurrency() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(8)
        .min(16)
        * 2
}

/// Builds a set, churns it from many threads, and drops it
/// with `n` keys still linked.
fn churn(n: u32, rounds: u32) {
    let concurrency = concurrency();

    let run = |set: ConcurrentSet<u32, 5>, barrier: &std::sync::Barrier, low_bits| {
        let shift = concurrency.next_power_of_two().trailing_zeros();
        let unique_key = |key| (key << shift) | low_bits;

        barrier.wait();
        for key in 0..n {
            let i = unique_key(key);
            assert!(!set.contains(&i));
            assert!(set.insert(i));
            assert!(set.contains(&i), "failed to get key {i}");
        }

        // churn the upper half so that deleted nodes pile up in ebr
        for key in n / 2..n {
            let i = unique_key(key);
            assert!(set.delete(&i));
            assert!(set.insert(i));
        }

        let visible: std::collections::HashSet<u32> = set.iter().collect();
        for key in 0_u32..n {
            let i = unique_key(key);
            assert!(visible.contains(&i), "failed to get key {i}");
        }

        // leave the lower half behind for the round's cleanup
        for key in n / 2..n {
            let i = unique_key(key);
            assert!(set.delete(&i));
        }
    };

    let set = ConcurrentSet::default();
    std::thread::scope(|s| {
        for round in 0..rounds {
            let barrier = std::sync::Arc::new(std::sync::Barrier::new(concurrency));
            let mut threads = vec![];
            for i in 0..concurrency {
                let set_2 = set.clone();
                let barrier_2 = barrier.clone();

                let thread = s.spawn(move || run(set_2, &barrier_2, u32::try_from(i).unwrap()));
                threads.push(thread);
            }
            for thread in threads {
                thread.join().unwrap();
            }

            let survivors: Vec<u32> = set.iter().collect();
            assert_eq!(survivors.len(), set.len(), "round {round}");
            for key in survivors {
                assert!(set.delete(&key));
            }
        }
    });

    // these are only freed by dropping the set itself
    for i in 0..n {
        assert!(set.insert(i));
    }
    assert_eq!(set.len(), n as usize);

    drop(set);
}

#[test]
fn leak_check() {
    let n: u32 = 256;

    // the first pass initializes any lazily allocated
    // process-wide state, so that the measured pass can
    // be compared byte for byte.
    churn(n, 1);
    alloc::allocated();
    alloc::freed();

    let before = Instant::now();
    let resident_before = alloc::resident();

    churn(n, 16);

    let resident_after = alloc::resident();

    // a single linked node is enough to break the byte count
    let set = ConcurrentSet::<u32>::default();
    let resident_empty = alloc::resident();
    assert!(set.insert(7));
    assert!(alloc::resident() > resident_empty);
    drop(set);
    assert_eq!(alloc::resident(), resident_after, "dropping a one-key set leaked");

    println!(
        "{:.2} million wps {} bytes allocated {} bytes freed {} bytes resident to insert {} items",
        f64::from(n) / (before.elapsed().as_micros().max(1)) as f64,
        alloc::allocated(),
        alloc::freed(),
        resident_after,
        n,
    );

    assert_eq!(
        resident_after,
        resident_before,
        "leaked {} bytes",
        resident_after.abs_diff(resident_before)
    );
}
