#![cfg_attr(
    test,
    deny(
        missing_docs,
        future_incompatible,
        nonstandard_style,
        rust_2018_idioms,
        missing_copy_implementations,
        trivial_casts,
        trivial_numeric_casts,
        unused_qualifications,
    )
)]
#![cfg_attr(test, deny(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::doc_markdown,
    clippy::explicit_into_iter_loop,
    clippy::explicit_iter_loop,
    clippy::if_not_else,
    clippy::inline_always,
    clippy::items_after_statements,
    clippy::match_same_arms,
    clippy::mem_forget,
    clippy::needless_borrow,
    clippy::needless_continue,
    clippy::needless_pass_by_value,
    clippy::redundant_closure_for_method_calls,
    clippy::shadow_unrelated,
    clippy::single_match_else,
    clippy::unimplemented,
    clippy::used_underscore_binding,
    clippy::wildcard_dependencies,
))]

//! A concurrent ordered set of integer keys, built on a sorted singly
//! linked list with lazy synchronization.
//!
//! Reads ([`ConcurrentSet::contains`], [`ConcurrentSet::range`],
//! [`ConcurrentSet::iter`], [`ConcurrentSet::len`]) never take a lock and
//! never retry. Mutations ([`ConcurrentSet::insert`] and
//! [`ConcurrentSet::delete`]) scan the list without locking, then lock only
//! the one or two nodes around the key, re-validate that neighborhood, and
//! restart the scan from the head of the list if it changed underneath them.
//!
//! Unlinked nodes are reclaimed with epoch-based reclamation provided by
//! the `ebr` crate, so a reader that is still walking over a node that
//! was just deleted will never observe freed memory.
//!
//! Every operation is O(n) in the current number of keys. This is a
//! linked list, not a tree or a skip list, so it is a good fit for small,
//! heavily contended sets rather than large indexes.
//!
//! Keys must implement the [`Minimum`] trait, which is provided for all of
//! the primitive integer types.

#[cfg(feature = "serde")]
mod serde_impl;

#[cfg(not(feature = "fault_injection"))]
#[inline]
const fn debug_delay() -> bool {
    false
}

/// Injects random validation failures and yields, shaking out
/// more retry interleavings in concurrent tests. Compiled out
/// entirely unless the `fault_injection` feature is enabled.
#[cfg(feature = "fault_injection")]
fn debug_delay() -> bool {
    use rand::{thread_rng, Rng};

    let mut rng = thread_rng();

    match rng.gen_range(0..100) {
        0..=97 => false,
        98 => {
            std::thread::yield_now();
            false
        }
        _ => true,
    }
}

macro_rules! trace_retry {
    ($op:expr, $reason:expr) => {
        #[cfg(feature = "tracing")]
        tracing::trace!(op = $op, reason = $reason, "validation failed, restarting scan");
    };
}

use std::fmt;
use std::ops::Deref;
use std::ptr::{self, NonNull};
use std::sync::{
    atomic::{AtomicIsize, AtomicPtr, Ordering},
    Arc,
};

#[cfg(feature = "timing")]
use std::sync::atomic::AtomicU64;
#[cfg(feature = "timing")]
use std::time::{Duration, Instant};

use ebr::{Ebr, Guard};
use parking_lot::Mutex;

/// Trait for types for which a minimum possible value exists.
///
/// This trait must be implemented for any `K` key type in the
/// [`ConcurrentSet`]. The value is only used as a placeholder for
/// the head sentinel of the list and is never compared against
/// real keys, so `K::MIN` itself may be stored in the set.
pub trait Minimum: Ord {
    /// The returned value must be less than or equal
    /// to all possible values for this type.
    const MIN: Self;
}

macro_rules! impl_integer {
    ($($t:ty),+) => {
        $(
            impl Minimum for $t {
                const MIN: Self = <$t>::MIN;
            }
        )*
    }
}

impl_integer!(usize, u8, u16, u32, u64, u128, isize, i8, i16, i32, i64, i128);

struct Node<K> {
    key: K,
    // the per-node lock, which owns the logical deletion mark. it must
    // also be held for any store to `next`.
    marked: Mutex<bool>,
    next: AtomicPtr<Node<K>>,
}

impl<K> Node<K> {
    fn new(key: K, next: *mut Node<K>) -> Box<Node<K>> {
        Box::new(Node {
            key,
            marked: Mutex::new(false),
            next: AtomicPtr::new(next),
        })
    }

    fn next<const LOCAL_GC_BUFFER_SIZE: usize>(
        &self,
        _guard: &Guard<'_, Box<Node<K>>, LOCAL_GC_BUFFER_SIZE>,
    ) -> Option<NodeView<K>>
    where
        K: 'static + Send,
    {
        let ptr = NonNull::new(self.next.load(Ordering::Acquire))?;

        Some(NodeView { ptr })
    }
}

/// A pointer to a node that is only dereferenced while
/// the ebr `Guard` it was loaded under is still pinned.
struct NodeView<K> {
    ptr: NonNull<Node<K>>,
}

impl<K> Clone for NodeView<K> {
    fn clone(&self) -> NodeView<K> {
        *self
    }
}

impl<K> Copy for NodeView<K> {}

impl<K> NodeView<K> {
    const fn as_ptr(self) -> *mut Node<K> {
        self.ptr.as_ptr()
    }
}

impl<K> Deref for NodeView<K> {
    type Target = Node<K>;

    fn deref(&self) -> &Node<K> {
        unsafe { self.ptr.as_ref() }
    }
}

/// The pair of adjacent nodes that bracket a search key,
/// as observed by an unsynchronized scan.
struct Window<K> {
    // key is strictly less than the search key, or the sentinel
    pred: NodeView<K>,
    // key is greater than or equal to the search key, or the end of the list
    succ: Option<NodeView<K>>,
}

impl<K> Window<K> {
    fn succ_ptr(&self) -> *mut Node<K> {
        self.succ.map_or(ptr::null_mut(), NodeView::as_ptr)
    }

    /// Must be called while holding the lock of `pred`, which
    /// is what `pred_marked` was read from.
    fn is_valid(&self, pred_marked: bool) -> bool {
        if debug_delay() {
            return false;
        }

        !pred_marked && self.pred.next.load(Ordering::Acquire) == self.succ_ptr()
    }

    /// Locks `pred`, validates the window, and publishes a new node for
    /// `key` between `pred` and `succ`. An `Err` means nothing was linked
    /// and the caller has to scan again.
    fn link(&self, key: K) -> Result<(), ()> {
        let pred_marked = self.pred.marked.lock();

        // a marked predecessor has already been unlinked, and
        // linking behind it would make the new key unreachable.
        if !self.is_valid(*pred_marked) {
            return Err(());
        }

        let node = Node::new(key, self.succ_ptr());
        self.pred.next.store(Box::into_raw(node), Ordering::Release);

        Ok(())
    }
}

/// A concurrent ordered set of integer keys.
///
/// Note that this structure is `Send` but NOT `Sync`.
/// The inner reclamation system, provided by the `ebr` crate,
/// keeps thread-local garbage state in each handle. If you want
/// to share a [`ConcurrentSet`] between threads, simply clone it,
/// and each clone will refer to the same underlying set.
///
/// The `LOCAL_GC_BUFFER_SIZE` const generic must be greater than 0.
/// It controls how many deleted nodes are batched together before
/// the epoch-based reclamation system tries to free them. Lower
/// values free memory sooner at the cost of more frequent
/// synchronization.
///
/// # Examples
///
/// ```
/// let set = lazy_set::ConcurrentSet::<i64>::default();
///
/// assert!(set.insert(5));
/// assert!(!set.insert(5));
/// assert!(set.contains(&5));
/// assert_eq!(set.len(), 1);
///
/// assert!(set.delete(&5));
/// assert!(!set.delete(&5));
/// assert!(set.is_empty());
/// ```
#[derive(Clone)]
pub struct ConcurrentSet<K = i64, const LOCAL_GC_BUFFER_SIZE: usize = 128>
where
    K: 'static + Copy + Minimum + Ord + Send + Sync,
{
    // epoch-based reclamation
    ebr: Ebr<Box<Node<K>>, LOCAL_GC_BUFFER_SIZE>,
    // the list itself, kept separate from the ebr
    // state which is local to each handle.
    inner: Arc<Inner<K>>,
    // a lagging count of the number of keys in the set,
    // updated after each mutation is published. signed
    // because a delete may be counted before the insert
    // that linked the same node.
    len: Arc<AtomicIsize>,
}

impl<K, const LOCAL_GC_BUFFER_SIZE: usize> fmt::Debug for ConcurrentSet<K, LOCAL_GC_BUFFER_SIZE>
where
    K: 'static + fmt::Debug + Copy + Minimum + Ord + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConcurrentSet ")?;
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, const LOCAL_GC_BUFFER_SIZE: usize> Default for ConcurrentSet<K, LOCAL_GC_BUFFER_SIZE>
where
    K: 'static + Copy + Minimum + Ord + Send + Sync,
{
    fn default() -> ConcurrentSet<K, LOCAL_GC_BUFFER_SIZE> {
        assert!(
            LOCAL_GC_BUFFER_SIZE > 0,
            "LOCAL_GC_BUFFER_SIZE must be greater than 0"
        );

        let inner = Arc::new(Inner {
            sentinel: Node {
                key: K::MIN,
                marked: Mutex::new(false),
                next: AtomicPtr::new(ptr::null_mut()),
            },
            #[cfg(feature = "timing")]
            slowest_op: u64::MIN.into(),
            #[cfg(feature = "timing")]
            fastest_op: u64::MAX.into(),
        });

        ConcurrentSet {
            ebr: Ebr::default(),
            inner,
            len: Arc::new(0.into()),
        }
    }
}

struct Inner<K> {
    // never marked, never unlinked, and its key is never compared.
    sentinel: Node<K>,
    #[cfg(feature = "timing")]
    slowest_op: AtomicU64,
    #[cfg(feature = "timing")]
    fastest_op: AtomicU64,
}

#[cfg(feature = "timing")]
impl<K> Inner<K> {
    fn print_timing(&self) {
        println!(
            "min : {:?}",
            Duration::from_nanos(self.fastest_op.load(Ordering::Acquire))
        );
        println!(
            "max : {:?}",
            Duration::from_nanos(self.slowest_op.load(Ordering::Acquire))
        );
    }

    fn record_timing(&self, time: Duration) {
        let nanos = u64::try_from(time.as_nanos()).unwrap_or(u64::MAX);
        self.fastest_op.fetch_min(nanos, Ordering::Relaxed);
        self.slowest_op.fetch_max(nanos, Ordering::Relaxed);
    }
}

impl<K> Drop for Inner<K> {
    fn drop(&mut self) {
        #[cfg(feature = "timing")]
        self.print_timing();

        // deleted nodes were already handed to ebr, so everything
        // still reachable from the sentinel is owned by us alone.
        let mut cursor = *self.sentinel.next.get_mut();
        while !cursor.is_null() {
            let node: Box<Node<K>> = unsafe { Box::from_raw(cursor) };
            let Node { marked, next, .. } = *node;
            assert!(!marked.into_inner(), "reachable node was left marked");
            cursor = next.into_inner();
        }
    }
}

impl<K> Inner<K>
where
    K: 'static + Copy + Minimum + Ord + Send + Sync,
{
    fn sentinel(&self) -> NodeView<K> {
        NodeView {
            ptr: NonNull::from(&self.sentinel),
        }
    }

    /// Walks from the sentinel without taking any locks, stopping at the
    /// first node whose key is not less than `key`. Never looks at marks,
    /// so callers that mutate must lock and validate the returned window.
    fn locate<const LOCAL_GC_BUFFER_SIZE: usize>(
        &self,
        key: &K,
        guard: &Guard<'_, Box<Node<K>>, LOCAL_GC_BUFFER_SIZE>,
    ) -> Window<K> {
        let mut pred = self.sentinel();
        loop {
            match pred.next(guard) {
                Some(succ) if succ.key < *key => pred = succ,
                succ => return Window { pred, succ },
            }
        }
    }
}

impl<K, const LOCAL_GC_BUFFER_SIZE: usize> ConcurrentSet<K, LOCAL_GC_BUFFER_SIZE>
where
    K: 'static + Copy + Minimum + Ord + Send + Sync,
{
    /// Create an empty set. Equivalent to [`ConcurrentSet::default`].
    pub fn new() -> ConcurrentSet<K, LOCAL_GC_BUFFER_SIZE> {
        ConcurrentSet::default()
    }

    /// Insert a key, returning `true` if it was not already present.
    ///
    /// # Examples
    ///
    /// ```
    /// let set = lazy_set::ConcurrentSet::<i64>::default();
    ///
    /// assert_eq!(set.insert(1), true);
    /// assert_eq!(set.insert(1), false);
    /// ```
    pub fn insert(&self, key: K) -> bool {
        #[cfg(feature = "timing")]
        let before = Instant::now();

        loop {
            let guard = self.ebr.pin();
            let window = self.inner.locate(&key, &guard);

            if let Some(succ) = window.succ {
                if succ.key == key {
                    return false;
                }
            }

            if window.link(key).is_err() {
                trace_retry!("insert", "predecessor changed or was deleted");
                continue;
            }

            self.len.fetch_add(1, Ordering::Relaxed);

            #[cfg(feature = "timing")]
            self.inner.record_timing(before.elapsed());

            return true;
        }
    }

    /// Delete a key, returning `true` if it was present.
    ///
    /// # Examples
    ///
    /// ```
    /// let set = lazy_set::ConcurrentSet::<i64>::default();
    ///
    /// assert_eq!(set.delete(&1), false);
    /// set.insert(1);
    /// assert_eq!(set.delete(&1), true);
    /// assert_eq!(set.contains(&1), false);
    /// ```
    pub fn delete(&self, key: &K) -> bool {
        #[cfg(feature = "timing")]
        let before = Instant::now();

        loop {
            let mut guard = self.ebr.pin();
            let window = self.inner.locate(key, &guard);

            let target = match window.succ {
                Some(succ) if succ.key == *key => succ,
                _ => return false,
            };

            // locks are taken right-to-left: target, then predecessor.
            let mut target_marked = target.marked.lock();
            if *target_marked {
                // another deleter won
                drop(target_marked);
                trace_retry!("delete", "target already deleted");
                continue;
            }

            let pred_marked = window.pred.marked.lock();
            if !window.is_valid(*pred_marked) {
                drop(pred_marked);
                drop(target_marked);
                trace_retry!("delete", "predecessor changed or was deleted");
                continue;
            }

            *target_marked = true;
            let successor = target.next.load(Ordering::Acquire);
            window.pred.next.store(successor, Ordering::Release);

            drop(pred_marked);
            drop(target_marked);

            // the target is no longer reachable from the sentinel, and
            // readers that already hold it are protected by their guards.
            let unlinked: Box<Node<K>> = unsafe { Box::from_raw(target.as_ptr()) };
            guard.defer_drop(unlinked);

            self.len.fetch_sub(1, Ordering::Relaxed);

            #[cfg(feature = "timing")]
            self.inner.record_timing(before.elapsed());

            return true;
        }
    }

    /// Returns `true` if the key is currently reachable in the set.
    /// Never blocks.
    ///
    /// # Examples
    ///
    /// ```
    /// let set = lazy_set::ConcurrentSet::<i64>::default();
    ///
    /// assert!(!set.contains(&99));
    /// set.insert(99);
    /// assert!(set.contains(&99));
    /// ```
    pub fn contains(&self, key: &K) -> bool {
        let guard = self.ebr.pin();
        let window = self.inner.locate(key, &guard);

        matches!(window.succ, Some(succ) if succ.key == *key)
    }

    /// Visit keys in ascending order until `visit` returns `false`
    /// or the end of the set is reached.
    ///
    /// This has the same weak consistency as [`ConcurrentSet::iter`].
    ///
    /// # Examples
    ///
    /// ```
    /// let set = lazy_set::ConcurrentSet::<i64>::default();
    ///
    /// set.insert(3);
    /// set.insert(1);
    /// set.insert(2);
    ///
    /// let mut visited = vec![];
    /// set.range(|key| {
    ///     visited.push(key);
    ///     key < 2
    /// });
    ///
    /// assert_eq!(visited, vec![1, 2]);
    /// ```
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(K) -> bool,
    {
        for key in self.iter() {
            if !visit(key) {
                break;
            }
        }
    }

    /// A **lagging**, eventually-consistent count of keys. This is NOT
    /// updated atomically with [`insert`](ConcurrentSet::insert) /
    /// [`delete`](ConcurrentSet::delete), but after those operations
    /// publish their changes to the shared list. It is exact whenever
    /// no mutation is in flight.
    pub fn len(&self) -> usize {
        usize::try_from(self.len.load(Ordering::Relaxed)).unwrap_or(0)
    }

    /// A **lagging**, eventually-consistent check for emptiness, based
    /// on the correspondingly non-atomic `len` method.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the smallest key currently in the set.
    ///
    /// # Examples
    /// ```
    /// let set = lazy_set::ConcurrentSet::<i64>::default();
    ///
    /// assert_eq!(set.first(), None);
    /// set.insert(2);
    /// set.insert(1);
    /// assert_eq!(set.first(), Some(1));
    /// ```
    pub fn first(&self) -> Option<K> {
        self.iter().next()
    }

    /// Iterate over the set in ascending order.
    ///
    /// This is not an atomic snapshot. Keys inserted or deleted
    /// concurrently may or may not be observed, depending on where
    /// the iterator is when the change is published. The keys that
    /// are returned are always strictly ascending, and any key that
    /// existed before the iterator was created and was not deleted
    /// during iteration will be returned.
    pub fn iter(&self) -> Iter<'_, K, LOCAL_GC_BUFFER_SIZE> {
        let guard = self.ebr.pin();
        let next = self.inner.sentinel.next(&guard);

        Iter { guard, next }
    }
}

/// An ascending iterator over a [`ConcurrentSet`]. Note that this
/// is not an atomic snapshot of the set.
///
/// This iterator holds an epoch-based reclamation guard, so
/// no deleted node can be freed until it is dropped.
pub struct Iter<'a, K, const LOCAL_GC_BUFFER_SIZE: usize>
where
    K: 'static + Copy + Minimum + Ord + Send + Sync,
{
    guard: Guard<'a, Box<Node<K>>, LOCAL_GC_BUFFER_SIZE>,
    next: Option<NodeView<K>>,
}

impl<'a, K, const LOCAL_GC_BUFFER_SIZE: usize> Iterator for Iter<'a, K, LOCAL_GC_BUFFER_SIZE>
where
    K: 'static + Copy + Minimum + Ord + Send + Sync,
{
    type Item = K;

    fn next(&mut self) -> Option<K> {
        let current = self.next?;
        self.next = current.next(&self.guard);
        Some(current.key)
    }
}

impl<K, const LOCAL_GC_BUFFER_SIZE: usize> PartialEq for ConcurrentSet<K, LOCAL_GC_BUFFER_SIZE>
where
    K: 'static + Copy + Minimum + Ord + Send + Sync,
{
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<K, const LOCAL_GC_BUFFER_SIZE: usize> Eq for ConcurrentSet<K, LOCAL_GC_BUFFER_SIZE> where
    K: 'static + Copy + Minimum + Ord + Send + Sync
{
}

impl<K, const LOCAL_GC_BUFFER_SIZE: usize> FromIterator<K> for ConcurrentSet<K, LOCAL_GC_BUFFER_SIZE>
where
    K: 'static + Copy + Minimum + Ord + Send + Sync,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let set = ConcurrentSet::default();

        for key in iter {
            set.insert(key);
        }

        set
    }
}

impl<K, const LOCAL_GC_BUFFER_SIZE: usize> Extend<K> for ConcurrentSet<K, LOCAL_GC_BUFFER_SIZE>
where
    K: 'static + Copy + Minimum + Ord + Send + Sync,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<'a, K, const LOCAL_GC_BUFFER_SIZE: usize> IntoIterator
    for &'a ConcurrentSet<K, LOCAL_GC_BUFFER_SIZE>
where
    K: 'static + Copy + Minimum + Ord + Send + Sync,
{
    type Item = K;
    type IntoIter = Iter<'a, K, LOCAL_GC_BUFFER_SIZE>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

const fn _test_impls() {
    const fn send<T: Send>() {}
    const fn clone<T: Clone>() {}
    send::<ConcurrentSet<i64>>();
    send::<ConcurrentSet<u8, 1>>();
    clone::<ConcurrentSet<i64>>();
}

#[test]
fn basic_set() {
    let set = ConcurrentSet::<usize>::default();

    let n = 64;
    for i in (0..=n).rev() {
        assert!(!set.contains(&i));
        assert!(set.insert(i));
        assert!(set.contains(&i), "failed to get key {i}");
    }

    assert_eq!(set.len(), n + 1);

    for (i, k) in set.iter().enumerate() {
        assert_eq!(i, k);
    }

    for i in 0..=n {
        assert!(!set.insert(i), "duplicate insert of key {i} succeeded");
    }

    assert_eq!(set.len(), n + 1);

    for i in (0..=n).filter(|i| i % 2 == 0) {
        assert!(set.delete(&i));
        assert!(!set.delete(&i));
    }

    let odd: Vec<usize> = set.iter().collect();
    let expected: Vec<usize> = (0..=n).filter(|i| i % 2 == 1).collect();
    assert_eq!(odd, expected);
    assert_eq!(set.len(), expected.len());
}

#[test]
fn extreme_keys() {
    let set = ConcurrentSet::<i8>::default();

    // the sentinel key is never compared, so MIN is a normal key
    assert!(!set.contains(&i8::MIN));
    assert!(set.insert(i8::MAX));
    assert!(set.insert(i8::MIN));
    assert!(set.insert(0));
    assert!(!set.insert(i8::MIN));

    assert_eq!(set.iter().collect::<Vec<_>>(), vec![i8::MIN, 0, i8::MAX]);
    assert_eq!(set.first(), Some(i8::MIN));

    assert!(set.delete(&i8::MIN));
    assert!(!set.contains(&i8::MIN));
    assert_eq!(set.first(), Some(0));
    assert_eq!(set.len(), 2);
}

#[test]
fn insert_rejects_detached_predecessor() {
    let set = ConcurrentSet::<i64>::default();
    let other = set.clone();

    set.insert(1);
    set.insert(3);

    let guard = set.ebr.pin();
    let window = set.inner.locate(&2, &guard);
    assert_eq!(window.pred.key, 1);
    assert_eq!(window.succ.map(|succ| succ.key), Some(3));

    assert!(other.delete(&1));

    // the detached predecessor still points at 3, so only
    // the mark tells us that it has been unlinked.
    assert_eq!(window.pred.next.load(Ordering::Acquire), window.succ_ptr());

    assert!(*window.pred.marked.lock());
    assert_eq!(window.link(2), Err(()));

    // nothing was hung off the detached node, and 2 is not reachable
    assert_eq!(window.pred.next.load(Ordering::Acquire), window.succ_ptr());
    drop(guard);

    assert!(!set.contains(&2));
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![3]);
    assert_eq!(set.len(), 1);

    assert!(set.insert(2));
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![2, 3]);
    assert_eq!(set.len(), 2);
}

#[test]
fn link_publishes_into_valid_window() {
    let set = ConcurrentSet::<i64>::default();

    set.insert(1);
    set.insert(3);

    let guard = set.ebr.pin();
    let window = set.inner.locate(&2, &guard);

    // retried the way insert does, since fault injection may refuse a valid window
    while window.link(2).is_err() {}

    let linked = window.pred.next(&guard).map(|node| node.key);
    assert_eq!(linked, Some(2));
    drop(guard);

    assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn iterator_survives_concurrent_delete() {
    let set = ConcurrentSet::<u32>::default();
    let other = set.clone();

    for i in 0..8 {
        set.insert(i);
    }

    let mut iter = set.iter();
    assert_eq!(iter.next(), Some(0));
    assert_eq!(iter.next(), Some(1));

    // the iterator's next node is deleted underneath it, but the
    // guard keeps it alive and its successor pointer is intact.
    assert!(other.delete(&2));
    assert!(other.delete(&3));

    let rest: Vec<u32> = iter.collect();
    assert!(rest.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(rest.last(), Some(&7));
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 1, 4, 5, 6, 7]);
}

#[test]
fn debug_and_eq() {
    let set: ConcurrentSet<i32> = [3, 1, 2].into_iter().collect();
    assert_eq!(format!("{set:?}"), "ConcurrentSet {1, 2, 3}");

    let mut other = ConcurrentSet::<i32>::new();
    other.extend([2, 3]);
    assert_ne!(set, other);
    other.insert(1);
    assert_eq!(set, other);
}

#[test]
fn timing_set() {
    use std::time::Instant;

    let set = ConcurrentSet::<u64>::default();

    let n = 4 * 1024;

    let insert = Instant::now();
    for i in (0..n).rev() {
        set.insert(i);
    }
    let insert_elapsed = insert.elapsed();
    println!(
        "{} inserts/s, total {:?}",
        (n * 1_000_000) / u64::try_from(insert_elapsed.as_micros().max(1)).unwrap_or(u64::MAX),
        insert_elapsed
    );

    let scan = Instant::now();
    let count = set.iter().count();
    assert_eq!(count as u64, n);
    let scan_elapsed = scan.elapsed();
    println!(
        "{} scanned items/s, total {:?}",
        (n * 1_000_000) / u64::try_from(scan_elapsed.as_micros().max(1)).unwrap_or(u64::MAX),
        scan_elapsed
    );

    let gets = Instant::now();
    for i in 0..n {
        assert!(set.contains(&i));
    }
    let gets_elapsed = gets.elapsed();
    println!(
        "{} contains/s, total {:?}",
        (n * 1_000_000) / u64::try_from(gets_elapsed.as_micros().max(1)).unwrap_or(u64::MAX),
        gets_elapsed
    );

    let deletes = Instant::now();
    for i in 0..n {
        assert!(set.delete(&i));
    }
    let deletes_elapsed = deletes.elapsed();
    println!(
        "{} deletes/s, total {:?}",
        (n * 1_000_000) / u64::try_from(deletes_elapsed.as_micros().max(1)).unwrap_or(u64::MAX),
        deletes_elapsed
    );

    assert!(set.is_empty());
}
