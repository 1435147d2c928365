//! Compute-once, await-many values
//!
//! A [`Memo`] holds a single lazily-driven future whose output is shared by
//! every observer. A [`MemoMap`] is the keyed form. Both allow an observer to
//! start waiting *before* the producer registers its future: the lookup
//! leaves behind a deferred slot that the later registration fills.
//!
//! Observers get `Option<V>`: `None` means the slot was dropped without ever
//! being filled (the owning build session ended), so waiters never hang on a
//! producer that no longer exists.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::borrow::Borrow;
use std::future::Future;
use std::hash::Hash;
use tokio::sync::oneshot;

/// Future handed to observers of a memoized value
pub type SharedValue<V> = Shared<BoxFuture<'static, Option<V>>>;

/// Snapshot of a memo slot, taken without awaiting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoState<V> {
    /// Nothing registered and nobody waiting
    Vacant,
    /// Registered or awaited, but the value is not available yet
    Pending,
    /// The value has been computed
    Ready(V),
}

/// Returned when a slot is registered twice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyRegistered;

enum Slot<V: Clone> {
    Registered(SharedValue<V>),
    Awaiting {
        fill: oneshot::Sender<BoxFuture<'static, V>>,
        shared: SharedValue<V>,
    },
}

impl<V> Slot<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn registered<F>(future: F) -> Self
    where
        F: Future<Output = V> + Send + 'static,
    {
        Self::Registered(future.map(Some).boxed().shared())
    }

    fn awaiting() -> Self {
        let (fill, filled) = oneshot::channel::<BoxFuture<'static, V>>();
        let shared = async move {
            match filled.await {
                Ok(future) => Some(future.await),
                Err(_) => None,
            }
        }
        .boxed()
        .shared();

        Self::Awaiting { fill, shared }
    }

    fn shared(&self) -> SharedValue<V> {
        match self {
            Self::Registered(shared) | Self::Awaiting { shared, .. } => shared.clone(),
        }
    }

    /// Fill this slot. Returns the slot to store back, or an error if it was
    /// already registered.
    fn fill<F>(self, future: F) -> Result<Self, (Self, AlreadyRegistered)>
    where
        F: Future<Output = V> + Send + 'static,
    {
        match self {
            Self::Awaiting { fill, shared } => {
                // The receiver lives inside `shared`, which we still hold.
                let _ = fill.send(future.boxed());
                Ok(Self::Registered(shared))
            }
            registered @ Self::Registered(_) => Err((registered, AlreadyRegistered)),
        }
    }

    fn state(&self) -> MemoState<V> {
        match self {
            Self::Registered(shared) => match shared.peek() {
                Some(Some(value)) => MemoState::Ready(value.clone()),
                _ => MemoState::Pending,
            },
            Self::Awaiting { .. } => MemoState::Pending,
        }
    }

    fn is_registered(&self) -> bool {
        matches!(self, Self::Registered(_))
    }
}

/// A single compute-once value
pub struct Memo<V: Clone> {
    slot: Mutex<Option<Slot<V>>>,
}

impl<V> Memo<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// A memo whose producer is already registered
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = V> + Send + 'static,
    {
        Self {
            slot: Mutex::new(Some(Slot::registered(future))),
        }
    }

    /// Register the producing future. It is not polled until first awaited.
    pub fn set<F>(&self, future: F) -> Result<(), AlreadyRegistered>
    where
        F: Future<Output = V> + Send + 'static,
    {
        let mut slot = self.slot.lock();
        match slot.take() {
            None => {
                *slot = Some(Slot::registered(future));
                Ok(())
            }
            Some(existing) => match existing.fill(future) {
                Ok(filled) => {
                    *slot = Some(filled);
                    Ok(())
                }
                Err((existing, err)) => {
                    *slot = Some(existing);
                    Err(err)
                }
            },
        }
    }

    /// Observe the value, waiting for registration if necessary
    pub fn get(&self) -> SharedValue<V> {
        self.slot.lock().get_or_insert_with(Slot::awaiting).shared()
    }

    /// Observe the value only if a producer has been registered
    pub fn try_get(&self) -> Option<SharedValue<V>> {
        self.slot
            .lock()
            .as_ref()
            .filter(|slot| slot.is_registered())
            .map(Slot::shared)
    }

    pub fn state(&self) -> MemoState<V> {
        self.slot
            .lock()
            .as_ref()
            .map_or(MemoState::Vacant, Slot::state)
    }
}

impl<V> Default for Memo<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> std::fmt::Debug for Memo<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo").finish_non_exhaustive()
    }
}

/// Compute-once values keyed by `K`
pub struct MemoMap<K, V: Clone> {
    slots: Mutex<FxHashMap<K, Slot<V>>>,
}

impl<K, V> MemoMap<K, V>
where
    K: Eq + Hash,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(FxHashMap::default()),
        }
    }

    /// Register the producing future for `key`
    pub fn set<F>(&self, key: K, future: F) -> Result<(), AlreadyRegistered>
    where
        F: Future<Output = V> + Send + 'static,
    {
        let mut slots = self.slots.lock();
        match slots.remove(&key) {
            None => {
                slots.insert(key, Slot::registered(future));
                Ok(())
            }
            Some(existing) => match existing.fill(future) {
                Ok(filled) => {
                    slots.insert(key, filled);
                    Ok(())
                }
                Err((existing, err)) => {
                    slots.insert(key, existing);
                    Err(err)
                }
            },
        }
    }

    /// Observe the value for `key`, waiting for registration if necessary
    pub fn get<Q>(&self, key: &Q) -> SharedValue<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get(key) {
            return slot.shared();
        }

        let slot = Slot::awaiting();
        let shared = slot.shared();
        slots.insert(key.to_owned(), slot);
        shared
    }

    pub fn state<Q>(&self, key: &Q) -> MemoState<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.slots
            .lock()
            .get(key)
            .map_or(MemoState::Vacant, Slot::state)
    }

    pub fn is_registered<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.slots.lock().get(key).is_some_and(Slot::is_registered)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for MemoMap<K, V>
where
    K: Eq + Hash,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V: Clone> std::fmt::Debug for MemoMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoMap").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_set_then_get() {
        let memo = Memo::new();
        memo.set(async { 42 }).unwrap();
        assert_eq!(memo.get().await, Some(42));
        assert_eq!(memo.state(), MemoState::Ready(42));
    }

    #[tokio::test]
    async fn test_get_before_set_waits_for_registration() {
        let memo: Memo<&'static str> = Memo::new();
        let waiting = memo.get();
        assert_eq!(memo.state(), MemoState::Pending);
        assert!(memo.try_get().is_none());

        memo.set(async { "settled" }).unwrap();
        assert_eq!(waiting.await, Some("settled"));
    }

    #[tokio::test]
    async fn test_second_registration_rejected() {
        let memo = Memo::new();
        memo.set(async { 1 }).unwrap();
        assert_eq!(memo.set(async { 2 }), Err(AlreadyRegistered));
        assert_eq!(memo.get().await, Some(1));
    }

    #[tokio::test]
    async fn test_producer_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let memo = Memo::new();
        let counter = Arc::clone(&calls);
        memo.set(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            "value"
        })
        .unwrap();

        for _ in 0..5 {
            assert_eq!(memo.get().await, Some("value"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropping_unfilled_slot_releases_waiters() {
        let map: MemoMap<String, bool> = MemoMap::new();
        let waiting = map.get("never-registered");
        drop(map);
        assert_eq!(waiting.await, None);
    }

    #[tokio::test]
    async fn test_map_keys_are_independent() {
        let map: MemoMap<String, u32> = MemoMap::new();
        map.set("a".to_string(), async { 1 }).unwrap();
        map.set("b".to_string(), async { 2 }).unwrap();

        assert_eq!(map.get("b").await, Some(2));
        assert_eq!(map.get("a").await, Some(1));
        assert_eq!(map.state("c"), MemoState::Vacant);
        assert!(map.is_registered("a"));
        assert_eq!(map.len(), 2);
    }

    #[tokio::test]
    async fn test_map_fill_after_get() {
        let map: MemoMap<String, u32> = MemoMap::new();
        let waiting = map.get("late");
        assert!(!map.is_registered("late"));

        map.set("late".to_string(), async { 7 }).unwrap();
        assert!(map.is_registered("late"));
        assert_eq!(waiting.await, Some(7));
        assert_eq!(
            map.set("late".to_string(), async { 8 }),
            Err(AlreadyRegistered)
        );
    }
}
