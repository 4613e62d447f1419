//! Derived state
//!
//! A `DerivedState` is a value computed from a dependency key and cached until
//! the key changes. Keys are compared by value, so re-reading with an equal key
//! never recomputes. A derivation keyed on `()` is a lazy constant: it is
//! computed on first read and never again.
//!
//! Errors are not handled here. A derivation returning `Result` hands the
//! `Result` to every reader unchanged.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

type Compute<K, T> = Box<dyn Fn(&K) -> T + Send + Sync>;

/// Memoized value derived from a dependency key
///
/// # Example
///
/// ```
/// use app_state::DerivedState;
///
/// let total = DerivedState::keyed(|(a, b): &(u32, u32)| a + b);
/// assert_eq!(total.get(&(1, 2)), 3);
/// assert_eq!(total.get(&(1, 2)), 3);
/// assert_eq!(total.recompute_count(), 1);
///
/// assert_eq!(total.get(&(2, 2)), 4);
/// assert_eq!(total.recompute_count(), 2);
/// ```
pub struct DerivedState<K, T> {
    compute: Compute<K, T>,
    cache: Mutex<Option<(K, T)>>,
    recomputes: AtomicU64,
    tx: watch::Sender<Option<T>>,
}

impl<K, T> DerivedState<K, T>
where
    K: Clone + PartialEq,
    T: Clone + PartialEq,
{
    /// Create a derivation recomputed whenever its key changes
    pub fn keyed(compute: impl Fn(&K) -> T + Send + Sync + 'static) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            compute: Box::new(compute),
            cache: Mutex::new(None),
            recomputes: AtomicU64::new(0),
            tx,
        }
    }

    /// Read the value for `key`, recomputing only if the key changed
    pub fn get(&self, key: &K) -> T {
        if let Some((cached_key, value)) = self.cache.lock().as_ref() {
            if cached_key == key {
                return value.clone();
            }
        }

        // Computed outside the lock so a derivation may read other derivations.
        let value = (self.compute)(key);
        self.recomputes.fetch_add(1, Ordering::Relaxed);
        *self.cache.lock() = Some((key.clone(), value.clone()));

        self.tx.send_if_modified(|current| {
            if current.as_ref() == Some(&value) {
                false
            } else {
                *current = Some(value.clone());
                true
            }
        });

        value
    }

    /// Last computed value, if any, without recomputing
    pub fn cached(&self) -> Option<T> {
        self.cache.lock().as_ref().map(|(_, value)| value.clone())
    }

    /// Drop the cached value so the next read recomputes
    pub fn invalidate(&self) {
        *self.cache.lock() = None;
    }

    /// Number of times the compute function has run
    pub fn recompute_count(&self) -> u64 {
        self.recomputes.load(Ordering::Relaxed)
    }

    /// Subscribe to changes of the computed value
    ///
    /// Observers are notified only when a recomputation yields a value
    /// different from the previous one.
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.tx.subscribe()
    }
}

impl<T> DerivedState<(), T>
where
    T: Clone + PartialEq,
{
    /// Create a derivation without dependencies, computed once on first read
    pub fn lazy(compute: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self::keyed(move |_: &()| compute())
    }

    /// Read the lazily computed value
    pub fn value(&self) -> T {
        self.get(&())
    }
}

impl<K, T: fmt::Debug> fmt::Debug for DerivedState<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedState")
            .field("cached", &self.cache.lock().as_ref().map(|(_, value)| value))
            .field("recomputes", &self.recomputes.load(Ordering::Relaxed))
            .finish()
    }
}
