//! Observable mutable state
//!
//! `MutableState` holds a single value that screens edit and observers watch.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// A mutable value with change notification
///
/// Every write bumps a version counter and publishes the new value to
/// subscribers.
///
/// # Example
///
/// ```
/// use app_state::MutableState;
///
/// let counter = MutableState::new(1);
/// counter.update(|n| n + 1);
/// assert_eq!(counter.get(), 2);
/// assert_eq!(counter.version(), 1);
/// ```
#[derive(Debug)]
pub struct MutableState<T> {
    tx: watch::Sender<T>,
    version: AtomicU64,
}

impl<T: Clone> MutableState<T> {
    /// Create a new state holding `value`
    pub fn new(value: T) -> Self {
        let (tx, _) = watch::channel(value);
        Self { tx, version: AtomicU64::new(0) }
    }

    /// Get a copy of the current value
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Read the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Replace the current value
    pub fn set_value(&self, value: T) {
        self.tx.send_replace(value);
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Replace the current value with `transform(current)`
    pub fn update(&self, transform: impl FnOnce(&T) -> T) -> &Self {
        let next = self.with(transform);
        self.set_value(next);
        self
    }

    /// Number of writes since creation
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Subscribe to value changes
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + PartialEq> MutableState<T> {
    /// Replace the value only if it differs from the current one
    ///
    /// Returns `true` if the value changed.
    pub fn set_if_changed(&self, value: T) -> bool {
        if self.with(|current| *current == value) {
            return false;
        }
        self.set_value(value);
        true
    }
}

impl<T: Clone + Default> Default for MutableState<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
