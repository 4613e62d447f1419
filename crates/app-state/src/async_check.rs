//! Asynchronous check state
//!
//! Tracks a background query whose answer decorates a form field, such as
//! "is this nickname still free". Each query gets a monotonically increasing
//! request id; a response is applied only if it carries the latest id, so a
//! slow answer to a superseded query can never overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier of a single check request
pub type RequestId = u64;

/// State of an asynchronous check
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AsyncCheckState {
    /// No check has been issued (or the last one was reset)
    #[default]
    Idle,

    /// A check is in flight
    Loading,

    /// The latest check finished
    Result {
        /// Whether the checked value is available
        available: bool,
        /// Error reported by the check, if any
        error: Option<String>,
    },
}

impl AsyncCheckState {
    /// Check if a request is in flight
    pub fn is_loading(&self) -> bool {
        matches!(self, AsyncCheckState::Loading)
    }

    /// Error of the finished check, if any
    pub fn error(&self) -> Option<&str> {
        match self {
            AsyncCheckState::Result { error: Some(error), .. } => Some(error),
            _ => None,
        }
    }

    /// Check if the finished check reported an error
    pub fn has_error(&self) -> bool {
        self.error().is_some()
    }

    /// Availability reported by the finished check
    pub fn available(&self) -> Option<bool> {
        match self {
            AsyncCheckState::Result { available, .. } => Some(*available),
            _ => None,
        }
    }
}

/// Shared view of the latest request id of a check
///
/// Handed to background tasks so they can tell whether they were superseded
/// before doing any work.
#[derive(Debug, Clone)]
pub struct LatestRequest(Arc<AtomicU64>);

impl LatestRequest {
    /// Check if `id` is still the latest issued request
    pub fn is_current(&self, id: RequestId) -> bool {
        self.0.load(Ordering::SeqCst) == id
    }
}

/// An asynchronous check with last-request-wins semantics
#[derive(Debug, Default)]
pub struct AsyncCheck {
    state: AsyncCheckState,
    latest: Arc<AtomicU64>,
}

impl AsyncCheck {
    /// Create an idle check
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> &AsyncCheckState {
        &self.state
    }

    /// Latest issued request id (0 before the first request)
    pub fn latest_id(&self) -> RequestId {
        self.latest.load(Ordering::SeqCst)
    }

    /// Handle for background tasks to observe supersession
    pub fn latest_handle(&self) -> LatestRequest {
        LatestRequest(Arc::clone(&self.latest))
    }

    /// Start a new request, superseding any in-flight one
    pub fn begin(&mut self) -> RequestId {
        let id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.state = AsyncCheckState::Loading;
        id
    }

    /// Apply the response of request `id`
    ///
    /// Returns `false` and leaves the state untouched if `id` is stale.
    pub fn complete(&mut self, id: RequestId, available: bool, error: Option<String>) -> bool {
        if id != self.latest_id() {
            tracing::trace!(id, latest = self.latest_id(), "Discarding stale check response");
            return false;
        }
        self.state = AsyncCheckState::Result { available, error };
        true
    }

    /// Return to idle and invalidate any in-flight request
    pub fn reset(&mut self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
        self.state = AsyncCheckState::Idle;
    }
}
