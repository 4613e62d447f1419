//! Application state management for Cook Helper
//!
//! This crate provides the reactive building blocks the screens are made of:
//! observable mutable state, memoized derived state, request-id tracked
//! asynchronous checks and one-shot event channels.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod async_check;
pub mod derived;
pub mod events;
pub mod state;

pub use async_check::{AsyncCheck, AsyncCheckState, LatestRequest, RequestId};
pub use derived::DerivedState;
pub use events::{event_channel, EventSender, EventStream, StateError};
pub use state::MutableState;
