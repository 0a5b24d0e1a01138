//! Run-scoped mutable state
//!
//! # Components
//!
//! - `Throttle`: adaptive inter-request delay shared by all request tasks
//! - `RetryPolicy`: bounded exponential backoff for transient failures
//! - `MissingIds`: identifiers dispatched but not returned by the provider

mod missing;
mod throttle;

pub use missing::MissingIds;
pub use throttle::{RetryPolicy, Throttle};
