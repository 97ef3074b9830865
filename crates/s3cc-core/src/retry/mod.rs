//! Backoff for capacity-bound work.
//!
//! Scratch reservations that do not fit are retried after a fixed interval.
//! The policy (interval, optional attempt cap) and the sleeper are both
//! injectable so the waiting can be tested without real sleeps.

mod policy;
mod run;
mod sleep;

pub use policy::{BackoffPolicy, RetryDecision};
pub use run::{run_with_backoff, RetryExhausted};
pub use sleep::{Sleeper, ThreadSleeper};
