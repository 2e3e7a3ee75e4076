//! Single-threaded stackful coroutines with timed wake-ups.
//!
//! A driver creates coroutines, resumes them, and periodically calls
//! [`tick`] with the current time. Coroutines suspend with [`yield_now`],
//! optionally asking to be woken at an absolute microsecond timestamp.

extern crate libc;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate tracing;

pub mod co;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod sleep_queue;
pub mod stack;
pub mod stats;
pub mod time;
mod platform;
mod registry;

pub use co::{CoState, CoroId, Handle};
pub use config::Config;
pub use error::{CoroError, Result, Wakeup};
pub use scheduler::{
    config, configure, create, create_with_stack_size, current_handle, current_id, go, resume,
    sleep_until, state_of, suspend, tick, yield_now
};
pub use stack::Stack;
pub use stats::{current_stack_used, statistics, Statistics};
pub use time::{now_micros, tick_now, wake_after, wake_after_from};
