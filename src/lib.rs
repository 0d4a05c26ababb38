//! Closable multi-producer multi-consumer channels with a multi-way
//! `select`, in the communicating-sequential-processes style.
//!
//! A [`Channel`] is a typed, bounded FIFO conduit shared by any number of
//! producers and consumers. Consumers suspend while it is empty, producers
//! suspend while it is full, and any party may [`close`](Channel::close) it
//! to signal end-of-stream: later sends fail, later receives drain the
//! remaining buffered values and then report `None`.
//!
//! [`Select`] (and the [`select!`] macro) races several send/receive cases
//! and commits to exactly one: the winning case's action runs on the
//! calling thread, every losing receive consumes nothing, and every losing
//! send delivers nothing.
//!
//! # Key Features
//!
//! - **Multi-producer multi-consumer**: handles are cheap clones sharing
//!   one conduit; delivery is exactly-once, FIFO per channel.
//! - **Closable**: monotonic end-of-stream with drain semantics, no panics
//!   on send-after-close.
//! - **Select**: atomic multi-way rendezvous over heterogeneous channels,
//!   with an optional non-blocking `default` case.
//! - **Rendezvous channels**: capacity 0 hands values directly from a
//!   blocked sender to a blocked receiver.
//! - **Timing helpers**: [`after`], [`tick`] and [`never`] cover the
//!   timeout-by-timer-channel pattern.
//!
//! # Example
//!
//! ```
//! use savak::{select, unbounded};
//! use std::thread;
//!
//! let numbers = unbounded::<i32>();
//! let words = unbounded::<&str>();
//!
//! let producer = numbers.clone();
//! thread::spawn(move || {
//!     producer.send(10).unwrap();
//! });
//!
//! select! {
//!     n = recv(numbers) => println!("got a number: {:?}", n),
//!     w = recv(words) => println!("got a word: {:?}", w),
//! }
//! ```

#![warn(missing_docs)]

/// The channel core: buffering, closing, wait-list management.
pub mod channel;
/// Error types for channel operations.
pub mod error;
/// The select coordinator and the `select!` macro.
pub mod select;
/// Special channels (`after`, `tick`, `never`).
pub mod special;

mod signal;
mod waitlist;

pub use channel::Channel;
pub use error::{SendError, TryRecvError, TrySendError};
pub use select::Select;
pub use special::{after, never, tick};

/// Creates a channel of effectively unbounded capacity.
///
/// Sends on it never block (short of exhausting memory); receives block
/// while it is empty.
pub fn unbounded<T>() -> Channel<T> {
    Channel::with_capacity(usize::MAX)
}

/// Creates a channel of bounded capacity.
///
/// Sends block while the buffer is full and no receiver is waiting. A
/// capacity of 0 makes a pure rendezvous channel: every send waits for a
/// receiver.
pub fn bounded<T>(capacity: usize) -> Channel<T> {
    Channel::with_capacity(capacity)
}
