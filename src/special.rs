use std::thread;
use std::time::{Duration, Instant};

use crate::channel::Channel;
use crate::{bounded, unbounded};

/// Creates a channel that delivers a single timestamp after `duration`.
///
/// The usual building block for select timeouts: add a receive case on the
/// returned channel next to the operations being raced.
pub fn after(duration: Duration) -> Channel<Instant> {
    let channel = bounded(1);
    let sender = channel.clone();
    thread::spawn(move || {
        thread::sleep(duration);
        let _ = sender.send(Instant::now());
    });
    channel
}

/// Creates a channel that delivers timestamps periodically.
///
/// Closing the returned channel stops the timer thread.
pub fn tick(duration: Duration) -> Channel<Instant> {
    let channel = bounded(1);
    let sender = channel.clone();
    thread::spawn(move || loop {
        thread::sleep(duration);
        if sender.send(Instant::now()).is_err() {
            break;
        }
    });
    channel
}

/// Creates a channel that never delivers a message.
///
/// Useful for structurally disabling a select case.
pub fn never<T>() -> Channel<T> {
    unbounded()
}
