use savak::{after, bounded, never, tick, Select, TryRecvError};
use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

// The timeout composition: race a channel nobody sends on against a timer
// channel and let the timer arm win.
#[test]
#[cfg_attr(miri, ignore)]
fn test_after_as_timeout_arm() {
    let start = Instant::now();
    let slow = bounded::<i32>(1);
    let timeout = after(Duration::from_millis(100));

    let timed_out = Cell::new(false);
    Select::new()
        .recv(&slow, |_| {})
        .recv(&timeout, |deadline| timed_out.set(deadline.is_some()))
        .run();

    assert!(timed_out.get());
    assert!(start.elapsed() >= Duration::from_millis(100));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_tick_halts_after_close() {
    let c = tick(Duration::from_millis(10));
    assert!(c.recv().is_some());

    c.close();

    // Drain whatever the timer got in before the close, then give it a few
    // periods: its next send fails and the timer thread exits, so the
    // channel stays dry
    while c.recv().is_some() {}
    assert!(c.is_closed());

    thread::sleep(Duration::from_millis(50));
    assert_eq!(c.try_recv(), Err(TryRecvError::Closed));
}

#[test]
fn test_never() {
    let c = never::<i32>();
    assert_eq!(c.try_recv(), Err(TryRecvError::Empty));
    assert!(!c.is_closed());
}
