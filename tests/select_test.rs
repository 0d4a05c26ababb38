use savak::{bounded, select, unbounded, Select};
use std::cell::Cell;
use std::thread;
use std::time::Duration;

#[test]
fn test_select_default() {
    let c = unbounded::<i32>();
    let v = Cell::new(0);

    Select::new()
        .recv(&c, |m| v.set(m.unwrap_or(-1)))
        .default(|| v.set(10))
        .run();

    assert_eq!(v.get(), 10);
}

#[test]
fn test_select_ready_value() {
    let c = unbounded();
    c.send(2).unwrap();

    let v = Cell::new(0);
    Select::new()
        .recv(&c, |m| v.set(m.unwrap_or(-1)))
        .default(|| v.set(1))
        .run();

    assert_eq!(v.get(), 2);
    assert!(c.is_empty());
}

#[test]
fn test_select_action_sees_delivered_value() {
    let c = unbounded();
    c.send(7).unwrap();

    let v = Cell::new(0);
    Select::new().recv(&c, |m| v.set(m.unwrap() + 1)).run();

    assert_eq!(v.get(), 8);
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_select_blocks_until_send() {
    let c = unbounded();
    let sender = c.clone();

    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        sender.send(8).unwrap();
    });

    let v = Cell::new(0);
    Select::new().recv(&c, |m| v.set(m.unwrap())).run();

    assert_eq!(v.get(), 8);
    t.join().unwrap();
}

#[test]
fn test_select_recv_on_closed() {
    let c = unbounded::<i32>();
    c.close();

    let saw_closed = Cell::new(false);
    Select::new()
        .recv(&c, |m| saw_closed.set(m.is_none()))
        .run();

    assert!(saw_closed.get());
}

#[test]
fn test_select_send_ready() {
    let c = unbounded();

    let sent = Cell::new(false);
    Select::new().send(&c, 5, |ok| sent.set(ok)).run();

    assert!(sent.get());
    assert_eq!(c.recv(), Some(5));
}

#[test]
fn test_select_send_on_closed() {
    let c = unbounded();
    c.close();

    let sent = Cell::new(true);
    Select::new().send(&c, 5, |ok| sent.set(ok)).run();

    assert!(!sent.get());
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_select_send_blocks_until_room() {
    let c = bounded(1);
    c.send(1).unwrap();

    let receiver = c.clone();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        assert_eq!(receiver.recv(), Some(1));
        assert_eq!(receiver.recv(), Some(2));
    });

    let sent = Cell::new(false);
    Select::new().send(&c, 2, |ok| sent.set(ok)).run();

    assert!(sent.get());
    t.join().unwrap();
}

#[test]
fn test_select_single_winner() {
    let c1 = unbounded();
    let c2 = unbounded();
    c1.send(1).unwrap();
    c2.send(2).unwrap();

    let fired = Cell::new(0);
    let got = Cell::new(0);
    Select::new()
        .recv(&c1, |m| {
            fired.set(fired.get() + 1);
            got.set(m.unwrap());
        })
        .recv(&c2, |m| {
            fired.set(fired.get() + 1);
            got.set(m.unwrap());
        })
        .run();

    // Exactly one case ran, and the losing channel kept its value
    assert_eq!(fired.get(), 1);
    assert_eq!(got.get(), 1);
    assert_eq!(c1.len() + c2.len(), 1);
    assert_eq!(c2.recv(), Some(2));
}

#[test]
fn test_select_leaves_no_registration_behind() {
    let c1 = unbounded::<i32>();
    let c2 = unbounded::<i32>();

    for _ in 0..3 {
        let idled = Cell::new(false);
        Select::new()
            .recv(&c1, |_| {})
            .recv(&c2, |_| {})
            .default(|| idled.set(true))
            .run();
        assert!(idled.get());
    }

    // Plain operations are unaffected by the abandoned sessions
    c1.send(42).unwrap();
    assert_eq!(c1.recv(), Some(42));
    c2.send(7).unwrap();
    assert_eq!(c2.try_recv(), Ok(7));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_select_race_across_threads() {
    let c1 = unbounded::<i32>();
    let c2 = unbounded::<i32>();

    let sender = c2.clone();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        sender.send(20).unwrap();
    });

    let v = Cell::new(0);
    Select::new()
        .recv(&c1, |_| panic!("c1 never receives"))
        .recv(&c2, |m| v.set(m.unwrap()))
        .run();

    assert_eq!(v.get(), 20);
    t.join().unwrap();
}

#[test]
fn test_select_macro_basic() {
    let c1 = unbounded::<i32>();
    let c2 = unbounded::<i32>();

    c1.send(10).unwrap();

    select! {
        v = recv(c1) => assert_eq!(v, Some(10)),
        _v = recv(c2) => panic!("Should receive from c1"),
    }
}

#[test]
fn test_select_macro_default() {
    let c1 = unbounded::<i32>();
    let c2 = unbounded::<i32>();

    select! {
        _v = recv(c1) => panic!("Should not receive from c1"),
        _v = recv(c2) => panic!("Should not receive from c2");
        default => {},
    }
}

#[test]
fn test_select_macro_send() {
    let c = unbounded::<i32>();

    select! {
        ok = send(c, 3) => assert!(ok),
    }

    assert_eq!(c.recv(), Some(3));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_select_macro_race() {
    let c1 = unbounded::<i32>();
    let c2 = unbounded::<i32>();

    let sender = c2.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        sender.send(20).unwrap();
    });

    select! {
        _v = recv(c1) => panic!("Should receive from c2"),
        v = recv(c2) => assert_eq!(v, Some(20)),
    }
}
