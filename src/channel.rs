use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::error::{SendError, TryRecvError, TrySendError};
use crate::signal::{RecvWaiter, SendWaiter};
use crate::waitlist::WaitList;

/// A typed, closable, multi-producer multi-consumer channel.
///
/// The handle is cheap to clone; all clones refer to the same conduit.
/// Values travel in FIFO order through a bounded buffer, with direct
/// handoff to pending select cases when one is waiting. Closing is
/// monotonic: after [`close`](Channel::close), sends fail immediately and
/// receives drain the remaining buffered values before reporting
/// end-of-stream.
pub struct Channel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

struct Shared<T> {
    inner: Mutex<Inner<T>>,
    // One condvar serves blocked senders, blocked receivers, and drain
    // waiters; every state change broadcasts.
    ops: Condvar,
}

struct Inner<T> {
    buffer: VecDeque<T>,
    capacity: usize,
    closed: bool,
    recv_waiters: WaitList<Arc<RecvWaiter<T>>>,
    send_waiters: WaitList<Arc<SendWaiter<T>>>,
    // Id 0 is reserved so the *_or_notify primitives can return it to mean
    // "resolved synchronously, nothing registered".
    next_id: u64,
    // Parties currently inside a blocking recv. Each one reserves a buffer
    // slot (see has_room) so a sender can proceed against a blocked
    // receiver without overfilling, including on zero-capacity channels.
    blocked_receivers: usize,
}

impl<T> Inner<T> {
    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn has_room(&self) -> bool {
        self.buffer.len() < self.capacity.saturating_add(self.blocked_receivers)
    }

    /// Offers a value to registered receive waiters in arrival order.
    /// Waiters whose select session already completed reject and are
    /// dropped. `Err` hands the value back when none accepted.
    fn offer_to_receivers(&mut self, mut value: T) -> Result<(), T> {
        while let Some((_, waiter)) = self.recv_waiters.pop_front() {
            match waiter.offer(value) {
                Ok(()) => return Ok(()),
                Err(rejected) => value = rejected,
            }
        }
        Err(value)
    }

    /// Pops the next deliverable value: the buffer head first, else a value
    /// produced by the earliest live send waiter (the empty-buffer
    /// rendezvous with a pending select send).
    fn pop_value(&mut self) -> Option<T> {
        if let Some(value) = self.buffer.pop_front() {
            self.backfill();
            return Some(value);
        }
        while let Some((_, waiter)) = self.send_waiters.pop_front() {
            if let Some(value) = waiter.produce() {
                return Some(value);
            }
        }
        None
    }

    /// Moves values from committed send waiters into freed buffer slots,
    /// preserving arrival order behind the buffered values.
    fn backfill(&mut self) {
        while self.buffer.len() < self.capacity {
            match self.send_waiters.pop_front() {
                Some((_, waiter)) => {
                    if let Some(value) = waiter.produce() {
                        self.buffer.push_back(value);
                    }
                }
                None => break,
            }
        }
    }
}

impl<T> Channel<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    buffer: VecDeque::new(),
                    capacity,
                    closed: false,
                    recv_waiters: WaitList::new(),
                    send_waiters: WaitList::new(),
                    next_id: 1,
                    blocked_receivers: 0,
                }),
                ops: Condvar::new(),
            }),
        }
    }

    /// Sends a value, blocking while the channel is full.
    ///
    /// A waiting select receive case gets the value directly; otherwise it
    /// is enqueued as soon as a buffer slot is free or a blocked receiver
    /// has reserved one. Fails only when the channel is closed, handing the
    /// value back in the error.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        let mut inner = self.shared.inner.lock();
        let mut value = value;
        loop {
            if inner.closed {
                return Err(SendError(value));
            }
            value = match inner.offer_to_receivers(value) {
                Ok(()) => return Ok(()),
                Err(rejected) => rejected,
            };
            if inner.has_room() {
                inner.buffer.push_back(value);
                self.shared.ops.notify_all();
                return Ok(());
            }
            self.shared.ops.wait(&mut inner);
        }
    }

    /// Attempts to send without blocking.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        let mut inner = self.shared.inner.lock();
        if inner.closed {
            return Err(TrySendError::Closed(value));
        }
        let value = match inner.offer_to_receivers(value) {
            Ok(()) => return Ok(()),
            Err(rejected) => rejected,
        };
        if inner.has_room() {
            inner.buffer.push_back(value);
            self.shared.ops.notify_all();
            Ok(())
        } else {
            Err(TrySendError::Full(value))
        }
    }

    /// Receives a value, blocking while the channel is empty.
    ///
    /// Returns `None` only once the channel is both closed and fully
    /// drained.
    pub fn recv(&self) -> Option<T> {
        let mut inner = self.shared.inner.lock();
        inner.blocked_receivers += 1;
        let result = loop {
            if let Some(value) = inner.pop_value() {
                break Some(value);
            }
            if inner.closed {
                break None;
            }
            // Publish the slot reservation so blocked senders re-check room.
            self.shared.ops.notify_all();
            self.shared.ops.wait(&mut inner);
        };
        inner.blocked_receivers -= 1;
        // A slot freed, or a closed channel just drained; either way every
        // blocked party must re-evaluate.
        self.shared.ops.notify_all();
        result
    }

    /// Attempts to receive without blocking.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let mut inner = self.shared.inner.lock();
        match inner.pop_value() {
            Some(value) => {
                self.shared.ops.notify_all();
                Ok(value)
            }
            None if inner.closed => Err(TryRecvError::Closed),
            None => Err(TryRecvError::Empty),
        }
    }

    /// Closes the channel. Idempotent.
    ///
    /// Pending select cases on both wait lists are resolved with the closed
    /// outcome; blocked senders fail; blocked receivers drain the buffer
    /// and then observe end-of-stream.
    pub fn close(&self) {
        let mut inner = self.shared.inner.lock();
        if inner.closed {
            return;
        }
        inner.closed = true;
        for waiter in inner.recv_waiters.drain() {
            waiter.close();
        }
        for waiter in inner.send_waiters.drain() {
            waiter.close();
        }
        self.shared.ops.notify_all();
    }

    /// Returns true once the channel is closed *and* drained. A closed
    /// channel that still holds buffered values reports false, because
    /// receives on it still succeed.
    pub fn is_closed(&self) -> bool {
        let inner = self.shared.inner.lock();
        inner.closed && inner.buffer.is_empty()
    }

    /// Number of values currently buffered.
    pub fn len(&self) -> usize {
        self.shared.inner.lock().buffer.len()
    }

    /// Returns true when no values are buffered.
    pub fn is_empty(&self) -> bool {
        self.shared.inner.lock().buffer.is_empty()
    }

    /// The buffer capacity this channel was created with.
    pub fn capacity(&self) -> usize {
        self.shared.inner.lock().capacity
    }

    /// Non-blocking receive for select: delivers through `waiter` when a
    /// value (or the closed outcome) is immediately available, else
    /// registers it on the receive-wait-list.
    ///
    /// Returns 0 when resolved synchronously, else the nonzero wait id the
    /// session must later cancel with [`unnotify_recv`](Self::unnotify_recv).
    /// A synchronously popped value whose waiter rejects it (the session
    /// already won elsewhere) is rolled back to the buffer head, so it is
    /// never lost and never delivered twice.
    pub(crate) fn recv_or_notify(&self, waiter: Arc<RecvWaiter<T>>) -> u64 {
        let mut inner = self.shared.inner.lock();
        if let Some(value) = inner.buffer.pop_front() {
            match waiter.offer(value) {
                Ok(()) => {
                    inner.backfill();
                    self.shared.ops.notify_all();
                }
                Err(rejected) => inner.buffer.push_front(rejected),
            }
            return 0;
        }
        while let Some((_, sender)) = inner.send_waiters.pop_front() {
            if let Some(value) = sender.produce() {
                if let Err(rejected) = waiter.offer(value) {
                    // The sender's session committed but ours lost; the
                    // value lands at the buffer head for the next receiver.
                    inner.buffer.push_front(rejected);
                    self.shared.ops.notify_all();
                }
                return 0;
            }
        }
        if inner.closed {
            waiter.close();
            return 0;
        }
        let id = inner.alloc_id();
        inner.recv_waiters.insert(id, waiter);
        // A blocked sender can now hand off directly.
        self.shared.ops.notify_all();
        id
    }

    /// Non-blocking send for select: when the channel can place a value
    /// right now, commits the waiter's session by producing it and places
    /// it (direct handoff, else enqueue); otherwise registers the waiter on
    /// the send-wait-list.
    ///
    /// Returns 0 when resolved synchronously, else the nonzero wait id the
    /// session must later cancel with [`unnotify_send`](Self::unnotify_send).
    pub(crate) fn send_or_notify(&self, waiter: Arc<SendWaiter<T>>) -> u64 {
        let mut inner = self.shared.inner.lock();
        if inner.closed {
            waiter.close();
            return 0;
        }
        if !inner.recv_waiters.is_empty() || inner.has_room() {
            if let Some(value) = waiter.produce() {
                match inner.offer_to_receivers(value) {
                    Ok(()) => {}
                    Err(value) => {
                        inner.buffer.push_back(value);
                        self.shared.ops.notify_all();
                    }
                }
            }
            return 0;
        }
        let id = inner.alloc_id();
        inner.send_waiters.insert(id, waiter);
        id
    }

    /// Cancels a pending receive registration. Idempotent.
    pub(crate) fn unnotify_recv(&self, id: u64) -> bool {
        self.shared.inner.lock().recv_waiters.remove(id)
    }

    /// Cancels a pending send registration. Idempotent.
    pub(crate) fn unnotify_send(&self, id: u64) -> bool {
        self.shared.inner.lock().send_waiters.remove(id)
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("Channel")
            .field("len", &inner.buffer.len())
            .field("capacity", &inner.capacity)
            .field("closed", &inner.closed)
            .finish()
    }
}
