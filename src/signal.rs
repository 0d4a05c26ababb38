use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// Completion signal shared by every case of one select session.
///
/// The first waiter to claim the signal becomes the session's winner; every
/// later claim fails. This is the single-winner arbiter: channels invoke
/// waiters while holding their own lock, so the lock order is always
/// channel lock, then signal lock, and signal locks are never nested.
pub(crate) struct Signal {
    state: Mutex<State>,
    cond: Condvar,
}

struct State {
    completed: bool,
    winner: usize,
}

impl Signal {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                completed: false,
                winner: 0,
            }),
            cond: Condvar::new(),
        }
    }

    /// Attempts to commit the session to the case at `index`. Returns false
    /// once any case has already won.
    pub(crate) fn try_claim(&self, index: usize) -> bool {
        let mut state = self.state.lock();
        if state.completed {
            return false;
        }
        state.completed = true;
        state.winner = index;
        self.cond.notify_all();
        true
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.state.lock().completed
    }

    pub(crate) fn winner(&self) -> Option<usize> {
        let state = self.state.lock();
        if state.completed {
            Some(state.winner)
        } else {
            None
        }
    }

    /// Blocks until some case wins, returning its index.
    pub(crate) fn wait(&self) -> usize {
        let mut state = self.state.lock();
        while !state.completed {
            self.cond.wait(&mut state);
        }
        state.winner
    }
}

/// What a receive case observed when its session completed.
pub(crate) enum Delivery<T> {
    Value(T),
    Closed,
}

/// A receive case registered on a channel's receive-wait-list.
///
/// One-shot: the channel removes the waiter from its list before offering,
/// and a rejected offer means the session already completed elsewhere, so
/// the waiter is dropped rather than re-queued.
pub(crate) struct RecvWaiter<T> {
    signal: Arc<Signal>,
    index: usize,
    slot: Mutex<Option<Delivery<T>>>,
}

impl<T> RecvWaiter<T> {
    pub(crate) fn new(signal: Arc<Signal>, index: usize) -> Self {
        Self {
            signal,
            index,
            slot: Mutex::new(None),
        }
    }

    /// Offers a value to this waiter. `Err` hands the value back when the
    /// session has already completed through another case.
    pub(crate) fn offer(&self, value: T) -> Result<(), T> {
        if self.signal.try_claim(self.index) {
            *self.slot.lock() = Some(Delivery::Value(value));
            Ok(())
        } else {
            Err(value)
        }
    }

    /// Resolves this case with the channel-closed outcome, if the session is
    /// still open.
    pub(crate) fn close(&self) {
        if self.signal.try_claim(self.index) {
            *self.slot.lock() = Some(Delivery::Closed);
        }
    }

    pub(crate) fn take(&self) -> Option<Delivery<T>> {
        self.slot.lock().take()
    }
}

/// How a send case resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SendOutcome {
    Pending,
    Sent,
    Closed,
}

/// A send case registered on a channel's send-wait-list. The value stays
/// inside the waiter until the channel commits the session by producing it;
/// a losing case therefore never surrenders its value.
pub(crate) struct SendWaiter<T> {
    signal: Arc<Signal>,
    index: usize,
    value: Mutex<Option<T>>,
    outcome: Mutex<SendOutcome>,
}

impl<T> SendWaiter<T> {
    pub(crate) fn new(signal: Arc<Signal>, index: usize, value: T) -> Self {
        Self {
            signal,
            index,
            value: Mutex::new(Some(value)),
            outcome: Mutex::new(SendOutcome::Pending),
        }
    }

    /// Takes the value out of the waiter, committing its session. Returns
    /// `None` when the session already completed through another case.
    pub(crate) fn produce(&self) -> Option<T> {
        if self.signal.try_claim(self.index) {
            *self.outcome.lock() = SendOutcome::Sent;
            self.value.lock().take()
        } else {
            None
        }
    }

    /// Resolves this case with the send-on-closed-channel outcome, if the
    /// session is still open.
    pub(crate) fn close(&self) {
        if self.signal.try_claim(self.index) {
            *self.outcome.lock() = SendOutcome::Closed;
        }
    }

    pub(crate) fn outcome(&self) -> SendOutcome {
        *self.outcome.lock()
    }
}
