use std::sync::Arc;

use crate::channel::Channel;
use crate::signal::{Delivery, RecvWaiter, SendOutcome, SendWaiter, Signal};

/// A one-shot coordinator that commits to exactly one ready case among
/// several send/receive candidates, in the CSP style.
///
/// Cases are declared in order with [`recv`](Select::recv),
/// [`send`](Select::send) and at most one trailing
/// [`default`](Select::default), then raced with [`run`](Select::run).
/// Exactly one case's action runs, synchronously on the calling thread;
/// every losing case observes no side effect: a losing receive consumes
/// nothing and a losing send delivers nothing.
///
/// # Example
///
/// ```
/// use savak::{unbounded, Select};
///
/// let numbers = unbounded::<i32>();
/// let words = unbounded::<&str>();
/// numbers.send(7).unwrap();
///
/// let mut seen = None;
/// Select::new()
///     .recv(&numbers, |n| seen = n)
///     .recv(&words, |_| unreachable!())
///     .run();
/// assert_eq!(seen, Some(7));
/// ```
pub struct Select<'a> {
    cases: Vec<Box<dyn Case + 'a>>,
    default_action: Option<Box<dyn FnOnce() + 'a>>,
}

impl<'a> Select<'a> {
    /// Creates an empty select session.
    pub fn new() -> Self {
        Self {
            cases: Vec::new(),
            default_action: None,
        }
    }

    /// Adds a receive case. If it wins, `action` runs with `Some(value)`,
    /// or with `None` when the channel resolved the case as closed.
    pub fn recv<T, F>(mut self, channel: &Channel<T>, action: F) -> Self
    where
        T: 'a,
        F: FnOnce(Option<T>) + 'a,
    {
        self.cases.push(Box::new(RecvCase {
            channel: channel.clone(),
            action: Some(Box::new(action)),
            waiter: None,
            id: 0,
        }));
        self
    }

    /// Adds a send case for `value`. If it wins, `action` runs with `true`
    /// when the value was delivered, or `false` when the channel resolved
    /// the case as closed.
    pub fn send<T, F>(mut self, channel: &Channel<T>, value: T, action: F) -> Self
    where
        T: 'a,
        F: FnOnce(bool) + 'a,
    {
        self.cases.push(Box::new(SendCase {
            channel: channel.clone(),
            value: Some(value),
            action: Some(Box::new(action)),
            waiter: None,
            id: 0,
        }));
        self
    }

    /// Adds the default case: `action` runs iff no other case is ready at
    /// registration time. Declare it after every other case.
    pub fn default<F>(mut self, action: F) -> Self
    where
        F: FnOnce() + 'a,
    {
        self.default_action = Some(Box::new(action));
        self
    }

    /// Races the cases and runs the winner's action before returning.
    ///
    /// Blocks until some case becomes ready, unless a default case was
    /// declared. A select with no cases and no default blocks forever.
    pub fn run(mut self) {
        let signal = Arc::new(Signal::new());

        // Registration pass, in declaration order. A channel that is ready
        // resolves the case inline and claims the signal; once that
        // happens, later cases never even register.
        for (index, case) in self.cases.iter_mut().enumerate() {
            case.register(&signal, index);
            if signal.is_completed() {
                break;
            }
        }

        let winner = match signal.winner() {
            Some(index) => Some(index),
            None => match self.default_action.take() {
                Some(default_action) => {
                    for case in &mut self.cases {
                        case.cancel();
                    }
                    // A producer may have claimed the session between the
                    // registration pass and the cancellations. The claim is
                    // one-shot, so whoever holds it delivered a real value
                    // and the default must yield.
                    match signal.winner() {
                        Some(index) => Some(index),
                        None => {
                            default_action();
                            None
                        }
                    }
                }
                None => Some(signal.wait()),
            },
        };

        // Deregister everything before any user action runs, so a panicking
        // action cannot leave dangling registrations behind.
        for case in &mut self.cases {
            case.cancel();
        }
        if let Some(index) = winner {
            self.cases[index].finish();
        }
    }
}

/// One participant in a select session.
trait Case {
    /// Registers against the case's channel; resolves inline when the
    /// channel is immediately ready.
    fn register(&mut self, signal: &Arc<Signal>, index: usize);
    /// Cancels a pending registration. Idempotent.
    fn cancel(&mut self);
    /// Runs the case's action with the recorded outcome. Winner only.
    fn finish(&mut self);
}

struct RecvCase<'a, T> {
    channel: Channel<T>,
    action: Option<Box<dyn FnOnce(Option<T>) + 'a>>,
    waiter: Option<Arc<RecvWaiter<T>>>,
    id: u64,
}

impl<T> Case for RecvCase<'_, T> {
    fn register(&mut self, signal: &Arc<Signal>, index: usize) {
        let waiter = Arc::new(RecvWaiter::new(signal.clone(), index));
        self.id = self.channel.recv_or_notify(waiter.clone());
        self.waiter = Some(waiter);
    }

    fn cancel(&mut self) {
        if self.id != 0 {
            self.channel.unnotify_recv(self.id);
            self.id = 0;
        }
    }

    fn finish(&mut self) {
        let delivered = self.waiter.take().and_then(|waiter| waiter.take());
        if let Some(action) = self.action.take() {
            let message = match delivered {
                Some(Delivery::Value(value)) => Some(value),
                _ => None,
            };
            action(message);
        }
    }
}

struct SendCase<'a, T> {
    channel: Channel<T>,
    value: Option<T>,
    action: Option<Box<dyn FnOnce(bool) + 'a>>,
    waiter: Option<Arc<SendWaiter<T>>>,
    id: u64,
}

impl<T> Case for SendCase<'_, T> {
    fn register(&mut self, signal: &Arc<Signal>, index: usize) {
        let Some(value) = self.value.take() else {
            return;
        };
        let waiter = Arc::new(SendWaiter::new(signal.clone(), index, value));
        self.id = self.channel.send_or_notify(waiter.clone());
        self.waiter = Some(waiter);
    }

    fn cancel(&mut self) {
        if self.id != 0 {
            self.channel.unnotify_send(self.id);
            self.id = 0;
        }
    }

    fn finish(&mut self) {
        let sent = self
            .waiter
            .take()
            .map(|waiter| waiter.outcome() == SendOutcome::Sent)
            .unwrap_or(false);
        if let Some(action) = self.action.take() {
            action(sent);
        }
    }
}

/// Waits on multiple channel operations, committing to exactly one.
///
/// Arms are `pattern = recv(channel) => body` (the pattern binds an
/// `Option<T>`, `None` meaning the channel closed) and
/// `pattern = send(channel, value) => body` (the pattern binds a `bool`,
/// `false` meaning the channel closed). An optional trailing
/// `default => body` arm, separated by `;`, runs iff no other arm is ready.
///
/// # Examples
///
/// ```
/// use savak::{select, unbounded};
///
/// let first = unbounded::<i32>();
/// let second = unbounded::<i32>();
///
/// first.send(10).unwrap();
///
/// select! {
///     v = recv(first) => assert_eq!(v, Some(10)),
///     _v = recv(second) => panic!("second is empty"),
/// }
/// ```
///
/// With a default arm:
///
/// ```
/// use savak::{select, unbounded};
///
/// let idle = unbounded::<i32>();
///
/// select! {
///     _v = recv(idle) => panic!("nothing was sent");
///     default => {},
/// }
/// ```
#[macro_export]
macro_rules! select {
    // Only a default arm.
    ( default => $default_body:expr $(,)? ) => {{
        $crate::Select::new().default(|| { $default_body; }).run();
    }};
    // Arms with a trailing default.
    ( $($bind:pat = $kind:ident($($args:expr),* $(,)?) => $body:expr),+ ;
      default => $default_body:expr $(,)? ) => {{
        let mut __select = $crate::Select::new();
        $( __select = $crate::__select_case!(__select, $bind, $kind, ($($args),*), $body); )+
        __select.default(|| { $default_body; }).run();
    }};
    // Arms without a default.
    ( $($bind:pat = $kind:ident($($args:expr),* $(,)?) => $body:expr),+ $(,)? ) => {{
        let mut __select = $crate::Select::new();
        $( __select = $crate::__select_case!(__select, $bind, $kind, ($($args),*), $body); )+
        __select.run();
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __select_case {
    ($select:expr, $bind:pat, recv, ($channel:expr), $body:expr) => {
        $select.recv(&$channel, |$bind| {
            $body;
        })
    };
    ($select:expr, $bind:pat, send, ($channel:expr, $value:expr), $body:expr) => {
        $select.send(&$channel, $value, |$bind| {
            $body;
        })
    };
}
