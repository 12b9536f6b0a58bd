//! One-time readiness gate for the externally loaded player script.

use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use std::cell::{Cell, RefCell};
use std::future::Future;

pub type Readiness = Result<(), String>;

/// Resolved exactly once; any number of waiters may subscribe before or after that.
pub struct ReadinessGate {
    load_requested: Cell<bool>,
    sender: RefCell<Option<oneshot::Sender<Readiness>>>,
    signal: Shared<oneshot::Receiver<Readiness>>,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (sender, receiver) = oneshot::channel();
        Self {
            load_requested: Cell::new(false),
            sender: RefCell::new(Some(sender)),
            signal: receiver.shared(),
        }
    }

    /// Runs `load` on the first call only. Returns whether it ran.
    pub fn request_load(&self, load: impl FnOnce()) -> bool {
        if self.load_requested.replace(true) {
            return false;
        }
        load();
        true
    }

    /// Settles the gate. Later calls are ignored and return `false`.
    pub fn resolve(&self, outcome: Readiness) -> bool {
        let Some(sender) = self.sender.borrow_mut().take() else {
            return false;
        };
        // The receiver lives in `signal`, so the send cannot fail.
        let _ = sender.send(outcome);
        true
    }

    pub fn wait(&self) -> impl Future<Output = Readiness> + 'static {
        self.signal.clone().map(|received| {
            received.unwrap_or_else(|_| Err("player loader was dropped".to_string()))
        })
    }
}
