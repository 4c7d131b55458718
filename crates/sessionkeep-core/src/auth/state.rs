use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::{SessionState, UserInfo};

/// Observable holder of the current session.
///
/// Backed by a watch channel: writers replace the value and return at once,
/// observers run on their own tasks and always see the latest value. Rapid
/// successive updates may be coalesced into one notification.
pub struct SessionStore {
    tx: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new(initial: SessionState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Snapshot of the latest value
    pub fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_signed_in()
    }

    /// Replace the value and wake every observer
    pub fn set(&self, value: SessionState) {
        self.tx.send_replace(value);
    }

    /// Replace the value only if `precondition` holds for the current one.
    /// The check and the swap happen atomically.
    pub(crate) fn replace_if(
        &self,
        precondition: impl FnOnce(&SessionState) -> bool,
        value: SessionState,
    ) -> bool {
        self.tx.send_if_modified(|state| {
            if precondition(state) {
                *state = value;
                true
            } else {
                false
            }
        })
    }

    /// Atomically move to `SignedOut`, returning the user that was signed in
    pub(crate) fn take_user(&self) -> Option<UserInfo> {
        let mut taken = None;
        self.tx.send_if_modified(|state| match std::mem::take(state) {
            SessionState::SignedIn(user) => {
                taken = Some(user);
                true
            }
            SessionState::SignedOut => false,
        });
        taken
    }

    /// Raw receiver for consumers that prefer `changed().await` loops.
    /// The current value is already marked as seen.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Register an observer. It is called with the current value right away,
    /// then after every change, on a spawned tokio task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe<F>(&self, mut observer: F) -> Subscription
    where
        F: FnMut(&SessionState) + Send + 'static,
    {
        // Taken here, not inside the task, so no update can slip between the
        // snapshot and the subscription.
        let mut rx = self.tx.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                let snapshot = rx.borrow_and_update().clone();
                observer(&snapshot);
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });
        Subscription { handle }
    }

    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionState::SignedOut)
    }
}

/// Handle for a registered observer. Dropping it unsubscribes.
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Stop notifications. One already in flight may still be delivered.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
