//! Observable view state with teardown-safe publication.
//!
//! A view's state lives in a [`ViewState`]. Writers publish under an
//! [`Epoch`]; starting a new epoch (target change) or closing the cell
//! (teardown) makes every older writer's publications no-ops, so a fetch that
//! resolves late can never overwrite newer state or update a disposed view.

use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

/// Publication right handed to one generation of writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch(u64);

pub struct ViewState<T> {
    tx: watch::Sender<T>,
    /// Current epoch; `None` once closed.
    current: Mutex<Option<u64>>,
}

impl<T> ViewState<T> {
    pub fn new(initial: T) -> (Self, Epoch) {
        let (tx, _rx) = watch::channel(initial);
        let state = Self {
            tx,
            current: Mutex::new(Some(0)),
        };
        (state, Epoch(0))
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.tx.borrow().clone()
    }

    /// Start a new epoch with `value`. Returns `None` if the view is closed.
    pub fn begin(&self, value: T) -> Option<Epoch> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let next = current.as_ref()?.wrapping_add(1);
        *current = Some(next);
        self.tx.send_replace(value);
        Some(Epoch(next))
    }

    /// Replace the state if `epoch` is still current. Returns whether it was.
    pub fn publish(&self, epoch: Epoch, value: T) -> bool {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != Some(epoch.0) {
            return false;
        }
        self.tx.send_replace(value);
        true
    }

    /// Reject all further publications.
    pub fn close(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_epoch_cannot_publish() {
        let (state, first) = ViewState::new(0u32);
        assert!(state.publish(first, 1));
        let second = state.begin(10).unwrap();
        assert!(!state.publish(first, 2));
        assert_eq!(state.get(), 10);
        assert!(state.publish(second, 11));
        assert_eq!(state.get(), 11);
    }

    #[test]
    fn closed_state_is_frozen() {
        let (state, epoch) = ViewState::new("loading");
        let rx = state.subscribe();
        state.close();
        assert!(!state.publish(epoch, "ready"));
        assert!(state.begin("again").is_none());
        assert_eq!(*rx.borrow(), "loading");
    }
}
