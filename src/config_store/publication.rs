use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::Notify;

/// Single-slot hand-off of published configurations.
///
/// The update loop sets the slot, a waiting consumer takes it. Each value is
/// taken at most once, so concurrent consumers each see distinct
/// publications. Setting never blocks: an unconsumed value is replaced by the
/// newer one. Once closed, consumers drain what is left and then stop
/// waiting.
pub(crate) struct Publication<C> {
    slot: Mutex<Option<C>>,
    notify: Notify,
    closed: AtomicBool,
}

impl<C> Publication<C> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Places `value` in the slot and wakes one waiting consumer.
    pub(crate) fn publish(&self, value: C) {
        let replaced = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(value);

        // A replaced value already left a wakeup behind
        if replaced.is_none() {
            self.notify.notify_one();
        }
    }

    /// Takes the published value, if any.
    pub(crate) fn try_take(&self) -> Option<C> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Marks that nothing will be published anymore and wakes every waiter.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Waits until a value is published and takes it.
    ///
    /// Returns `None` once the publication is closed and the slot is empty.
    pub(crate) async fn take(&self) -> Option<C> {
        loop {
            let notified = self.notify.notified();

            if let Some(value) = self.try_take() {
                return Some(value);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }

            notified.await;
        }
    }
}

/// Closes the publication when dropped, including while unwinding.
pub(crate) struct CloseOnDrop<C>(pub(crate) Arc<Publication<C>>);

impl<C> Drop for CloseOnDrop<C> {
    fn drop(&mut self) {
        self.0.close();
    }
}
