//! Notification dispatch to registered listeners

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, warn};

use crate::protocol::Notification;

/// Receives every notification the engine emits, in emission order
pub trait NotificationListener {
    fn notify(&mut self, notification: &Notification) -> anyhow::Result<()>;
}

/// Fan-out of notifications to all listeners.
///
/// A failing listener is logged and skipped; it never stops later listeners
/// or the operation that emitted the notification.
#[derive(Default)]
pub struct Emitter {
    listeners: Vec<Box<dyn NotificationListener>>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl NotificationListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn emit(&mut self, notification: Notification) {
        debug!("emit {}", notification.kind());
        for (index, listener) in self.listeners.iter_mut().enumerate() {
            if let Err(e) = listener.notify(&notification) {
                warn!(
                    "Listener {index} failed on {}: {e:#}",
                    notification.kind()
                );
            }
        }
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Listener that buffers notifications until the owner drains them
#[derive(Clone, Debug, Default)]
pub struct NotificationQueue {
    pending: Rc<RefCell<VecDeque<Notification>>>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notification that did not come from the emitter
    pub fn push(&self, notification: Notification) {
        self.pending.borrow_mut().push_back(notification);
    }

    pub fn drain(&self) -> Vec<Notification> {
        self.pending.borrow_mut().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

impl NotificationListener for NotificationQueue {
    fn notify(&mut self, notification: &Notification) -> anyhow::Result<()> {
        self.pending.borrow_mut().push_back(notification.clone());
        Ok(())
    }
}
