//! Frame-drained event queue between the conversation session and the UI.
//!
//! Single-threaded (WASM main thread), so the queue lives behind
//! `Rc<RefCell<_>>`. The session pushes; the UI drains once per frame and
//! projects the events into its own display state.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use redmerce_types::event::SessionEvent;

/// Shared handle to one queue. Cloning shares the queue.
pub struct EventBus<E = SessionEvent> {
    queue: Rc<RefCell<VecDeque<E>>>,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    pub fn emit(&self, event: E) {
        self.queue.borrow_mut().push_back(event);
    }

    /// Take every queued event in emission order.
    pub fn drain(&self) -> Vec<E> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn has_pending(&self) -> bool {
        self.pending() > 0
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}
