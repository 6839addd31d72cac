//! Scheduling primitives shared by the controllers.
//!
//! Both primitives hold at most one pending callback. Scheduling again drops
//! the previous guard, which cancels it, so the latest request always wins.

#[cfg(test)]
#[path = "sched_test.rs"]
mod sched_test;

use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::Page;

/// Trailing debounce: the callback runs once the trigger has been quiet for
/// `delay_ms`.
pub struct Debounce<P: Page> {
    page: Rc<P>,
    delay_ms: u32,
    pending: RefCell<Option<P::Timer>>,
}

impl<P: Page> Debounce<P> {
    pub fn new(page: Rc<P>, delay_ms: u32) -> Self {
        Self { page, delay_ms, pending: RefCell::new(None) }
    }

    /// Restart the quiet period with `callback` as the trailing action.
    pub fn trigger(&self, callback: impl FnOnce() + 'static) {
        let timer = self.page.set_timeout(self.delay_ms, Box::new(callback));
        let previous = self.pending.replace(Some(timer));
        drop(previous);
    }

    /// Drop the pending callback, if any.
    pub fn cancel(&self) {
        let previous = self.pending.take();
        drop(previous);
    }
}

/// Latest-wins frame scheduler: at most one callback per animation frame,
/// and only the most recently scheduled one runs.
pub struct FrameScheduler<P: Page> {
    page: Rc<P>,
    pending: RefCell<Option<P::Frame>>,
}

impl<P: Page> FrameScheduler<P> {
    pub fn new(page: Rc<P>) -> Self {
        Self { page, pending: RefCell::new(None) }
    }

    /// Cancel the pending frame and request a new one running `callback`.
    pub fn schedule(&self, callback: impl FnOnce() + 'static) {
        let previous = self.pending.take();
        drop(previous);
        let frame = self.page.request_frame(Box::new(callback));
        *self.pending.borrow_mut() = Some(frame);
    }
}
