//! Frame request bookkeeping
//!
//! `FrameQueue` stands in for the browser's animation-frame callback: the
//! scheduler arms frames on it and the host loop pops them and calls back.

use std::cell::RefCell;
use std::rc::Rc;

use crate::sim::{FrameHandle, FrameRequester};

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    pending: Vec<FrameHandle>,
    requested: u64,
    cancelled: u64,
}

/// Records armed frames. Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct FrameQueue {
    inner: Rc<RefCell<Inner>>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames armed and not yet fired or cancelled
    pub fn pending(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Total frames ever requested
    pub fn requested(&self) -> u64 {
        self.inner.borrow().requested
    }

    /// Total frames cancelled while still pending
    pub fn cancelled(&self) -> u64 {
        self.inner.borrow().cancelled
    }

    /// Fire the oldest armed frame, if any
    pub fn take_armed(&self) -> Option<FrameHandle> {
        let mut inner = self.inner.borrow_mut();
        if inner.pending.is_empty() {
            None
        } else {
            Some(inner.pending.remove(0))
        }
    }
}

impl FrameRequester for FrameQueue {
    fn request_frame(&mut self) -> FrameHandle {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        inner.requested += 1;
        let handle = FrameHandle(inner.next_id);
        inner.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut inner = self.inner.borrow_mut();
        // Already fired frames are simply gone
        if let Some(i) = inner.pending.iter().position(|h| *h == handle) {
            inner.pending.remove(i);
            inner.cancelled += 1;
        }
    }
}
