#![forbid(unsafe_code)]

//! Host frame scheduling.
//!
//! The runtime never owns a clock. When it needs another frame it calls
//! [`FrameScheduler::request_frame`] with the token of the playback that
//! wants it; the host later calls
//! [`CommandStack::on_frame`](crate::CommandStack::on_frame) with its own
//! timestamp. A request whose token has since been cancelled may be dropped
//! by the host.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::cancellation::CancellationToken;

/// Registers interest in the next display frame.
pub trait FrameScheduler {
    /// Ask the host to call back on the next frame.
    fn request_frame(&self, token: CancellationToken);
}

impl<F> FrameScheduler for F
where
    F: Fn(CancellationToken),
{
    fn request_frame(&self, token: CancellationToken) {
        self(token);
    }
}

/// Scheduler that ignores every request. Hosts that tick unconditionally
/// use this.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFrameScheduler;

impl FrameScheduler for NoopFrameScheduler {
    fn request_frame(&self, _token: CancellationToken) {}
}

/// Scheduler that queues requests for the host to drain.
///
/// Clones share one queue, so a host can keep a handle while the stack owns
/// another.
#[derive(Clone, Default)]
pub struct ManualFrameScheduler {
    requests: Arc<Mutex<Vec<CancellationToken>>>,
}

impl ManualFrameScheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests that are still live (not cancelled).
    #[must_use]
    pub fn pending(&self) -> usize {
        let queue = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        queue.iter().filter(|t| !t.is_cancelled()).count()
    }

    /// Drain the queue, returning `true` if any live request was in it.
    pub fn take(&self) -> bool {
        let mut queue = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        let live = queue.iter().any(|t| !t.is_cancelled());
        queue.clear();
        live
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&self, token: CancellationToken) {
        let mut queue = self.requests.lock().unwrap_or_else(|e| e.into_inner());
        queue.retain(|t| !t.is_cancelled());
        queue.push(token);
    }
}

impl fmt::Debug for ManualFrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualFrameScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
