//! Bound on concurrent strategy calls.

use super::CancellationToken;
use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Permit pool shared by every pipeline that must respect one call limit.
///
/// A permit is held for the whole strategy call, including the part that
/// outlives a timed-out attempt on its detached worker thread, so the
/// number of calls actually in flight never exceeds the capacity.
#[derive(Debug, Clone)]
pub struct CallLimiter {
    permits: Receiver<()>,
    release: Sender<()>,
    capacity: usize,
}

impl CallLimiter {
    /// Create a limiter allowing `capacity` simultaneous calls.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::config("call limit must be at least 1"));
        }
        let (release, permits) = crossbeam_channel::bounded(capacity);
        for _ in 0..capacity {
            release
                .try_send(())
                .map_err(|e| Error::Other(format!("Failed to fill call limiter: {}", e)))?;
        }
        Ok(Self {
            permits,
            release,
            capacity,
        })
    }

    /// Maximum number of simultaneous calls.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.permits.len()
    }

    /// Take a permit if one is free.
    pub fn try_acquire(&self) -> Option<CallPermit> {
        self.permits.try_recv().ok().map(|()| self.permit())
    }

    /// Wait for a permit. Returns `None` once `token` is cancelled.
    pub fn acquire(&self, token: &CancellationToken) -> Option<CallPermit> {
        loop {
            if token.is_cancelled() {
                return None;
            }
            match self.permits.recv_timeout(POLL_INTERVAL) {
                Ok(()) => return Some(self.permit()),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn permit(&self) -> CallPermit {
        CallPermit {
            release: self.release.clone(),
        }
    }
}

/// A held call slot, returned to its limiter on drop.
#[derive(Debug)]
pub struct CallPermit {
    release: Sender<()>,
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        let _ = self.release.try_send(());
    }
}
