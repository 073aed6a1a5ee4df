//! Shared values that can be waited on.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
struct Slot<T> {
    version: u64,
    value: Option<T>,
}

/// A value written by one stage and read by others.
///
/// Every write bumps a version number, so a reader can remember the version
/// it saw and later wait for a newer write.
#[derive(Debug)]
pub struct Watched<T> {
    slot: Mutex<Slot<T>>,
}

impl<T> Default for Watched<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(Slot {
                version: 0,
                value: None,
            }),
        }
    }
}

impl<T: Clone> Watched<T> {
    /// Create an empty value at version 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value. Returns the new version.
    pub fn set(&self, value: T) -> u64 {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.version += 1;
        slot.value = Some(value);
        slot.version
    }

    /// The latest value, if any was written.
    pub fn get(&self) -> Option<T> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .value
            .clone()
    }

    /// Number of writes so far.
    pub fn version(&self) -> u64 {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .version
    }

    /// Wait until a write newer than `version` happens, checking every
    /// `poll`. Gives up with `None` after `timeout`.
    pub async fn changed_since(&self, version: u64, timeout: Duration, poll: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.version > version {
                    return slot.value.clone();
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(poll).await;
        }
    }
}
