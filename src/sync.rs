//! Scoped read/write lock
//!
//! Thin wrapper over `parking_lot::RwLock` naming the two acquisition modes the
//! facades use. Guards release on every exit path when dropped. Acquisition is
//! not reentrant: a thread holding a read guard must not acquire again.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared-read / exclusive-write lock around `T`.
#[derive(Debug, Default)]
pub struct ScopedRwLock<T> {
    inner: RwLock<T>,
}

impl<T> ScopedRwLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// Acquire shared access. Any number of readers may hold it at once.
    pub fn acquire_read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read()
    }

    /// Acquire exclusive access, waiting for all readers to leave.
    pub fn acquire_write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write()
    }
}
